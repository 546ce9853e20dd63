//! Train [`Agent`].
mod config;
use crate::{
    error::StrataError,
    merge,
    record::{Record, RecordValue::Scalar, Recorder},
    AdvantageEstimator, Agent, Env, Evaluator, Losses, VecRunner,
};
use anyhow::{Context, Result};
pub use config::TrainerConfig;
use log::info;
use std::{path::Path, time::SystemTime};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the on-policy training loop.
///
/// # Training loop
///
/// [`Trainer::train()`] runs `n = ceil(num_total_steps / (rollout_steps * num_processes))`
/// iterations. Iteration `i` (1-based) does the following:
///
/// 1. Collect `rollout_steps` transitions from each of the `num_processes`
///    environments with [`VecRunner::rollout`].
/// 2. Merge the trajectories into a [`Batch`] with [`merge`].
/// 3. Compute returns, values and log-probabilities of the batch once with
///    [`AdvantageEstimator::compute`]. They stay fixed for the rest of the
///    iteration.
/// 4. For each of `ppo_epochs` epochs, shuffle the rows of the batch and call
///    [`Agent::optimize`] on consecutive minibatches of `batch_size` rows. The
///    last minibatch of an epoch may be smaller.
/// 5. Write a record with the mean losses, `env_steps`, `opt_steps`, `fps` and
///    `rollout_avg_return` (when an episode ended during the rollout).
/// 6. If `i % eval_interval == 0`, evaluate the agent in evaluation mode and add
///    the result to the record. If the average return is the best so far, the
///    parameters are saved in `(model_dir)/best`.
/// 7. If `i % save_interval == 0`, save the parameters in `(model_dir)/(i)`.
///
/// Errors abort training and carry the iteration number.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|actions|B[VecRunner]
///     B -->|Trajectory|C[merge]
///     C -->|Batch|D[AdvantageEstimator]
///     A -->|values, log-probs|D
///     D -->|RolloutTargets|A
///     C -->|Batch|A
/// ```
///
/// [`Batch`]: crate::Batch
pub struct Trainer {
    config: TrainerConfig,
    estimator: AdvantageEstimator,
    rng: fastrand::Rng,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Result<Self> {
        let checks = [
            ("rollout_steps", config.rollout_steps),
            ("num_processes", config.num_processes),
            ("batch_size", config.batch_size),
            ("ppo_epochs", config.ppo_epochs),
        ];
        for (name, v) in checks.iter() {
            if *v == 0 {
                return Err(StrataError::InvalidConfig(format!("{} must be positive", name)).into());
            }
        }

        Ok(Self {
            estimator: AdvantageEstimator::new(config.gae_config()),
            rng: fastrand::Rng::with_seed(config.seed),
            config,
        })
    }

    fn save_model<A: Agent + ?Sized>(agent: &A, model_dir: &Path) -> Result<()> {
        agent
            .save_params(model_dir)
            .with_context(|| format!("Failed to save the model in {:?}", model_dir))?;
        info!("Saved the model in {:?}", model_dir);
        Ok(())
    }

    fn model_dir(&self) -> Result<&Path> {
        self.config
            .model_dir
            .as_deref()
            .map(Path::new)
            .ok_or_else(|| StrataError::InvalidConfig("model_dir is not set".to_string()).into())
    }

    /// Performs `ppo_epochs` epochs of minibatch updates on a rollout.
    fn optimize<E: Env, A: Agent + ?Sized>(
        &mut self,
        runner: &mut VecRunner<E>,
        agent: &mut A,
    ) -> Result<(Record, usize)> {
        let trajectories = runner.rollout(&*agent, self.config.rollout_steps)?;
        let episode_returns: Vec<f32> = trajectories
            .iter()
            .flat_map(|t| t.episode_returns().iter().copied())
            .collect();
        let batch = merge(&trajectories)?;
        let targets = self.estimator.compute(&batch, &*agent)?;

        let mut ixs: Vec<usize> = (0..batch.len()).collect();
        let mut sum = Losses {
            actor_loss: 0.0,
            critic_loss: 0.0,
            entropy: 0.0,
        };
        let mut n_opts = 0;

        for _ in 0..self.config.ppo_epochs {
            self.rng.shuffle(&mut ixs);
            for chunk in ixs.chunks(self.config.batch_size) {
                let losses = agent.optimize(&batch.select(chunk), &targets.select(chunk))?;
                sum.actor_loss += losses.actor_loss;
                sum.critic_loss += losses.critic_loss;
                sum.entropy += losses.entropy;
                n_opts += 1;
            }
        }

        let n = n_opts as f32;
        let mut record = Losses {
            actor_loss: sum.actor_loss / n,
            critic_loss: sum.critic_loss / n,
            entropy: sum.entropy / n,
        }
        .into_record();
        if !episode_returns.is_empty() {
            let avg = episode_returns.iter().sum::<f32>() / episode_returns.len() as f32;
            record.insert("rollout_avg_return", Scalar(avg));
        }

        Ok((record, n_opts))
    }

    /// Train the agent.
    pub fn train<E, A, D>(
        &mut self,
        runner: &mut VecRunner<E>,
        agent: &mut A,
        recorder: &mut dyn Recorder,
        evaluator: &mut D,
    ) -> Result<()>
    where
        E: Env,
        A: Agent + ?Sized,
        D: Evaluator<A>,
    {
        if runner.n_envs() != self.config.num_processes {
            return Err(StrataError::InvalidConfig(format!(
                "runner has {} environments, num_processes is {}",
                runner.n_envs(),
                self.config.num_processes
            ))
            .into());
        }
        if self.config.save_interval > 0 || self.config.eval_interval > 0 {
            self.model_dir()?;
        }

        let n_iterations = self.config.n_iterations();
        let steps_per_iter = self.config.rollout_steps * self.config.num_processes;
        let mut max_eval_return = f32::MIN;
        let mut env_steps: usize = 0;
        let mut opt_steps: usize = 0;
        info!("Starts training for {} iterations", n_iterations);
        agent.train();

        for iter in 1..=n_iterations {
            let timer = SystemTime::now();
            let (mut record, n_opts) = self
                .optimize(runner, agent)
                .with_context(|| format!("Training failed at iteration {}", iter))?;
            env_steps += steps_per_iter;
            opt_steps += n_opts;

            let secs = timer.elapsed()?.as_secs_f32();
            record.insert("iteration", Scalar(iter as f32));
            record.insert("env_steps", Scalar(env_steps as f32));
            record.insert("opt_steps", Scalar(opt_steps as f32));
            if secs > 0.0 {
                record.insert("fps", Scalar(steps_per_iter as f32 / secs));
            }

            // Evaluation
            if self.config.eval_interval > 0 && iter % self.config.eval_interval == 0 {
                agent.eval();
                let eval_record = evaluator.evaluate(&*agent);
                agent.train();
                let eval_record = eval_record
                    .with_context(|| format!("Evaluation failed at iteration {}", iter))?;
                let eval_return = eval_record.get_scalar("eval_avg_return")?;
                record.merge_inplace(eval_record);

                // Save the best model up to the current iteration
                if eval_return > max_eval_return {
                    max_eval_return = eval_return;
                    Self::save_model(&*agent, &self.model_dir()?.join("best"))?;
                }
            }

            // Save the current model
            if self.config.save_interval > 0 && iter % self.config.save_interval == 0 {
                Self::save_model(&*agent, &self.model_dir()?.join(iter.to_string()))?;
            }

            info!(
                "Iteration {}/{}: env_steps {}, actor_loss {:.4}, critic_loss {:.4}, entropy {:.4}",
                iter,
                n_iterations,
                env_steps,
                record.get_scalar("actor_loss")?,
                record.get_scalar("critic_loss")?,
                record.get_scalar("entropy")?,
            );
            recorder.write(record);
        }

        recorder.flush()?;
        info!("Finished training: {} env steps, {} opt steps", env_steps, opt_steps);

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        record::BufferedRecorder,
        test_util::{CountingEnv, CountingEnvConfig, MockAgent},
        DefaultEvaluator, TrainingState,
    };
    use tempdir::TempDir;

    fn env_config() -> CountingEnvConfig {
        CountingEnvConfig::default().episode_len(4)
    }

    #[test]
    fn test_minibatch_schedule() -> Result<()> {
        let config = TrainerConfig::default()
            .num_total_steps(50)
            .rollout_steps(5)
            .num_processes(2)
            .batch_size(4)
            .ppo_epochs(3);
        let mut trainer = Trainer::build(config)?;
        let mut runner = VecRunner::<CountingEnv>::build(&env_config(), 2, 0)?;
        let mut agent = MockAgent::new(1, 0.0);
        let mut recorder = BufferedRecorder::new();
        let mut evaluator = DefaultEvaluator::<CountingEnv>::new(&env_config(), 0, 1)?;

        trainer.train(&mut runner, &mut agent, &mut recorder, &mut evaluator)?;

        // 5 iterations, 3 epochs each, 10 rows split into 4 + 4 + 2
        assert_eq!(agent.minibatch_sizes.len(), 5 * 3 * 3);
        assert_eq!(&agent.minibatch_sizes[..3], &[4, 4, 2]);
        assert_eq!(agent.state(), TrainingState::Trained(45));
        assert_eq!(recorder.len(), 5);

        // Old log-probabilities are collected once per iteration, before its
        // 9 optimization steps, and reused in every epoch
        assert_eq!(agent.n_evaluate_calls.get(), 5);
        assert_eq!(agent.old_log_probs.len(), 5 * 3 * 10);
        for &(k, lp) in agent.old_log_probs.iter() {
            assert_eq!(lp, -(((k - 1) * 9) as f32));
        }

        let last = recorder.iter().last().unwrap();
        assert_eq!(last.get_scalar("env_steps")?, 50.0);
        assert_eq!(last.get_scalar("opt_steps")?, 45.0);
        assert!(last.get_scalar("rollout_avg_return").is_ok());
        assert!(last.get_scalar("eval_avg_return").is_err());

        Ok(())
    }

    #[test]
    fn test_eval_and_save() -> Result<()> {
        let dir = TempDir::new("trainer")?;
        let model_dir = dir.path().to_str().unwrap().to_string();
        let config = TrainerConfig::default()
            .num_total_steps(40)
            .rollout_steps(10)
            .num_processes(1)
            .batch_size(10)
            .ppo_epochs(1)
            .eval_interval(2)
            .save_interval(3)
            .model_dir(model_dir);
        let mut trainer = Trainer::build(config)?;
        let mut runner = VecRunner::<CountingEnv>::build(&env_config(), 1, 0)?;
        let mut agent = MockAgent::new(1, 0.0);
        let mut recorder = BufferedRecorder::new();
        let mut evaluator = DefaultEvaluator::<CountingEnv>::new(&env_config(), 0, 2)?;

        trainer.train(&mut runner, &mut agent, &mut recorder, &mut evaluator)?;

        assert!(agent.is_train());
        assert!(dir.path().join("best").join("state.yaml").exists());
        assert!(dir.path().join("3").join("state.yaml").exists());
        assert!(!dir.path().join("2").exists());

        let records: Vec<_> = recorder.iter().collect();
        assert_eq!(records[1].get_scalar("eval_avg_return")?, 4.0);
        assert!(records[0].get_scalar("eval_avg_return").is_err());

        Ok(())
    }

    #[test]
    fn test_error_carries_iteration() -> Result<()> {
        let env_config = env_config().fail(0, 12);
        let config = TrainerConfig::default()
            .num_total_steps(100)
            .rollout_steps(5);
        let mut trainer = Trainer::build(config)?;
        let mut runner = VecRunner::<CountingEnv>::build(&env_config, 1, 0)?;
        let mut agent = MockAgent::new(1, 0.0);
        let mut recorder = BufferedRecorder::new();
        let mut evaluator = DefaultEvaluator::<CountingEnv>::new(&env_config, 99, 1)?;

        let err = trainer
            .train(&mut runner, &mut agent, &mut recorder, &mut evaluator)
            .unwrap_err();

        assert!(format!("{}", err).contains("iteration 3"));
        assert!(matches!(
            err.downcast_ref::<StrataError>(),
            Some(StrataError::Runner { env_ix: 0, step: 2 })
        ));
        assert_eq!(recorder.len(), 2);

        Ok(())
    }

    #[test]
    fn test_invalid_config() {
        assert!(Trainer::build(TrainerConfig::default().batch_size(0)).is_err());
    }
}
