//! Hyperparameters of a run.
use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use strata_core::{error::StrataError, TrainerConfig};
use strata_tch_agent::{
    ppo::{ActorCriticConfig, PpoConfig},
    OptimizerConfig,
};

/// Flat set of hyperparameters of a PPO run.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct HParams {
    /// Learning rate of Adam.
    pub learning_rate: f64,

    /// Discount factor.
    pub gamma: f64,

    /// GAE parameter.
    pub lambda: f64,

    /// Weight of the critic loss.
    pub alpha: f64,

    /// Weight of the entropy bonus.
    pub beta: f64,

    /// Clipping range of the probability ratio.
    pub clip_ratio: f64,

    /// Bound of gradient elements.
    pub max_grad_norm: f64,

    /// Rollout horizon.
    pub rollout_steps: usize,

    /// The number of environments.
    pub num_processes: usize,

    /// Total environment steps.
    pub num_total_steps: usize,

    /// Minibatch size.
    pub batch_size: usize,

    /// Epochs per rollout.
    pub ppo_epochs: usize,

    /// Units of hidden layers.
    pub hidden_units: Vec<i64>,

    /// Episodes per evaluation.
    pub num_eval: usize,

    /// Interval of evaluation in iterations.
    pub eval_interval: usize,

    /// Interval of saving in iterations.
    pub save_interval: usize,

    /// Random seed.
    pub seed: u64,
}

impl Default for HParams {
    /// Defaults of the PPO learner.
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            gamma: 0.99,
            lambda: 0.01,
            alpha: 0.5,
            beta: 1.0,
            clip_ratio: 0.2,
            max_grad_norm: 1.0,
            rollout_steps: 20,
            num_processes: 1,
            num_total_steps: 100_000,
            batch_size: 64,
            ppo_epochs: 4,
            hidden_units: vec![256],
            num_eval: 10,
            eval_interval: 100,
            save_interval: 0,
            seed: 42,
        }
    }
}

impl HParams {
    /// Hyperparameters tuned for the pendulum.
    pub fn ppo_pendulum() -> Self {
        Self {
            learning_rate: 3e-4,
            gamma: 0.99,
            lambda: 0.95,
            alpha: 0.5,
            beta: 1e-3,
            clip_ratio: 0.2,
            max_grad_norm: 1.0,
            rollout_steps: 20,
            num_processes: 16,
            num_total_steps: 5_000_000,
            batch_size: 64,
            ppo_epochs: 4,
            ..Default::default()
        }
    }

    /// Overrides the values with those in a YAML mapping.
    ///
    /// Keys absent from the mapping keep their values, unknown keys are an error.
    pub fn override_with(self, yaml: &str) -> Result<Self> {
        let mut base = match serde_yaml::to_value(&self)? {
            serde_yaml::Value::Mapping(m) => m,
            _ => {
                return Err(
                    StrataError::InvalidConfig("hyperparameters are not a mapping".into()).into(),
                )
            }
        };
        let overrides: serde_yaml::Mapping = serde_yaml::from_str(yaml)?;
        for (k, v) in overrides {
            if !base.contains_key(&k) {
                return Err(
                    StrataError::InvalidConfig(format!("unknown hyperparameter {:?}", k)).into(),
                );
            }
            base.insert(k, v);
        }
        Ok(serde_yaml::from_value(serde_yaml::Value::Mapping(base))?)
    }

    /// Overrides the values with those in a YAML file.
    pub fn override_with_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read hyperparameters from {:?}", path))?;
        let hparams = self.override_with(&yaml)?;
        info!("Override hyperparameters with {:?}", path);
        Ok(hparams)
    }

    /// Configuration of the trainer.
    pub fn trainer_config(&self, model_dir: &str) -> TrainerConfig {
        TrainerConfig::default()
            .num_total_steps(self.num_total_steps)
            .rollout_steps(self.rollout_steps)
            .num_processes(self.num_processes)
            .batch_size(self.batch_size)
            .ppo_epochs(self.ppo_epochs)
            .gamma(self.gamma as f32)
            .lambda(self.lambda as f32)
            .eval_interval(self.eval_interval)
            .save_interval(self.save_interval)
            .model_dir(model_dir)
            .seed(self.seed)
    }

    /// Configuration of the agent.
    pub fn ppo_config(&self, obs_dim: usize, act_dim: usize, device: tch::Device) -> PpoConfig {
        let ac_config = ActorCriticConfig::default()
            .dims(obs_dim as i64, act_dim as i64)
            .hidden_units(self.hidden_units.clone());
        PpoConfig::default()
            .actor_critic_config(ac_config)
            .opt_config(OptimizerConfig::default().learning_rate(self.learning_rate))
            .alpha(self.alpha)
            .beta(self.beta)
            .clip_ratio(self.clip_ratio)
            .max_grad_norm(self.max_grad_norm)
            .seed(self.seed as i64)
            .device(device)
    }

    /// Constructs [`HParams`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`HParams`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_override() -> Result<()> {
        let hparams = HParams::ppo_pendulum().override_with("batch_size: 32\nbeta: 0.01\n")?;
        assert_eq!(hparams.batch_size, 32);
        assert_eq!(hparams.beta, 0.01);
        assert_eq!(hparams.num_processes, 16);

        assert!(HParams::default().override_with("batchsize: 32\n").is_err());
        assert!(HParams::default().override_with("batch_size: many\n").is_err());
        Ok(())
    }

    #[test]
    fn test_serde_hparams() -> Result<()> {
        let dir = TempDir::new("hparams")?;
        let path = dir.path().join("hparams.yaml");
        let hparams = HParams::ppo_pendulum();
        hparams.save(&path)?;
        assert_eq!(HParams::load(&path)?, hparams);
        Ok(())
    }

    #[test]
    fn test_trainer_config() {
        let config = HParams::ppo_pendulum().trainer_config("model");
        assert_eq!(config.num_processes, 16);
        assert_eq!(config.lambda, 0.95);
        assert_eq!(config.n_iterations(), 15_625);
        assert_eq!(config.model_dir.as_deref(), Some("model"));
    }
}
