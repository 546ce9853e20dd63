//! Environments and agents used in tests.
use crate::{
    record::Record, Agent, Batch, Env, Evaluation, Losses, RolloutTargets, Step, TrainingState,
};
use anyhow::{bail, Result};
use ndarray::{Array1, Array2};
use std::{cell::Cell, fs, path::Path};

#[derive(Clone, Debug)]
pub struct CountingEnvConfig {
    pub episode_len: usize,

    /// `(seed, n)`: the environment built with `seed` fails on its `n`-th step call (0-based).
    pub fail: Option<(i64, usize)>,
}

impl Default for CountingEnvConfig {
    fn default() -> Self {
        Self {
            episode_len: 5,
            fail: None,
        }
    }
}

impl CountingEnvConfig {
    pub fn episode_len(mut self, v: usize) -> Self {
        self.episode_len = v;
        self
    }

    pub fn fail(mut self, seed: i64, n: usize) -> Self {
        self.fail = Some((seed, n));
        self
    }
}

/// Observation is `[steps in the episode, seed]`, every step gives reward 1.
pub struct CountingEnv {
    config: CountingEnvConfig,
    seed: i64,
    count: usize,
    total_steps: usize,
}

impl CountingEnv {
    fn obs(&self) -> Vec<f32> {
        vec![self.count as f32, self.seed as f32]
    }
}

impl Env for CountingEnv {
    type Config = CountingEnvConfig;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            seed,
            count: 0,
            total_steps: 0,
        })
    }

    fn obs_dim(&self) -> usize {
        2
    }

    fn act_dim(&self) -> usize {
        1
    }

    fn reset(&mut self) -> Result<Vec<f32>> {
        self.count = 0;
        Ok(self.obs())
    }

    fn reset_with_index(&mut self, _ix: usize) -> Result<Vec<f32>> {
        self.reset()
    }

    fn step(&mut self, act: &[f32]) -> Result<(Step, Record)> {
        if self.config.fail == Some((self.seed, self.total_steps)) {
            bail!("simulator crashed");
        }
        self.total_steps += 1;
        self.count += 1;
        let is_terminated = self.count >= self.config.episode_len;
        let reward = 1.0 + act[0];
        Ok((Step::new(self.obs(), reward, is_terminated, false), Record::empty()))
    }
}

/// Agent with fixed outputs which remembers how it was called.
///
/// Actions are zeros, values are a constant, the log-probability of an action
/// row is minus the sum of its elements minus the number of optimization
/// steps done so far.
pub struct MockAgent {
    act_dim: usize,
    value: f32,
    state: TrainingState,
    is_train: bool,
    pub n_value_calls: Cell<usize>,
    pub n_evaluate_calls: Cell<usize>,
    pub minibatch_sizes: Vec<usize>,

    /// `(n_evaluate_calls, old_log_prob)` of every row given to `optimize`.
    pub old_log_probs: Vec<(usize, f32)>,
}

impl MockAgent {
    pub fn new(act_dim: usize, value: f32) -> Self {
        Self {
            act_dim,
            value,
            state: TrainingState::Untrained,
            is_train: true,
            n_value_calls: Cell::new(0),
            n_evaluate_calls: Cell::new(0),
            minibatch_sizes: Vec::new(),
            old_log_probs: Vec::new(),
        }
    }
}

impl Agent for MockAgent {
    fn act(&self, obs: &Array2<f32>) -> Result<Array2<f32>> {
        Ok(Array2::zeros((obs.nrows(), self.act_dim)))
    }

    fn value(&self, obs: &Array2<f32>) -> Result<Array1<f32>> {
        self.n_value_calls.set(self.n_value_calls.get() + 1);
        Ok(Array1::from_elem(obs.nrows(), self.value))
    }

    fn evaluate(&self, obs: &Array2<f32>, act: &Array2<f32>) -> Result<Evaluation> {
        self.n_evaluate_calls.set(self.n_evaluate_calls.get() + 1);
        let n_opts = self.state.n_opts() as f32;
        Ok(Evaluation {
            values: Array1::from_elem(obs.nrows(), self.value),
            log_probs: act.rows().into_iter().map(|r| -r.sum() - n_opts).collect(),
            entropy: Array1::zeros(obs.nrows()),
        })
    }

    fn optimize(&mut self, batch: &Batch, targets: &RolloutTargets) -> Result<Losses> {
        assert_eq!(batch.len(), targets.len());
        self.minibatch_sizes.push(batch.len());
        let k = self.n_evaluate_calls.get();
        self.old_log_probs.extend(targets.old_log_probs().iter().map(|&lp| (k, lp)));
        self.state = self.state.next();
        Ok(Losses {
            actor_loss: -targets.advantages().mean().unwrap_or(0.0),
            critic_loss: 0.0,
            entropy: 0.0,
        })
    }

    fn models(&self) -> Vec<String> {
        vec!["mock".to_string()]
    }

    fn state(&self) -> TrainingState {
        self.state
    }

    fn train(&mut self) {
        self.is_train = true;
    }

    fn eval(&mut self) {
        self.is_train = false;
    }

    fn is_train(&self) -> bool {
        self.is_train
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        fs::write(path.join("state.yaml"), serde_yaml::to_string(&self.state)?)?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.state = serde_yaml::from_str(&fs::read_to_string(path.join("state.yaml"))?)?;
        Ok(())
    }
}
