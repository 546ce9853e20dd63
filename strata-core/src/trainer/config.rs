//! Configuration of [`Trainer`](super::Trainer).
use crate::GaeConfig;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// Total number of environment steps of the run.
    pub num_total_steps: usize,

    /// Length of the trajectories collected in each iteration.
    pub rollout_steps: usize,

    /// The number of environments stepped in parallel.
    pub num_processes: usize,

    /// Size of minibatches.
    pub batch_size: usize,

    /// The number of passes over a rollout.
    pub ppo_epochs: usize,

    /// Discount factor.
    pub gamma: f32,

    /// GAE parameter.
    pub lambda: f32,

    /// Interval of evaluation in iterations, 0 disables evaluation.
    pub eval_interval: usize,

    /// Interval of saving the model in iterations, 0 disables saving.
    pub save_interval: usize,

    /// Where to save the trained model.
    pub model_dir: Option<String>,

    /// Seed of minibatch shuffling.
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            num_total_steps: 0,
            rollout_steps: 20,
            num_processes: 1,
            batch_size: 64,
            ppo_epochs: 4,
            gamma: 0.99,
            lambda: 0.95,
            eval_interval: 0,
            save_interval: 0,
            model_dir: None,
            seed: 42,
        }
    }
}

impl TrainerConfig {
    /// Sets the total number of environment steps.
    pub fn num_total_steps(mut self, v: usize) -> Self {
        self.num_total_steps = v;
        self
    }

    /// Sets the rollout horizon.
    pub fn rollout_steps(mut self, v: usize) -> Self {
        self.rollout_steps = v;
        self
    }

    /// Sets the number of environments.
    pub fn num_processes(mut self, v: usize) -> Self {
        self.num_processes = v;
        self
    }

    /// Sets the minibatch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the number of epochs per rollout.
    pub fn ppo_epochs(mut self, v: usize) -> Self {
        self.ppo_epochs = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the GAE parameter.
    pub fn lambda(mut self, v: f32) -> Self {
        self.lambda = v;
        self
    }

    /// Sets the interval of evaluation in iterations.
    pub fn eval_interval(mut self, v: usize) -> Self {
        self.eval_interval = v;
        self
    }

    /// Sets the interval of saving in iterations.
    pub fn save_interval(mut self, v: usize) -> Self {
        self.save_interval = v;
        self
    }

    /// Sets the directory the trained model being saved.
    pub fn model_dir<T: Into<String>>(mut self, model_dir: T) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Sets the seed of minibatch shuffling.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Parameters of advantage estimation.
    pub fn gae_config(&self) -> GaeConfig {
        GaeConfig {
            gamma: self.gamma,
            lambda: self.lambda,
        }
    }

    /// The number of iterations needed to consume `num_total_steps` environment steps.
    pub fn n_iterations(&self) -> usize {
        let per_iter = self.rollout_steps * self.num_processes;
        if per_iter == 0 {
            return 0;
        }
        (self.num_total_steps + per_iter - 1) / per_iter
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
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
    fn test_serde_trainer_config() -> Result<()> {
        let config = TrainerConfig::default()
            .num_total_steps(1000)
            .rollout_steps(10)
            .num_processes(4)
            .eval_interval(5)
            .model_dir("some/directory");

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");
        println!("{:?}", path);

        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_n_iterations_rounds_up() {
        let config = TrainerConfig::default()
            .num_total_steps(100)
            .rollout_steps(5)
            .num_processes(3);
        assert_eq!(config.n_iterations(), 7);
        assert_eq!(config.num_total_steps(105).n_iterations(), 7);
    }
}
