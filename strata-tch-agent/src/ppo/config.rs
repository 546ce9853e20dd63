//! Configuration of PPO agent.
use super::ActorCriticConfig;
use crate::{opt::OptimizerConfig, Device};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Constructs [`Ppo`](super::Ppo).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PpoConfig {
    pub(super) actor_critic_config: ActorCriticConfig,
    pub(super) opt_config: OptimizerConfig,
    pub(super) alpha: f64,
    pub(super) beta: f64,
    pub(super) clip_ratio: f64,
    pub(super) max_grad_norm: f64,
    pub(super) seed: Option<i64>,
    pub device: Option<Device>,
}

impl Default for PpoConfig {
    fn default() -> Self {
        Self {
            actor_critic_config: Default::default(),
            opt_config: OptimizerConfig::Adam { lr: 1e-3 },
            alpha: 0.5,
            beta: 1.0,
            clip_ratio: 0.2,
            max_grad_norm: 1.0,
            seed: None,
            device: None,
        }
    }
}

impl PpoConfig {
    /// Configuration of the actor-critic network.
    pub fn actor_critic_config(mut self, v: ActorCriticConfig) -> Self {
        self.actor_critic_config = v;
        self
    }

    /// Configuration of the optimizer.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Weight of the critic loss.
    pub fn alpha(mut self, v: f64) -> Self {
        self.alpha = v;
        self
    }

    /// Weight of the entropy bonus.
    pub fn beta(mut self, v: f64) -> Self {
        self.beta = v;
        self
    }

    /// Clipping range of the probability ratio.
    pub fn clip_ratio(mut self, v: f64) -> Self {
        self.clip_ratio = v;
        self
    }

    /// Bound of gradient elements.
    pub fn max_grad_norm(mut self, v: f64) -> Self {
        self.max_grad_norm = v;
        self
    }

    /// Random seed.
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Device.
    pub fn device(mut self, device: tch::Device) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Constructs [`PpoConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of PPO agent from {:?}", path_);
        Ok(b)
    }

    /// Saves [`PpoConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of PPO agent into {:?}", path_);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_ppo_config() -> Result<()> {
        let config = PpoConfig::default()
            .actor_critic_config(ActorCriticConfig::default().dims(3, 1).hidden_units(vec![64, 64]))
            .opt_config(OptimizerConfig::Adam { lr: 3e-4 })
            .beta(1e-3)
            .seed(42)
            .device(tch::Device::Cpu);

        let dir = TempDir::new("ppo_config")?;
        let path = dir.path().join("ppo_config.yaml");
        config.save(&path)?;
        let config_ = PpoConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
