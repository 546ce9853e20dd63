//! Inverted pendulum swing-up.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use strata_core::{
    error::StrataError,
    record::{Record, RecordValue},
    Env, Step,
};

/// Environment id accepted by [`Pendulum`].
pub const PENDULUM_ENV_ID: &str = "Pendulum-v0";

/// Configuration of [`Pendulum`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PendulumConfig {
    /// Environment id, must be [`PENDULUM_ENV_ID`].
    pub env_id: String,

    /// Episodes are truncated after this number of steps.
    pub max_episode_steps: usize,

    /// Bound of the angular velocity.
    pub max_speed: f32,

    /// Bound of the torque.
    pub max_torque: f32,

    /// Time step.
    pub dt: f32,

    /// Gravity.
    pub g: f32,

    /// Mass.
    pub m: f32,

    /// Length.
    pub l: f32,
}

impl Default for PendulumConfig {
    fn default() -> Self {
        Self {
            env_id: PENDULUM_ENV_ID.to_string(),
            max_episode_steps: 200,
            max_speed: 8.0,
            max_torque: 2.0,
            dt: 0.05,
            g: 10.0,
            m: 1.0,
            l: 1.0,
        }
    }
}

impl PendulumConfig {
    /// Configuration of the environment with the given id.
    pub fn new(env_id: impl Into<String>) -> Self {
        Self {
            env_id: env_id.into(),
            ..Default::default()
        }
    }

    /// Sets the time limit of episodes.
    pub fn max_episode_steps(mut self, v: usize) -> Self {
        self.max_episode_steps = v;
        self
    }
}

/// Inverted pendulum swing-up.
///
/// Observation is `[cos(theta), sin(theta), theta_dot]`, action is a torque in
/// `[-max_torque, max_torque]` (clipped). The reward is
/// `-(theta^2 + 0.1 * theta_dot^2 + 0.001 * torque^2)` with `theta` normalized to
/// `[-pi, pi)`. Episodes never terminate, they are truncated at
/// `max_episode_steps`.
pub struct Pendulum {
    config: PendulumConfig,
    rng: fastrand::Rng,
    theta: f32,
    theta_dot: f32,
    n_steps: usize,
}

fn angle_normalize(x: f32) -> f32 {
    (x + PI).rem_euclid(2.0 * PI) - PI
}

impl Pendulum {
    fn obs(&self) -> Vec<f32> {
        vec![self.theta.cos(), self.theta.sin(), self.theta_dot]
    }

    /// Starts an episode from an angle in `[-pi, pi)` and a velocity in `[-1, 1)`,
    /// given two uniform samples in `[0, 1)`.
    fn start(&mut self, u1: f32, u2: f32) -> Vec<f32> {
        self.theta = (u1 * 2.0 - 1.0) * PI;
        self.theta_dot = u2 * 2.0 - 1.0;
        self.n_steps = 0;
        self.obs()
    }
}

impl Env for Pendulum {
    type Config = PendulumConfig;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        if config.env_id != PENDULUM_ENV_ID {
            return Err(StrataError::InvalidConfig(format!(
                "Pendulum does not implement environment {}",
                config.env_id
            ))
            .into());
        }
        Ok(Self {
            config: config.clone(),
            rng: fastrand::Rng::with_seed(seed as u64),
            theta: 0.0,
            theta_dot: 0.0,
            n_steps: 0,
        })
    }

    fn obs_dim(&self) -> usize {
        3
    }

    fn act_dim(&self) -> usize {
        1
    }

    fn reset(&mut self) -> Result<Vec<f32>> {
        let (u1, u2) = (self.rng.f32(), self.rng.f32());
        Ok(self.start(u1, u2))
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Vec<f32>> {
        let rng = fastrand::Rng::with_seed(ix as u64);
        Ok(self.start(rng.f32(), rng.f32()))
    }

    fn step(&mut self, act: &[f32]) -> Result<(Step, Record)> {
        let c = &self.config;
        let u = act
            .first()
            .copied()
            .ok_or_else(|| StrataError::ShapeMismatch("empty action".to_string()))?
            .clamp(-c.max_torque, c.max_torque);
        let th = self.theta;
        let thdot = self.theta_dot;

        let cost = angle_normalize(th).powi(2) + 0.1 * thdot.powi(2) + 0.001 * u.powi(2);
        let new_thdot = (thdot
            + (3.0 * c.g / (2.0 * c.l) * th.sin() + 3.0 / (c.m * c.l * c.l) * u) * c.dt)
            .clamp(-c.max_speed, c.max_speed);
        self.theta = th + new_thdot * c.dt;
        self.theta_dot = new_thdot;
        self.n_steps += 1;

        let is_truncated = self.n_steps >= c.max_episode_steps;
        let info = Record::from_slice(&[("torque", RecordValue::Scalar(u))]);

        Ok((Step::new(self.obs(), -cost, false, is_truncated), info))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_time_limit() -> Result<()> {
        let mut env = Pendulum::build(&PendulumConfig::default(), 0)?;
        env.reset()?;
        for t in 1..=200 {
            let (step, _) = env.step(&[0.5])?;
            assert!(!step.is_terminated);
            assert_eq!(step.is_truncated, t == 200);
            assert!(step.reward <= 0.0);
            assert_eq!(step.obs.len(), 3);
        }
        Ok(())
    }

    #[test]
    fn test_torque_is_clipped() -> Result<()> {
        let mut env = Pendulum::build(&PendulumConfig::default(), 0)?;
        env.reset_with_index(3)?;
        let (_, info) = env.step(&[10.0])?;
        assert_eq!(info.get_scalar("torque")?, 2.0);
        Ok(())
    }

    #[test]
    fn test_reset_with_index_is_deterministic() -> Result<()> {
        let mut env1 = Pendulum::build(&PendulumConfig::default(), 0)?;
        let mut env2 = Pendulum::build(&PendulumConfig::default(), 1)?;
        assert_eq!(env1.reset_with_index(5)?, env2.reset_with_index(5)?);
        assert_ne!(env1.reset()?, env2.reset()?);
        Ok(())
    }

    #[test]
    fn test_upright_at_rest_has_no_cost() -> Result<()> {
        let mut env = Pendulum::build(&PendulumConfig::default(), 0)?;
        env.reset()?;
        env.theta = 0.0;
        env.theta_dot = 0.0;
        let (step, _) = env.step(&[0.0])?;
        assert_eq!(step.reward, 0.0);
        assert_eq!(step.obs, vec![1.0, 0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_unknown_env_id() {
        assert!(Pendulum::build(&PendulumConfig::new("CartPole-v1"), 0).is_err());
    }
}
