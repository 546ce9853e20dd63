//! Vectorized environment runner.
use super::{Trajectory, Transition};
use crate::{error::StrataError, Agent, Env};
use anyhow::{Context, Result};
use log::{debug, trace};
use ndarray::Array2;

/// Steps a fixed set of environments and collects fixed-horizon trajectories.
///
/// Environments are reset lazily on the first call of [`VecRunner::rollout`].
/// Unfinished episodes continue over consecutive rollouts; an environment whose
/// step ends an episode is reset on its own while the others keep running.
pub struct VecRunner<E: Env> {
    envs: Vec<E>,

    /// Current observation of every slot, `None` before the first rollout.
    obs: Option<Vec<Vec<f32>>>,

    /// Cumulative reward of the running episode of every slot.
    returns: Vec<f32>,
}

impl<E: Env> VecRunner<E> {
    /// Builds `n_envs` environments, the `i`-th with seed `seed + i`.
    pub fn build(config: &E::Config, n_envs: usize, seed: i64) -> Result<Self> {
        if n_envs == 0 {
            return Err(StrataError::InvalidConfig("n_envs must be positive".to_string()).into());
        }
        let envs = (0..n_envs)
            .map(|i| E::build(config, seed + i as i64))
            .collect::<Result<Vec<_>>>()?;
        debug!("Built {} environments from seed {}", n_envs, seed);

        Ok(Self {
            envs,
            obs: None,
            returns: vec![0.0; n_envs],
        })
    }

    /// The number of environment slots.
    pub fn n_envs(&self) -> usize {
        self.envs.len()
    }

    /// Width of observations.
    pub fn obs_dim(&self) -> usize {
        self.envs[0].obs_dim()
    }

    /// Width of actions.
    pub fn act_dim(&self) -> usize {
        self.envs[0].act_dim()
    }

    fn reset_all(&mut self) -> Result<Vec<Vec<f32>>> {
        self.returns.iter_mut().for_each(|r| *r = 0.0);
        self.envs
            .iter_mut()
            .enumerate()
            .map(|(i, env)| {
                env.reset()
                    .with_context(|| StrataError::Runner { env_ix: i, step: 0 })
            })
            .collect()
    }

    /// Collects `horizon` transitions from every environment.
    ///
    /// Returns one trajectory per slot, in slot order. Any environment error
    /// aborts the rollout and is returned with [`StrataError::Runner`] attached;
    /// the next rollout then starts from freshly reset environments.
    pub fn rollout<A: Agent + ?Sized>(
        &mut self,
        agent: &A,
        horizon: usize,
    ) -> Result<Vec<Trajectory>> {
        if horizon == 0 {
            return Err(StrataError::InvalidConfig("horizon must be positive".to_string()).into());
        }
        let mut obs = match self.obs.take() {
            Some(obs) => obs,
            None => self.reset_all()?,
        };
        let n_envs = self.envs.len();
        let obs_dim = self.obs_dim();
        let act_dim = self.act_dim();
        let mut trajectories: Vec<_> = (0..n_envs).map(Trajectory::new).collect();

        for t in 0..horizon {
            let obs_batch = stack(&obs, obs_dim)?;
            let act = agent.act(&obs_batch)?;
            if act.dim() != (n_envs, act_dim) {
                return Err(StrataError::ShapeMismatch(format!(
                    "agent returned actions of shape {:?}, expected ({}, {})",
                    act.dim(),
                    n_envs,
                    act_dim
                ))
                .into());
            }

            for (i, env) in self.envs.iter_mut().enumerate() {
                let a = act.row(i).to_vec();
                let (step, _) = env
                    .step(&a)
                    .with_context(|| StrataError::Runner { env_ix: i, step: t })?;
                self.returns[i] += step.reward;
                let is_done = step.is_done();
                let next_obs = if is_done {
                    trace!("Episode of env {} ended with return {}", i, self.returns[i]);
                    trajectories[i].push_episode_return(self.returns[i]);
                    self.returns[i] = 0.0;
                    env.reset()
                        .with_context(|| StrataError::Runner { env_ix: i, step: t })?
                } else {
                    step.obs.clone()
                };
                let prev_obs = std::mem::replace(&mut obs[i], next_obs);
                trajectories[i].push(Transition::new(prev_obs, a, step.reward, step.obs, is_done));
            }
        }

        self.obs = Some(obs);
        debug!("Collected {} steps from {} environments", horizon, n_envs);

        Ok(trajectories)
    }

    /// Closes all environments.
    pub fn close(mut self) -> Result<()> {
        for env in self.envs.iter_mut() {
            env.close()?;
        }
        Ok(())
    }
}

fn stack(obs: &[Vec<f32>], obs_dim: usize) -> Result<Array2<f32>> {
    if let Some((i, o)) = obs.iter().enumerate().find(|(_, o)| o.len() != obs_dim) {
        return Err(StrataError::ShapeMismatch(format!(
            "observation of env {} has width {}, expected {}",
            i,
            o.len(),
            obs_dim
        ))
        .into());
    }
    Ok(Array2::from_shape_vec((obs.len(), obs_dim), obs.concat())?)
}
