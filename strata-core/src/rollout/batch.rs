//! Batch of transitions.
use crate::error::StrataError;
use anyhow::Result;
use ndarray::{Array1, Array2, Axis};
use std::ops::Range;

/// Transitions of all environment slots aligned row by row.
///
/// Row `i` of every field refers to the same transition. Rows
/// `k * horizon .. (k + 1) * horizon` hold the trajectory of environment `k`
/// in time order.
#[derive(Clone, Debug)]
pub struct Batch {
    obs: Array2<f32>,
    act: Array2<f32>,
    reward: Array1<f32>,
    next_obs: Array2<f32>,
    is_done: Vec<bool>,
    n_envs: usize,
    horizon: usize,
}

impl Batch {
    /// Constructs a batch, checking that every field has `n_envs * horizon` rows.
    pub fn new(
        obs: Array2<f32>,
        act: Array2<f32>,
        reward: Array1<f32>,
        next_obs: Array2<f32>,
        is_done: Vec<bool>,
        n_envs: usize,
        horizon: usize,
    ) -> Result<Self> {
        let n = n_envs * horizon;
        let rows = [
            ("obs", obs.nrows()),
            ("act", act.nrows()),
            ("reward", reward.len()),
            ("next_obs", next_obs.nrows()),
            ("is_done", is_done.len()),
        ];
        for (name, len) in rows.iter() {
            if *len != n {
                return Err(StrataError::ShapeMismatch(format!(
                    "{} has {} rows, expected {} ({} envs x {} steps)",
                    name, len, n, n_envs, horizon
                ))
                .into());
            }
        }
        if obs.ncols() != next_obs.ncols() {
            return Err(StrataError::ShapeMismatch(format!(
                "obs has width {} but next_obs has width {}",
                obs.ncols(),
                next_obs.ncols()
            ))
            .into());
        }

        Ok(Self {
            obs,
            act,
            reward,
            next_obs,
            is_done,
            n_envs,
            horizon,
        })
    }

    /// Returns a minibatch made of the given rows, in the given order.
    ///
    /// The minibatch is a single block: `n_envs() == 1` and `horizon() == ixs.len()`.
    pub fn select(&self, ixs: &[usize]) -> Self {
        Self {
            obs: self.obs.select(Axis(0), ixs),
            act: self.act.select(Axis(0), ixs),
            reward: self.reward.select(Axis(0), ixs),
            next_obs: self.next_obs.select(Axis(0), ixs),
            is_done: ixs.iter().map(|&i| self.is_done[i]).collect(),
            n_envs: 1,
            horizon: ixs.len(),
        }
    }

    /// Rows of environment `env_ix`.
    pub fn block(&self, env_ix: usize) -> Range<usize> {
        env_ix * self.horizon..(env_ix + 1) * self.horizon
    }

    /// Observations `o_t`.
    pub fn obs(&self) -> &Array2<f32> {
        &self.obs
    }

    /// Actions `a_t`.
    pub fn act(&self) -> &Array2<f32> {
        &self.act
    }

    /// Rewards `r_t`.
    pub fn reward(&self) -> &Array1<f32> {
        &self.reward
    }

    /// Observations `o_t+1`.
    pub fn next_obs(&self) -> &Array2<f32> {
        &self.next_obs
    }

    /// Episode end flags.
    pub fn is_done(&self) -> &[bool] {
        &self.is_done
    }

    /// The number of environment blocks.
    pub fn n_envs(&self) -> usize {
        self.n_envs
    }

    /// The length of every block.
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// The number of rows.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if there is no row.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }
}
