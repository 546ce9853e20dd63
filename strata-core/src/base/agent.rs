//! Agent.
use crate::{
    record::{Record, RecordValue},
    Batch, RolloutTargets,
};
use anyhow::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lifecycle of the parameters of an [`Agent`].
///
/// An agent starts [`Untrained`](TrainingState::Untrained) and moves to
/// `Trained(k)` after its `k`-th successful call of [`Agent::optimize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TrainingState {
    /// No optimization step has been done.
    Untrained,

    /// The number of optimization steps done so far.
    Trained(usize),
}

impl TrainingState {
    /// The number of optimization steps.
    pub fn n_opts(&self) -> usize {
        match self {
            Self::Untrained => 0,
            Self::Trained(k) => *k,
        }
    }

    /// The state after one more optimization step.
    pub fn next(&self) -> Self {
        Self::Trained(self.n_opts() + 1)
    }
}

impl Default for TrainingState {
    fn default() -> Self {
        Self::Untrained
    }
}

/// Output of [`Agent::evaluate`], one element per row of the inputs.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// State values.
    pub values: Array1<f32>,

    /// Log-probabilities of the given actions.
    pub log_probs: Array1<f32>,

    /// Entropies of the action distributions.
    pub entropy: Array1<f32>,
}

/// Loss components of a single optimization step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Losses {
    /// Negated mean of the clipped surrogate objective.
    pub actor_loss: f32,

    /// Mean squared error of the value estimates against returns.
    pub critic_loss: f32,

    /// Mean entropy of the action distributions.
    pub entropy: f32,
}

impl Losses {
    /// Converts the losses into a [`Record`].
    pub fn into_record(self) -> Record {
        Record::from_slice(&[
            ("actor_loss", RecordValue::Scalar(self.actor_loss)),
            ("critic_loss", RecordValue::Scalar(self.critic_loss)),
            ("entropy", RecordValue::Scalar(self.entropy)),
        ])
    }
}

/// Represents a trainable policy/value function.
///
/// Observations and actions are passed as batches, one row per environment
/// or per transition. Only [`Agent::optimize`] and [`Agent::load_params`]
/// change the parameters of the agent.
pub trait Agent {
    /// Samples actions for a batch of observations.
    ///
    /// In training mode actions are drawn from the policy distribution,
    /// in evaluation mode the most probable action is returned.
    fn act(&self, obs: &Array2<f32>) -> Result<Array2<f32>>;

    /// Value estimates for a batch of observations.
    fn value(&self, obs: &Array2<f32>) -> Result<Array1<f32>>;

    /// Recomputes values, log-probabilities of the given actions and entropies
    /// under the current parameters.
    fn evaluate(&self, obs: &Array2<f32>, act: &Array2<f32>) -> Result<Evaluation>;

    /// Performs a single gradient step on a minibatch.
    ///
    /// `targets` must be the rows of the rollout targets matching `batch`.
    fn optimize(&mut self, batch: &Batch, targets: &RolloutTargets) -> Result<Losses>;

    /// Names of the trainable models of the agent.
    fn models(&self) -> Vec<String>;

    /// Returns the lifecycle state of the parameters.
    fn state(&self) -> TrainingState;

    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Save the parameters of the agent in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;

    /// Resets internals of the agent which are not parameters.
    fn reset(&mut self) {}
}
