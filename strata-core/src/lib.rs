#![warn(missing_docs)]
//! Core of strata, a library for on-policy reinforcement learning.
//!
//! This crate is independent of any deep learning backend. It defines
//! the environment and agent interfaces and the online rollout-and-learn loop:
//!
//! * [`VecRunner`] steps a set of environments and collects one [`Trajectory`]
//!   per environment.
//! * [`merge`] aligns the trajectories into a single [`Batch`].
//! * [`AdvantageEstimator`] derives [`RolloutTargets`] with generalized advantage
//!   estimation.
//! * [`Trainer`] repeats the cycle and feeds minibatches to [`Agent::optimize`].
pub mod error;
pub mod record;

mod base;
pub use base::{Agent, Env, Evaluation, Losses, Step, TrainingState};

mod rollout;
pub use rollout::{merge, Batch, Trajectory, Transition, VecRunner};

mod gae;
pub use gae::{gae, AdvantageEstimator, GaeConfig, RolloutTargets};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{Trainer, TrainerConfig};

#[cfg(test)]
pub(crate) mod test_util;
