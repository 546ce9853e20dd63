//! Environment.
use super::Step;
use crate::record::Record;
use anyhow::Result;

/// Represents an environment, typically an MDP.
///
/// Observations and actions are flat `f32` vectors of fixed widths
/// [`Env::obs_dim`] and [`Env::act_dim`].
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Width of observation vectors.
    fn obs_dim(&self) -> usize;

    /// Width of action vectors.
    fn act_dim(&self) -> usize;

    /// Starts a new episode and returns its initial observation.
    fn reset(&mut self) -> Result<Vec<f32>>;

    /// Resets the environment with a given index.
    ///
    /// The index is used in an arbitrary way. For example, it can be used as a random seed,
    /// which makes evaluation runs of a trained agent reproducible. This method is called
    /// in [`DefaultEvaluator`].
    ///
    /// [`DefaultEvaluator`]: crate::DefaultEvaluator
    fn reset_with_index(&mut self, ix: usize) -> Result<Vec<f32>>;

    /// Performes an environment step.
    ///
    /// The returned [`Record`] carries environment specific information.
    fn step(&mut self, act: &[f32]) -> Result<(Step, Record)>;

    /// Releases resources held by the environment.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
