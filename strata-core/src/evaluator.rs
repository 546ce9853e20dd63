//! Evaluate [`Agent`].
use crate::{record::Record, Agent};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Evaluate [`Agent`].
pub trait Evaluator<A: Agent + ?Sized> {
    /// Evaluate [`Agent`].
    ///
    /// The caller of this method needs to handle the internal state of `agent`,
    /// like training/evaluation mode.
    fn evaluate(&mut self, agent: &A) -> Result<Record>;
}
