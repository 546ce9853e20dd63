//! Interface of neural network modules.
use tch::nn;

/// Neural network module built under a path of a shared [`VarStore`].
///
/// Modules of an agent share a single [`VarStore`], so that the parameters of
/// the agent are saved, loaded and optimized together. Each module is built
/// under its own sub-path, which prefixes the names of its variables.
///
/// [`VarStore`]: https://docs.rs/tch/0.16.0/tch/nn/struct.VarStore.html
pub trait SubModel {
    /// Configuration from which [`SubModel`] is constructed.
    type Config;

    /// Input of the [`SubModel`].
    type Input;

    /// Output of the [`SubModel`].
    type Output;

    /// Builds [`SubModel`] with variables under `p`.
    fn build(p: &nn::Path, config: Self::Config) -> Self;

    /// A generalized forward function.
    fn forward(&self, input: &Self::Input) -> Self::Output;
}
