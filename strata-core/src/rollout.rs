//! Collection of fixed-horizon trajectories and their alignment into batches.
mod batch;
mod merger;
mod runner;
mod trajectory;
pub use batch::Batch;
pub use merger::merge;
pub use runner::VecRunner;
pub use trajectory::{Trajectory, Transition};
