//! Core functionalities.
mod agent;
mod env;
mod step;
pub use agent::{Agent, Evaluation, Losses, TrainingState};
pub use env::Env;
pub use step::Step;
