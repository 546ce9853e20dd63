//! Environments.
mod pendulum;
pub use pendulum::{Pendulum, PendulumConfig, PENDULUM_ENV_ID};
