//! Proximal policy optimization in Rust.
//!
//! Strata consists of the following crates:
//!
//! * [strata-core](../strata_core/index.html) defines the environment and agent
//!   traits, the vectorized runner, generalized advantage estimation and the
//!   on-policy training loop. It does not depend on a deep learning backend.
//! * [strata-tch-agent](../strata_tch_agent/index.html) implements the PPO agent
//!   with [tch](https://crates.io/crates/tch).
//! * This crate registers problems and hyperparameter sets, includes a pendulum
//!   environment and a CSV recorder, and provides the `strata` binary.
//!
//! ```ignore
//! use strata::{experiment, record::CsvRecorder, registry::Registry};
//!
//! let registry = Registry::with_defaults();
//! let problem = registry.problem("ppo-pendulum-v0")?;
//! let hparams = registry.hparams(&problem.hparam_set)?;
//! let mut recorder = CsvRecorder::new("model/train.csv")?;
//! experiment::train(problem, &hparams, "model", &mut recorder, tch::Device::Cpu)?;
//! ```
pub mod env;
pub mod experiment;
pub mod hparams;
pub mod record;
pub mod registry;

pub use hparams::HParams;
pub use registry::{Problem, Registry};
