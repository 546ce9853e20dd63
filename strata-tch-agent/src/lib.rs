//! PPO agent implemented with [tch](https://crates.io/crates/tch).
//!
//! [`ppo::Ppo`] implements [`strata_core::Agent`] for continuous action spaces.
mod mlp;
mod model;
mod opt;
pub mod ppo;
mod util;
pub use mlp::{Mlp, MlpConfig};
pub use model::SubModel;
pub use opt::{Optimizer, OptimizerConfig};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using tch.
///
/// This enum is added because [`tch::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl From<tch::Device> for Device {
    fn from(device: tch::Device) -> Self {
        match device {
            tch::Device::Cuda(n) => Self::Cuda(n),
            _ => Self::Cpu,
        }
    }
}

impl From<Device> for tch::Device {
    fn from(device: Device) -> Self {
        match device {
            Device::Cpu => tch::Device::Cpu,
            Device::Cuda(n) => tch::Device::Cuda(n),
        }
    }
}
