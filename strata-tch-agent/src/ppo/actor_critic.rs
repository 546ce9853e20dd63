use crate::{Mlp, MlpConfig, SubModel};
use serde::{Deserialize, Serialize};
use tch::{nn, Tensor};

/// Configuration of [`ActorCritic`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ActorCriticConfig {
    /// Dimension of observations.
    pub obs_dim: i64,

    /// Dimension of actions.
    pub act_dim: i64,

    /// Units of the hidden layers of both networks.
    pub hidden_units: Vec<i64>,

    /// Initial value of the log standard deviation of the policy.
    pub init_log_std: f64,
}

impl Default for ActorCriticConfig {
    fn default() -> Self {
        Self {
            obs_dim: 0,
            act_dim: 0,
            hidden_units: vec![256],
            init_log_std: 0.0,
        }
    }
}

impl ActorCriticConfig {
    /// Sets the dimensions of observations and actions.
    pub fn dims(mut self, obs_dim: i64, act_dim: i64) -> Self {
        self.obs_dim = obs_dim;
        self.act_dim = act_dim;
        self
    }

    /// Sets the units of the hidden layers.
    pub fn hidden_units(mut self, v: Vec<i64>) -> Self {
        self.hidden_units = v;
        self
    }

    /// Sets the initial log standard deviation.
    pub fn init_log_std(mut self, v: f64) -> Self {
        self.init_log_std = v;
        self
    }
}

/// Value function and Gaussian policy.
///
/// `critic` and `actor` are independent MLPs over observations; the standard
/// deviation of the policy does not depend on the observation. Variables live
/// under `critic`, `actor` and `log_std` of the given path.
pub struct ActorCritic {
    critic: Mlp,
    actor: Mlp,
    log_std: Tensor,
}

impl ActorCritic {
    /// Log standard deviations of the policy, shape `(act_dim)`.
    pub fn log_std(&self) -> &Tensor {
        &self.log_std
    }
}

impl SubModel for ActorCritic {
    type Config = ActorCriticConfig;
    type Input = Tensor;

    /// State values `(n)` and policy means `(n, act_dim)`.
    type Output = (Tensor, Tensor);

    fn build(p: &nn::Path, config: Self::Config) -> Self {
        let critic_config = MlpConfig::new(config.obs_dim, config.hidden_units.clone(), 1, false);
        let actor_config =
            MlpConfig::new(config.obs_dim, config.hidden_units.clone(), config.act_dim, false);

        Self {
            critic: Mlp::build(&(p / "critic"), critic_config),
            actor: Mlp::build(&(p / "actor"), actor_config),
            log_std: p.var(
                "log_std",
                &[config.act_dim],
                nn::Init::Const(config.init_log_std),
            ),
        }
    }

    fn forward(&self, obs: &Tensor) -> (Tensor, Tensor) {
        let value = self.critic.forward(obs).squeeze_dim(-1);
        let mean = self.actor.forward(obs);
        (value, mean)
    }
}
