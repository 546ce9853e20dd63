//! Named problems and hyperparameter sets.
use crate::{env::PENDULUM_ENV_ID, hparams::HParams};
use anyhow::Result;
use std::collections::HashMap;
use strata_core::error::StrataError;

/// A learning problem: an environment and the hyperparameter set used for it
/// by default.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// Name of the problem.
    pub name: String,

    /// Environment id.
    pub env_id: String,

    /// Name of the default hyperparameter set.
    pub hparam_set: String,
}

impl Problem {
    /// Constructs a [`Problem`].
    pub fn new(
        name: impl Into<String>,
        env_id: impl Into<String>,
        hparam_set: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            env_id: env_id.into(),
            hparam_set: hparam_set.into(),
        }
    }
}

/// Lookup tables of problems and hyperparameter sets.
#[derive(Default)]
pub struct Registry {
    problems: HashMap<String, Problem>,
    hparam_sets: HashMap<String, HParams>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in problems and hyperparameter sets.
    ///
    /// * `ppo-pendulum-v0`: PPO on `Pendulum-v0` with `ppo-pendulum`
    /// * `base-ppo`: defaults of the PPO learner
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_hparam_set("base-ppo", HParams::default());
        registry.register_hparam_set("ppo-pendulum", HParams::ppo_pendulum());
        registry.register_problem(Problem::new(
            "ppo-pendulum-v0",
            PENDULUM_ENV_ID,
            "ppo-pendulum",
        ));
        registry
    }

    /// Registers a problem, replacing one with the same name.
    pub fn register_problem(&mut self, problem: Problem) {
        self.problems.insert(problem.name.clone(), problem);
    }

    /// Registers a hyperparameter set, replacing one with the same name.
    pub fn register_hparam_set(&mut self, name: impl Into<String>, hparams: HParams) {
        self.hparam_sets.insert(name.into(), hparams);
    }

    /// The problem with the given name.
    pub fn problem(&self, name: &str) -> Result<&Problem> {
        self.problems
            .get(name)
            .ok_or_else(|| StrataError::UnknownProblem(name.to_string()).into())
    }

    /// A copy of the hyperparameter set with the given name.
    pub fn hparams(&self, name: &str) -> Result<HParams> {
        self.hparam_sets
            .get(name)
            .cloned()
            .ok_or_else(|| StrataError::UnknownHParamSet(name.to_string()).into())
    }

    /// Names of the registered problems, sorted.
    pub fn problem_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.problems.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Names of the registered hyperparameter sets, sorted.
    pub fn hparam_set_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.hparam_sets.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() -> Result<()> {
        let registry = Registry::with_defaults();
        let problem = registry.problem("ppo-pendulum-v0")?;
        assert_eq!(problem.env_id, "Pendulum-v0");

        let hparams = registry.hparams(&problem.hparam_set)?;
        assert_eq!(hparams.num_processes, 16);
        assert_eq!(hparams.learning_rate, 3e-4);
        assert_eq!(registry.hparams("base-ppo")?.lambda, 0.01);

        assert_eq!(registry.problem_names(), vec!["ppo-pendulum-v0"]);
        assert_eq!(registry.hparam_set_names(), vec!["base-ppo", "ppo-pendulum"]);
        Ok(())
    }

    #[test]
    fn test_unknown_names() {
        let registry = Registry::with_defaults();

        let err = registry.problem("ppo-cartpole-v0").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StrataError>(),
            Some(StrataError::UnknownProblem(_))
        ));
        let err = registry.hparams("ppo-cartpole").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StrataError>(),
            Some(StrataError::UnknownHParamSet(_))
        ));
    }

    #[test]
    fn test_register_replaces() -> Result<()> {
        let mut registry = Registry::with_defaults();
        let hparams = HParams {
            batch_size: 8,
            ..Default::default()
        };
        registry.register_hparam_set("ppo-pendulum", hparams);
        assert_eq!(registry.hparams("ppo-pendulum")?.batch_size, 8);
        assert_eq!(registry.hparam_set_names().len(), 2);
        Ok(())
    }
}
