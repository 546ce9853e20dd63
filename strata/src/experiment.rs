//! Training and evaluation runs of registered problems.
use crate::{
    env::{Pendulum, PendulumConfig, PENDULUM_ENV_ID},
    hparams::HParams,
    registry::Problem,
};
use anyhow::{Context, Result};
use log::info;
use std::{fs, path::Path};
use strata_core::{
    error::StrataError,
    record::{Record, Recorder},
    Agent, DefaultEvaluator, Env, Evaluator, Trainer, VecRunner,
};
use strata_tch_agent::ppo::Ppo;
use tch::Device;

const HPARAMS_FILE: &str = "hparams.yaml";
const PPO_CONFIG_FILE: &str = "ppo_config.yaml";
const TRAINER_CONFIG_FILE: &str = "trainer_config.yaml";

/// Seed offset of the evaluation environment.
const EVAL_SEED_OFFSET: i64 = 1_000_000;

/// Trains a PPO agent on environments built from `env_config`.
///
/// The hyperparameters and the derived configurations are written in
/// `model_dir` before training, the parameters after the last iteration in
/// `(model_dir)/final`.
pub fn train_with<E: Env>(
    env_config: &E::Config,
    hparams: &HParams,
    model_dir: &str,
    recorder: &mut dyn Recorder,
    device: Device,
) -> Result<Ppo> {
    let dir = Path::new(model_dir);
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;

    let seed = hparams.seed as i64;
    let mut runner = VecRunner::<E>::build(env_config, hparams.num_processes, seed)?;
    let ppo_config = hparams.ppo_config(runner.obs_dim(), runner.act_dim(), device);
    let trainer_config = hparams.trainer_config(model_dir);
    hparams.save(dir.join(HPARAMS_FILE))?;
    ppo_config.save(dir.join(PPO_CONFIG_FILE))?;
    trainer_config.save(dir.join(TRAINER_CONFIG_FILE))?;

    let mut agent = Ppo::build(ppo_config)?;
    let mut trainer = Trainer::build(trainer_config)?;
    let mut evaluator =
        DefaultEvaluator::<E>::new(env_config, seed + EVAL_SEED_OFFSET, hparams.num_eval)?;

    trainer.train(&mut runner, &mut agent, recorder, &mut evaluator)?;
    runner.close()?;

    let final_dir = dir.join("final");
    agent.save_params(&final_dir)?;
    info!("Saved the final model in {:?}", final_dir);

    Ok(agent)
}

/// Evaluates the parameters in `load_dir` on an environment built from `env_config`.
pub fn evaluate_with<E: Env>(
    env_config: &E::Config,
    hparams: &HParams,
    load_dir: &str,
    device: Device,
) -> Result<Record> {
    let seed = hparams.seed as i64 + EVAL_SEED_OFFSET;
    let (obs_dim, act_dim) = {
        let mut env = E::build(env_config, seed)?;
        let dims = (env.obs_dim(), env.act_dim());
        env.close()?;
        dims
    };

    let mut agent = Ppo::build(hparams.ppo_config(obs_dim, act_dim, device))?;
    agent.load_params(Path::new(load_dir))?;
    agent.eval();

    let mut evaluator = DefaultEvaluator::<E>::new(env_config, seed, hparams.num_eval)?;
    evaluator.evaluate(&agent)
}

/// Trains an agent on a registered problem.
pub fn train(
    problem: &Problem,
    hparams: &HParams,
    model_dir: &str,
    recorder: &mut dyn Recorder,
    device: Device,
) -> Result<Ppo> {
    info!("Train on {} ({})", problem.name, problem.env_id);
    match problem.env_id.as_str() {
        PENDULUM_ENV_ID => {
            let env_config = PendulumConfig::new(problem.env_id.as_str());
            train_with::<Pendulum>(&env_config, hparams, model_dir, recorder, device)
        }
        _ => Err(StrataError::UnknownProblem(problem.name.clone()).into()),
    }
}

/// Evaluates saved parameters on a registered problem.
pub fn evaluate(
    problem: &Problem,
    hparams: &HParams,
    load_dir: &str,
    device: Device,
) -> Result<Record> {
    info!("Evaluate {} on {} ({})", load_dir, problem.name, problem.env_id);
    match problem.env_id.as_str() {
        PENDULUM_ENV_ID => {
            let env_config = PendulumConfig::new(problem.env_id.as_str());
            evaluate_with::<Pendulum>(&env_config, hparams, load_dir, device)
        }
        _ => Err(StrataError::UnknownProblem(problem.name.clone()).into()),
    }
}
