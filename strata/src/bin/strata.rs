use anyhow::Result;
use clap::Parser;
use log::info;
use strata::{
    experiment,
    record::CsvRecorder,
    registry::Registry,
};
use strata_core::{
    error::StrataError,
    record::{NullRecorder, Recorder},
};

/// Trains or evaluates a PPO agent on a registered problem.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Name of the problem
    #[arg(long, default_value = "ppo-pendulum-v0")]
    problem: String,

    /// Name of the hyperparameter set, the default set of the problem if not given
    #[arg(long)]
    hparam_set: Option<String>,

    /// YAML file overriding hyperparameters
    #[arg(long)]
    hparams: Option<String>,

    /// Directory where models and configurations are saved
    #[arg(long, default_value = "./model")]
    model_dir: String,

    /// CSV file of training metrics
    #[arg(long)]
    log_csv: Option<String>,

    /// Random seed, overrides the one of the hyperparameter set
    #[arg(long)]
    seed: Option<u64>,

    /// Evaluate a saved model, not train
    #[arg(long, default_value_t = false)]
    eval_only: bool,

    /// Directory of the model to be evaluated
    #[arg(long)]
    load_dir: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let registry = Registry::with_defaults();
    let problem = registry.problem(&args.problem)?;
    let hparam_set = args.hparam_set.as_deref().unwrap_or(&problem.hparam_set);
    let mut hparams = registry.hparams(hparam_set)?;
    if let Some(path) = &args.hparams {
        hparams = hparams.override_with_file(path)?;
    }
    if let Some(seed) = args.seed {
        hparams.seed = seed;
    }
    tch::manual_seed(hparams.seed as i64);
    let device = tch::Device::cuda_if_available();
    info!("Problem {}, hyperparameters {}, device {:?}", problem.name, hparam_set, device);

    if args.eval_only {
        let load_dir = args.load_dir.as_deref().ok_or_else(|| {
            StrataError::InvalidConfig("--eval-only requires --load-dir".to_string())
        })?;
        let record = experiment::evaluate(problem, &hparams, load_dir, device)?;
        info!(
            "Average return {:.3}, standard deviation {:.3}",
            record.get_scalar("eval_avg_return")?,
            record.get_scalar("eval_std_return")?
        );
    } else {
        let mut recorder: Box<dyn Recorder> = match &args.log_csv {
            Some(path) => Box::new(CsvRecorder::new(path)?),
            None => Box::new(NullRecorder::new()),
        };
        experiment::train(problem, &hparams, &args.model_dir, recorder.as_mut(), device)?;
    }

    Ok(())
}
