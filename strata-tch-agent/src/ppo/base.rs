use super::{
    loss::{clipped_surrogate, gaussian_entropy, gaussian_log_prob},
    ActorCritic, PpoConfig,
};
use crate::{
    model::SubModel,
    opt::Optimizer,
    util::{array1_to_tensor, array2_to_tensor, tensor_to_array1, tensor_to_array2},
};
use anyhow::{Context, Result};
use log::{info, trace};
use ndarray::{Array1, Array2};
use std::{convert::TryFrom, fs, path::Path};
use strata_core::{
    error::StrataError, Agent, Batch, Evaluation, Losses, RolloutTargets, TrainingState,
};
use tch::{nn, no_grad, Device, Reduction};

const MODEL_FILE: &str = "ac_net.pt.tch";
const OPT_FILE: &str = "opt.pt.tch";
const STATE_FILE: &str = "state.yaml";

/// PPO agent with a Gaussian policy.
///
/// Parameters are updated only in [`Agent::optimize`] and [`Agent::load_params`].
/// A checkpoint directory holds the network (`ac_net.pt.tch`), the moment
/// estimates of the optimizer (`opt.pt.tch`) and the [`TrainingState`]
/// (`state.yaml`), so training resumes exactly where it was saved.
pub struct Ppo {
    var_store: nn::VarStore,
    ac: ActorCritic,
    opt: Optimizer,
    alpha: f64,
    beta: f64,
    clip_ratio: f64,
    max_grad_norm: f64,
    train: bool,
    state: TrainingState,
    device: Device,
}

impl Ppo {
    /// Constructs [`Ppo`] agent.
    pub fn build(config: PpoConfig) -> Result<Self> {
        let device: Device = config
            .device
            .map(|d| d.into())
            .unwrap_or(Device::Cpu);
        if let Some(seed) = config.seed {
            tch::manual_seed(seed);
        }

        let var_store = nn::VarStore::new(device);
        let ac = ActorCritic::build(&(var_store.root() / "ac_net"), config.actor_critic_config);
        let opt = config.opt_config.build(&var_store)?;

        Ok(Self {
            var_store,
            ac,
            opt,
            alpha: config.alpha,
            beta: config.beta,
            clip_ratio: config.clip_ratio,
            max_grad_norm: config.max_grad_norm,
            train: true,
            state: TrainingState::Untrained,
            device,
        })
    }

    /// Means and standard deviations of the policy for a batch of observations.
    pub fn dist_params(&self, obs: &Array2<f32>) -> Result<(Array2<f32>, Array1<f32>)> {
        no_grad(|| {
            let (_, mean) = self.ac.forward(&array2_to_tensor(obs, self.device));
            let std = self.ac.log_std().exp();
            Ok((tensor_to_array2(&mean)?, tensor_to_array1(&std)?))
        })
    }
}

impl Agent for Ppo {
    fn act(&self, obs: &Array2<f32>) -> Result<Array2<f32>> {
        no_grad(|| {
            let (_, mean) = self.ac.forward(&array2_to_tensor(obs, self.device));
            let act = if self.train {
                let std = self.ac.log_std().exp();
                &mean + mean.randn_like() * std
            } else {
                mean
            };
            tensor_to_array2(&act)
        })
    }

    fn value(&self, obs: &Array2<f32>) -> Result<Array1<f32>> {
        no_grad(|| {
            let (value, _) = self.ac.forward(&array2_to_tensor(obs, self.device));
            tensor_to_array1(&value)
        })
    }

    fn evaluate(&self, obs: &Array2<f32>, act: &Array2<f32>) -> Result<Evaluation> {
        no_grad(|| {
            let (values, mean) = self.ac.forward(&array2_to_tensor(obs, self.device));
            let act = array2_to_tensor(act, self.device);
            let log_probs = gaussian_log_prob(&act, &mean, self.ac.log_std());
            let entropy = gaussian_entropy(self.ac.log_std()).expand([obs.nrows() as i64], false);

            Ok(Evaluation {
                values: tensor_to_array1(&values)?,
                log_probs: tensor_to_array1(&log_probs)?,
                entropy: tensor_to_array1(&entropy)?,
            })
        })
    }

    fn optimize(&mut self, batch: &Batch, targets: &RolloutTargets) -> Result<Losses> {
        if batch.len() != targets.len() {
            return Err(StrataError::ShapeMismatch(format!(
                "minibatch has {} rows but targets have {}",
                batch.len(),
                targets.len()
            ))
            .into());
        }
        let obs = array2_to_tensor(batch.obs(), self.device);
        let act = array2_to_tensor(batch.act(), self.device);
        let returns = array1_to_tensor(targets.returns(), self.device);
        let old_log_probs = array1_to_tensor(targets.old_log_probs(), self.device);
        let adv = array1_to_tensor(&targets.advantages(), self.device);

        let (values, mean) = self.ac.forward(&obs);
        let log_probs = gaussian_log_prob(&act, &mean, self.ac.log_std());
        let ratio = (log_probs - old_log_probs).exp();
        let actor_loss = -clipped_surrogate(&ratio, &adv, self.clip_ratio).mean(tch::Kind::Float);
        let critic_loss = values.mse_loss(&returns, Reduction::Mean);
        let entropy = gaussian_entropy(self.ac.log_std());
        let loss = &actor_loss + self.alpha * &critic_loss - self.beta * &entropy;

        let loss_value = f64::try_from(&loss)?;
        if !loss_value.is_finite() {
            return Err(StrataError::NumericalInstability(format!(
                "total loss at optimization step {}",
                self.state.n_opts() + 1
            ))
            .into());
        }

        self.opt.backward_step_clip_value(&loss, self.max_grad_norm)?;
        self.state = self.state.next();
        trace!("Optimization step {}: loss {}", self.state.n_opts(), loss_value);

        Ok(Losses {
            actor_loss: f32::try_from(&actor_loss)?,
            critic_loss: f32::try_from(&critic_loss)?,
            entropy: f32::try_from(&entropy)?,
        })
    }

    fn models(&self) -> Vec<String> {
        vec!["ac_net".to_string()]
    }

    fn state(&self) -> TrainingState {
        self.state
    }

    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        let model_file = path.join(MODEL_FILE);
        self.var_store
            .save(&model_file)
            .with_context(|| format!("Failed to save {:?}", model_file))?;
        self.opt.save(path.join(OPT_FILE))?;
        fs::write(path.join(STATE_FILE), serde_yaml::to_string(&self.state)?)?;
        info!("Save PPO agent to {:?}", path);
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        let model_file = path.join(MODEL_FILE);
        self.var_store
            .load(&model_file)
            .with_context(|| format!("Failed to load {:?}", model_file))?;
        self.opt.load(path.join(OPT_FILE))?;
        let state_file = path.join(STATE_FILE);
        let state = fs::read_to_string(&state_file)
            .with_context(|| format!("Failed to load {:?}", state_file))?;
        self.state = serde_yaml::from_str(&state)?;
        info!("Load PPO agent from {:?}", path);
        Ok(())
    }
}
