//! Optimizers.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tch::{nn, nn::VarStore, no_grad, Tensor};

/// Configures an optimizer for training neural networks in an RL agent.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
    },

    /// AdamW optimizer.
    AdamW {
        /// Learning rate.
        lr: f64,
        /// Decay rate of the first moment.
        beta1: f64,
        /// Decay rate of the second moment.
        beta2: f64,
        /// Weight decay.
        wd: f64,
        /// Added to the denominator.
        eps: f64,
    },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam { lr: 1e-3 }
    }
}

impl OptimizerConfig {
    /// Constructs an optimizer of the trainable variables in `vs`.
    pub fn build(&self, vs: &VarStore) -> Result<Optimizer> {
        let (lr, beta1, beta2, wd, eps) = match *self {
            Self::Adam { lr } => (lr, 0.9, 0.999, 0.0, 1e-8),
            Self::AdamW {
                lr,
                beta1,
                beta2,
                wd,
                eps,
            } => (lr, beta1, beta2, wd, eps),
        };
        Ok(Optimizer::new(vs, lr, beta1, beta2, wd, eps))
    }

    /// Returns a copy with the learning rate replaced.
    pub fn learning_rate(mut self, v: f64) -> Self {
        match &mut self {
            Self::Adam { lr } => *lr = v,
            Self::AdamW { lr, .. } => *lr = v,
        }
        self
    }
}

/// Adam with decoupled weight decay.
///
/// Moment estimates and the step count live in a [`VarStore`] of their own,
/// which is saved and loaded with [`Optimizer::save`] and [`Optimizer::load`].
/// Moments are named after the variables they belong to, under `m` and `v`.
pub struct Optimizer {
    lr: f64,
    beta1: f64,
    beta2: f64,
    wd: f64,
    eps: f64,
    params: Vec<Tensor>,
    m: Vec<Tensor>,
    v: Vec<Tensor>,
    step: Tensor,
    state: VarStore,
}

/// Zero tensor under `root / prefix` mirroring the dotted name of a variable.
fn zeros_named(root: &nn::Path, prefix: &str, name: &str, size: &[i64]) -> Tensor {
    let (dirs, last): (Vec<&str>, &str) = match name.rsplit_once('.') {
        Some((dirs, last)) => (dirs.split('.').collect(), last),
        None => (vec![], name),
    };
    let path = dirs.iter().fold(root / prefix, |p, d| &p / *d);
    path.zeros_no_train(last, size)
}

impl Optimizer {
    fn new(vs: &VarStore, lr: f64, beta1: f64, beta2: f64, wd: f64, eps: f64) -> Self {
        let mut named: Vec<(String, Tensor)> = vs
            .variables()
            .into_iter()
            .filter(|(_, t)| t.requires_grad())
            .collect();
        named.sort_by(|a, b| a.0.cmp(&b.0));

        let state = VarStore::new(vs.device());
        let (m, v, step) = {
            let root = state.root();
            let m: Vec<Tensor> = named
                .iter()
                .map(|(k, t)| zeros_named(&root, "m", k, &t.size()))
                .collect();
            let v: Vec<Tensor> = named
                .iter()
                .map(|(k, t)| zeros_named(&root, "v", k, &t.size()))
                .collect();
            (m, v, root.zeros_no_train("step", &[1]))
        };

        Self {
            lr,
            beta1,
            beta2,
            wd,
            eps,
            params: named.into_iter().map(|(_, t)| t).collect(),
            m,
            v,
            step,
            state,
        }
    }

    /// The number of updates done so far.
    pub fn n_steps(&self) -> Result<usize> {
        Ok(f64::try_from(&self.step)? as usize)
    }

    /// Zeroes gradients, backpropagates `loss`, clamps every gradient element
    /// to `[-max, max]` and updates the parameters.
    ///
    /// Clipped gradients are kept in the variables until the next call.
    pub fn backward_step_clip_value(&mut self, loss: &Tensor, max: f64) -> Result<()> {
        for p in self.params.iter_mut() {
            p.zero_grad();
        }
        loss.backward();

        let t = f64::try_from(&self.step)? + 1.0;
        let bc1 = 1.0 - self.beta1.powf(t);
        let bc2 = 1.0 - self.beta2.powf(t);
        let (lr, beta1, beta2, wd, eps) = (self.lr, self.beta1, self.beta2, self.wd, self.eps);

        no_grad(|| {
            let step = &self.step + 1.0;
            self.step.copy_(&step);
            for ((p, m), v) in self
                .params
                .iter_mut()
                .zip(self.m.iter_mut())
                .zip(self.v.iter_mut())
            {
                let mut grad = p.grad();
                if !grad.defined() {
                    continue;
                }
                let clipped = grad.clamp(-max, max);
                grad.copy_(&clipped);

                let m_new = beta1 * &*m + (1.0 - beta1) * &clipped;
                let v_new = beta2 * &*v + (1.0 - beta2) * (&clipped * &clipped);
                let denom = (&v_new / bc2).sqrt() + eps;
                let p_new = &*p * (1.0 - lr * wd) - lr * ((&m_new / bc1) / denom);
                m.copy_(&m_new);
                v.copy_(&v_new);
                p.copy_(&p_new);
            }
        });

        Ok(())
    }

    /// Saves moment estimates and the step count.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.state
            .save(path)
            .with_context(|| format!("Failed to save {:?}", path))
    }

    /// Loads moment estimates and the step count.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.state
            .load(path)
            .with_context(|| format!("Failed to load {:?}", path))
    }
}
