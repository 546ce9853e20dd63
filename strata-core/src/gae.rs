//! Generalized advantage estimation.
use crate::{error::StrataError, Agent, Batch};
use anyhow::Result;
use log::trace;
use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};

/// Computes the returns of a single trajectory with GAE(λ).
///
/// `bootstrap` is the value estimate of the observation following the last
/// transition. It is ignored when `dones` ends with `true`. An episode end inside
/// the trajectory stops both the bootstrap from the following value and the
/// accumulation of later advantages: `done` at step `t` masks both
/// `values[t + 1]` and the accumulator, unlike the plain recursion
/// `delta = r + gamma * values[t + 1] - values[t]`, which would leak the value
/// of the next episode's first observation into the previous episode.
///
/// The advantage of step `t` is `returns[t] - values[t]`.
pub fn gae(
    rewards: &[f32],
    values: &[f32],
    dones: &[bool],
    bootstrap: f32,
    gamma: f32,
    lambda: f32,
) -> Vec<f32> {
    let n = rewards.len();
    debug_assert_eq!(values.len(), n);
    debug_assert_eq!(dones.len(), n);

    let mut returns = vec![0f32; n];
    let mut acc = 0f32;

    for t in (0..n).rev() {
        let next_value = if t + 1 < n { values[t + 1] } else { bootstrap };
        let not_done = if dones[t] { 0.0 } else { 1.0 };
        let delta = rewards[t] + gamma * next_value * not_done - values[t];
        acc = delta + gamma * lambda * not_done * acc;
        returns[t] = acc + values[t];
    }

    returns
}

/// Configuration of [`AdvantageEstimator`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct GaeConfig {
    /// Discount factor.
    pub gamma: f32,

    /// Exponential weight of multi-step estimates.
    pub lambda: f32,
}

impl Default for GaeConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            lambda: 0.95,
        }
    }
}

/// Regression and policy targets of a rollout, one element per batch row.
#[derive(Clone, Debug)]
pub struct RolloutTargets {
    returns: Array1<f32>,
    values: Array1<f32>,
    old_log_probs: Array1<f32>,
}

impl RolloutTargets {
    /// Constructs targets, all arrays must have the same length.
    pub fn new(
        returns: Array1<f32>,
        values: Array1<f32>,
        old_log_probs: Array1<f32>,
    ) -> Result<Self> {
        if values.len() != returns.len() || old_log_probs.len() != returns.len() {
            return Err(StrataError::ShapeMismatch(format!(
                "returns: {}, values: {}, old_log_probs: {}",
                returns.len(),
                values.len(),
                old_log_probs.len()
            ))
            .into());
        }
        Ok(Self {
            returns,
            values,
            old_log_probs,
        })
    }

    /// Returns, the regression targets of the value function.
    pub fn returns(&self) -> &Array1<f32> {
        &self.returns
    }

    /// Value estimates at collection time.
    pub fn values(&self) -> &Array1<f32> {
        &self.values
    }

    /// Log-probabilities of the actions at collection time.
    pub fn old_log_probs(&self) -> &Array1<f32> {
        &self.old_log_probs
    }

    /// Advantages, `returns - values`.
    pub fn advantages(&self) -> Array1<f32> {
        &self.returns - &self.values
    }

    /// Targets of the given rows, matching [`Batch::select`].
    pub fn select(&self, ixs: &[usize]) -> Self {
        Self {
            returns: self.returns.select(Axis(0), ixs),
            values: self.values.select(Axis(0), ixs),
            old_log_probs: self.old_log_probs.select(Axis(0), ixs),
        }
    }

    /// The number of rows.
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// Returns `true` if there is no row.
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}

/// Computes [`RolloutTargets`] of a merged batch.
///
/// Every environment block of the batch is an independent truncated trajectory.
/// A block ending with a done transition gets a bootstrap value of exactly 0,
/// otherwise the agent's value of the block's last `next_obs`.
pub struct AdvantageEstimator {
    gamma: f32,
    lambda: f32,
}

impl AdvantageEstimator {
    /// Constructs an estimator.
    pub fn new(config: GaeConfig) -> Self {
        Self {
            gamma: config.gamma,
            lambda: config.lambda,
        }
    }

    /// Computes returns, values and log-probabilities of the batch with the
    /// current parameters of `agent`.
    ///
    /// The agent is called once through [`Agent::evaluate`] and at most once
    /// through [`Agent::value`].
    pub fn compute<A: Agent + ?Sized>(&self, batch: &Batch, agent: &A) -> Result<RolloutTargets> {
        let n = batch.len();
        if n != batch.n_envs() * batch.horizon() {
            return Err(StrataError::ShapeMismatch(format!(
                "batch has {} rows, expected {} envs x {} steps",
                n,
                batch.n_envs(),
                batch.horizon()
            ))
            .into());
        }

        let ev = agent.evaluate(batch.obs(), batch.act())?;
        if ev.values.len() != n || ev.log_probs.len() != n {
            return Err(StrataError::ShapeMismatch(format!(
                "agent evaluated {} values and {} log-probabilities for {} rows",
                ev.values.len(),
                ev.log_probs.len(),
                n
            ))
            .into());
        }

        // Bootstrap values of blocks cut by the horizon
        let open_blocks: Vec<usize> = (0..batch.n_envs())
            .filter(|&k| !batch.is_done()[batch.block(k).end - 1])
            .collect();
        let mut bootstrap = vec![0f32; batch.n_envs()];
        if !open_blocks.is_empty() {
            let rows: Vec<usize> = open_blocks.iter().map(|&k| batch.block(k).end - 1).collect();
            let next_values = agent.value(&batch.next_obs().select(Axis(0), &rows))?;
            if next_values.len() != rows.len() {
                return Err(StrataError::ShapeMismatch(format!(
                    "agent returned {} values for {} observations",
                    next_values.len(),
                    rows.len()
                ))
                .into());
            }
            for (&k, &v) in open_blocks.iter().zip(next_values.iter()) {
                bootstrap[k] = v;
            }
        }

        let rewards = batch.reward().to_vec();
        let values = ev.values.to_vec();
        let mut returns = Vec::with_capacity(n);
        for k in 0..batch.n_envs() {
            let r = batch.block(k);
            returns.extend(gae(
                &rewards[r.clone()],
                &values[r.clone()],
                &batch.is_done()[r],
                bootstrap[k],
                self.gamma,
                self.lambda,
            ));
        }

        if returns.iter().any(|r| !r.is_finite()) {
            return Err(StrataError::NumericalInstability("returns".to_string()).into());
        }
        trace!("Bootstrapped {} of {} blocks", open_blocks.len(), batch.n_envs());

        RolloutTargets::new(Array1::from(returns), ev.values, ev.log_probs)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        merge,
        test_util::{CountingEnv, CountingEnvConfig, MockAgent},
        Trajectory, Transition, VecRunner,
    };

    const EPS: f32 = 1e-5;

    #[test]
    fn test_bootstrap_at_truncation() {
        let h = 10;
        let rewards = vec![1.0; h];
        let values = vec![0.3; h];
        let dones = vec![false; h];
        let returns = gae(&rewards, &values, &dones, 7.0, 1.0, 1.0);

        assert!((returns[0] - (h as f32 + 7.0)).abs() < EPS);
        assert!((returns[h - 1] - 8.0).abs() < EPS);
    }

    #[test]
    fn test_no_bootstrap_at_terminal() {
        let h = 10;
        let rewards = vec![1.0; h];
        let mut dones = vec![false; h];
        dones[h - 1] = true;

        for v in [0.0, 3.0, -50.0] {
            let values = vec![v; h];
            let returns = gae(&rewards, &values, &dones, 123.0, 1.0, 1.0);
            assert!((returns[0] - h as f32).abs() < 1e-4);
        }
    }

    #[test]
    fn test_td0_with_lambda_zero() {
        let rewards = [1.0, 2.0];
        let values = [0.5, 1.0];
        let dones = [false, true];
        let returns = gae(&rewards, &values, &dones, 0.0, 0.99, 0.0);

        assert!((returns[1] - 2.0).abs() < EPS);
        assert!((returns[0] - (1.0 + 0.99 * 1.0)).abs() < EPS);
    }

    #[test]
    fn test_episode_end_inside_trajectory() {
        let rewards = [1.0, 1.0, 1.0];
        let values = [0.0, 5.0, 5.0];
        let dones = [true, false, false];
        let returns = gae(&rewards, &values, &dones, 5.0, 1.0, 1.0);

        assert!((returns[0] - 1.0).abs() < EPS);
        assert!((returns[1] - 7.0).abs() < EPS);
    }

    fn block(env_ix: usize, h: usize, last_done: bool) -> Trajectory {
        let transitions = (0..h)
            .map(|t| {
                let is_done = last_done && t + 1 == h;
                Transition::new(vec![t as f32], vec![0.5], 1.0, vec![t as f32 + 1.0], is_done)
            })
            .collect();
        Trajectory::from_transitions(env_ix, transitions)
    }

    #[test]
    fn test_blocks_are_independent() -> Result<()> {
        let batch = merge(&[block(0, 4, false), block(1, 4, true), block(2, 4, false)])?;
        let agent = MockAgent::new(1, 2.0);
        let estimator = AdvantageEstimator::new(GaeConfig {
            gamma: 1.0,
            lambda: 1.0,
        });
        let targets = estimator.compute(&batch, &agent)?;

        assert_eq!(targets.len(), 12);
        assert_eq!(agent.n_value_calls.get(), 1);
        assert!((targets.returns()[0] - 6.0).abs() < EPS);
        assert!((targets.returns()[4] - 4.0).abs() < EPS);
        assert!((targets.returns()[8] - 6.0).abs() < EPS);
        assert!((targets.returns()[7] - 1.0).abs() < EPS);
        assert!((targets.advantages()[4] - 2.0).abs() < EPS);

        Ok(())
    }

    #[test]
    fn test_no_value_call_when_all_blocks_end() -> Result<()> {
        let batch = merge(&[block(0, 3, true), block(1, 3, true)])?;
        let agent = MockAgent::new(1, 2.0);
        let _ = AdvantageEstimator::new(GaeConfig::default()).compute(&batch, &agent)?;
        assert_eq!(agent.n_value_calls.get(), 0);
        Ok(())
    }

    #[test]
    fn test_targets_of_rollout() -> Result<()> {
        let config = CountingEnvConfig::default().episode_len(3);
        let mut runner = VecRunner::<CountingEnv>::build(&config, 2, 0)?;
        let agent = MockAgent::new(1, 0.0);
        let batch = merge(&runner.rollout(&agent, 8)?)?;
        let targets = AdvantageEstimator::new(GaeConfig {
            gamma: 1.0,
            lambda: 1.0,
        })
        .compute(&batch, &agent)?;

        // With zero values, returns are the remaining rewards of each episode
        let expected = [3.0, 2.0, 1.0, 3.0, 2.0, 1.0, 2.0, 1.0];
        for k in 0..2 {
            let r = batch.block(k);
            assert_eq!(targets.returns().slice(ndarray::s![r]).to_vec(), expected.to_vec());
        }
        assert_eq!(targets.old_log_probs().to_vec(), vec![-0.0; 16]);

        let mb = targets.select(&[2, 9]);
        assert_eq!(mb.returns().to_vec(), vec![1.0, 2.0]);

        Ok(())
    }

    #[test]
    fn test_targets_length_check() {
        let n = Array1::zeros(3);
        assert!(RolloutTargets::new(n.clone(), n.clone(), Array1::zeros(2)).is_err());
    }
}
