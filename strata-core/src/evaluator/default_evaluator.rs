//! Default implementation of the [`Evaluator`] trait.
//!
//! Runs a fixed number of episodes and summarizes their returns.
use super::Evaluator;
use crate::{
    error::StrataError,
    record::{Record, RecordValue::Scalar},
    Agent, Env,
};
use anyhow::Result;
use log::info;
use ndarray::Array2;

/// Runs `n_episodes` episodes with a single environment.
///
/// Episode `i` starts from [`Env::reset_with_index`] with `ix = i`, so results
/// are reproducible for a deterministic agent. The returned record contains
/// `eval_avg_return` and `eval_std_return` (population standard deviation of
/// the episode returns).
///
/// # Examples
///
/// ```ignore
/// let mut evaluator = DefaultEvaluator::<Pendulum>::new(&config, 42, 10)?;
/// agent.eval();
/// let record = evaluator.evaluate(&agent)?;
/// println!("Average return: {}", record.get_scalar("eval_avg_return")?);
/// ```
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    env: E,
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        if n_episodes == 0 {
            return Err(
                StrataError::InvalidConfig("n_episodes must be positive".to_string()).into(),
            );
        }
        Ok(Self {
            n_episodes,
            env: E::build(config, seed)?,
        })
    }

    /// Returns of the episodes.
    pub fn episode_returns<A: Agent + ?Sized>(&mut self, agent: &A) -> Result<Vec<f32>> {
        let obs_dim = self.env.obs_dim();
        let mut returns = Vec::with_capacity(self.n_episodes);

        for ix in 0..self.n_episodes {
            let mut obs = self.env.reset_with_index(ix)?;
            let mut r_total = 0f32;

            loop {
                let act = agent.act(&Array2::from_shape_vec((1, obs_dim), obs)?)?;
                let (step, _) = self.env.step(&act.row(0).to_vec())?;
                r_total += step.reward;
                if step.is_done() {
                    break;
                }
                obs = step.obs;
            }
            returns.push(r_total);
        }

        Ok(returns)
    }
}

impl<E: Env, A: Agent + ?Sized> Evaluator<A> for DefaultEvaluator<E> {
    fn evaluate(&mut self, agent: &A) -> Result<Record> {
        let returns = self.episode_returns(agent)?;
        let n = returns.len() as f32;
        let avg = returns.iter().sum::<f32>() / n;
        let std = (returns.iter().map(|r| (r - avg).powi(2)).sum::<f32>() / n).sqrt();
        info!("Evaluated {} episodes: avg {:.3}, std {:.3}", returns.len(), avg, std);

        Ok(Record::from_slice(&[
            ("eval_avg_return", Scalar(avg)),
            ("eval_std_return", Scalar(std)),
        ]))
    }
}
