//! Merges trajectories into a [`Batch`].
use super::{Batch, Trajectory};
use crate::error::StrataError;
use anyhow::Result;
use ndarray::{Array1, Array2};

fn shape_mismatch(msg: String) -> anyhow::Error {
    StrataError::ShapeMismatch(msg).into()
}

/// Concatenates trajectories field-wise.
///
/// The trajectory at position `k` of `trajectories` becomes rows
/// `k * H .. (k + 1) * H` of the batch, where `H` is the common length.
///
/// # Errors
///
/// [`StrataError::ShapeMismatch`] if there is no trajectory, a trajectory is empty,
/// lengths differ, or observation/action widths differ between transitions.
pub fn merge(trajectories: &[Trajectory]) -> Result<Batch> {
    let first = trajectories
        .first()
        .ok_or_else(|| shape_mismatch("no trajectory to merge".to_string()))?;
    let horizon = first.len();
    let head = first
        .transitions()
        .first()
        .ok_or_else(|| shape_mismatch(format!("trajectory of env {} is empty", first.env_ix())))?;
    let obs_dim = head.obs().len();
    let act_dim = head.act().len();
    let n = trajectories.len() * horizon;

    let mut obs = Vec::with_capacity(n * obs_dim);
    let mut act = Vec::with_capacity(n * act_dim);
    let mut reward = Vec::with_capacity(n);
    let mut next_obs = Vec::with_capacity(n * obs_dim);
    let mut is_done = Vec::with_capacity(n);

    for traj in trajectories.iter() {
        if traj.len() != horizon {
            return Err(shape_mismatch(format!(
                "trajectory of env {} has length {}, expected {}",
                traj.env_ix(),
                traj.len(),
                horizon
            )));
        }
        for (t, tr) in traj.transitions().iter().enumerate() {
            if tr.obs().len() != obs_dim || tr.next_obs().len() != obs_dim {
                return Err(shape_mismatch(format!(
                    "observation width at env {}, step {} differs from {}",
                    traj.env_ix(),
                    t,
                    obs_dim
                )));
            }
            if tr.act().len() != act_dim {
                return Err(shape_mismatch(format!(
                    "action width {} at env {}, step {} differs from {}",
                    tr.act().len(),
                    traj.env_ix(),
                    t,
                    act_dim
                )));
            }
            obs.extend_from_slice(tr.obs());
            act.extend_from_slice(tr.act());
            reward.push(tr.reward());
            next_obs.extend_from_slice(tr.next_obs());
            is_done.push(tr.is_done());
        }
    }

    Batch::new(
        Array2::from_shape_vec((n, obs_dim), obs)?,
        Array2::from_shape_vec((n, act_dim), act)?,
        Array1::from(reward),
        Array2::from_shape_vec((n, obs_dim), next_obs)?,
        is_done,
        trajectories.len(),
        horizon,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rollout::Transition;

    fn trajectory(env_ix: usize, len: usize) -> Trajectory {
        let transitions = (0..len)
            .map(|t| {
                let v = (env_ix * 100 + t) as f32;
                Transition::new(vec![v, -v], vec![v], v, vec![v + 1.0, -v - 1.0], t + 1 == len)
            })
            .collect();
        Trajectory::from_transitions(env_ix, transitions)
    }

    #[test]
    fn test_merge_keeps_env_blocks_contiguous() -> Result<()> {
        let trajs = vec![trajectory(0, 3), trajectory(1, 3)];
        let batch = merge(&trajs)?;

        assert_eq!(batch.len(), 6);
        assert_eq!(batch.n_envs(), 2);
        assert_eq!(batch.horizon(), 3);
        assert_eq!(batch.obs().shape(), &[6, 2]);
        assert_eq!(batch.act().shape(), &[6, 1]);
        assert_eq!(
            batch.reward().to_vec(),
            vec![0.0, 1.0, 2.0, 100.0, 101.0, 102.0]
        );
        assert_eq!(batch.obs()[[4, 1]], -101.0);
        assert_eq!(batch.next_obs()[[4, 0]], 102.0);
        assert_eq!(
            batch.is_done(),
            &[false, false, true, false, false, true]
        );
        assert_eq!(batch.block(1), 3..6);

        Ok(())
    }

    #[test]
    fn test_merge_rejects_unequal_lengths() {
        let trajs = vec![trajectory(0, 3), trajectory(1, 2)];
        let err = merge(&trajs).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StrataError>(),
            Some(StrataError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_merge_rejects_unequal_widths() {
        let mut t1 = trajectory(1, 2).transitions().to_vec();
        t1[1] = Transition::new(vec![0.0, 0.0], vec![0.0, 0.0], 0.0, vec![0.0, 0.0], false);
        let trajs = vec![trajectory(0, 2), Trajectory::from_transitions(1, t1)];
        let err = merge(&trajs).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StrataError>(),
            Some(StrataError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_merge_rejects_empty_input() {
        assert!(merge(&[]).is_err());
        assert!(merge(&[Trajectory::new(0)]).is_err());
    }

    #[test]
    fn test_select_rows() -> Result<()> {
        let batch = merge(&[trajectory(0, 2), trajectory(1, 2)])?;
        let mb = batch.select(&[3, 0]);

        assert_eq!(mb.len(), 2);
        assert_eq!(mb.n_envs(), 1);
        assert_eq!(mb.reward().to_vec(), vec![101.0, 0.0]);
        assert_eq!(mb.is_done(), &[true, false]);
        assert_eq!(mb.obs()[[0, 0]], 101.0);

        Ok(())
    }
}
