//! Loss functions of PPO.
use std::f64::consts::PI;
use tch::{Kind, Tensor};

/// Elementwise clipped surrogate objective,
/// `min(ratio * adv, clamp(ratio, 1 - clip, 1 + clip) * adv)`.
pub fn clipped_surrogate(ratio: &Tensor, adv: &Tensor, clip: f64) -> Tensor {
    let surr1 = ratio * adv;
    let surr2 = ratio.clamp(1.0 - clip, 1.0 + clip) * adv;
    surr1.minimum(&surr2)
}

/// Log-density of actions under diagonal Gaussians, summed over action dimensions.
///
/// `act` and `mean` have shape `(n, act_dim)`, `log_std` has shape `(act_dim)`.
pub fn gaussian_log_prob(act: &Tensor, mean: &Tensor, log_std: &Tensor) -> Tensor {
    let z = (act - mean) * (-log_std).exp();
    let lp = z.square() * -0.5 - log_std - 0.5 * (2.0 * PI).ln();
    lp.sum_dim_intlist(Some([-1i64].as_slice()), false, Kind::Float)
}

/// Entropy of a diagonal Gaussian with the given log standard deviations.
pub fn gaussian_entropy(log_std: &Tensor) -> Tensor {
    (log_std + 0.5 + 0.5 * (2.0 * PI).ln()).sum(Kind::Float)
}
