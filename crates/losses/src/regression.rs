//! Regression losses.

use candle_core::{bail, Result, Tensor};

use crate::checks::expect_same_shape;
use crate::Reduction;

/// Absolute error `|predictions - targets|`.
pub fn l1_loss(predictions: &Tensor, targets: &Tensor, reduction: Reduction) -> Result<Tensor> {
    expect_same_shape("l1_loss", predictions, targets)?;
    reduction.apply((predictions - targets)?.abs()?)
}

/// Squared error `(predictions - targets)^2`.
pub fn mse_loss(predictions: &Tensor, targets: &Tensor, reduction: Reduction) -> Result<Tensor> {
    expect_same_shape("mse_loss", predictions, targets)?;
    reduction.apply((predictions - targets)?.sqr()?)
}

/// Smooth L1: quadratic inside `beta`, linear outside.
///
/// `0.5 * d^2 / beta` where `|d| < beta`, else `|d| - 0.5 * beta`. The two
/// branches meet at `|d| == beta`.
pub fn smooth_l1_loss(
    predictions: &Tensor,
    targets: &Tensor,
    beta: f64,
    reduction: Reduction,
) -> Result<Tensor> {
    if beta <= 0.0 {
        bail!("smooth_l1_loss beta ({}) must be positive", beta);
    }
    expect_same_shape("smooth_l1_loss", predictions, targets)?;
    let abs_diff = (predictions - targets)?.abs()?;
    let quadratic = abs_diff.sqr()?.affine(0.5 / beta, 0.0)?;
    let linear = abs_diff.affine(1.0, -0.5 * beta)?;
    let loss = abs_diff.lt(beta)?.where_cond(&quadratic, &linear)?;
    reduction.apply(loss)
}

/// Huber loss: quadratic inside `delta`, linear outside.
///
/// Written through the split `|d| = min(|d|, delta) + rest`, which gives
/// `0.5 * min(|d|, delta)^2 + delta * rest` without a branch.
pub fn huber_loss(
    inputs: &Tensor,
    targets: &Tensor,
    delta: f64,
    reduction: Reduction,
) -> Result<Tensor> {
    if delta <= 0.0 {
        bail!("huber_loss delta ({}) must be positive", delta);
    }
    expect_same_shape("huber_loss", inputs, targets)?;
    let abs_errors = (inputs - targets)?.abs()?;
    let quadratic = abs_errors.minimum(delta)?;
    let linear = (abs_errors - &quadratic)?;
    let loss = (quadratic.sqr()?.affine(0.5, 0.0)? + linear.affine(delta, 0.0)?)?;
    reduction.apply(loss)
}
