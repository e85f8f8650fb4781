//! Classification and distribution losses.

use candle_core::shape::Dim;
use candle_core::{bail, Result, Tensor};
use candle_nn::ops;

use crate::checks::{class_indices, expect_same_shape};
use crate::Reduction;

/// Cross-entropy on unnormalized logits with integer class targets.
///
/// `targets` holds class indices and must match `logits` with `axis`
/// removed. `label_smoothing` in `[0, 1)` mixes the target log-probability
/// with the per-element mean over all classes. Optional `weights` scale the
/// per-element loss, share the targets' shape, and the logits' dtype.
pub fn cross_entropy<D: Dim>(
    logits: &Tensor,
    targets: &Tensor,
    weights: Option<&Tensor>,
    axis: D,
    label_smoothing: f32,
    reduction: Reduction,
) -> Result<Tensor> {
    if !(0.0..1.0).contains(&label_smoothing) {
        bail!("label_smoothing ({}) must be in [0, 1)", label_smoothing);
    }
    let axis = axis.to_index(logits.shape(), "cross_entropy")?;

    let mut expected = logits.dims().to_vec();
    expected.remove(axis);
    if targets.dims() != expected.as_slice() {
        bail!(
            "cross_entropy: targets shape {:?} does not match logits shape {:?} with axis {} removed",
            targets.dims(),
            logits.dims(),
            axis
        );
    }

    let log_probs = ops::log_softmax(logits, axis)?;
    let indices = class_indices("cross_entropy", targets)?.unsqueeze(axis)?;
    let picked = log_probs.gather(&indices, axis)?.squeeze(axis)?;

    let loss = if label_smoothing > 0.0 {
        // Smoothing mixes the target class with the uniform distribution
        // over all classes.
        let eps = f64::from(label_smoothing);
        let nll = picked.neg()?;
        let uniform = log_probs.mean(axis)?.neg()?;
        (nll.affine(1.0 - eps, 0.0)? + uniform.affine(eps, 0.0)?)?
    } else {
        picked.neg()?
    };

    let loss = match weights {
        Some(weights) => {
            expect_same_shape("cross_entropy weights", weights, &loss)?;
            (&loss * weights)?
        }
        None => loss,
    };
    reduction.apply(loss)
}

/// Binary cross-entropy on unnormalized logits.
///
/// Evaluates `log(1 + exp(logits)) - targets * logits` through the stable
/// decomposition `relu(x) + log(1 + exp(-|x|)) - x * t`, so large-magnitude
/// logits stay finite.
pub fn binary_cross_entropy(
    logits: &Tensor,
    targets: &Tensor,
    reduction: Reduction,
) -> Result<Tensor> {
    expect_same_shape("binary_cross_entropy", logits, targets)?;
    let positive_part = logits.relu()?;
    let log_term = (logits.abs()?.neg()?.exp()? + 1.0)?.log()?;
    let linear_term = (targets * logits)?;
    let loss = ((positive_part + log_term)? - linear_term)?;
    reduction.apply(loss)
}

/// Negative log-likelihood over inputs that are already log probabilities.
pub fn nll_loss<D: Dim>(
    inputs: &Tensor,
    targets: &Tensor,
    axis: D,
    reduction: Reduction,
) -> Result<Tensor> {
    let axis = axis.to_index(inputs.shape(), "nll_loss")?;

    let mut expected = inputs.dims().to_vec();
    expected.remove(axis);
    if targets.dims() != expected.as_slice() {
        bail!(
            "nll_loss: targets shape {:?} does not match inputs shape {:?} with axis {} removed",
            targets.dims(),
            inputs.dims(),
            axis
        );
    }

    let indices = class_indices("nll_loss", targets)?.unsqueeze(axis)?;
    let picked = inputs.gather(&indices, axis)?.squeeze(axis)?;
    reduction.apply(picked.neg()?)
}

/// Kullback-Leibler divergence between log-probability tensors.
///
/// Both arguments are log probabilities; `targets` is the reference
/// distribution. The divergence is summed over `axis` before reduction.
pub fn kl_div_loss<D: Dim>(
    inputs: &Tensor,
    targets: &Tensor,
    axis: D,
    reduction: Reduction,
) -> Result<Tensor> {
    expect_same_shape("kl_div_loss", inputs, targets)?;
    let axis = axis.to_index(inputs.shape(), "kl_div_loss")?;
    let loss = (targets.exp()? * (targets - inputs)?)?.sum(axis)?;
    reduction.apply(loss)
}

/// Hinge loss for targets in `{-1, 1}`: `max(0, 1 - inputs * targets)`.
pub fn hinge_loss(inputs: &Tensor, targets: &Tensor, reduction: Reduction) -> Result<Tensor> {
    expect_same_shape("hinge_loss", inputs, targets)?;
    let loss = (inputs * targets)?.affine(-1.0, 1.0)?.relu()?;
    reduction.apply(loss)
}

/// Focal loss on unnormalized logits.
///
/// Scales the per-element binary cross-entropy by `alpha * (1 - pt)^gamma`
/// with `pt = exp(-bce)`, concentrating the loss on badly classified
/// elements.
pub fn focal_loss(
    inputs: &Tensor,
    targets: &Tensor,
    alpha: f64,
    gamma: f64,
    reduction: Reduction,
) -> Result<Tensor> {
    if gamma < 0.0 {
        bail!("focal_loss gamma ({}) must be non-negative", gamma);
    }
    let bce = binary_cross_entropy(inputs, targets, Reduction::None)?;
    let pt = bce.neg()?.exp()?;
    let focus = pt.affine(-1.0, 1.0)?.powf(gamma)?;
    let loss = (focus.affine(alpha, 0.0)? * bce)?;
    reduction.apply(loss)
}

/// Dice loss over probability inputs.
///
/// Overlap is accumulated along axis 1, the feature axis of a
/// `(batch, features, ..)` layout; `eps` keeps empty unions finite.
pub fn dice_loss(
    inputs: &Tensor,
    targets: &Tensor,
    eps: f64,
    reduction: Reduction,
) -> Result<Tensor> {
    expect_same_shape("dice_loss", inputs, targets)?;
    if inputs.rank() < 2 {
        bail!(
            "dice_loss expects at least (batch, features) inputs, got shape {:?}",
            inputs.dims()
        );
    }
    let intersection = (inputs * targets)?.sum(1)?;
    let union = (inputs.sum(1)? + targets.sum(1)?)?;
    let dice = (intersection.affine(2.0, eps)? / (union + eps)?)?;
    reduction.apply(dice.affine(-1.0, 1.0)?)
}
