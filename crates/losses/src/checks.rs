//! Input validation shared by the loss functions.

use candle_core::{bail, DType, Result, Tensor};

/// Fail with both shapes when two paired inputs disagree.
pub(crate) fn expect_same_shape(name: &'static str, lhs: &Tensor, rhs: &Tensor) -> Result<()> {
    if lhs.dims() != rhs.dims() {
        bail!(
            "{}: shape mismatch between inputs {:?} and targets {:?}",
            name,
            lhs.dims(),
            rhs.dims()
        );
    }
    Ok(())
}

/// Normalize integer class indices to `U32` for `gather`.
pub(crate) fn class_indices(name: &'static str, targets: &Tensor) -> Result<Tensor> {
    match targets.dtype() {
        DType::U32 => Ok(targets.clone()),
        DType::U8 | DType::I64 => targets.to_dtype(DType::U32),
        other => bail!(
            "{}: target class indices must be integers, got {:?}",
            name,
            other
        ),
    }
}
