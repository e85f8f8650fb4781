//! Loss functions over candle tensors.
//!
//! Every loss is a stateless free function taking tensor inputs plus an
//! explicit [`Reduction`], and returns the per-element loss (`None`) or a
//! scalar (`Mean` / `Sum`). Class-axis parameters are generic over
//! `candle_core::shape::Dim`, so `D::Minus1` and plain indices both work:
//!
//! ```no_run
//! use candle_core::{D, Device, Tensor};
//! use losses::{cross_entropy, Reduction};
//!
//! # fn main() -> candle_core::Result<()> {
//! let device = Device::Cpu;
//! let logits = Tensor::randn(0f32, 1.0, (4, 10), &device)?;
//! let targets = Tensor::new(&[0u32, 3, 9, 2], &device)?;
//! let loss = cross_entropy(&logits, &targets, None, D::Minus1, 0.0, Reduction::Mean)?;
//! # Ok(())
//! # }
//! ```
//!
//! Shape mismatches and out-of-range factors fail immediately with the
//! offending values in the message; nothing here retries or recovers.

mod checks;
mod classification;
mod embedding;
mod reduction;
mod regression;

pub use classification::{
    binary_cross_entropy, cross_entropy, dice_loss, focal_loss, hinge_loss, kl_div_loss, nll_loss,
};
pub use embedding::{contrastive_loss, cosine_similarity_loss};
pub use reduction::{ParseReductionError, Reduction};
pub use regression::{huber_loss, l1_loss, mse_loss, smooth_l1_loss};
