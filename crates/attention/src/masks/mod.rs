//! Additive attention-mask builders.
//!
//! Masks are added to attention scores before the softmax: `0` keeps a
//! position, [`MASK_FILL`] suppresses it. Builders assemble the mask on the
//! host, upload it with `Tensor::from_vec`, and cast to the requested dtype
//! so the same mask can feed f32, f16, or bf16 score tensors.

mod causal;
mod padding;


pub use causal::additive_causal_mask;
pub use padding::{additive_padding_mask_from_booleans, additive_padding_mask_from_lengths};

/// Fill value for suppressed positions.
///
/// Large but finite, so a row whose keys are all masked still softmaxes to
/// a uniform distribution instead of NaN.
pub const MASK_FILL: f32 = -1e9;
