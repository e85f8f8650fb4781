//! Encoder/decoder transformer layers over the candle tensor engine.
//!
//! The crate composes [`attention`] and `candle_nn` primitives into the
//! standard sequence-to-sequence stack:
//!
//! - [`TransformerEncoderLayer`] / [`TransformerDecoderLayer`]: one
//!   attention (plus cross-attention on the decoder side) and a two-linear
//!   MLP, with pre-norm or post-norm residual wiring.
//! - [`TransformerEncoder`] / [`TransformerDecoder`]: layer stacks with a
//!   final layer norm.
//! - [`Transformer`]: an encoder and decoder glued together.
//!
//! Activations are `(batch, seq, dims)`. Every forward takes a `train` flag
//! that switches the dropouts on; with dropout probability zero the flag has
//! no effect. Parameters are registered through `candle_nn::VarBuilder`, so
//! the caller's `VarMap` and optimizer own all weights.

mod config;
mod decoder;
mod encoder;
mod model;

pub use config::TransformerConfig;
pub use decoder::{TransformerDecoder, TransformerDecoderLayer};
pub use encoder::{TransformerEncoder, TransformerEncoderLayer};
pub use model::Transformer;
