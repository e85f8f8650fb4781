//! Multi-head attention over the candle tensor engine.
//!
//! The crate hosts the learned attention module used by the transformer
//! layers plus builders for the additive masks fed into it:
//!
//! - [`MultiHeadAttention`] projects queries, keys, and values with
//!   `candle_nn` linear layers and runs scaled dot-product attention per
//!   head.
//! - [`masks`] builds causal and padding masks that are broadcast-added to
//!   attention scores before the softmax.
//!
//! Activations follow the `(batch, seq, width)` convention throughout.
//! Parameters are registered through `candle_nn::VarBuilder`, so ownership
//! and updates stay with the caller's `VarMap` and optimizer.

pub mod config;
pub mod masks;
mod mha;

pub use config::MultiHeadAttentionConfig;
pub use mha::MultiHeadAttention;
