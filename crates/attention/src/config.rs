//! Shape configuration for multi-head attention.

use candle_core::{bail, Result};
use serde::{Deserialize, Serialize};

/// Projection widths and head count for [`MultiHeadAttention`].
///
/// Only `dims` and `num_heads` are required. The optional widths cover
/// asymmetric setups such as cross-attention over a memory with a different
/// width; each one falls back to `dims` when unset, except
/// `value_input_dims` which follows the resolved key input width.
///
/// [`MultiHeadAttention`]: crate::MultiHeadAttention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiHeadAttentionConfig {
    /// Width of the projected queries and keys.
    pub dims: usize,
    /// Number of attention heads.
    pub num_heads: usize,
    /// Width of incoming queries.
    #[serde(default)]
    pub query_input_dims: Option<usize>,
    /// Width of incoming keys.
    #[serde(default)]
    pub key_input_dims: Option<usize>,
    /// Width of incoming values.
    #[serde(default)]
    pub value_input_dims: Option<usize>,
    /// Width of the projected values.
    #[serde(default)]
    pub value_dims: Option<usize>,
    /// Width of the attention output.
    #[serde(default)]
    pub value_output_dims: Option<usize>,
    /// Attach bias vectors to the projections.
    #[serde(default)]
    pub bias: bool,
}

/// Projection widths with every default applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ProjectionDims {
    pub query_input: usize,
    pub key_input: usize,
    pub value_input: usize,
    pub value: usize,
    pub value_output: usize,
}

impl MultiHeadAttentionConfig {
    /// Symmetric configuration: every width equals `dims`, no bias.
    pub fn new(dims: usize, num_heads: usize) -> Self {
        Self {
            dims,
            num_heads,
            query_input_dims: None,
            key_input_dims: None,
            value_input_dims: None,
            value_dims: None,
            value_output_dims: None,
            bias: false,
        }
    }

    pub(crate) fn projection_dims(&self) -> ProjectionDims {
        let key_input = self.key_input_dims.unwrap_or(self.dims);
        ProjectionDims {
            query_input: self.query_input_dims.unwrap_or(self.dims),
            key_input,
            value_input: self.value_input_dims.unwrap_or(key_input),
            value: self.value_dims.unwrap_or(self.dims),
            value_output: self.value_output_dims.unwrap_or(self.dims),
        }
    }

    /// Check head divisibility before any parameter is allocated.
    pub fn validate(&self) -> Result<()> {
        if self.num_heads == 0 {
            bail!("num_heads must be greater than zero");
        }
        if self.dims % self.num_heads != 0 {
            bail!(
                "dims ({}) must be divisible by num_heads ({})",
                self.dims,
                self.num_heads
            );
        }
        let value_dims = self.projection_dims().value;
        if value_dims % self.num_heads != 0 {
            bail!(
                "value_dims ({}) must be divisible by num_heads ({})",
                value_dims,
                self.num_heads
            );
        }
        Ok(())
    }
}
