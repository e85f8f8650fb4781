//! Scaled dot-product attention with learned projections.

use candle_core::{bail, Result, Tensor};
use candle_nn::{Linear, Module, VarBuilder};

use crate::config::MultiHeadAttentionConfig;

/// Multi-head scaled dot-product attention.
///
/// Queries, keys, and values are projected, split into `num_heads` heads,
/// scored as `(q * scale) @ k^T` with `scale = sqrt(1 / head_dim)`, softmaxed
/// over keys, and recombined through the output projection. An optional
/// additive mask is broadcast onto the `(batch, heads, q_len, k_len)` score
/// tensor before the softmax; see [`crate::masks`] for builders.
#[derive(Debug, Clone)]
pub struct MultiHeadAttention {
    query_proj: Linear,
    key_proj: Linear,
    value_proj: Linear,
    out_proj: Linear,
    num_heads: usize,
}

fn projection(in_dims: usize, out_dims: usize, bias: bool, vb: VarBuilder) -> Result<Linear> {
    if bias {
        candle_nn::linear(in_dims, out_dims, vb)
    } else {
        candle_nn::linear_no_bias(in_dims, out_dims, vb)
    }
}

impl MultiHeadAttention {
    /// Validate `config` and register the four projections under `vb`.
    pub fn new(config: MultiHeadAttentionConfig, vb: VarBuilder) -> Result<Self> {
        config.validate()?;
        let dims = config.projection_dims();
        let query_proj =
            projection(dims.query_input, config.dims, config.bias, vb.pp("query_proj"))?;
        let key_proj = projection(dims.key_input, config.dims, config.bias, vb.pp("key_proj"))?;
        let value_proj =
            projection(dims.value_input, dims.value, config.bias, vb.pp("value_proj"))?;
        let out_proj = projection(dims.value, dims.value_output, config.bias, vb.pp("out_proj"))?;

        log::debug!(
            "multi-head attention: dims={} num_heads={} head_dim={} value_dims={} bias={}",
            config.dims,
            config.num_heads,
            config.dims / config.num_heads,
            dims.value,
            config.bias,
        );

        Ok(Self {
            query_proj,
            key_proj,
            value_proj,
            out_proj,
            num_heads: config.num_heads,
        })
    }

    /// Attend over `keys`/`values` with `queries`.
    ///
    /// All inputs are `(batch, seq, width)`. Output is
    /// `(batch, q_len, value_output_dims)`, which under a symmetric config
    /// matches the query shape.
    pub fn forward(
        &self,
        queries: &Tensor,
        keys: &Tensor,
        values: &Tensor,
        mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        let queries = self.query_proj.forward(queries)?;
        let keys = self.key_proj.forward(keys)?;
        let values = self.value_proj.forward(values)?;

        let (batch, q_len, dims) = queries.dims3()?;
        let (key_batch, k_len, _) = keys.dims3()?;
        let (value_batch, value_len, _) = values.dims3()?;
        if key_batch != batch || value_batch != batch {
            bail!(
                "attention inputs disagree on batch size: queries {}, keys {}, values {}",
                batch,
                key_batch,
                value_batch
            );
        }
        if value_len != k_len {
            bail!(
                "keys and values disagree on sequence length: keys {}, values {}",
                k_len,
                value_len
            );
        }

        let head_dim = dims / self.num_heads;
        let queries = queries
            .reshape((batch, q_len, self.num_heads, head_dim))?
            .transpose(1, 2)?
            .contiguous()?;
        let keys = keys
            .reshape((batch, k_len, self.num_heads, head_dim))?
            .permute((0, 2, 3, 1))?
            .contiguous()?;
        let values = values
            .reshape((batch, k_len, self.num_heads, ()))?
            .transpose(1, 2)?
            .contiguous()?;

        // Scale queries ahead of the matmul so scores arrive normalized.
        let scale = (1.0 / head_dim as f64).sqrt();
        let scores = queries.affine(scale, 0.0)?.matmul(&keys)?;
        let scores = match mask {
            Some(mask) => scores.broadcast_add(&mask.to_dtype(scores.dtype())?)?,
            None => scores,
        };
        let weights = candle_nn::ops::softmax_last_dim(&scores)?;

        let context = weights
            .matmul(&values)?
            .transpose(1, 2)?
            .contiguous()?
            .reshape((batch, q_len, ()))?;
        self.out_proj.forward(&context)
    }
}
