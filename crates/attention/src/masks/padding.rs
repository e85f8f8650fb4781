use candle_core::{bail, DType, Device, Result, Tensor};

use super::MASK_FILL;

/// Padding mask from per-batch valid key lengths.
///
/// Key positions at or beyond a batch element's valid length receive
/// [`MASK_FILL`]; lengths longer than `k_len` are clamped. The result is
/// `(batch, num_heads, q_len, k_len)`.
pub fn additive_padding_mask_from_lengths(
    key_lengths: &[usize],
    num_heads: usize,
    q_len: usize,
    k_len: usize,
    dtype: DType,
    device: &Device,
) -> Result<Tensor> {
    let batch = key_lengths.len();
    let mut data = vec![0f32; batch * num_heads * q_len * k_len];

    for (b, &valid) in key_lengths.iter().enumerate() {
        let valid = valid.min(k_len);
        for h in 0..num_heads {
            for q in 0..q_len {
                let row = (((b * num_heads) + h) * q_len + q) * k_len;
                for k in valid..k_len {
                    data[row + k] = MASK_FILL;
                }
            }
        }
    }

    Tensor::from_vec(data, (batch, num_heads, q_len, k_len), device)?.to_dtype(dtype)
}

/// Padding mask from per-key padded flags.
///
/// `padding[b][k] == true` marks key `k` of batch element `b` as padded.
/// Rows must agree on key length.
pub fn additive_padding_mask_from_booleans(
    padding: &[Vec<bool>],
    num_heads: usize,
    q_len: usize,
    dtype: DType,
    device: &Device,
) -> Result<Tensor> {
    if padding.is_empty() {
        return Tensor::zeros((0, num_heads, q_len, 0), dtype, device);
    }

    let k_len = padding[0].len();
    for (b, row) in padding.iter().enumerate() {
        if row.len() != k_len {
            bail!(
                "padding row {} has {} keys, expected {}",
                b,
                row.len(),
                k_len
            );
        }
    }

    let batch = padding.len();
    let mut data = vec![0f32; batch * num_heads * q_len * k_len];
    for (b, row) in padding.iter().enumerate() {
        for h in 0..num_heads {
            for q in 0..q_len {
                let base = (((b * num_heads) + h) * q_len + q) * k_len;
                for (k, &is_padding) in row.iter().enumerate() {
                    if is_padding {
                        data[base + k] = MASK_FILL;
                    }
                }
            }
        }
    }

    Tensor::from_vec(data, (batch, num_heads, q_len, k_len), device)?.to_dtype(dtype)
}
