use candle_core::{DType, Device, Result, Tensor};

use super::MASK_FILL;

/// Square additive causal mask.
///
/// Entry `(i, j)` is `0` for `j <= i` and [`MASK_FILL`] for `j > i`, so every
/// query attends to itself and earlier keys only. The `(seq_len, seq_len)`
/// result broadcasts against `(batch, heads, seq_len, seq_len)` scores.
pub fn additive_causal_mask(seq_len: usize, dtype: DType, device: &Device) -> Result<Tensor> {
    let mut data = vec![0f32; seq_len * seq_len];
    for i in 0..seq_len {
        for j in (i + 1)..seq_len {
            data[i * seq_len + j] = MASK_FILL;
        }
    }
    Tensor::from_vec(data, (seq_len, seq_len), device)?.to_dtype(dtype)
}
