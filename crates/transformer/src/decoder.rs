//! Decoder-side layers and stack.

use attention::{MultiHeadAttention, MultiHeadAttentionConfig};
use candle_core::{Result, Tensor};
use candle_nn::{layer_norm, linear, Activation, Dropout, LayerNorm, Linear, Module, VarBuilder};

use crate::TransformerConfig;

/// One decoder layer: masked self-attention, cross-attention over the
/// encoder memory, then the MLP.
///
/// Residual wiring follows [`TransformerEncoderLayer`] with one extra
/// norm/dropout pair for the cross-attention sublayer.
///
/// [`TransformerEncoderLayer`]: crate::TransformerEncoderLayer
#[derive(Debug, Clone)]
pub struct TransformerDecoderLayer {
    self_attention: MultiHeadAttention,
    cross_attention: MultiHeadAttention,
    ln1: LayerNorm,
    ln2: LayerNorm,
    ln3: LayerNorm,
    linear1: Linear,
    linear2: Linear,
    dropout1: Dropout,
    dropout2: Dropout,
    dropout3: Dropout,
    activation: Activation,
    norm_first: bool,
}

impl TransformerDecoderLayer {
    pub fn new(config: &TransformerConfig, vb: VarBuilder) -> Result<Self> {
        let attention_config = MultiHeadAttentionConfig::new(config.dims, config.num_heads);
        let self_attention =
            MultiHeadAttention::new(attention_config.clone(), vb.pp("self_attention"))?;
        let cross_attention = MultiHeadAttention::new(attention_config, vb.pp("cross_attention"))?;
        let ln1 = layer_norm(config.dims, 1e-5, vb.pp("ln1"))?;
        let ln2 = layer_norm(config.dims, 1e-5, vb.pp("ln2"))?;
        let ln3 = layer_norm(config.dims, 1e-5, vb.pp("ln3"))?;
        let mlp_dims = config.mlp_dims_or_default();
        let linear1 = linear(config.dims, mlp_dims, vb.pp("linear1"))?;
        let linear2 = linear(mlp_dims, config.dims, vb.pp("linear2"))?;

        Ok(Self {
            self_attention,
            cross_attention,
            ln1,
            ln2,
            ln3,
            linear1,
            linear2,
            dropout1: Dropout::new(config.dropout),
            dropout2: Dropout::new(config.dropout),
            dropout3: Dropout::new(config.dropout),
            activation: config.activation,
            norm_first: config.norm_first,
        })
    }

    /// `x` is the decoder stream, `memory` the encoder output. `x_mask`
    /// usually carries the causal mask; `memory_mask` hides padded memory
    /// positions.
    pub fn forward(
        &self,
        x: &Tensor,
        memory: &Tensor,
        x_mask: Option<&Tensor>,
        memory_mask: Option<&Tensor>,
        train: bool,
    ) -> Result<Tensor> {
        if self.norm_first {
            let y = self.ln1.forward(x)?;
            let y = self.self_attention.forward(&y, &y, &y, x_mask)?;
            let x = (x + self.dropout1.forward(&y, train)?)?;

            let y = self.ln2.forward(&x)?;
            let y = self.cross_attention.forward(&y, memory, memory, memory_mask)?;
            let x = (x + self.dropout2.forward(&y, train)?)?;

            let y = self.ln3.forward(&x)?;
            let y = self.linear1.forward(&y)?;
            let y = self.activation.forward(&y)?;
            let y = self.dropout3.forward(&y, train)?;
            let y = self.linear2.forward(&y)?;
            x + y
        } else {
            let y = self.self_attention.forward(x, x, x, x_mask)?;
            let x = self.ln1.forward(&(x + self.dropout1.forward(&y, train)?)?)?;

            let y = self.cross_attention.forward(&x, memory, memory, memory_mask)?;
            let x = self.ln2.forward(&(&x + self.dropout2.forward(&y, train)?)?)?;

            let y = self.linear1.forward(&x)?;
            let y = self.activation.forward(&y)?;
            let y = self.dropout3.forward(&y, train)?;
            let y = self.linear2.forward(&y)?;
            self.ln3.forward(&(x + y)?)
        }
    }
}

/// Stack of decoder layers with a final layer norm.
#[derive(Debug, Clone)]
pub struct TransformerDecoder {
    layers: Vec<TransformerDecoderLayer>,
    ln: LayerNorm,
}

impl TransformerDecoder {
    /// Build `config.num_decoder_layers` layers under `layers.{i}` plus the
    /// closing norm under `ln`.
    pub fn new(config: &TransformerConfig, vb: VarBuilder) -> Result<Self> {
        config.validate()?;
        let vb_layers = vb.pp("layers");
        let mut layers = Vec::with_capacity(config.num_decoder_layers);
        for index in 0..config.num_decoder_layers {
            layers.push(TransformerDecoderLayer::new(
                config,
                vb_layers.pp(index.to_string()),
            )?);
        }
        let ln = layer_norm(config.dims, 1e-5, vb.pp("ln"))?;
        Ok(Self { layers, ln })
    }

    pub fn forward(
        &self,
        x: &Tensor,
        memory: &Tensor,
        x_mask: Option<&Tensor>,
        memory_mask: Option<&Tensor>,
        train: bool,
    ) -> Result<Tensor> {
        let mut x = x.clone();
        for layer in &self.layers {
            x = layer.forward(&x, memory, x_mask, memory_mask, train)?;
        }
        self.ln.forward(&x)
    }

    /// Number of stacked layers.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::{VarBuilder, VarMap};

    fn small_config() -> TransformerConfig {
        TransformerConfig {
            dims: 16,
            num_heads: 4,
            num_encoder_layers: 2,
            num_decoder_layers: 2,
            ..TransformerConfig::default()
        }
    }

    fn decoder_with(config: &TransformerConfig) -> Result<TransformerDecoder> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        TransformerDecoder::new(config, vb)
    }

    #[test]
    fn output_follows_target_shape() -> Result<()> {
        let decoder = decoder_with(&small_config())?;
        let tgt = Tensor::randn(0f32, 1.0, (2, 4, 16), &Device::Cpu)?;
        let memory = Tensor::randn(0f32, 1.0, (2, 9, 16), &Device::Cpu)?;
        let out = decoder.forward(&tgt, &memory, None, None, false)?;
        assert_eq!(out.dims(), tgt.dims());
        Ok(())
    }

    #[test]
    fn pre_norm_output_follows_target_shape() -> Result<()> {
        let config = TransformerConfig {
            norm_first: true,
            ..small_config()
        };
        let decoder = decoder_with(&config)?;
        let tgt = Tensor::randn(0f32, 1.0, (1, 5, 16), &Device::Cpu)?;
        let memory = Tensor::randn(0f32, 1.0, (1, 3, 16), &Device::Cpu)?;
        let out = decoder.forward(&tgt, &memory, None, None, false)?;
        assert_eq!(out.dims(), tgt.dims());
        Ok(())
    }

    #[test]
    fn memory_feeds_into_output() -> Result<()> {
        let decoder = decoder_with(&small_config())?;
        let tgt = Tensor::randn(0f32, 1.0, (1, 4, 16), &Device::Cpu)?;
        let memory_a = Tensor::randn(0f32, 1.0, (1, 6, 16), &Device::Cpu)?;
        let memory_b = (&memory_a + 1.0)?;

        let out_a = decoder
            .forward(&tgt, &memory_a, None, None, false)?
            .flatten_all()?
            .to_vec1::<f32>()?;
        let out_b = decoder
            .forward(&tgt, &memory_b, None, None, false)?
            .flatten_all()?
            .to_vec1::<f32>()?;
        let changed = out_a
            .iter()
            .zip(out_b.iter())
            .any(|(a, b)| (a - b).abs() > 1e-4);
        assert!(changed, "cross-attention ignored the encoder memory");
        Ok(())
    }
}
