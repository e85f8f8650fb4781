//! Encoder-side layers and stack.

use attention::{MultiHeadAttention, MultiHeadAttentionConfig};
use candle_core::{Result, Tensor};
use candle_nn::{layer_norm, linear, Activation, Dropout, LayerNorm, Linear, Module, VarBuilder};

use crate::TransformerConfig;

/// One encoder layer: self-attention followed by a two-linear MLP.
///
/// With `norm_first` the layer normalizes before each sublayer and adds the
/// sublayer output to the unnormalized stream; otherwise it normalizes the
/// residual sums. Dropout sits after the attention output and after the MLP
/// activation.
#[derive(Debug, Clone)]
pub struct TransformerEncoderLayer {
    attention: MultiHeadAttention,
    ln1: LayerNorm,
    ln2: LayerNorm,
    linear1: Linear,
    linear2: Linear,
    dropout1: Dropout,
    dropout2: Dropout,
    activation: Activation,
    norm_first: bool,
}

impl TransformerEncoderLayer {
    pub fn new(config: &TransformerConfig, vb: VarBuilder) -> Result<Self> {
        let attention = MultiHeadAttention::new(
            MultiHeadAttentionConfig::new(config.dims, config.num_heads),
            vb.pp("attention"),
        )?;
        let ln1 = layer_norm(config.dims, 1e-5, vb.pp("ln1"))?;
        let ln2 = layer_norm(config.dims, 1e-5, vb.pp("ln2"))?;
        let mlp_dims = config.mlp_dims_or_default();
        let linear1 = linear(config.dims, mlp_dims, vb.pp("linear1"))?;
        let linear2 = linear(mlp_dims, config.dims, vb.pp("linear2"))?;

        Ok(Self {
            attention,
            ln1,
            ln2,
            linear1,
            linear2,
            dropout1: Dropout::new(config.dropout),
            dropout2: Dropout::new(config.dropout),
            activation: config.activation,
            norm_first: config.norm_first,
        })
    }

    pub fn forward(&self, x: &Tensor, mask: Option<&Tensor>, train: bool) -> Result<Tensor> {
        if self.norm_first {
            let y = self.ln1.forward(x)?;
            let y = self.attention.forward(&y, &y, &y, mask)?;
            let x = (x + self.dropout1.forward(&y, train)?)?;

            let y = self.ln2.forward(&x)?;
            let y = self.linear1.forward(&y)?;
            let y = self.activation.forward(&y)?;
            let y = self.dropout2.forward(&y, train)?;
            let y = self.linear2.forward(&y)?;
            x + y
        } else {
            let y = self.attention.forward(x, x, x, mask)?;
            let x = self.ln1.forward(&(x + self.dropout1.forward(&y, train)?)?)?;

            let y = self.linear1.forward(&x)?;
            let y = self.activation.forward(&y)?;
            let y = self.dropout2.forward(&y, train)?;
            let y = self.linear2.forward(&y)?;
            self.ln2.forward(&(x + y)?)
        }
    }
}

/// Stack of encoder layers with a final layer norm.
#[derive(Debug, Clone)]
pub struct TransformerEncoder {
    layers: Vec<TransformerEncoderLayer>,
    ln: LayerNorm,
}

impl TransformerEncoder {
    /// Build `config.num_encoder_layers` layers under `layers.{i}` plus the
    /// closing norm under `ln`.
    pub fn new(config: &TransformerConfig, vb: VarBuilder) -> Result<Self> {
        config.validate()?;
        let vb_layers = vb.pp("layers");
        let mut layers = Vec::with_capacity(config.num_encoder_layers);
        for index in 0..config.num_encoder_layers {
            layers.push(TransformerEncoderLayer::new(
                config,
                vb_layers.pp(index.to_string()),
            )?);
        }
        let ln = layer_norm(config.dims, 1e-5, vb.pp("ln"))?;
        Ok(Self { layers, ln })
    }

    pub fn forward(&self, x: &Tensor, mask: Option<&Tensor>, train: bool) -> Result<Tensor> {
        let mut x = x.clone();
        for layer in &self.layers {
            x = layer.forward(&x, mask, train)?;
        }
        self.ln.forward(&x)
    }

    /// Number of stacked layers.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}
