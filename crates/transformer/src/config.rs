//! Transformer hyperparameters.

use candle_core::{bail, Result};
use candle_nn::Activation;
use serde::{Deserialize, Serialize};

/// Hyperparameters shared by the encoder and decoder stacks.
///
/// The defaults describe the classic base model: width 512, 8 heads, six
/// layers per side, post-norm residuals, relu MLPs four times the model
/// width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    /// Model width carried through every layer.
    pub dims: usize,
    /// Attention heads per layer.
    pub num_heads: usize,
    /// Encoder depth.
    pub num_encoder_layers: usize,
    /// Decoder depth.
    pub num_decoder_layers: usize,
    /// Hidden width of the per-layer MLP; `None` means `4 * dims`.
    pub mlp_dims: Option<usize>,
    /// Dropout probability inside every layer.
    pub dropout: f32,
    /// Activation between the two MLP linears.
    pub activation: Activation,
    /// Normalize before each sublayer instead of after the residual sum.
    pub norm_first: bool,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            dims: 512,
            num_heads: 8,
            num_encoder_layers: 6,
            num_decoder_layers: 6,
            mlp_dims: None,
            dropout: 0.0,
            activation: Activation::Relu,
            norm_first: false,
        }
    }
}

impl TransformerConfig {
    /// MLP hidden width with the default expansion applied.
    pub fn mlp_dims_or_default(&self) -> usize {
        self.mlp_dims.unwrap_or(4 * self.dims)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dims == 0 {
            bail!("dims must be greater than zero");
        }
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
        if !(0.0..1.0).contains(&self.dropout) {
            bail!("dropout ({}) must be in [0, 1)", self.dropout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TransformerConfig::default();
        assert_eq!(config.dims, 512);
        assert_eq!(config.num_heads, 8);
        assert_eq!(config.num_encoder_layers, 6);
        assert_eq!(config.num_decoder_layers, 6);
        assert_eq!(config.mlp_dims_or_default(), 2048);
        assert_eq!(config.activation, Activation::Relu);
        assert!(!config.norm_first);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn explicit_mlp_dims_win_over_expansion() {
        let config = TransformerConfig {
            mlp_dims: Some(128),
            ..TransformerConfig::default()
        };
        assert_eq!(config.mlp_dims_or_default(), 128);
    }

    #[test]
    fn rejects_indivisible_heads() {
        let config = TransformerConfig {
            dims: 100,
            num_heads: 7,
            ..TransformerConfig::default()
        };
        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains("100") && msg.contains("7"), "{msg}");
    }

    #[test]
    fn rejects_out_of_range_dropout() {
        for dropout in [1.0, 1.5, -0.1] {
            let config = TransformerConfig {
                dropout,
                ..TransformerConfig::default()
            };
            assert!(config.validate().is_err(), "dropout {dropout} accepted");
        }
    }

    #[test]
    fn rejects_zero_dims() {
        let config = TransformerConfig {
            dims: 0,
            ..TransformerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults_filled_in() {
        let config: TransformerConfig =
            serde_json::from_str(r#"{"dims": 64, "num_heads": 4, "activation": "gelu"}"#).unwrap();
        assert_eq!(config.dims, 64);
        assert_eq!(config.num_heads, 4);
        assert_eq!(config.activation, Activation::Gelu);
        assert_eq!(config.num_encoder_layers, 6);
        assert!(!config.norm_first);
    }
}
