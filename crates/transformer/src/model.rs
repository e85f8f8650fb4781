//! The combined encoder-decoder model.

use candle_core::{Result, Tensor};
use candle_nn::VarBuilder;

use crate::{TransformerConfig, TransformerDecoder, TransformerEncoder};

/// Encoder-decoder transformer.
///
/// `new` builds both stacks from one [`TransformerConfig`] under the
/// VarBuilder scopes `encoder` and `decoder`; [`Transformer::from_parts`]
/// accepts stacks built elsewhere, for setups the shared config cannot
/// express.
#[derive(Debug, Clone)]
pub struct Transformer {
    encoder: TransformerEncoder,
    decoder: TransformerDecoder,
}

impl Transformer {
    pub fn new(config: &TransformerConfig, vb: VarBuilder) -> Result<Self> {
        config.validate()?;
        let encoder = TransformerEncoder::new(config, vb.pp("encoder"))?;
        let decoder = TransformerDecoder::new(config, vb.pp("decoder"))?;

        log::debug!(
            "transformer: dims={} heads={} encoder_layers={} decoder_layers={} mlp_dims={} norm_first={}",
            config.dims,
            config.num_heads,
            config.num_encoder_layers,
            config.num_decoder_layers,
            config.mlp_dims_or_default(),
            config.norm_first,
        );

        Ok(Self { encoder, decoder })
    }

    /// Assemble from externally built stacks.
    pub fn from_parts(encoder: TransformerEncoder, decoder: TransformerDecoder) -> Self {
        Self { encoder, decoder }
    }

    pub fn encoder(&self) -> &TransformerEncoder {
        &self.encoder
    }

    pub fn decoder(&self) -> &TransformerDecoder {
        &self.decoder
    }

    /// Encode `src`, then decode `tgt` against the encoded memory.
    ///
    /// `src_mask` masks source self-attention, `tgt_mask` (usually causal)
    /// masks decoder self-attention, and `memory_mask` masks the decoder's
    /// view of the memory. Returns `(batch, tgt_len, dims)`.
    pub fn forward(
        &self,
        src: &Tensor,
        tgt: &Tensor,
        src_mask: Option<&Tensor>,
        tgt_mask: Option<&Tensor>,
        memory_mask: Option<&Tensor>,
        train: bool,
    ) -> Result<Tensor> {
        let memory = self.encoder.forward(src, src_mask, train)?;
        self.decoder.forward(tgt, &memory, tgt_mask, memory_mask, train)
    }
}
