//! Losses over paired embedding vectors.
//!
//! Both losses take `(batch, dims)` embedding pairs plus a per-pair target
//! and work along axis 1 of the pair.

use candle_core::{bail, Result, Tensor};

use crate::checks::expect_same_shape;
use crate::Reduction;

fn expect_embedding_pair(name: &'static str, lhs: &Tensor, rhs: &Tensor) -> Result<()> {
    expect_same_shape(name, lhs, rhs)?;
    if lhs.rank() < 2 {
        bail!(
            "{} expects (batch, dims) embeddings, got shape {:?}",
            name,
            lhs.dims()
        );
    }
    Ok(())
}

fn expect_per_pair_targets(name: &'static str, targets: &Tensor, per_pair: &Tensor) -> Result<()> {
    if targets.dims() != per_pair.dims() {
        bail!(
            "{}: targets shape {:?} does not match the per-pair shape {:?}",
            name,
            targets.dims(),
            per_pair.dims()
        );
    }
    Ok(())
}

/// Contrastive loss over embedding pairs.
///
/// `targets` is `1` for similar pairs and `0` for dissimilar ones. Similar
/// pairs are pulled together by their Euclidean distance; dissimilar pairs
/// are pushed until at least `margin` apart.
pub fn contrastive_loss(
    embeddings1: &Tensor,
    embeddings2: &Tensor,
    targets: &Tensor,
    margin: f64,
    reduction: Reduction,
) -> Result<Tensor> {
    expect_embedding_pair("contrastive_loss", embeddings1, embeddings2)?;
    let distances = (embeddings1 - embeddings2)?.sqr()?.sum(1)?.sqrt()?;
    expect_per_pair_targets("contrastive_loss", targets, &distances)?;

    let pull = (targets * &distances)?;
    let push = (distances.affine(-1.0, margin)?.relu()? * targets.affine(-1.0, 1.0)?)?;
    reduction.apply((pull + push)?)
}

/// Cosine-embedding loss over embedding pairs.
///
/// Pairs labeled `1` are pulled toward cosine similarity one; any other
/// label pushes the similarity below `margin`. `eps` sits inside the norm
/// square roots so zero vectors stay finite.
pub fn cosine_similarity_loss(
    embeddings1: &Tensor,
    embeddings2: &Tensor,
    targets: &Tensor,
    eps: f64,
    margin: f64,
    reduction: Reduction,
) -> Result<Tensor> {
    expect_embedding_pair("cosine_similarity_loss", embeddings1, embeddings2)?;
    let dot = (embeddings1 * embeddings2)?.sum(1)?;
    let norm1 = (embeddings1.sqr()?.sum(1)? + eps)?.sqrt()?;
    let norm2 = (embeddings2.sqr()?.sum(1)? + eps)?.sqrt()?;
    let cos = (dot / (norm1 * norm2)?)?;
    expect_per_pair_targets("cosine_similarity_loss", targets, &cos)?;

    let similar = cos.affine(-1.0, 1.0)?;
    let dissimilar = cos.affine(1.0, -margin)?.relu()?;
    let loss = targets.eq(1.0)?.where_cond(&similar, &dissimilar)?;
    reduction.apply(loss)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn contrastive_pulls_similar_and_pushes_dissimilar_pairs() -> Result<()> {
        let device = Device::Cpu;
        // Distances per pair: 0, 5, 0.25.
        let a = Tensor::from_vec(vec![1f32, 1.0, 0.0, 0.0, 0.0, 0.0], (3, 2), &device)?;
        let b = Tensor::from_vec(vec![1f32, 1.0, 3.0, 4.0, 0.25, 0.0], (3, 2), &device)?;
        let targets = Tensor::from_vec(vec![1f32, 0.0, 0.0], (3,), &device)?;

        let loss = contrastive_loss(&a, &b, &targets, 1.0, Reduction::None)?.to_vec1::<f32>()?;
        // Identical similar pair costs nothing; a dissimilar pair past the
        // margin costs nothing; a close dissimilar pair pays margin - d.
        assert!((loss[0] - 0.0).abs() < 1e-6, "{loss:?}");
        assert!((loss[1] - 0.0).abs() < 1e-6, "{loss:?}");
        assert!((loss[2] - 0.75).abs() < 1e-6, "{loss:?}");
        Ok(())
    }

    #[test]
    fn contrastive_charges_similar_pairs_their_distance() -> Result<()> {
        let device = Device::Cpu;
        let a = Tensor::from_vec(vec![0f32, 0.0], (1, 2), &device)?;
        let b = Tensor::from_vec(vec![3f32, 4.0], (1, 2), &device)?;
        let targets = Tensor::from_vec(vec![1f32], (1,), &device)?;

        let loss = contrastive_loss(&a, &b, &targets, 1.0, Reduction::None)?.to_vec1::<f32>()?;
        assert!((loss[0] - 5.0).abs() < 1e-5, "{loss:?}");
        Ok(())
    }

    #[test]
    fn cosine_loss_on_parallel_orthogonal_and_opposite_pairs() -> Result<()> {
        let device = Device::Cpu;
        let a = Tensor::from_vec(
            vec![3f32, 4.0, 1.0, 0.0, 2.0, 0.0],
            (3, 2),
            &device,
        )?;
        let b = Tensor::from_vec(
            vec![6f32, 8.0, 0.0, 1.0, -2.0, 0.0],
            (3, 2),
            &device,
        )?;
        // Pair 0 parallel (label 1), pair 1 orthogonal (label 0), pair 2
        // opposite (label 0).
        let targets = Tensor::from_vec(vec![1f32, 0.0, 0.0], (3,), &device)?;

        let loss =
            cosine_similarity_loss(&a, &b, &targets, 1e-8, 0.0, Reduction::None)?.to_vec1::<f32>()?;
        assert!(loss[0].abs() < 1e-4, "parallel pair: {loss:?}");
        assert!(loss[1].abs() < 1e-4, "orthogonal pair: {loss:?}");
        assert!(loss[2].abs() < 1e-4, "opposite pair: {loss:?}");
        Ok(())
    }

    #[test]
    fn cosine_loss_penalizes_aligned_dissimilar_pairs() -> Result<()> {
        let device = Device::Cpu;
        let a = Tensor::from_vec(vec![1f32, 2.0], (1, 2), &device)?;
        let b = Tensor::from_vec(vec![2f32, 4.0], (1, 2), &device)?;
        let targets = Tensor::from_vec(vec![0f32], (1,), &device)?;

        let loss =
            cosine_similarity_loss(&a, &b, &targets, 1e-8, 0.0, Reduction::None)?.to_vec1::<f32>()?;
        // cos == 1 for parallel vectors, margin 0, so the full similarity is
        // the penalty.
        assert!((loss[0] - 1.0).abs() < 1e-4, "{loss:?}");
        Ok(())
    }

    #[test]
    fn cosine_loss_survives_zero_vectors() -> Result<()> {
        let device = Device::Cpu;
        let a = Tensor::zeros((1, 3), candle_core::DType::F32, &device)?;
        let b = Tensor::zeros((1, 3), candle_core::DType::F32, &device)?;
        let targets = Tensor::from_vec(vec![1f32], (1,), &device)?;

        let loss =
            cosine_similarity_loss(&a, &b, &targets, 1e-8, 0.0, Reduction::None)?.to_vec1::<f32>()?;
        assert!(loss[0].is_finite(), "{loss:?}");
        Ok(())
    }

    #[test]
    fn embedding_losses_reject_rank_one_inputs() -> Result<()> {
        let device = Device::Cpu;
        let flat = Tensor::zeros((4,), candle_core::DType::F32, &device)?;
        let targets = Tensor::zeros((4,), candle_core::DType::F32, &device)?;
        assert!(contrastive_loss(&flat, &flat, &targets, 1.0, Reduction::None).is_err());
        assert!(
            cosine_similarity_loss(&flat, &flat, &targets, 1e-8, 0.0, Reduction::None).is_err()
        );
        Ok(())
    }

    #[test]
    fn per_pair_target_shape_is_enforced() -> Result<()> {
        let device = Device::Cpu;
        let a = Tensor::zeros((3, 2), candle_core::DType::F32, &device)?;
        let targets = Tensor::zeros((2,), candle_core::DType::F32, &device)?;
        let err = contrastive_loss(&a, &a, &targets, 1.0, Reduction::None).unwrap_err();
        assert!(err.to_string().contains("targets shape"), "{err}");
        Ok(())
    }
}
