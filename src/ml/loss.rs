// ============================================================
// Layer 5 — Loss and Attention Penalty
// ============================================================
// Total loss = cross_entropy(logits, labels)
//            + coef * ‖AᵗA − I‖_F        (only when `penalize` is set)
//
// A is [batch, seq_len, hops], so AᵗA is [batch, hops, hops].
// When every hop attends to a different position the hops are
// orthonormal, AᵗA = I and the penalty vanishes. Overlapping
// hops push the off-diagonal terms (and the penalty) up.

use anyhow::{ensure, Result};
use burn::{nn::loss::CrossEntropyLossConfig, prelude::*};

use crate::ml::model::SelfAttentionConfig;

/// Added under the square root so the norm of an all-zero matrix
/// stays differentiable.
const FROBENIUS_EPSILON: f64 = 1e-10;

/// Batch-mean Frobenius norm of a `[batch, n, m]` tensor.
///
/// Any other rank is rejected with an error.
pub fn frobenius<B: Backend, const D: usize>(matrix: Tensor<B, D>) -> Result<Tensor<B, 1>> {
    ensure!(
        D == 3,
        "invalid matrix size for Frobenius function: expected rank 3, got rank {}",
        D
    );
    let dims = matrix.dims();
    let dims: &[usize] = &dims;
    Ok(batched_frobenius(matrix.reshape([dims[0], dims[1], dims[2]])))
}

fn batched_frobenius<B: Backend>(matrix: Tensor<B, 3>) -> Tensor<B, 1> {
    let [batch_size, _, _] = matrix.dims();
    let norms = matrix
        .powf_scalar(2.0)
        .sum_dim(2)
        .sum_dim(1)
        .reshape([batch_size])
        .add_scalar(FROBENIUS_EPSILON)
        .sqrt();
    norms.sum().div_scalar(batch_size as f64)
}

/// `coef * ‖AᵗA − I‖_F`, averaged over the batch.
pub fn penalization_term<B: Backend>(
    attention: Tensor<B, 3>,
    config:    &SelfAttentionConfig,
) -> Tensor<B, 1> {
    let [batch_size, _, hops] = attention.dims();
    let gram = attention.clone().swap_dims(1, 2).matmul(attention);
    let identity = Tensor::<B, 2>::eye(hops, &gram.device())
        .unsqueeze::<3>()
        .repeat_dim(0, batch_size);
    batched_frobenius(gram - identity).mul_scalar(config.coef)
}

/// Both loss terms, kept apart so the trainer can log them.
pub struct LossBreakdown<B: Backend> {
    pub total:         Tensor<B, 1>,
    pub cross_entropy: Tensor<B, 1>,
    /// `None` when the penalty is disabled
    pub penalty:       Option<Tensor<B, 1>>,
}

pub fn loss_with_breakdown<B: Backend>(
    logits:    Tensor<B, 2>,
    labels:    Tensor<B, 1, Int>,
    attention: Tensor<B, 3>,
    config:    &SelfAttentionConfig,
) -> LossBreakdown<B> {
    let cross_entropy = CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, labels);

    if !config.penalize {
        return LossBreakdown {
            total: cross_entropy.clone(),
            cross_entropy,
            penalty: None,
        };
    }

    let penalty = penalization_term(attention, config);
    LossBreakdown {
        total: cross_entropy.clone() + penalty.clone(),
        cross_entropy,
        penalty: Some(penalty),
    }
}

/// Cross entropy, plus the attention penalty when `config.penalize` is set.
pub fn loss_fn<B: Backend>(
    logits:    Tensor<B, 2>,
    labels:    Tensor<B, 1, Int>,
    attention: Tensor<B, 3>,
    config:    &SelfAttentionConfig,
) -> Tensor<B, 1> {
    loss_with_breakdown(logits, labels, attention, config).total
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn config(penalize: bool) -> SelfAttentionConfig {
        SelfAttentionConfig::new(10, 4, 3, 1, 5, 2, 6, 2)
            .with_dropout(0.0)
            .with_coef(0.1)
            .with_penalize(penalize)
    }

    fn scalar(t: Tensor<TestBackend, 1>) -> f32 {
        t.into_data().to_vec::<f32>().unwrap()[0]
    }

    #[test]
    fn test_frobenius_of_zero_matrix_is_epsilon_only() {
        let device = Default::default();
        let zeros = Tensor::<TestBackend, 3>::zeros([3, 4, 4], &device);
        let norm = scalar(frobenius(zeros).unwrap());
        // sqrt(1e-10) = 1e-5
        assert!(norm.abs() < 1e-4, "norm = {norm}");
    }

    #[test]
    fn test_frobenius_averages_over_batch() {
        let device = Default::default();
        // ‖ones(2x2)‖ = 2, ‖zeros‖ ≈ 0 → mean ≈ 1
        let m = Tensor::<TestBackend, 3>::from_floats(
            [[[1.0, 1.0], [1.0, 1.0]], [[0.0, 0.0], [0.0, 0.0]]],
            &device,
        );
        let norm = scalar(frobenius(m).unwrap());
        assert!((norm - 1.0).abs() < 1e-4, "norm = {norm}");
    }

    #[test]
    fn test_frobenius_rejects_rank_2() {
        let device = Default::default();
        let m = Tensor::<TestBackend, 2>::zeros([3, 3], &device);
        let err = frobenius(m).unwrap_err();
        assert!(err.to_string().contains("invalid matrix size"));
    }

    #[test]
    fn test_frobenius_rejects_rank_4() {
        let device = Default::default();
        let m = Tensor::<TestBackend, 4>::zeros([2, 3, 3, 3], &device);
        assert!(frobenius(m).is_err());
    }

    #[test]
    fn test_penalty_vanishes_for_orthonormal_hops() {
        let device = Default::default();
        // seq_len = 3, hops = 2; hop 0 on position 0, hop 1 on position 2
        let attention = Tensor::<TestBackend, 3>::from_floats(
            [
                [[1.0, 0.0], [0.0, 0.0], [0.0, 1.0]],
                [[0.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
            ],
            &device,
        );
        let p = scalar(penalization_term(attention, &config(true)));
        assert!(p.abs() < 1e-4, "penalty = {p}");
    }

    #[test]
    fn test_penalty_of_zero_attention_is_identity_norm() {
        let device = Default::default();
        // ‖0 − I₃‖ = sqrt(3)
        let attention = Tensor::<TestBackend, 3>::zeros([2, 5, 3], &device);
        let p = scalar(penalization_term(attention, &config(true).with_coef(1.0)));
        assert!((p - 3f32.sqrt()).abs() < 1e-4, "penalty = {p}");
    }

    #[test]
    fn test_penalty_positive_for_redundant_hops() {
        let device = Default::default();
        // Both hops spread uniformly: identical, non-orthogonal rows
        let attention = Tensor::<TestBackend, 3>::ones([2, 4, 2], &device).div_scalar(4.0);
        let p = scalar(penalization_term(attention, &config(true)));
        assert!(p > 1e-3, "penalty = {p}");
    }

    #[test]
    fn test_penalty_scales_with_coef() {
        let device = Default::default();
        let attention = Tensor::<TestBackend, 3>::ones([1, 4, 2], &device).div_scalar(4.0);
        let low  = scalar(penalization_term(attention.clone(), &config(true).with_coef(1.0)));
        let high = scalar(penalization_term(attention, &config(true).with_coef(3.0)));
        assert!((high - 3.0 * low).abs() < 1e-5);
    }

    fn loss_inputs(
        device: &<TestBackend as Backend>::Device,
    ) -> (Tensor<TestBackend, 2>, Tensor<TestBackend, 1, Int>, Tensor<TestBackend, 3>) {
        let logits = Tensor::from_floats([[2.0, -1.0], [0.3, 0.7]], device);
        let labels = Tensor::from_ints([0, 1], device);
        let attention = Tensor::<TestBackend, 3>::ones([2, 3, 2], device).div_scalar(3.0);
        (logits, labels, attention)
    }

    #[test]
    fn test_unpenalized_loss_is_plain_cross_entropy() {
        let device = Default::default();
        let (logits, labels, attention) = loss_inputs(&device);

        let expected = CrossEntropyLossConfig::new()
            .init(&device)
            .forward(logits.clone(), labels.clone());
        let loss = loss_fn(logits, labels, attention, &config(false));

        let expected: Vec<f32> = expected.into_data().to_vec().unwrap();
        let loss: Vec<f32> = loss.into_data().to_vec().unwrap();
        assert_eq!(loss, expected);
    }

    #[test]
    fn test_penalized_loss_adds_scaled_term() {
        let device = Default::default();
        let (logits, labels, attention) = loss_inputs(&device);
        let cfg = config(true);

        let ce = scalar(
            CrossEntropyLossConfig::new()
                .init(&device)
                .forward(logits.clone(), labels.clone()),
        );
        let penalty = scalar(penalization_term(attention.clone(), &cfg));
        let total = scalar(loss_fn(logits, labels, attention, &cfg));

        assert!(penalty > 0.0);
        assert!((total - (ce + penalty)).abs() < 1e-6);
    }

    #[test]
    fn test_breakdown_reports_penalty_only_when_enabled() {
        let device = Default::default();
        let (logits, labels, attention) = loss_inputs(&device);

        let off = loss_with_breakdown(logits.clone(), labels.clone(), attention.clone(), &config(false));
        assert!(off.penalty.is_none());

        let on = loss_with_breakdown(logits, labels, attention, &config(true));
        assert!(on.penalty.is_some());
    }
}
