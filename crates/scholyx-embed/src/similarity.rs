//! Cosine similarity between embedding vectors.
//! See ARCHITECTURE.md §3 for the degenerate-input contract.

use tracing::warn;

/// Cosine similarity in [-1, 1].
///
/// Returns exactly 0.0 when either vector has zero norm, and when the
/// dimensions disagree (two vectors are only comparable at equal dimension;
/// a mismatch is logged rather than raised).
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        warn!(a_dim = a.len(), b_dim = b.len(), "cosine called with mismatched dimensions");
        return 0.0;
    }
    if a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_similarity_is_one() {
        let v = vec![0.3, -1.2, 4.5, 0.01];
        assert!((cosine(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_opposite_vectors() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, -2.0, -3.0];
        assert!((cosine(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_zero_norm_is_zero() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine(&a, &b), 0.0);
        assert_eq!(cosine(&b, &a), 0.0);
    }

    #[test]
    fn test_mismatched_dimensions_are_zero() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine(&a, &b), 0.0);
    }

    #[test]
    fn test_bounds_hold_for_arbitrary_vectors() {
        let a = vec![3.1, -2.7, 0.4, 9.9, -0.02];
        let b = vec![-1.5, 8.8, 2.2, -3.3, 7.1];
        let sim = cosine(&a, &b);
        assert!((-1.0..=1.0).contains(&sim));
    }
}
