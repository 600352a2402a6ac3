/// Cosine similarity of two vectors, in `[-1, 1]`.
///
/// Returns `0.0` when either vector is empty, the lengths differ, or either
/// norm is zero: an undefined similarity carries no signal.
#[must_use]
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    if left.is_empty() || left.len() != right.len() {
        return 0.0;
    }

    let mut dot = 0.0_f32;
    let mut left_norm_sq = 0.0_f32;
    let mut right_norm_sq = 0.0_f32;

    for (a, b) in left.iter().zip(right.iter()) {
        dot += a * b;
        left_norm_sq += a * a;
        right_norm_sq += b * b;
    }

    let denom = left_norm_sq.sqrt() * right_norm_sq.sqrt();
    if denom <= f32::EPSILON || !denom.is_finite() {
        return 0.0;
    }

    (dot / denom).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn identical_vectors_score_one() {
        let v = [0.3, -1.2, 4.0];
        assert!(approx(cosine_similarity(&v, &v), 1.0));
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        assert!(approx(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0));
    }

    #[test]
    fn opposite_vectors_score_minus_one() {
        assert!(approx(cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]), -1.0));
    }

    #[test]
    fn degenerate_inputs_score_zero() {
        assert!(approx(cosine_similarity(&[], &[]), 0.0));
        assert!(approx(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0));
        assert!(approx(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0));
        assert!(approx(cosine_similarity(&[1.0, 1.0], &[0.0, 0.0]), 0.0));
    }

    #[test]
    fn magnitude_does_not_matter() {
        let a = cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 1.0, 0.5]);
        let b = cosine_similarity(&[10.0, 20.0, 30.0], &[2.0, 1.0, 0.5]);
        assert!(approx(a, b));
    }
}
