use std::cmp::Ordering;

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn l2_norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Cosine similarity with precomputed norms; a zero vector scores 0.
pub fn cosine(a: &[f32], b: &[f32], a_norm: f32, b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    dot(a, b) / (a_norm * b_norm)
}

/// Highest score first; equal scores keep the lower row first.
pub fn top_k(scores: impl IntoIterator<Item = (usize, f32)>, k: usize) -> Vec<(usize, f32)> {
    let mut hits: Vec<(usize, f32)> = scores.into_iter().collect();
    hits.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });
    hits.truncate(k);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        let a = [1.0, 2.0, 2.0];
        let b = [2.0, 4.0, 4.0];
        let s = cosine(&a, &b, l2_norm(&a), l2_norm(&b));
        assert!((s - 1.0).abs() < 1e-6);
        assert_eq!(cosine(&a, &[0.0; 3], l2_norm(&a), 0.0), 0.0);
    }

    #[test]
    fn top_k_breaks_ties_by_row() {
        let hits = top_k(vec![(2, 0.5), (0, 0.9), (1, 0.5), (3, 0.1)], 3);
        assert_eq!(hits, vec![(0, 0.9), (1, 0.5), (2, 0.5)]);
        assert!(top_k(Vec::new(), 5).is_empty());
    }
}
