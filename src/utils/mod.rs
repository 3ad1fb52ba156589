// Utility functions shared by the metric and recommender code paths.

use std::cmp::Ordering;

use crate::models::MovieId;

/// Arithmetic mean of a slice. Callers guard against empty input where an
/// empty mean would be a caller bug.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sort scored movies by score descending, ties broken by ascending movie id
/// so ranked lists are reproducible across platforms.
pub fn sort_by_score_desc(scored: &mut [(MovieId, f64)]) {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert!((mean(&[1.0, 2.0, 3.0]) - 2.0).abs() < 1e-12);
        assert!((mean(&[]) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_sort_by_score_desc() {
        let mut scored = vec![(3, 0.5), (1, 0.9), (2, 0.5)];
        sort_by_score_desc(&mut scored);

        assert_eq!(
            scored.iter().map(|(m, _)| *m).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }
}
