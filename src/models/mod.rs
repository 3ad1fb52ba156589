use std::collections::HashMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub type UserId = u64;
pub type MovieId = u64;

/// Upper bound on the length of any per-user recommendation list.
pub const MAX_RECOMMENDATIONS: usize = 10;

/// A single user-movie rating event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f64,
    pub timestamp: i64,
}

/// Content metadata for one movie. `tags` is empty for movies nobody tagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Immutable bundle produced once by the loader/splitter and shared
/// read-only with every recommender and the evaluator.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub train: Vec<Interaction>,
    pub test: Vec<Interaction>,
    /// Ground truth: movies each user rated >= 4.0 in the held-out period.
    /// Users without such a rating are absent; look up with a default of
    /// an empty slice.
    pub test_user_to_items: HashMap<UserId, Vec<MovieId>>,
    pub item_content: HashMap<MovieId, ItemMetadata>,
}

impl Dataset {
    /// True if the user appears in either partition.
    pub fn knows_user(&self, user_id: UserId) -> bool {
        self.train.iter().any(|it| it.user_id == user_id)
            || self.test.iter().any(|it| it.user_id == user_id)
    }

    /// Ratings of the test interactions, in test order. This is the
    /// ground-truth side of the RMSE pairing.
    pub fn test_ratings(&self) -> Vec<f64> {
        self.test.iter().map(|it| it.rating).collect()
    }
}

/// Output of a single recommender run.
///
/// `predicted_ratings` is aligned 1:1 with `dataset.test`;
/// `user_to_recommended_items` maps each user to at most
/// [`MAX_RECOMMENDATIONS`] movies ranked best-first.
#[derive(Debug, Clone, Default)]
pub struct RecommendResult {
    pub predicted_ratings: Vec<f64>,
    pub user_to_recommended_items: HashMap<UserId, Vec<MovieId>>,
}

impl RecommendResult {
    /// Ranked recommendations for one user. Fails with
    /// [`AppError::UnknownUser`] when the user is absent from the index.
    pub fn items_for(&self, user_id: UserId) -> Result<&[MovieId]> {
        self.user_to_recommended_items
            .get(&user_id)
            .map(Vec::as_slice)
            .ok_or(AppError::UnknownUser(user_id))
    }
}

/// Evaluation scores for one recommender run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub rmse: f64,
    pub precision_at_k: f64,
    pub recall_at_k: f64,
}

/// Dense item embeddings in a stable item-index order, ready for a
/// vector-index sink. One row per item.
#[derive(Debug, Clone)]
pub struct ItemEmbeddings {
    pub item_ids: Vec<MovieId>,
    pub vectors: Array2<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interaction(user_id: UserId, movie_id: MovieId) -> Interaction {
        Interaction {
            user_id,
            movie_id,
            rating: 4.0,
            timestamp: 0,
        }
    }

    #[test]
    fn test_knows_user_checks_both_partitions() {
        let dataset = Dataset {
            train: vec![interaction(1, 10)],
            test: vec![interaction(2, 20)],
            test_user_to_items: HashMap::new(),
            item_content: HashMap::new(),
        };

        assert!(dataset.knows_user(1));
        assert!(dataset.knows_user(2));
        assert!(!dataset.knows_user(3));
    }

    #[test]
    fn test_items_for_unknown_user() {
        let result = RecommendResult::default();

        match result.items_for(42) {
            Err(AppError::UnknownUser(42)) => {}
            other => panic!("expected UnknownUser, got {:?}", other),
        }
    }
}
