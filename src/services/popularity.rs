/// Popularity baseline
///
/// Predicts the train mean rating of each movie and recommends the
/// best-rated movies among those with enough ratings to trust the mean.
use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{ensure_train_nonempty, rated_items_by_user, top_unrated};
use crate::error::Result;
use crate::models::{Dataset, MovieId, RecommendResult};
use crate::services::Recommender;

#[derive(Debug, Clone)]
pub struct PopularityRecommenderConfig {
    /// Movies with fewer train ratings than this never enter a
    /// recommendation list; their mean is too noisy to rank on.
    pub minimum_num_rating: usize,
}

impl Default for PopularityRecommenderConfig {
    fn default() -> Self {
        Self {
            minimum_num_rating: 200,
        }
    }
}

pub struct PopularityRecommender {
    config: PopularityRecommenderConfig,
}

#[derive(Debug, Default, Clone, Copy)]
struct RatingStats {
    count: usize,
    sum: f64,
}

impl RatingStats {
    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

impl PopularityRecommender {
    pub fn new(config: PopularityRecommenderConfig) -> Self {
        Self { config }
    }
}

impl Recommender for PopularityRecommender {
    fn name(&self) -> &'static str {
        "popularity"
    }

    fn recommend(&self, dataset: &Dataset) -> Result<RecommendResult> {
        ensure_train_nonempty(dataset)?;

        let mut stats: HashMap<MovieId, RatingStats> = HashMap::new();
        for interaction in &dataset.train {
            let entry = stats.entry(interaction.movie_id).or_default();
            entry.count += 1;
            entry.sum += interaction.rating;
        }

        // Movies only seen in test fall back to a 0.0 prediction.
        let predicted_ratings: Vec<f64> = dataset
            .test
            .iter()
            .map(|it| stats.get(&it.movie_id).map(RatingStats::mean).unwrap_or(0.0))
            .collect();

        let candidates: Vec<(MovieId, f64)> = stats
            .iter()
            .filter(|(_, s)| s.count >= self.config.minimum_num_rating)
            .map(|(movie_id, s)| (*movie_id, s.mean()))
            .collect();

        debug!(
            candidates = candidates.len(),
            threshold = self.config.minimum_num_rating,
            "popularity candidate pool built"
        );

        let rated = rated_items_by_user(&dataset.train);
        let empty = HashSet::new();
        let mut train_users: Vec<_> = rated.keys().copied().collect();
        train_users.sort_unstable();

        let user_to_recommended_items = train_users
            .into_iter()
            .map(|user_id| {
                let user_rated = rated.get(&user_id).unwrap_or(&empty);
                (user_id, top_unrated(candidates.clone(), user_rated))
            })
            .collect();

        Ok(RecommendResult {
            predicted_ratings,
            user_to_recommended_items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_user_to_items;
    use crate::models::{Interaction, UserId};

    fn dataset(train: Vec<Interaction>, test: Vec<Interaction>) -> Dataset {
        let test_user_to_items = test_user_to_items(&test);
        Dataset {
            train,
            test,
            test_user_to_items,
            item_content: HashMap::new(),
        }
    }

    fn interaction(user_id: UserId, movie_id: MovieId, rating: f64, timestamp: i64) -> Interaction {
        Interaction {
            user_id,
            movie_id,
            rating,
            timestamp,
        }
    }

    fn config(minimum_num_rating: usize) -> PopularityRecommenderConfig {
        PopularityRecommenderConfig { minimum_num_rating }
    }

    #[test]
    fn test_higher_mean_ranks_first() {
        // m1: rated 5,5,5 by three users; m2: rated 1 once.
        let train = vec![
            interaction(1, 1, 5.0, 100),
            interaction(2, 1, 5.0, 110),
            interaction(3, 1, 5.0, 120),
            interaction(4, 2, 1.0, 130),
        ];
        let test = vec![interaction(1, 2, 4.0, 200)];
        let recommender = PopularityRecommender::new(config(1));

        let result = recommender.recommend(&dataset(train, test)).unwrap();

        for user_id in [2, 3, 4] {
            let items = result.items_for(user_id).unwrap();
            let pos_m1 = items.iter().position(|&m| m == 1);
            let pos_m2 = items.iter().position(|&m| m == 2);
            if let (Some(p1), Some(p2)) = (pos_m1, pos_m2) {
                assert!(p1 < p2, "m1 must rank above m2 for user {}", user_id);
            }
        }
        // User 1 already rated m1, so only m2 may remain.
        assert_eq!(result.items_for(1).unwrap(), &[2]);
    }

    #[test]
    fn test_prediction_is_train_mean_with_cold_fallback() {
        let train = vec![
            interaction(1, 1, 4.0, 100),
            interaction(2, 1, 2.0, 110),
        ];
        // Movie 9 never appears in train.
        let test = vec![
            interaction(3, 1, 5.0, 200),
            interaction(3, 9, 4.0, 210),
        ];
        let recommender = PopularityRecommender::new(config(1));

        let result = recommender.recommend(&dataset(train, test)).unwrap();

        assert!((result.predicted_ratings[0] - 3.0).abs() < 1e-9);
        assert_eq!(result.predicted_ratings[1], 0.0);
    }

    #[test]
    fn test_threshold_filters_candidates_without_padding() {
        let train = vec![
            interaction(1, 1, 5.0, 100),
            interaction(2, 1, 4.0, 110),
            interaction(3, 2, 5.0, 120),
        ];
        let test = vec![interaction(4, 1, 4.0, 200)];
        // Only m1 reaches two ratings.
        let recommender = PopularityRecommender::new(config(2));

        let result = recommender.recommend(&dataset(train, test)).unwrap();

        let items = result.items_for(3).unwrap();
        assert_eq!(items, &[1]);
    }
}
