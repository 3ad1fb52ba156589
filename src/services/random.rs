/// Random baseline
///
/// Draws every (user, item) prediction uniformly from [0.5, 5.0). Useful as
/// the floor every other variant has to beat.
use std::collections::HashSet;

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use ndarray::Array2;
use tracing::debug;

use super::{ensure_train_nonempty, rated_items_by_user, top_unrated, InteractionMatrix};
use crate::error::Result;
use crate::models::{Dataset, MovieId, RecommendResult};
use crate::services::Recommender;

/// Prediction range matches the MovieLens rating scale.
const RATING_LOW: f64 = 0.5;
const RATING_HIGH: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct RandomRecommenderConfig {
    pub seed: u64,
}

impl Default for RandomRecommenderConfig {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

pub struct RandomRecommender {
    config: RandomRecommenderConfig,
}

impl RandomRecommender {
    pub fn new(config: RandomRecommenderConfig) -> Self {
        Self { config }
    }
}

impl Recommender for RandomRecommender {
    fn name(&self) -> &'static str {
        "random"
    }

    fn recommend(&self, dataset: &Dataset) -> Result<RecommendResult> {
        ensure_train_nonempty(dataset)?;

        let index = InteractionMatrix::from_train(&dataset.train, 0.0)?;
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let dist = Uniform::new(RATING_LOW, RATING_HIGH);

        // Dense prediction matrix over every train (user, item) cell.
        let pred_matrix =
            Array2::from_shape_fn((index.n_users(), index.n_items()), |_| dist.sample(&mut rng));

        // Test pairs outside the train matrix still get a uniform sample
        // rather than an error.
        let predicted_ratings: Vec<f64> = dataset
            .test
            .iter()
            .map(|it| {
                match (index.user_index(it.user_id), index.item_index(it.movie_id)) {
                    (Some(row), Some(col)) => pred_matrix[[row, col]],
                    _ => dist.sample(&mut rng),
                }
            })
            .collect();

        let rated = rated_items_by_user(&dataset.train);
        let empty = HashSet::new();
        let user_to_recommended_items = index
            .user_ids()
            .iter()
            .enumerate()
            .map(|(row, &user_id)| {
                let scored: Vec<(MovieId, f64)> = index
                    .item_ids()
                    .iter()
                    .copied()
                    .zip(pred_matrix.row(row).iter().copied())
                    .collect();
                let user_rated = rated.get(&user_id).unwrap_or(&empty);
                (user_id, top_unrated(scored, user_rated))
            })
            .collect();

        debug!(users = index.n_users(), items = index.n_items(), "random predictions sampled");

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
    use crate::models::{Interaction, UserId, MAX_RECOMMENDATIONS};
    use std::collections::HashMap;

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

    #[test]
    fn test_seeded_run_is_deterministic_and_in_range() {
        let data = dataset(
            vec![interaction(1, 1, 5.0, 100)],
            vec![interaction(1, 2, 4.0, 200)],
        );
        let recommender = RandomRecommender::new(RandomRecommenderConfig { seed: 7 });

        let first = recommender.recommend(&data).unwrap();
        let second = recommender.recommend(&data).unwrap();

        assert_eq!(first.predicted_ratings, second.predicted_ratings);
        assert_eq!(first.predicted_ratings.len(), 1);
        let rating = first.predicted_ratings[0];
        assert!((RATING_LOW..RATING_HIGH).contains(&rating));
    }

    #[test]
    fn test_recommendations_exclude_rated_movies() {
        let data = dataset(
            vec![
                interaction(1, 1, 5.0, 100),
                interaction(1, 2, 3.0, 110),
                interaction(2, 3, 4.0, 120),
            ],
            vec![interaction(1, 4, 4.0, 200)],
        );
        let recommender = RandomRecommender::new(RandomRecommenderConfig::default());

        let result = recommender.recommend(&data).unwrap();

        let items = result.items_for(1).unwrap();
        assert!(!items.contains(&1));
        assert!(!items.contains(&2));
        assert!(items.len() <= MAX_RECOMMENDATIONS);
    }

    #[test]
    fn test_empty_train_fails() {
        let data = dataset(Vec::new(), vec![interaction(1, 4, 4.0, 200)]);
        let recommender = RandomRecommender::new(RandomRecommenderConfig::default());

        assert!(recommender.recommend(&data).is_err());
    }
}
