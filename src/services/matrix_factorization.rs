/// Matrix-factorization baseline
///
/// Factorizes the train matrix into non-negative user and item factors and
/// predicts ratings from the reconstruction W·H. The solver itself lives
/// behind [`NmfModel::fit`]; the recommender builds the input matrix,
/// applies the shared selection policy, and exposes the fitted item
/// embeddings for the vector-index sink.
use std::collections::HashSet;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::matrix::global_mean_rating;
use super::{ensure_train_nonempty, rated_items_by_user, top_unrated, InteractionMatrix};
use crate::error::Result;
use crate::models::{Dataset, ItemEmbeddings, MovieId, RecommendResult};
use crate::services::Recommender;

/// Keeps the multiplicative updates away from division by zero.
const UPDATE_EPS: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct MatrixFactorizationRecommenderConfig {
    /// Latent factor count (embedding dimension).
    pub factors: usize,
    /// Missing matrix cells become 0.0 when true, the global train mean
    /// otherwise.
    pub fill_with_zero: bool,
    /// Multiplicative-update iterations.
    pub n_epochs: usize,
    pub seed: u64,
}

impl Default for MatrixFactorizationRecommenderConfig {
    fn default() -> Self {
        Self {
            factors: 5,
            fill_with_zero: true,
            n_epochs: 50,
            seed: 42,
        }
    }
}

/// Non-negative matrix factorization via multiplicative updates
/// (Lee & Seung). V ≈ W·H with W: users × factors, H: factors × items.
pub(crate) struct NmfModel {
    user_factors: Array2<f64>,
    item_factors: Array2<f64>,
}

impl NmfModel {
    pub(crate) fn fit(matrix: &Array2<f64>, factors: usize, n_epochs: usize, seed: u64) -> Self {
        let (n_users, n_items) = matrix.dim();
        let mut rng = StdRng::seed_from_u64(seed);

        let mut w = Array2::from_shape_fn((n_users, factors), |_| rng.gen_range(0.1..1.0));
        let mut h = Array2::from_shape_fn((factors, n_items), |_| rng.gen_range(0.1..1.0));

        for _ in 0..n_epochs {
            // H <- H ⊙ (WᵀV) / (WᵀWH + eps)
            let numerator = w.t().dot(matrix);
            let denominator = w.t().dot(&w).dot(&h) + UPDATE_EPS;
            h = &h * &(numerator / denominator);

            // W <- W ⊙ (VHᵀ) / (WHHᵀ + eps)
            let numerator = matrix.dot(&h.t());
            let denominator = w.dot(&h.dot(&h.t())) + UPDATE_EPS;
            w = &w * &(numerator / denominator);
        }

        Self {
            user_factors: w,
            item_factors: h,
        }
    }

    /// Dense reconstruction, the predicted-score matrix.
    pub(crate) fn predicted(&self) -> Array2<f64> {
        self.user_factors.dot(&self.item_factors)
    }

    /// Item embeddings as float32 rows, one per item column of H.
    pub(crate) fn item_embeddings(&self) -> Array2<f32> {
        self.item_factors.t().mapv(|v| v as f32)
    }
}

pub struct MatrixFactorizationRecommender {
    config: MatrixFactorizationRecommenderConfig,
}

impl MatrixFactorizationRecommender {
    pub fn new(config: MatrixFactorizationRecommenderConfig) -> Self {
        Self { config }
    }

    /// Recommend and also hand back the fitted item embeddings in the
    /// matrix's stable item order, for persisting to a vector index.
    pub fn recommend_with_embeddings(
        &self,
        dataset: &Dataset,
    ) -> Result<(RecommendResult, ItemEmbeddings)> {
        ensure_train_nonempty(dataset)?;

        let fill = if self.config.fill_with_zero {
            0.0
        } else {
            global_mean_rating(&dataset.train)
        };
        let index = InteractionMatrix::from_train(&dataset.train, fill)?;

        let model = NmfModel::fit(
            index.values(),
            self.config.factors,
            self.config.n_epochs,
            self.config.seed,
        );
        let pred_matrix = model.predicted();
        debug!(
            users = index.n_users(),
            items = index.n_items(),
            factors = self.config.factors,
            "matrix factorization fitted"
        );

        // Test pairs outside the train matrix fall back to 0.0.
        let predicted_ratings: Vec<f64> = dataset
            .test
            .iter()
            .map(|it| {
                match (index.user_index(it.user_id), index.item_index(it.movie_id)) {
                    (Some(row), Some(col)) => pred_matrix[[row, col]],
                    _ => 0.0,
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

        let result = RecommendResult {
            predicted_ratings,
            user_to_recommended_items,
        };
        let embeddings = ItemEmbeddings {
            item_ids: index.item_ids().to_vec(),
            vectors: model.item_embeddings(),
        };

        Ok((result, embeddings))
    }
}

impl Recommender for MatrixFactorizationRecommender {
    fn name(&self) -> &'static str {
        "matrix-factorization"
    }

    fn recommend(&self, dataset: &Dataset) -> Result<RecommendResult> {
        self.recommend_with_embeddings(dataset)
            .map(|(result, _)| result)
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

    fn block_train() -> Vec<Interaction> {
        // Two user groups with disjoint taste blocks.
        vec![
            interaction(1, 1, 5.0, 100),
            interaction(1, 2, 4.5, 110),
            interaction(2, 1, 4.5, 120),
            interaction(2, 2, 5.0, 130),
            interaction(3, 3, 5.0, 140),
            interaction(3, 4, 4.5, 150),
            interaction(4, 3, 4.5, 160),
            interaction(4, 4, 5.0, 170),
        ]
    }

    #[test]
    fn test_nmf_reconstructs_low_rank_structure() {
        let train = block_train();
        let index = InteractionMatrix::from_train(&train, 0.0).unwrap();
        let model = NmfModel::fit(index.values(), 2, 200, 42);
        let predicted = model.predicted();

        // In-block cells should reconstruct far higher than cross-block
        // cells.
        let in_block = predicted[[0, 0]];
        let cross_block = predicted[[0, 2]];
        assert!(
            in_block > cross_block + 1.0,
            "in-block {} vs cross-block {}",
            in_block,
            cross_block
        );
    }

    #[test]
    fn test_factors_stay_non_negative() {
        let train = block_train();
        let index = InteractionMatrix::from_train(&train, 0.0).unwrap();
        let model = NmfModel::fit(index.values(), 2, 50, 7);

        assert!(model.user_factors.iter().all(|&v| v >= 0.0));
        assert!(model.item_factors.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_embeddings_align_with_item_order() {
        let recommender =
            MatrixFactorizationRecommender::new(MatrixFactorizationRecommenderConfig {
                factors: 2,
                ..Default::default()
            });
        let data = dataset(block_train(), vec![interaction(1, 3, 4.0, 200)]);

        let (_, embeddings) = recommender.recommend_with_embeddings(&data).unwrap();

        assert_eq!(embeddings.item_ids, vec![1, 2, 3, 4]);
        assert_eq!(embeddings.vectors.dim(), (4, 2));
    }

    #[test]
    fn test_recommendations_exclude_rated_and_respect_cap() {
        let recommender =
            MatrixFactorizationRecommender::new(MatrixFactorizationRecommenderConfig::default());
        let data = dataset(block_train(), vec![interaction(1, 3, 4.0, 200)]);

        let result = recommender.recommend(&data).unwrap();

        let items = result.items_for(1).unwrap();
        assert!(!items.contains(&1));
        assert!(!items.contains(&2));
        assert!(items.len() <= MAX_RECOMMENDATIONS);
    }

    #[test]
    fn test_cold_test_pair_predicts_zero() {
        let recommender =
            MatrixFactorizationRecommender::new(MatrixFactorizationRecommenderConfig::default());
        // Movie 99 never appears in train.
        let data = dataset(block_train(), vec![interaction(1, 99, 4.0, 200)]);

        let result = recommender.recommend(&data).unwrap();

        assert_eq!(result.predicted_ratings[0], 0.0);
    }

    #[test]
    fn test_seeded_fit_is_deterministic() {
        let recommender =
            MatrixFactorizationRecommender::new(MatrixFactorizationRecommenderConfig::default());
        let data = dataset(block_train(), vec![interaction(1, 3, 4.0, 200)]);

        let first = recommender.recommend(&data).unwrap();
        let second = recommender.recommend(&data).unwrap();

        assert_eq!(first.predicted_ratings, second.predicted_ratings);
        assert_eq!(
            first.user_to_recommended_items,
            second.user_to_recommended_items
        );
    }
}
