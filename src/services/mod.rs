mod association;
mod matrix;
mod matrix_factorization;
mod popularity;
mod random;

use std::collections::{HashMap, HashSet};

use crate::config::{Config, RecommenderKind};
use crate::error::{AppError, Result};
use crate::models::{Dataset, Interaction, MovieId, RecommendResult, UserId, MAX_RECOMMENDATIONS};
use crate::utils::sort_by_score_desc;

pub use association::{AssociationRecommender, AssociationRecommenderConfig};
pub use matrix::InteractionMatrix;
pub use matrix_factorization::{
    MatrixFactorizationRecommender, MatrixFactorizationRecommenderConfig,
};
pub use popularity::{PopularityRecommender, PopularityRecommenderConfig};
pub use random::{RandomRecommender, RandomRecommenderConfig};

/// A baseline recommender. Implementations read the dataset, never mutate
/// it, and produce rating predictions for every test interaction plus a
/// ranked recommendation list per train user.
pub trait Recommender: Send + Sync {
    fn name(&self) -> &'static str;
    fn recommend(&self, dataset: &Dataset) -> Result<RecommendResult>;
}

/// Construct the configured variant behind the common trait.
pub fn build_recommender(kind: RecommenderKind, config: &Config) -> Box<dyn Recommender> {
    match kind {
        RecommenderKind::Random => Box::new(RandomRecommender::new(config.random.clone())),
        RecommenderKind::Popularity => {
            Box::new(PopularityRecommender::new(config.popularity.clone()))
        }
        RecommenderKind::Association => {
            Box::new(AssociationRecommender::new(config.association.clone()))
        }
        RecommenderKind::MatrixFactorization => Box::new(MatrixFactorizationRecommender::new(
            config.matrix_factorization.clone(),
        )),
    }
}

/// Every variant requires train interactions to fit on.
pub(crate) fn ensure_train_nonempty(dataset: &Dataset) -> Result<()> {
    if dataset.train.is_empty() {
        return Err(AppError::EmptyDataset(
            "train partition holds no interactions".to_string(),
        ));
    }
    Ok(())
}

/// Movies each user already rated in train; recommendation lists must never
/// contain these.
pub(crate) fn rated_items_by_user(train: &[Interaction]) -> HashMap<UserId, HashSet<MovieId>> {
    let mut rated: HashMap<UserId, HashSet<MovieId>> = HashMap::new();
    for interaction in train {
        rated
            .entry(interaction.user_id)
            .or_default()
            .insert(interaction.movie_id);
    }
    rated
}

/// Shared selection policy: rank by score descending (ties by ascending
/// movie id), drop already-rated movies, truncate to [`MAX_RECOMMENDATIONS`].
pub(crate) fn top_unrated(
    mut scored: Vec<(MovieId, f64)>,
    rated: &HashSet<MovieId>,
) -> Vec<MovieId> {
    sort_by_score_desc(&mut scored);
    scored
        .into_iter()
        .map(|(movie_id, _)| movie_id)
        .filter(|movie_id| !rated.contains(movie_id))
        .take(MAX_RECOMMENDATIONS)
        .collect()
}
