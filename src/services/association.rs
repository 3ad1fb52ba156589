/// Association-rule baseline
///
/// Mines pairwise co-occurrence rules over per-user like-baskets and scores
/// candidates by the strongest confidence reaching them from a user's liked
/// movies. The rule mining itself sits behind [`AssociationModel::fit`] as
/// the numerical collaborator; the recommender only builds baskets and
/// applies the shared selection policy.
use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{ensure_train_nonempty, rated_items_by_user, top_unrated, InteractionMatrix};
use crate::error::Result;
use crate::models::{Dataset, MovieId, RecommendResult};
use crate::services::Recommender;

#[derive(Debug, Clone)]
pub struct AssociationRecommenderConfig {
    /// Rules need at least this many users liking both movies.
    pub min_cooccurrence: usize,
    /// Rating at which a train interaction counts as a like.
    pub like_threshold: f64,
}

impl Default for AssociationRecommenderConfig {
    fn default() -> Self {
        Self {
            min_cooccurrence: 10,
            like_threshold: 4.0,
        }
    }
}

/// Fitted pairwise rules: for each antecedent item index, the consequents
/// with their confidence.
struct AssociationModel {
    rules: Vec<Vec<(usize, f64)>>,
}

impl AssociationModel {
    fn fit(baskets: &[Vec<usize>], n_items: usize, min_cooccurrence: usize) -> Self {
        let mut item_counts = vec![0usize; n_items];
        let mut pair_counts: HashMap<(usize, usize), usize> = HashMap::new();

        for basket in baskets {
            for &item in basket {
                item_counts[item] += 1;
            }
            for (pos, &a) in basket.iter().enumerate() {
                for &b in &basket[pos + 1..] {
                    let key = if a < b { (a, b) } else { (b, a) };
                    *pair_counts.entry(key).or_insert(0) += 1;
                }
            }
        }

        let mut rules: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n_items];
        for ((a, b), cooccurrence) in pair_counts {
            if cooccurrence < min_cooccurrence {
                continue;
            }
            rules[a].push((b, cooccurrence as f64 / item_counts[a] as f64));
            rules[b].push((a, cooccurrence as f64 / item_counts[b] as f64));
        }

        Self { rules }
    }

    /// Score every item for a user: the maximum confidence of any rule from
    /// the user's liked items. Items without a matching rule stay at 0.0.
    fn score_user(&self, liked: &[usize], n_items: usize) -> Vec<f64> {
        let mut scores = vec![0.0; n_items];
        for &antecedent in liked {
            for &(consequent, confidence) in &self.rules[antecedent] {
                if confidence > scores[consequent] {
                    scores[consequent] = confidence;
                }
            }
        }
        scores
    }
}

pub struct AssociationRecommender {
    config: AssociationRecommenderConfig,
}

impl AssociationRecommender {
    pub fn new(config: AssociationRecommenderConfig) -> Self {
        Self { config }
    }
}

impl Recommender for AssociationRecommender {
    fn name(&self) -> &'static str {
        "association"
    }

    fn recommend(&self, dataset: &Dataset) -> Result<RecommendResult> {
        ensure_train_nonempty(dataset)?;

        let index = InteractionMatrix::from_train(&dataset.train, 0.0)?;

        // One like-basket per train user, in user-index order.
        let baskets: Vec<Vec<usize>> = (0..index.n_users())
            .map(|row| {
                index
                    .values()
                    .row(row)
                    .iter()
                    .enumerate()
                    .filter(|(_, &rating)| rating >= self.config.like_threshold)
                    .map(|(col, _)| col)
                    .collect()
            })
            .collect();

        let model = AssociationModel::fit(&baskets, index.n_items(), self.config.min_cooccurrence);
        debug!(
            baskets = baskets.len(),
            rules = model.rules.iter().map(Vec::len).sum::<usize>(),
            "association rules mined"
        );

        let user_scores: Vec<Vec<f64>> = baskets
            .iter()
            .map(|basket| model.score_user(basket, index.n_items()))
            .collect();

        // Test pairs outside the train matrix fall back to 0.0.
        let predicted_ratings: Vec<f64> = dataset
            .test
            .iter()
            .map(|it| {
                match (index.user_index(it.user_id), index.item_index(it.movie_id)) {
                    (Some(row), Some(col)) => user_scores[row][col],
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
                // Only rule-backed candidates; no padding with unscored
                // movies.
                let scored: Vec<(MovieId, f64)> = user_scores[row]
                    .iter()
                    .enumerate()
                    .filter(|(_, &score)| score > 0.0)
                    .map(|(col, &score)| (index.item_ids()[col], score))
                    .collect();
                let user_rated = rated.get(&user_id).unwrap_or(&empty);
                (user_id, top_unrated(scored, user_rated))
            })
            .collect();

        Ok(RecommendResult {
            predicted_ratings,
            user_to_recommended_items,
        })
    }
}
