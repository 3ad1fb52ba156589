/// Metric computation
///
/// RMSE over paired rating sequences plus Precision@K / Recall@K over ranked
/// recommendation lists. The per-user formulas are pure; the aggregates
/// average over every user present in the ground-truth mapping, treating a
/// user missing from the predictions as having an empty list.
use std::collections::{HashMap, HashSet};

use crate::error::{AppError, Result};
use crate::models::{Metrics, MovieId, UserId};
use crate::utils::mean;

#[derive(Debug, Default)]
pub struct MetricCalculator;

impl MetricCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Compute all metrics for one recommender run.
    pub fn calc(
        &self,
        true_ratings: &[f64],
        pred_ratings: &[f64],
        true_user_to_items: &HashMap<UserId, Vec<MovieId>>,
        pred_user_to_items: &HashMap<UserId, Vec<MovieId>>,
        k: usize,
    ) -> Result<Metrics> {
        Ok(Metrics {
            rmse: self.rmse(true_ratings, pred_ratings)?,
            precision_at_k: self.mean_precision_at_k(true_user_to_items, pred_user_to_items, k)?,
            recall_at_k: self.mean_recall_at_k(true_user_to_items, pred_user_to_items, k)?,
        })
    }

    /// Root mean squared error over paired sequences. Unequal lengths are a
    /// caller bug; empty input fails explicitly instead of yielding NaN.
    pub fn rmse(&self, true_ratings: &[f64], pred_ratings: &[f64]) -> Result<f64> {
        if true_ratings.len() != pred_ratings.len() {
            return Err(AppError::LengthMismatch {
                expected: true_ratings.len(),
                actual: pred_ratings.len(),
            });
        }
        if true_ratings.is_empty() {
            return Err(AppError::EmptyDataset(
                "cannot compute RMSE over empty rating sequences".to_string(),
            ));
        }

        let mean_sq = true_ratings
            .iter()
            .zip(pred_ratings)
            .map(|(t, p)| (t - p) * (t - p))
            .sum::<f64>()
            / true_ratings.len() as f64;
        Ok(mean_sq.sqrt())
    }

    /// Mean per-user Precision@K over every user in the ground-truth map.
    pub fn mean_precision_at_k(
        &self,
        true_user_to_items: &HashMap<UserId, Vec<MovieId>>,
        pred_user_to_items: &HashMap<UserId, Vec<MovieId>>,
        k: usize,
    ) -> Result<f64> {
        self.mean_over_users(true_user_to_items, pred_user_to_items, k, precision_at_k)
    }

    /// Mean per-user Recall@K over every user in the ground-truth map.
    pub fn mean_recall_at_k(
        &self,
        true_user_to_items: &HashMap<UserId, Vec<MovieId>>,
        pred_user_to_items: &HashMap<UserId, Vec<MovieId>>,
        k: usize,
    ) -> Result<f64> {
        self.mean_over_users(true_user_to_items, pred_user_to_items, k, recall_at_k)
    }

    fn mean_over_users(
        &self,
        true_user_to_items: &HashMap<UserId, Vec<MovieId>>,
        pred_user_to_items: &HashMap<UserId, Vec<MovieId>>,
        k: usize,
        per_user: fn(&[MovieId], &[MovieId], usize) -> f64,
    ) -> Result<f64> {
        if true_user_to_items.is_empty() {
            return Err(AppError::EmptyDataset(
                "no ground-truth users to aggregate over".to_string(),
            ));
        }

        let scores: Vec<f64> = true_user_to_items
            .iter()
            .map(|(user_id, true_items)| {
                let pred_items = pred_user_to_items
                    .get(user_id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                per_user(true_items, pred_items, k)
            })
            .collect();
        Ok(mean(&scores))
    }
}

/// Precision@K for one user: |true ∩ pred[..k]| / k. 0.0 when k == 0.
fn precision_at_k(true_items: &[MovieId], pred_items: &[MovieId], k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    hits_at_k(true_items, pred_items, k) as f64 / k as f64
}

/// Recall@K for one user: |true ∩ pred[..k]| / |true|. 0.0 when the ground
/// truth is empty or k == 0.
fn recall_at_k(true_items: &[MovieId], pred_items: &[MovieId], k: usize) -> f64 {
    if true_items.is_empty() || k == 0 {
        return 0.0;
    }
    let truth: HashSet<&MovieId> = true_items.iter().collect();
    hits_at_k(true_items, pred_items, k) as f64 / truth.len() as f64
}

fn hits_at_k(true_items: &[MovieId], pred_items: &[MovieId], k: usize) -> usize {
    let truth: HashSet<&MovieId> = true_items.iter().collect();
    let top_k: HashSet<&MovieId> = pred_items.iter().take(k).collect();
    top_k.iter().filter(|m| truth.contains(**m)).count()
}
