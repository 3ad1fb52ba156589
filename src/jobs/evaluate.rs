// ============================================
// Evaluation Job
// ============================================
//
// Batch runner for the whole experiment: load and split the dataset once,
// then train and score every configured recommender variant against it.
// Runs are independent; any failure aborts the current run and propagates.
//
// Usage:
//   DATA_PATH=data/ml-latest-small RECOMMENDERS=popularity,mf reco-eval

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::{Config, RecommenderKind};
use crate::data::DataLoader;
use crate::error::Result;
use crate::index::{FlatIndexFile, VectorIndexSink};
use crate::metrics::MetricCalculator;
use crate::models::{Dataset, Metrics, RecommendResult};
use crate::services::{build_recommender, MatrixFactorizationRecommender, Recommender};

/// Scores for one recommender variant.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub recommender: String,
    pub metrics: Metrics,
}

/// Everything one invocation produced.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub generated_at: DateTime<Utc>,
    pub runs: Vec<RunReport>,
}

/// Stateless besides configuration; one instance drives one batch run.
pub struct EvaluationJob {
    config: Config,
}

impl EvaluationJob {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Load, split, and evaluate every configured variant.
    pub fn run(&self) -> Result<EvaluationReport> {
        let loader = DataLoader::new(&self.config.data);
        let dataset = loader.load()?;

        let mut runs = Vec::with_capacity(self.config.recommenders.len());
        for kind in &self.config.recommenders {
            runs.push(self.run_variant(*kind, &dataset)?);
        }

        Ok(EvaluationReport {
            generated_at: Utc::now(),
            runs,
        })
    }

    /// Fit one recommender and produce its result.
    pub fn train(&self, model: &dyn Recommender, dataset: &Dataset) -> Result<RecommendResult> {
        info!(recommender = model.name(), "start train");
        model.recommend(dataset)
    }

    /// Score a recommend result against the held-out test partition.
    pub fn evaluate(&self, dataset: &Dataset, result: &RecommendResult) -> Result<Metrics> {
        info!("start evaluation");
        MetricCalculator::new().calc(
            &dataset.test_ratings(),
            &result.predicted_ratings,
            &dataset.test_user_to_items,
            &result.user_to_recommended_items,
            self.config.eval.top_k,
        )
    }

    /// Convenience composition of [`train`](Self::train) and
    /// [`evaluate`](Self::evaluate).
    pub fn train_and_evaluate(
        &self,
        model: &dyn Recommender,
        dataset: &Dataset,
    ) -> Result<Metrics> {
        let result = self.train(model, dataset)?;
        self.evaluate(dataset, &result)
    }

    fn run_variant(&self, kind: RecommenderKind, dataset: &Dataset) -> Result<RunReport> {
        let result = match (kind, &self.config.index_path) {
            // The factorization variant is the only embedding producer; dump
            // its item vectors when an index path is configured.
            (RecommenderKind::MatrixFactorization, Some(index_path)) => {
                let model = MatrixFactorizationRecommender::new(
                    self.config.matrix_factorization.clone(),
                );
                info!(recommender = model.name(), "start train");
                let (result, embeddings) = model.recommend_with_embeddings(dataset)?;
                FlatIndexFile::new(index_path).persist(&embeddings)?;
                result
            }
            _ => {
                let model = build_recommender(kind, &self.config);
                self.train(model.as_ref(), dataset)?
            }
        };

        let metrics = self.evaluate(dataset, &result)?;
        info!(
            recommender = kind.as_str(),
            rmse = metrics.rmse,
            precision_at_k = metrics.precision_at_k,
            recall_at_k = metrics.recall_at_k,
            "evaluation finished"
        );

        Ok(RunReport {
            recommender: kind.as_str().to_string(),
            metrics,
        })
    }
}
