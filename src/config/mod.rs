use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::services::{
    AssociationRecommenderConfig, MatrixFactorizationRecommenderConfig,
    PopularityRecommenderConfig, RandomRecommenderConfig,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub data: DataConfig,
    pub eval: EvalConfig,
    /// Recommender variants to run, in order.
    pub recommenders: Vec<RecommenderKind>,
    pub random: RandomRecommenderConfig,
    pub popularity: PopularityRecommenderConfig,
    pub association: AssociationRecommenderConfig,
    pub matrix_factorization: MatrixFactorizationRecommenderConfig,
    /// When set, item embeddings from the matrix-factorization run are
    /// persisted here as a flat vector index.
    pub index_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Directory holding `ratings.csv`, `movies.csv` and `tags.csv`.
    pub data_path: PathBuf,
    /// Keep only the first `num_users` user ids in ascending order
    /// (0 = no cap).
    pub num_users: usize,
    /// Most recent interactions per user held out for the test partition.
    pub num_test_items: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvalConfig {
    /// Cutoff for Precision@K / Recall@K.
    pub top_k: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommenderKind {
    Random,
    Popularity,
    Association,
    MatrixFactorization,
}

impl RecommenderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommenderKind::Random => "random",
            RecommenderKind::Popularity => "popularity",
            RecommenderKind::Association => "association",
            RecommenderKind::MatrixFactorization => "matrix-factorization",
        }
    }
}

impl FromStr for RecommenderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(RecommenderKind::Random),
            "popularity" => Ok(RecommenderKind::Popularity),
            "association" => Ok(RecommenderKind::Association),
            "matrix-factorization" | "mf" | "nmf" => Ok(RecommenderKind::MatrixFactorization),
            other => bail!("unknown recommender variant: {}", other),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let recommenders = env::var("RECOMMENDERS")
            .unwrap_or_else(|_| "random,popularity,association,matrix-factorization".to_string())
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(RecommenderKind::from_str)
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Config {
            data: DataConfig {
                data_path: env::var("DATA_PATH")
                    .unwrap_or_else(|_| "data/ml-latest-small".to_string())
                    .into(),
                num_users: parsed_env("NUM_USERS", "1000")?,
                num_test_items: parsed_env("NUM_TEST_ITEMS", "5")?,
            },
            eval: EvalConfig {
                top_k: parsed_env("TOP_K", "10")?,
            },
            recommenders,
            random: RandomRecommenderConfig {
                seed: parsed_env("RANDOM_SEED", "42")?,
            },
            popularity: PopularityRecommenderConfig {
                minimum_num_rating: parsed_env("MINIMUM_NUM_RATING", "200")?,
            },
            association: AssociationRecommenderConfig {
                min_cooccurrence: parsed_env("MIN_COOCCURRENCE", "10")?,
                like_threshold: parsed_env("LIKE_THRESHOLD", "4.0")?,
            },
            matrix_factorization: MatrixFactorizationRecommenderConfig {
                factors: parsed_env("MF_FACTORS", "5")?,
                fill_with_zero: parsed_env("MF_FILL_WITH_ZERO", "true")?,
                n_epochs: parsed_env("MF_EPOCHS", "50")?,
                seed: parsed_env("RANDOM_SEED", "42")?,
            },
            index_path: env::var("INDEX_PATH").ok().map(PathBuf::from),
        })
    }
}

fn parsed_env<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("{} must be a valid {}", key, std::any::type_name::<T>()))
}
