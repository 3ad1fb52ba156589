pub mod config;
pub mod data;
pub mod error;
pub mod index;
pub mod jobs;
pub mod metrics;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
pub use metrics::MetricCalculator;
pub use models::{Dataset, Interaction, ItemMetadata, Metrics, RecommendResult};
pub use services::Recommender;
