use anyhow::Context;
use reco_eval::jobs::EvaluationJob;
use reco_eval::Config;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run() {
        error!("evaluation run failed: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load config")?;

    info!(
        data_path = %config.data.data_path.display(),
        num_users = config.data.num_users,
        num_test_items = config.data.num_test_items,
        top_k = config.eval.top_k,
        "starting reco-eval"
    );

    let report = EvaluationJob::new(config).run()?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
