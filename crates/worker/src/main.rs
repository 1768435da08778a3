//! Sequence worker: runs the batch engine on a fixed interval.
//!
//! Safe to run alongside overlapping invocations — the claim lease in the
//! engine guarantees at most one in-flight attempt per enrollment.

mod config;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cadence_delivery::HttpEmailGateway;
use cadence_engine::{ProcessorConfig, SequenceProcessor};
use config::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence_worker=info,cadence_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env()?;
    let pool = cadence_db::create_pool(&config.database_url).await?;

    let gateway = HttpEmailGateway::with_timeout(
        config.delivery_api_url.clone(),
        config.delivery_api_key.clone(),
        config.delivery_timeout,
    )?;

    let processor = SequenceProcessor::with_config(
        pool,
        Arc::new(gateway),
        ProcessorConfig {
            batch_size: config.batch_size,
            delivery_timeout: config.delivery_timeout,
            ..ProcessorConfig::default()
        },
    );

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    let mut ticker = tokio::time::interval(config.poll_interval);
    tracing::info!(
        poll_interval_secs = config.poll_interval.as_secs(),
        batch_size = config.batch_size,
        "Sequence worker started",
    );

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Sequence worker shutting down");
                break;
            }
            _ = ticker.tick() => {
                match processor.run_batch().await {
                    Ok(summary) => {
                        let json = serde_json::to_string(&summary)
                            .unwrap_or_else(|_| "<unserializable>".into());
                        if summary.failed > 0 {
                            tracing::warn!(summary = %json, "Batch finished with failures");
                        } else {
                            tracing::info!(summary = %json, "Batch finished");
                        }
                    }
                    Err(error) => {
                        tracing::error!(error = %error, "Batch run failed");
                    }
                }
            }
        }
    }

    Ok(())
}
