use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use marker_aggregator::{Aggregator, AggregatorConfig, FetchPolicy};
use marker_types::{FilterState, MarkerType};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let signing_endpoint = std::env::var("SIGNING_ENDPOINT")
        .context("SIGNING_ENDPOINT environment variable is not set")?;

    let config = aggregator_config_from_env(signing_endpoint)?;
    let filters = marker_filter_from_env()?;

    info!("Starting aggregation against {}", config.signing_endpoint);
    let aggregator = Aggregator::new(config, reqwest::Client::new());

    // Ctrl+C tears down outstanding fetches
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, cancelling aggregation...");
                signal_cancel.cancel();
            }
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {e}");
            }
        }
    });

    let aggregation = aggregator.run(&cancel).await?;

    if !aggregation.failures.is_empty() {
        warn!(
            "{} document fetch(es) failed, markers below are partial",
            aggregation.failures.len()
        );
        for failure in &aggregation.failures {
            warn!("  {failure}");
        }
    }

    let visible = filters.apply(&aggregation.markers);
    info!(
        "Fetched {} marker(s), {} visible after filtering",
        aggregation.markers.len(),
        visible.len()
    );

    for marker in visible {
        println!("{}", serde_json::to_string(marker)?);
    }

    Ok(())
}

fn aggregator_config_from_env(signing_endpoint: String) -> anyhow::Result<AggregatorConfig> {
    let mut config = AggregatorConfig::new(signing_endpoint);

    if let Ok(policy) = std::env::var("MARKER_FETCH_POLICY") {
        config.fetch_policy = match policy.trim().to_lowercase().as_str() {
            "strict" => FetchPolicy::Strict,
            "lenient" => FetchPolicy::Lenient,
            other => anyhow::bail!("Invalid MARKER_FETCH_POLICY: {other}"),
        };
    }
    if let Ok(secs) = std::env::var("MARKER_FETCH_TIMEOUT_SECS") {
        config.per_fetch_timeout =
            Duration::from_secs(secs.parse().context("Invalid MARKER_FETCH_TIMEOUT_SECS")?);
    }
    if let Ok(secs) = std::env::var("MARKER_DEADLINE_SECS") {
        config.overall_deadline =
            Duration::from_secs(secs.parse().context("Invalid MARKER_DEADLINE_SECS")?);
    }

    Ok(config)
}

/// `MARKER_FILTER` lists the marker types to show, comma-separated; absent
/// means everything is visible
fn marker_filter_from_env() -> anyhow::Result<FilterState> {
    let mut filters = FilterState::new();

    if let Ok(raw) = std::env::var("MARKER_FILTER") {
        let shown: Vec<MarkerType> = raw
            .split(',')
            .map(|s| {
                s.trim()
                    .parse::<MarkerType>()
                    .map_err(|_| anyhow::anyhow!("Invalid marker type in MARKER_FILTER: {s}"))
            })
            .collect::<Result<_, _>>()?;

        for kind in [MarkerType::Hazard, MarkerType::Congestion] {
            filters.set_visible(kind, shown.contains(&kind));
        }
    }

    Ok(filters)
}
