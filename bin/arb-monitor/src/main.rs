use anyhow::Result;
use clap::Parser;
use common::Instrument;
use config::{FeedSourceConfig, MonitorConfig};
use detector::{DetectorConfig, DetectorService, LogSink, MarketStateStore, PriceStream};
use feed_ingestor::sources::{ReplayFeedFactory, SimFeedFactory};
use feed_ingestor::{
    IngestMetrics, IngestPipeline, IngestionMux, NormalizerRegistry, Supervisor, SupervisorHandle,
};
use feed_worker_trait::FeedWorkerFactory;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info};

/// Command line arguments for arb-monitor.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the monitor configuration YAML
    #[arg(long, default_value = "config/default.yml")]
    config: String,
    /// Seconds between operator health reports
    #[arg(long, default_value_t = 10)]
    health_interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();
    let args = Args::parse();

    let cfg = MonitorConfig::load(&args.config)?;
    cfg.validate()?;

    let instruments: Vec<Instrument> = cfg
        .instruments
        .iter()
        .map(|s| Instrument::from(s.as_str()))
        .collect();

    let factory: Arc<dyn FeedWorkerFactory> = match &cfg.feed {
        FeedSourceConfig::Sim {
            tick_interval_ms,
            spread_bps,
            volatility_bps,
            base_prices,
        } => Arc::new(SimFeedFactory::new(
            *tick_interval_ms,
            *spread_bps,
            *volatility_bps,
            base_prices.clone(),
            instruments.clone(),
        )),
        FeedSourceConfig::Replay { dir, speed } => Arc::new(ReplayFeedFactory::new(dir, *speed)),
    };

    let metrics = Arc::new(IngestMetrics::new());
    let store = Arc::new(MarketStateStore::new());
    let mux = IngestionMux::new(&cfg.exchanges, cfg.mux.worker_buffer, Arc::clone(&metrics));

    // Channel between the ingest pipeline and the detector
    let (quote_tx, quote_rx) = mpsc::channel(1024);
    let quote_stream = Box::pin(ReceiverStream::new(quote_rx)) as PriceStream;

    let (supervisor, supervisor_handle) = Supervisor::new(
        cfg.supervisor.clone(),
        cfg.exchanges.clone(),
        factory,
        mux.clone(),
    );
    let supervisor_task = supervisor.spawn();

    let (pipeline_shutdown_tx, pipeline_shutdown_rx) = watch::channel(false);
    let pipeline = IngestPipeline::new(
        mux,
        NormalizerRegistry::new(instruments),
        quote_tx,
        Arc::clone(&metrics),
        pipeline_shutdown_rx,
    );
    let pipeline_task = pipeline.spawn();

    let (detector_shutdown_tx, detector_shutdown_rx) = mpsc::channel(1);
    let service = DetectorService::new(
        DetectorConfig {
            staleness_bound: Duration::from_millis(cfg.detector.staleness_bound_ms),
            min_spread_ratio: cfg.detector.min_spread_ratio,
            dedup_ttl: Duration::from_millis(cfg.detector.dedup_ttl_ms),
        },
        Arc::clone(&store),
        quote_stream,
        Arc::new(LogSink),
        detector_shutdown_rx,
    );
    let detector_task = service.spawn();

    let health_task = tokio::spawn(report_health(
        supervisor_handle.clone(),
        Arc::clone(&store),
        Arc::clone(&metrics),
        Duration::from_secs(args.health_interval_secs.max(1)),
    ));

    info!(config = %args.config, "arb-monitor running; ctrl-c to stop");
    tokio::signal::ctrl_c().await?;

    // Graceful shutdown, feed side first so the quote channel drains.
    supervisor_handle.shutdown().await.ok();
    if let Err(e) = supervisor_task.await.expect("supervisor task panicked") {
        error!(error = %e, "Supervisor exited with error");
    }
    pipeline_shutdown_tx.send(true).ok();
    if let Err(e) = pipeline_task.await.expect("pipeline task panicked") {
        error!(error = %e, "Pipeline exited with error");
    }
    detector_shutdown_tx.send(()).await.ok();
    if let Err(e) = detector_task.await.expect("detector task panicked") {
        error!(error = %e, "Detector exited with error");
    }
    health_task.abort();

    Ok(())
}

/// Periodic operator surface: worker health, entry freshness, and
/// ingestion counters, emitted to the log stream.
async fn report_health(
    supervisor: SupervisorHandle,
    store: Arc<MarketStateStore>,
    metrics: Arc<IngestMetrics>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick completes immediately; skip it so startup logs settle.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        for health in supervisor.health() {
            info!(
                exchange = %health.exchange,
                status = %health.status,
                consecutive_failures = health.consecutive_failures,
                failures_in_window = health.failures_in_window,
                next_restart_ms = health.next_restart_in.map(|d| d.as_millis() as u64),
                last_failure = health.last_failure.as_deref(),
                "worker health"
            );
        }
        for row in store.freshness() {
            info!(
                exchange = %row.exchange,
                instrument = %row.instrument,
                age_ms = row.age.as_millis() as u64,
                usable = row.usable,
                "market state freshness"
            );
        }
        for snapshot in metrics.snapshot() {
            if snapshot.messages == 0 {
                continue;
            }
            info!(
                exchange = %snapshot.exchange,
                messages = snapshot.messages,
                parse_failures = snapshot.parse_failures,
                dropped = snapshot.dropped,
                sequence_gaps = snapshot.sequence_gaps,
                out_of_order = snapshot.out_of_order,
                "ingest counters"
            );
        }
    }
}
