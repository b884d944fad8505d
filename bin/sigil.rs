use std::sync::Arc;

use anyhow::Context;
use jemallocator::Jemalloc;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use sigil::ledger::LedgerClient;
use sigil::{
    Admin, CronScheduler, Database, Indexer, NotificationPublisher, PointsEngine, Processors,
    RpcLedgerClient, Settings,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .unwrap();

    // Load configuration
    let settings = Arc::new(
        Settings::new()
            .context("Failed to load config.yaml. Please ensure it exists and is valid")?,
    );

    let db = Arc::new(
        Database::new(settings.clone())
            .await
            .context("Failed to initialize database connection")?,
    );

    let ledger: Arc<dyn LedgerClient> = Arc::new(
        RpcLedgerClient::new(&settings.ledger).context("Failed to create ledger client")?,
    );

    let notifier = settings
        .redpanda
        .as_ref()
        .and_then(NotificationPublisher::new)
        .map(Arc::new);

    let points = PointsEngine::new(db.clone(), settings.indexer.base_checkin_points);
    let processors = Arc::new(Processors::new(
        db.clone(),
        points.clone(),
        notifier,
        settings.indexer.base_checkin_points,
    ));
    let indexer = Arc::new(Indexer::new(ledger, db.clone(), processors, &settings.indexer));

    // One-shot administrative commands bypass the scheduler entirely.
    let mut args = std::env::args().skip(1);
    if let Some(command) = args.next() {
        let admin = Admin::new(db, indexer, points);
        return match command.as_str() {
            "reindex" => {
                let source = args.next().context("usage: sigil reindex <source>")?;
                admin.reindex_all(&source).await
            },
            "recalc" => admin.recalculate_points(args.next().as_deref()).await,
            "fix-referrers" => admin.fix_referrer_casing().await,
            "ranks" => admin.recalculate_all_ranks().await.map(|_| ()),
            other => anyhow::bail!(
                "unknown command: {other} (expected reindex | recalc | fix-referrers | ranks)"
            ),
        };
    }

    run_daemon(settings, indexer, points).await
}

async fn run_daemon(
    settings: Arc<Settings>,
    indexer: Arc<Indexer>,
    points: PointsEngine,
) -> anyhow::Result<()> {
    let cancellation_token = CancellationToken::new();

    let scheduler = CronScheduler::new(indexer.clone(), points, &settings.indexer);
    let cron_token = cancellation_token.child_token();
    let cron_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.run(cron_token).await {
            error!("Cron scheduler failed: {:#}", e);
        }
    });

    // First cycle runs immediately instead of waiting out a full interval.
    indexer.run_cycle().await;

    #[cfg(unix)]
    let mut sigterm_stream = {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?
    };

    info!("Indexer running. Press Ctrl+C to stop.");

    #[cfg(unix)]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
            _ = sigterm_stream.recv() => {
                info!("Received SIGTERM, exiting gracefully...");
            },
        };
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
    }

    // An in-flight indexing tick finishes on its own; cancellation only
    // prevents further ticks.
    cancellation_token.cancel();
    let _ = cron_handle.await;

    info!("Shutdown complete");
    Ok(())
}
