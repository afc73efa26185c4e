use std::sync::Arc;

use alarmhub::actions::WebhookNotifier;
use alarmhub::config::{Config, StorageConfig, read_config_file};
use alarmhub::evaluator::UncheckedEvaluator;
use alarmhub::lifecycle::{LifecycleCoordinator, ReadinessSignal};
use alarmhub::scheduler::AlarmScheduler;
use alarmhub::store::{AlarmStore, MemoryAlarmStore};
use clap::Parser;
use tracing::{debug, error, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: Option<String>,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("alarmhub", LevelFilter::TRACE),
        ("hub", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = match &args.file {
        Some(path) => read_config_file(path)?,
        None => Config::default(),
    };

    let settings = config.scheduler.clone().unwrap_or_default();

    let store = build_store(&config).await?;
    let scheduler = Arc::new(AlarmScheduler::new(
        store.clone(),
        Arc::new(UncheckedEvaluator),
        Arc::new(WebhookNotifier::new()),
    ));

    let (readiness, probe) = ReadinessSignal::new();
    let coordinator =
        LifecycleCoordinator::new(scheduler.clone(), store.clone(), probe, &settings);

    coordinator.on_after_init();

    #[cfg(feature = "api")]
    {
        use alarmhub::api::{ApiConfig, ApiState, spawn_api_server};
        use alarmhub::service::AlarmService;

        let service = Arc::new(AlarmService::new(
            store.clone(),
            scheduler.clone(),
            settings.schedule_on_create,
        ));

        let api_config = ApiConfig::from_settings(&config.api.clone().unwrap_or_default())?;
        spawn_api_server(
            api_config,
            ApiState::new(service, scheduler.clone(), store.clone()),
        )
        .await?;
    }

    // the hub is serving; restart sweeps may proceed from here on
    readiness.set_running(true);
    debug!("alarmhub running, press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    debug!("shutting down");

    readiness.set_running(false);
    coordinator.on_before_stop();

    if let Err(e) = store.close().await {
        error!("failed to close alarm store: {e}");
    }

    Ok(())
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn AlarmStore>> {
    match config.storage.clone().unwrap_or(StorageConfig::None) {
        #[cfg(feature = "storage-sqlite")]
        StorageConfig::Sqlite { path } => {
            use alarmhub::store::SqliteAlarmStore;
            debug!("using SQLite alarm store at {}", path.display());
            Ok(Arc::new(SqliteAlarmStore::new(path).await?))
        }
        #[cfg(not(feature = "storage-sqlite"))]
        StorageConfig::Sqlite { .. } => {
            anyhow::bail!("sqlite storage configured but the storage-sqlite feature is disabled")
        }
        StorageConfig::None => {
            debug!("using in-memory alarm store");
            Ok(Arc::new(MemoryAlarmStore::new()))
        }
    }
}
