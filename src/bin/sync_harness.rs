use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use agrisync::infrastructure::connectivity::ManualConnectivityWatcher;
use agrisync::infrastructure::offline::SyncMetricsSnapshot;
use agrisync::infrastructure::remote::RestRemoteService;
use agrisync::shared::config::AppConfig;
use agrisync::{Farm, LinkInfo, OfflineExport, OfflineService, OfflineStats, SyncReport};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone)]
struct HarnessConfig {
    start_online: bool,
    create_farm: Option<String>,
    run_seconds: u64,
    include_export: bool,
    summary_path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HarnessSummary {
    stats: OfflineStats,
    metrics: SyncMetricsSnapshot,
    final_run: SyncReport,
    farms: Vec<Farm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    export: Option<OfflineExport>,
}

fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

impl HarnessConfig {
    fn from_env() -> Self {
        Self {
            start_online: env_flag("AGRISYNC_HARNESS_ONLINE", true),
            create_farm: std::env::var("AGRISYNC_HARNESS_CREATE_FARM")
                .ok()
                .filter(|name| !name.trim().is_empty()),
            run_seconds: std::env::var("AGRISYNC_HARNESS_RUN_SECONDS")
                .ok()
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(0),
            include_export: env_flag("AGRISYNC_HARNESS_EXPORT", false),
            summary_path: std::env::var("AGRISYNC_HARNESS_SUMMARY_PATH")
                .ok()
                .map(PathBuf::from),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    agrisync::init_logging();

    let harness = HarnessConfig::from_env();
    let config = AppConfig::from_env();
    config
        .validate()
        .map_err(|err| anyhow::anyhow!("invalid configuration: {err}"))?;

    let remote = Arc::new(RestRemoteService::new(&config.remote)?);
    let watcher = Arc::new(ManualConnectivityWatcher::new());
    let service = OfflineService::with_sqlite(config, remote, watcher.clone()).await?;
    service.init().await?;

    if harness.start_online {
        watcher.set_online(LinkInfo::new("ethernet", "ethernet"));
    }

    let farms = service.accessor::<Farm>()?;
    if let Some(name) = &harness.create_farm {
        let outcome = farms.create(Farm::new(name.clone())).await?;
        info!(
            source = ?outcome.source,
            deferred = outcome.is_deferred(),
            "farm created"
        );
    }

    if harness.run_seconds > 0 {
        tokio::time::sleep(Duration::from_secs(harness.run_seconds)).await;
    }

    let final_run = service.trigger_sync().await;
    if final_run.failed > 0 {
        warn!(failed = final_run.failed, "some queued actions failed");
    }

    let summary = HarnessSummary {
        stats: service.offline_stats().await,
        metrics: service.sync_metrics(),
        final_run,
        farms: farms.get_all().await,
        export: if harness.include_export {
            Some(service.export_offline_data().await)
        } else {
            None
        },
    };
    service.shutdown().await;

    let rendered = serde_json::to_string_pretty(&summary)?;
    match &harness.summary_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, rendered)?;
            info!(path = %path.display(), "summary written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
