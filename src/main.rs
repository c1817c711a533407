// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Context;
use casino_scraper::config::settings::Settings;
use casino_scraper::domain::services::extraction_profile::ExtractionProfile;
use casino_scraper::domain::services::extraction_service::Extractor;
use casino_scraper::engines::chromium_engine::ChromiumLauncher;
use casino_scraper::infrastructure::database::connection;
use casino_scraper::infrastructure::metrics::init_metrics;
use casino_scraper::infrastructure::repositories::casino_record_repo_impl::CasinoRecordRepositoryImpl;
use casino_scraper::queue::scheduler::{ScrapeScheduler, TriggerOutcome};
use casino_scraper::utils::telemetry;
use casino_scraper::workers::job_runner::JobRunner;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// 主函数
///
/// 初始化所有组件后，按配置执行一次抓取或进入周期调度
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Settings::new().context("Failed to load configuration")?;

    // 2. Initialize logging and metrics
    telemetry::init_telemetry(&settings.logging);
    info!("Starting casino-scraper...");
    init_metrics(&settings.metrics);

    // 3. Connect to database and run migrations
    let db = connection::connect_and_migrate(&settings.database)
        .await
        .context("Failed to prepare database")?;
    let db = Arc::new(db);
    info!("Database connection established");

    // 4. Compile extraction profile
    let profile = match &settings.scraper.profile_path {
        Some(path) => {
            info!("Loading extraction profile from {}", path);
            ExtractionProfile::from_yaml_file(path)?
        }
        None => ExtractionProfile::default(),
    };
    let extractor = Arc::new(Extractor::new(&profile)?);

    // 5. Initialize components
    let launcher = Arc::new(ChromiumLauncher::from_settings(
        &settings.scraper,
        &profile.ready_selector,
    ));
    let repository = Arc::new(CasinoRecordRepositoryImpl::new(
        db.clone(),
        settings.scraper.identity,
    ));
    let runner = Arc::new(JobRunner::new(launcher, repository, extractor));

    let targets = settings.scraper.targets();
    if targets.is_empty() {
        warn!("No targets configured, runs will be empty");
    }

    let scheduler = ScrapeScheduler::new(&settings.scheduler.schedule, targets, runner)?;

    // 6. One-shot mode
    if !settings.scheduler.enabled {
        info!("Scheduler disabled, running once");
        return match scheduler.trigger_now().await {
            TriggerOutcome::Completed(report) => {
                let summary = report.summary();
                info!(
                    succeeded = summary.succeeded,
                    empty = summary.empty,
                    failed = summary.failed,
                    "Run complete"
                );
                Ok(())
            }
            TriggerOutcome::Failed(reason) => Err(anyhow::anyhow!(reason)),
            TriggerOutcome::Skipped => Ok(()),
        };
    }

    // 7. Scheduled mode
    if settings.scheduler.run_on_start {
        if let TriggerOutcome::Failed(reason) = scheduler.trigger_now().await {
            error!("Initial run failed: {}", reason);
        }
    }

    scheduler.start().await?;
    let status = scheduler.status().await;
    info!(
        schedule = %status.schedule,
        next_run = ?status.next_run_estimate,
        "Waiting for scheduled runs"
    );

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Unable to listen for shutdown signal: {}", e),
    }

    scheduler.shutdown().await?;
    let status = scheduler.status().await;
    info!(
        completed_runs = status.completed_runs,
        skipped_ticks = status.skipped_ticks,
        "casino-scraper stopped"
    );

    Ok(())
}
