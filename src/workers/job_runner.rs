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

use crate::domain::models::casino_record::{RecordDraft, RecordStatus};
use crate::domain::models::run_report::{RunReport, TargetOutcome};
use crate::domain::models::target::Target;
use crate::domain::repositories::casino_record_repository::CasinoRecordRepository;
use crate::domain::services::extraction_service::Extractor;
use crate::engines::traits::{BrowserLauncher, PageFetcher};
use crate::infrastructure::metrics::{SCRAPE_RUN_DURATION_SECONDS, SCRAPE_TARGETS_TOTAL};
use crate::utils::errors::RunnerError;
use chrono::Utc;
use futures::FutureExt;
use metrics::{counter, histogram};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// 抓取任务运行器
///
/// 一次运行按顺序处理所有目标：抓取、提取、写入。
/// 单个目标的失败只会记录在报告里，不会中断其余目标。
pub struct JobRunner {
    launcher: Arc<dyn BrowserLauncher>,
    repository: Arc<dyn CasinoRecordRepository>,
    extractor: Arc<Extractor>,
}

impl JobRunner {
    /// 创建新的运行器
    ///
    /// # 参数
    ///
    /// * `launcher` - 浏览器启动器，每次运行启动一个浏览器
    /// * `repository` - 记录仓库
    /// * `extractor` - 已编译的提取器
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        repository: Arc<dyn CasinoRecordRepository>,
        extractor: Arc<Extractor>,
    ) -> Self {
        Self {
            launcher,
            repository,
            extractor,
        }
    }

    /// 执行一次完整运行
    ///
    /// # 返回值
    ///
    /// * `Ok(RunReport)` - 报告中的结果与 `targets` 一一对应
    /// * `Err(RunnerError)` - 浏览器无法启动，没有处理任何目标
    pub async fn run_once(&self, targets: &[Target]) -> Result<RunReport, RunnerError> {
        let started = Instant::now();
        let mut report = RunReport::start();
        info!(run_id = %report.run_id, targets = targets.len(), "Starting scrape run");

        let mut fetcher = self.launcher.launch().await.map_err(|e| {
            error!(engine = self.launcher.name(), "Failed to launch browser: {}", e);
            RunnerError::BrowserUnavailable(e.to_string())
        })?;

        for target in targets {
            let outcome = AssertUnwindSafe(self.process_target(fetcher.as_ref(), target))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    let message = panic_message(panic.as_ref());
                    error!(url = %target.url, "Target processing panicked: {}", message);
                    TargetOutcome::failed(target.clone(), format!("panic: {}", message))
                });

            counter!(SCRAPE_TARGETS_TOTAL, "outcome" => outcome_label(&outcome)).increment(1);
            report.push(outcome);
        }

        fetcher.close().await;

        let report = report.finish();
        let summary = report.summary();
        histogram!(SCRAPE_RUN_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        info!(
            run_id = %report.run_id,
            succeeded = summary.succeeded,
            empty = summary.empty,
            failed = summary.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scrape run finished"
        );

        Ok(report)
    }

    #[instrument(skip(self, fetcher, target), fields(url = %target.url, target = target.display_name()))]
    async fn process_target(&self, fetcher: &dyn PageFetcher, target: &Target) -> TargetOutcome {
        let page = match fetcher.fetch(target).await {
            Ok(page) => page,
            Err(e) => {
                warn!(kind = e.kind(), "Fetch failed: {}", e);
                let message = e.to_string();
                // 失败也写入一条错误记录，便于从存储中看到最近一次状态
                if let Err(persist_err) = self
                    .repository
                    .upsert_failure(target, self.extractor.category(), message.clone(), Utc::now())
                    .await
                {
                    error!("Failed to persist error record: {}", persist_err);
                }
                return TargetOutcome::failed(target.clone(), message);
            }
        };

        let record = self.extractor.extract(&page);
        if record.has_data {
            info!(name = %record.name, rows = record.row_count(), "Extracted record");
        } else {
            warn!(name = %record.name, "No structured data found");
        }

        match self
            .repository
            .upsert(RecordDraft::from(record), page.loaded_at)
            .await
        {
            Ok(persisted) => TargetOutcome::scraped(target.clone(), persisted),
            Err(e) => {
                error!("Failed to persist record: {}", e);
                TargetOutcome::failed(target.clone(), e.to_string())
            }
        }
    }
}

fn outcome_label(outcome: &TargetOutcome) -> &'static str {
    match outcome.record() {
        Some(record) if record.status == RecordStatus::Success => "success",
        Some(_) => "empty",
        None => "failed",
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
