// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::run_report::RunReport;
use crate::domain::models::target::Target;
use crate::infrastructure::metrics::SCHEDULER_SKIPPED_TICKS_TOTAL;
use crate::utils::errors::SchedulerError;
use crate::workers::job_runner::JobRunner;
use chrono::{DateTime, Utc};
use metrics::counter;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};
use uuid::Uuid;

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Running,
}

/// 触发来源
#[derive(Debug, Clone, Copy)]
enum TriggerSource {
    Cron,
    Manual,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerSource::Cron => write!(f, "cron"),
            TriggerSource::Manual => write!(f, "manual"),
        }
    }
}

/// 一次触发的结果
#[derive(Debug, Clone)]
pub enum TriggerOutcome {
    /// 上一次运行尚未结束，本次触发被丢弃
    Skipped,
    Completed(RunReport),
    /// 运行无法开始（例如浏览器不可用）
    Failed(String),
}

/// 调度器状态快照
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub is_running: bool,
    /// 配置的 cron 表达式
    pub schedule: String,
    /// 下一次触发时间，调度器未启动时为 None
    pub next_run_estimate: Option<DateTime<Utc>>,
    pub completed_runs: u64,
    pub skipped_ticks: u64,
}

/// 运行结束（包括 panic 展开）时恢复为空闲
struct RunGuard<'a> {
    state: &'a Mutex<RunState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock() = RunState::Idle;
    }
}

struct SchedulerCore {
    runner: Arc<JobRunner>,
    targets: Vec<Target>,
    state: Mutex<RunState>,
    last_report: Mutex<Option<RunReport>>,
    completed_runs: AtomicU64,
    skipped_ticks: AtomicU64,
}

impl SchedulerCore {
    fn try_begin(&self) -> Option<RunGuard<'_>> {
        let mut state = self.state.lock();
        if *state == RunState::Running {
            return None;
        }
        *state = RunState::Running;
        Some(RunGuard { state: &self.state })
    }

    async fn trigger(&self, source: TriggerSource) -> TriggerOutcome {
        let Some(_guard) = self.try_begin() else {
            self.skipped_ticks.fetch_add(1, Ordering::Relaxed);
            counter!(SCHEDULER_SKIPPED_TICKS_TOTAL).increment(1);
            warn!(%source, "Previous run still in progress, skipping");
            return TriggerOutcome::Skipped;
        };

        info!(%source, "Scheduled run triggered");
        match self.runner.run_once(&self.targets).await {
            Ok(report) => {
                self.completed_runs.fetch_add(1, Ordering::Relaxed);
                *self.last_report.lock() = Some(report.clone());
                TriggerOutcome::Completed(report)
            }
            Err(e) => {
                error!(%source, "Run failed to start: {}", e);
                TriggerOutcome::Failed(e.to_string())
            }
        }
    }
}

/// 抓取调度器
///
/// 按 cron 周期调用 [`JobRunner`]，同一时间最多一次运行。
/// 周期触发和手动触发共用同一个运行状态。
pub struct ScrapeScheduler {
    core: Arc<SchedulerCore>,
    schedule: String,
    cron: tokio::sync::Mutex<Option<(JobScheduler, Uuid)>>,
}

impl ScrapeScheduler {
    /// 创建调度器，此时还不会注册周期任务
    ///
    /// # 参数
    ///
    /// * `schedule` - 5 段或 6 段 cron 表达式
    /// * `targets` - 每次运行处理的目标，顺序即处理顺序
    /// * `runner` - 任务运行器
    ///
    /// # 返回值
    ///
    /// * `Err(SchedulerError::InvalidSchedule)` - 表达式段数不正确
    pub fn new(
        schedule: &str,
        targets: Vec<Target>,
        runner: Arc<JobRunner>,
    ) -> Result<Self, SchedulerError> {
        normalize_cron(schedule)?;

        Ok(Self {
            core: Arc::new(SchedulerCore {
                runner,
                targets,
                state: Mutex::new(RunState::Idle),
                last_report: Mutex::new(None),
                completed_runs: AtomicU64::new(0),
                skipped_ticks: AtomicU64::new(0),
            }),
            schedule: schedule.trim().to_string(),
            cron: tokio::sync::Mutex::new(None),
        })
    }

    /// 立即执行一次，正在运行时返回 `Skipped`
    pub async fn trigger_now(&self) -> TriggerOutcome {
        self.core.trigger(TriggerSource::Manual).await
    }

    /// 注册周期任务并启动
    ///
    /// 重复调用不会注册第二个任务
    pub async fn start(&self) -> Result<(), SchedulerError> {
        let mut cron = self.cron.lock().await;
        if cron.is_some() {
            return Ok(());
        }

        let expression = normalize_cron(&self.schedule)?;
        let scheduler = JobScheduler::new().await?;

        let core = self.core.clone();
        let job = Job::new_async(expression.as_str(), move |_job_id, _scheduler| {
            let core = core.clone();
            Box::pin(async move {
                core.trigger(TriggerSource::Cron).await;
            })
        })
        .map_err(|e| SchedulerError::InvalidSchedule(format!("{}: {}", self.schedule, e)))?;

        let job_id = scheduler.add(job).await?;
        scheduler.start().await?;
        info!(schedule = %self.schedule, "Scheduler started");

        *cron = Some((scheduler, job_id));
        Ok(())
    }

    /// 停止周期任务，正在进行的运行不受影响
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        if let Some((mut scheduler, _)) = self.cron.lock().await.take() {
            scheduler.shutdown().await?;
            info!("Scheduler stopped");
        }
        Ok(())
    }

    pub async fn status(&self) -> SchedulerStatus {
        let next_run_estimate = match self.cron.lock().await.as_mut() {
            Some((scheduler, job_id)) => scheduler
                .next_tick_for_job(*job_id)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        SchedulerStatus {
            is_running: self.is_running(),
            schedule: self.schedule.clone(),
            next_run_estimate,
            completed_runs: self.core.completed_runs.load(Ordering::Relaxed),
            skipped_ticks: self.core.skipped_ticks.load(Ordering::Relaxed),
        }
    }

    pub fn is_running(&self) -> bool {
        *self.core.state.lock() == RunState::Running
    }

    /// 最近一次完成的运行报告
    pub fn last_report(&self) -> Option<RunReport> {
        self.core.last_report.lock().clone()
    }
}

/// 把 5 段 cron 表达式补成带秒的 6 段形式
///
/// "*/5 * * * *" -> "0 */5 * * * *"；6 段和 7 段原样返回
pub fn normalize_cron(expression: &str) -> Result<String, SchedulerError> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    match fields.len() {
        5 => Ok(format!("0 {}", fields.join(" "))),
        6 | 7 => Ok(fields.join(" ")),
        _ => Err(SchedulerError::InvalidSchedule(expression.to_string())),
    }
}
