// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::casino_record::{PersistedRecord, RecordStatus};
use crate::domain::models::target::Target;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// 单个目标的处理结果
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeResult {
    /// 已提取并写入存储（可能是空数据的错误记录）
    Scraped { record: PersistedRecord },
    /// 抓取或写入失败
    Failed { error: String },
}

/// 目标及其结果
#[derive(Debug, Clone, Serialize)]
pub struct TargetOutcome {
    pub target: Target,
    pub result: OutcomeResult,
}

impl TargetOutcome {
    pub fn scraped(target: Target, record: PersistedRecord) -> Self {
        Self {
            target,
            result: OutcomeResult::Scraped { record },
        }
    }

    pub fn failed(target: Target, error: impl Into<String>) -> Self {
        Self {
            target,
            result: OutcomeResult::Failed {
                error: error.into(),
            },
        }
    }

    pub fn record(&self) -> Option<&PersistedRecord> {
        match &self.result {
            OutcomeResult::Scraped { record } => Some(record),
            OutcomeResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.result {
            OutcomeResult::Scraped { .. } => None,
            OutcomeResult::Failed { error } => Some(error),
        }
    }
}

/// 运行汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// 有数据的目标数
    pub succeeded: usize,
    /// 页面加载成功但没有数据的目标数
    pub empty: usize,
    /// 失败的目标数
    pub failed: usize,
}

/// 一次运行的报告
///
/// `outcomes` 与配置的目标一一对应，顺序一致
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<TargetOutcome>,
}

impl RunReport {
    pub fn start() -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: TargetOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn summary(&self) -> RunSummary {
        self.outcomes
            .iter()
            .fold(RunSummary::default(), |mut acc, outcome| {
                match &outcome.result {
                    OutcomeResult::Scraped { record } if record.status == RecordStatus::Success => {
                        acc.succeeded += 1
                    }
                    OutcomeResult::Scraped { .. } => acc.empty += 1,
                    OutcomeResult::Failed { .. } => acc.failed += 1,
                }
                acc
            })
    }
}
