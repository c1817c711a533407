// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::DbErr;
use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;

/// 仓库层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("数据库错误: {0}")]
    Database(#[from] DbErr),

    /// 未找到数据
    #[error("未找到数据")]
    NotFound,

    /// 数据序列化失败
    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 提取配置错误类型
///
/// 只在编译提取配置时出现，提取本身永不失败
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("无效的选择器 `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("无效的正则表达式 `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("区块 `{section}` 的过滤条件引用了不存在的字段 `{field}`")]
    UnknownField { section: String, field: String },

    #[error("无法读取提取配置 {path}: {reason}")]
    ProfileLoad { path: String, reason: String },
}

/// 任务运行器错误类型
///
/// 单个目标的失败不会变成这个错误，只有整个运行无法开始时才会返回
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("浏览器不可用: {0}")]
    BrowserUnavailable(String),
}

/// 调度器错误类型
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("无效的调度表达式 `{0}`")]
    InvalidSchedule(String),

    #[error("调度器错误: {0}")]
    Scheduler(#[from] JobSchedulerError),
}
