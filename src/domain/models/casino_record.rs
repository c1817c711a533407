// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// 页面上没有任何结构化数据时写入的提示
pub const NO_DATA_MESSAGE: &str = "no data found";

/// 关键词扫描得到的字段
///
/// 这些字段来自启发式扫描，与直接读取的表格数据分开保存
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordScanResult {
    /// 描述文本
    pub description: String,
    /// 匹配到的特性关键词
    pub features: BTreeSet<String>,
    /// 第一个链接
    pub link: String,
    /// 评分
    pub score: f64,
    /// 使用了默认值的字段名
    pub defaulted: BTreeSet<String>,
}

/// 单个页面的提取结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// 页面展示的游戏或赌场名称
    pub name: String,
    /// 类别
    pub category: String,
    /// 统计数据，结构不固定
    pub stats: Map<String, Value>,
    /// 特性标签
    pub features: BTreeSet<String>,
    /// 来源地址
    pub source_url: String,
    /// 是否有任何结构化数据
    pub has_data: bool,
    /// `has_data` 为 false 时的说明
    pub no_data_reason: Option<String>,
    /// 关键词扫描结果，仅在结构化数据为空时存在
    pub heuristic: Option<KeywordScanResult>,
}

impl ExtractedRecord {
    /// 结构化数据中的行数
    pub fn row_count(&self) -> usize {
        self.stats
            .values()
            .filter_map(Value::as_array)
            .map(Vec::len)
            .sum()
    }
}

/// 记录状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Success,
    Error,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Success => write!(f, "success"),
            RecordStatus::Error => write!(f, "error"),
        }
    }
}

/// 已写入存储的记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    /// 存储分配的ID
    pub id: Uuid,
    /// 去重键的取值
    pub identity_key: String,
    pub name: String,
    pub category: String,
    pub stats: Map<String, Value>,
    pub features: BTreeSet<String>,
    pub source_url: String,
    pub has_data: bool,
    pub status: RecordStatus,
    /// 错误信息
    pub message: Option<String>,
    pub heuristic: Option<KeywordScanResult>,
    /// 本次抓取时间
    pub scraped_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 写入存储前的记录内容
///
/// 正常提取结果和抓取失败生成的错误记录都先转换成这个结构
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub name: String,
    pub category: String,
    pub stats: Map<String, Value>,
    pub features: BTreeSet<String>,
    pub source_url: String,
    pub has_data: bool,
    pub status: RecordStatus,
    pub message: Option<String>,
    pub heuristic: Option<KeywordScanResult>,
}

impl From<ExtractedRecord> for RecordDraft {
    fn from(record: ExtractedRecord) -> Self {
        // 空提取按错误状态保存
        let status = if record.has_data {
            RecordStatus::Success
        } else {
            RecordStatus::Error
        };

        Self {
            name: record.name,
            category: record.category,
            stats: record.stats,
            features: record.features,
            source_url: record.source_url,
            has_data: record.has_data,
            status,
            message: record.no_data_reason,
            heuristic: record.heuristic,
        }
    }
}

impl RecordDraft {
    /// 抓取失败时写入的错误记录
    pub fn failure(name: &str, source_url: &str, category: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            stats: Map::new(),
            features: BTreeSet::new(),
            source_url: source_url.to_string(),
            has_data: false,
            status: RecordStatus::Error,
            message: Some(message),
            heuristic: None,
        }
    }
}
