// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::ExtractionError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 单元格缺失时的占位值
pub const NOT_AVAILABLE: &str = "N/A";

/// 榜单类区块的行数上限
pub const TOP_N: usize = 5;

/// 提取配置
///
/// 描述页面上每个区块的位置和字段，提取器据此工作而不写死页面结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionProfile {
    /// 表示数据已渲染的元素
    pub ready_selector: String,
    /// 名称所在元素
    pub name_selector: String,
    /// 记录类别
    pub category: String,
    /// 结构化区块，按顺序提取
    pub sections: Vec<TableSection>,
    /// 结构化区块全部为空时使用的关键词扫描
    pub keyword_scan: KeywordScanRule,
}

/// 表格区块
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSection {
    /// 写入 stats 时使用的键
    pub key: String,
    /// 行选择器
    pub rows: String,
    /// 行内单元格选择器
    #[serde(default = "default_cell_selector")]
    pub cell: String,
    /// 按位置读取的字段
    pub fields: Vec<FieldRule>,
    /// 最多保留的行数
    #[serde(default)]
    pub limit: Option<usize>,
    /// 行过滤条件
    #[serde(default)]
    pub filter: Option<RowFilter>,
}

/// 字段提取规则：位置 + 类型 + 占位值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRule {
    pub name: String,
    /// 单元格下标，从 0 开始
    pub position: usize,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

/// 字段类型
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    /// 解析为数字，失败时保留原文
    Number,
    /// 读取单元格或其子元素的属性
    Attribute { name: String },
}

/// 中奖记录的有效性条件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowFilter {
    /// 日期字段，必须非空
    pub date_field: String,
    /// 金额字段，必须带货币符号
    pub amount_field: String,
    /// 玩家字段
    pub player_field: String,
    #[serde(default = "default_currency_pattern")]
    pub currency_pattern: String,
    /// 只有倍数的“玩家名”会被剔除
    #[serde(default = "default_multiplier_pattern")]
    pub multiplier_pattern: String,
    /// 玩家名最少要超过的字符数
    #[serde(default = "default_min_player_len")]
    pub min_player_len: usize,
}

/// 关键词扫描规则
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordScanRule {
    pub keyword: String,
    #[serde(default = "default_description_min")]
    pub description_min: usize,
    #[serde(default = "default_description_max")]
    pub description_max: usize,
    /// 出现在文本中即记为特性
    pub feature_keywords: Vec<String>,
    #[serde(default = "default_score_pattern")]
    pub score_pattern: String,
    pub default_description: String,
    pub default_features: Vec<String>,
}

fn default_cell_selector() -> String {
    "td".to_string()
}

fn default_fallback() -> String {
    NOT_AVAILABLE.to_string()
}

fn default_currency_pattern() -> String {
    r"^[€$£]\s?\d[\d,]*(\.\d+)?$".to_string()
}

fn default_multiplier_pattern() -> String {
    r"(?i)^\d+(\.\d+)?x$".to_string()
}

fn default_min_player_len() -> usize {
    2
}

fn default_description_min() -> usize {
    50
}

fn default_description_max() -> usize {
    500
}

fn default_score_pattern() -> String {
    r"(?i)(\d+(?:\.\d+)?)\s*(?:stars?|points?|rating)".to_string()
}

fn field(name: &str, position: usize, kind: FieldKind) -> FieldRule {
    FieldRule {
        name: name.to_string(),
        position,
        kind,
        fallback: default_fallback(),
    }
}

impl ExtractionProfile {
    /// 从 YAML 文件加载
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ExtractionError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ExtractionError::ProfileLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| ExtractionError::ProfileLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// 直播游戏统计页面的默认配置
    ///
    /// 三个区块：开奖历史、前 5 高倍数、大额中奖记录
    pub fn live_game_stats() -> Self {
        Self {
            ready_selector: "table#spin-history tbody tr".to_string(),
            name_selector: "h1".to_string(),
            category: "live-game-show".to_string(),
            sections: vec![
                TableSection {
                    key: "rounds".to_string(),
                    rows: "table#spin-history tbody tr".to_string(),
                    cell: default_cell_selector(),
                    fields: vec![
                        field("time", 0, FieldKind::Text),
                        field("result", 1, FieldKind::Text),
                        field("multiplier", 2, FieldKind::Number),
                        field("total_winners", 3, FieldKind::Number),
                        field("total_payout", 4, FieldKind::Text),
                    ],
                    limit: None,
                    filter: None,
                },
                TableSection {
                    key: "top_multipliers".to_string(),
                    rows: "table#top-multipliers tbody tr".to_string(),
                    cell: default_cell_selector(),
                    fields: vec![
                        field("date", 0, FieldKind::Text),
                        field("result", 1, FieldKind::Text),
                        field("multiplier", 2, FieldKind::Number),
                    ],
                    limit: Some(TOP_N),
                    filter: None,
                },
                TableSection {
                    key: "win_records".to_string(),
                    rows: "table#biggest-wins tbody tr".to_string(),
                    cell: default_cell_selector(),
                    fields: vec![
                        field("date", 0, FieldKind::Text),
                        field("player", 1, FieldKind::Text),
                        field("amount", 2, FieldKind::Text),
                        field("multiplier", 3, FieldKind::Number),
                    ],
                    limit: None,
                    filter: Some(RowFilter {
                        date_field: "date".to_string(),
                        amount_field: "amount".to_string(),
                        player_field: "player".to_string(),
                        currency_pattern: default_currency_pattern(),
                        multiplier_pattern: default_multiplier_pattern(),
                        min_player_len: default_min_player_len(),
                    }),
                },
            ],
            keyword_scan: KeywordScanRule {
                keyword: "casino".to_string(),
                description_min: default_description_min(),
                description_max: default_description_max(),
                feature_keywords: [
                    "Live Dealer",
                    "Mobile",
                    "Welcome Bonus",
                    "Free Spins",
                    "Cashback",
                    "Crypto",
                    "VIP",
                    "24/7 Support",
                    "Fast Payouts",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
                score_pattern: default_score_pattern(),
                default_description:
                    "Online casino featuring live dealer games and real-time game statistics."
                        .to_string(),
                default_features: vec!["Live Casino".to_string()],
            },
        }
    }
}

impl Default for ExtractionProfile {
    fn default() -> Self {
        Self::live_game_stats()
    }
}
