// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};

/// 浏览器渲染完成后的页面
///
/// 只在抓取和提取之间传递，提取后即丢弃
#[derive(Debug, Clone)]
pub struct RawPage {
    /// 页面地址
    pub url: String,
    /// 目标名称，页面上找不到名称时使用
    pub label: Option<String>,
    /// 渲染后的HTML
    pub html: String,
    /// 加载完成时间
    pub loaded_at: DateTime<Utc>,
}

impl RawPage {
    pub fn new(url: impl Into<String>, label: Option<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label,
            html: html.into(),
            loaded_at: Utc::now(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.url)
    }
}
