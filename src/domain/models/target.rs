// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use url::Url;

/// 抓取目标
///
/// 来自配置的只读数据，不会写入数据库
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// 页面地址
    pub url: String,
    /// 便于阅读的名称
    pub label: Option<String>,
}

impl Target {
    /// 根据URL创建目标，名称取自主机名和最后一段路径
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let label = derive_label(&url);
        Self { url, label }
    }

    pub fn with_label(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: Some(label.into()),
        }
    }

    /// 日志和兜底记录使用的名称
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.url)
    }
}

fn derive_label(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    let host = parsed.host_str()?.trim_start_matches("www.");
    let last_segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last());

    Some(match last_segment {
        Some(segment) => format!("{}/{}", host, segment),
        None => host.to_string(),
    })
}
