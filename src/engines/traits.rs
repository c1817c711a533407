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

use crate::domain::models::raw_page::RawPage;
use crate::domain::models::target::Target;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 抓取错误类型
#[derive(Error, Debug)]
pub enum FetchError {
    /// 页面在超时内无法加载
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    /// 数据表格没有在超时内出现
    #[error("Content at {url} not ready after {timeout_ms} ms (waiting for `{selector}`)")]
    ContentTimeout {
        url: String,
        selector: String,
        timeout_ms: u64,
    },
    /// 浏览器本身出错
    #[error("Browser error: {0}")]
    Browser(String),
}

impl FetchError {
    /// 错误类别，用于日志和指标标签
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Navigation { .. } => "navigation",
            FetchError::ContentTimeout { .. } => "content_timeout",
            FetchError::Browser(_) => "browser",
        }
    }
}

/// 客户端身份
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub user_agent: String,
    pub accept_language: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

/// 抓取参数
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// 导航超时
    pub navigation_timeout: Duration,
    /// 等待数据出现的超时，通常比导航超时短
    pub content_ready_timeout: Duration,
    /// 表示数据已渲染的选择器
    pub ready_selector: String,
    pub identity: ClientIdentity,
}

/// 页面抓取器
///
/// 一个实例对应一个浏览器进程，每次 `fetch` 使用一个新标签页
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 加载页面并等待数据出现
    async fn fetch(&self, target: &Target) -> Result<RawPage, FetchError>;

    /// 关闭浏览器，之后不能再调用 `fetch`
    async fn close(&mut self);
}

/// 浏览器启动器
///
/// 每次运行开始时启动一个浏览器，运行结束时关闭
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageFetcher>, FetchError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
