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

use crate::domain::models::target::Target;
use crate::domain::repositories::casino_record_repository::IdentityKey;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// 应用程序配置设置
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 抓取配置
    pub scraper: ScraperSettings,
    /// 调度配置
    pub scheduler: SchedulerSettings,
    /// 日志配置
    pub logging: LoggingSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 数据库配置设置
#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 抓取配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperSettings {
    /// 目标站点，按配置顺序处理
    pub targets: Vec<String>,
    /// 页面导航超时（毫秒）
    pub fetch_timeout_ms: u64,
    /// 等待数据表格出现的超时（毫秒）
    pub content_ready_timeout_ms: u64,
    /// 是否以无头模式启动浏览器
    pub headless: bool,
    /// 去重使用的自然键
    pub identity: IdentityKey,
    /// 自定义提取配置 (YAML)
    pub profile_path: Option<String>,
    /// 浏览器 User-Agent
    pub user_agent: String,
    /// Accept-Language 请求头
    pub accept_language: String,
    /// 视口宽度
    pub viewport_width: u32,
    /// 视口高度
    pub viewport_height: u32,
    /// Chrome 可执行文件路径
    pub chrome_executable: Option<String>,
    /// 远程 Chrome 调试地址，设置后不再本地启动浏览器
    pub remote_debugging_url: Option<String>,
}

/// 调度配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// 关闭时进程只执行一次抓取后退出
    pub enabled: bool,
    /// cron 表达式（5 段）
    pub schedule: String,
    /// 启动后立即执行一次
    pub run_on_start: bool,
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// EnvFilter 语法的过滤规则
    pub filter: String,
    /// 输出格式
    pub format: LogFormat,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出
    pub enabled: bool,
    /// 导出监听地址
    pub listen: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次合并默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和 `SCRAPER__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(Self::environment())
    }

    /// 使用指定的环境变量源加载配置
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());

        Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    /// 环境变量源
    ///
    /// `SCRAPER__SCRAPER__TARGETS` 以逗号分隔
    pub fn environment() -> Environment {
        Environment::with_prefix("SCRAPER")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("scraper.targets")
            .try_parsing(true)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("database.url", "sqlite://casino_scraper.db?mode=rwc")?
            .set_default("database.max_connections", 5)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default(
                "scraper.targets",
                vec![
                    "https://casinoscores.com/crazy-time/",
                    "https://casinoscores.com/monopoly-live/",
                    "https://casinoscores.com/lightning-roulette/",
                ],
            )?
            .set_default("scraper.fetch_timeout_ms", 30_000)?
            .set_default("scraper.content_ready_timeout_ms", 15_000)?
            .set_default("scraper.headless", true)?
            .set_default("scraper.identity", "source_url")?
            .set_default("scraper.user_agent", DEFAULT_USER_AGENT)?
            .set_default("scraper.accept_language", "en-US,en;q=0.9")?
            .set_default("scraper.viewport_width", 1366)?
            .set_default("scraper.viewport_height", 768)?
            .set_default("scheduler.enabled", true)?
            .set_default("scheduler.schedule", "* * * * *")?
            .set_default("scheduler.run_on_start", false)?
            .set_default("logging.filter", "info,casino_scraper=debug")?
            .set_default("logging.format", "pretty")?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen", "0.0.0.0:9000")
    }
}

impl ScraperSettings {
    /// 按配置顺序生成抓取目标
    pub fn targets(&self) -> Vec<Target> {
        self.targets
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(Target::new)
            .collect()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn content_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.content_ready_timeout_ms)
    }
}
