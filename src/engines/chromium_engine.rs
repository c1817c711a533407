// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScraperSettings;
use crate::domain::models::raw_page::RawPage;
use crate::domain::models::target::Target;
use crate::engines::traits::{BrowserLauncher, ClientIdentity, FetchError, FetchOptions, PageFetcher};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde_json::json;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

/// 检查数据是否出现的间隔
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Chromium 启动器
///
/// 基于 chromiumoxide (CDP)，页面脚本会被执行，适用于动态渲染的统计页面
pub struct ChromiumLauncher {
    options: FetchOptions,
    headless: bool,
    executable: Option<String>,
    remote_debugging_url: Option<String>,
}

impl ChromiumLauncher {
    pub fn new(options: FetchOptions, headless: bool) -> Self {
        Self {
            options,
            headless,
            executable: None,
            remote_debugging_url: None,
        }
    }

    /// 根据配置创建启动器，`ready_selector` 来自提取配置
    pub fn from_settings(settings: &ScraperSettings, ready_selector: &str) -> Self {
        let options = FetchOptions {
            navigation_timeout: settings.fetch_timeout(),
            content_ready_timeout: settings.content_ready_timeout(),
            ready_selector: ready_selector.to_string(),
            identity: ClientIdentity {
                user_agent: settings.user_agent.clone(),
                accept_language: settings.accept_language.clone(),
                viewport_width: settings.viewport_width,
                viewport_height: settings.viewport_height,
            },
        };

        Self {
            options,
            headless: settings.headless,
            executable: settings.chrome_executable.clone(),
            remote_debugging_url: settings.remote_debugging_url.clone(),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, FetchError> {
        let identity = &self.options.identity;
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(self.options.navigation_timeout)
            .window_size(identity.viewport_width, identity.viewport_height)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--lang={}", primary_language(&identity.accept_language)));

        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(FetchError::Browser)
    }
}

/// "en-US,en;q=0.9" -> "en-US"
fn primary_language(accept_language: &str) -> &str {
    accept_language
        .split([',', ';'])
        .next()
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .unwrap_or("en-US")
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn PageFetcher>, FetchError> {
        let (browser, mut handler) = if let Some(url) = &self.remote_debugging_url {
            info!("Connecting to remote Chrome instance at: {}", url);
            Browser::connect(url.as_str())
                .await
                .map_err(|e| FetchError::Browser(format!("Failed to connect to remote Chrome: {}", e)))?
        } else {
            Browser::launch(self.browser_config()?)
                .await
                .map_err(|e| FetchError::Browser(format!("Failed to launch Chrome: {}", e)))?
        };

        // 浏览器事件必须持续消费，否则所有命令都会挂起
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        info!(headless = self.headless, "Browser launched");

        Ok(Box::new(ChromiumFetcher {
            browser: Some(browser),
            owned: self.remote_debugging_url.is_none(),
            handler_task,
            options: self.options.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

/// 单次运行内使用的浏览器
pub struct ChromiumFetcher {
    browser: Option<Browser>,
    /// 远程浏览器不由我们关闭
    owned: bool,
    handler_task: JoinHandle<()>,
    options: FetchOptions,
}

impl ChromiumFetcher {
    async fn load(&self, page: &Page, target: &Target) -> Result<RawPage, FetchError> {
        self.apply_identity(page).await?;

        let navigation_timeout = self.options.navigation_timeout;
        match timeout(navigation_timeout, page.goto(target.url.as_str())).await {
            Err(_) => {
                return Err(FetchError::Navigation {
                    url: target.url.clone(),
                    reason: format!("timed out after {} ms", navigation_timeout.as_millis()),
                })
            }
            Ok(Err(e)) => {
                return Err(FetchError::Navigation {
                    url: target.url.clone(),
                    reason: e.to_string(),
                })
            }
            Ok(Ok(_)) => {}
        }

        self.wait_until_ready(page, target).await?;

        let html = page
            .content()
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to read page content: {}", e)))?;

        Ok(RawPage::new(target.url.clone(), target.label.clone(), html))
    }

    async fn apply_identity(&self, page: &Page) -> Result<(), FetchError> {
        let identity = &self.options.identity;

        let user_agent = SetUserAgentOverrideParams::builder()
            .user_agent(identity.user_agent.clone())
            .accept_language(identity.accept_language.clone())
            .build()
            .map_err(FetchError::Browser)?;
        page.execute(user_agent)
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to set user agent: {}", e)))?;

        let headers = SetExtraHttpHeadersParams::new(Headers::new(json!({
            "Accept-Language": identity.accept_language,
        })));
        page.execute(headers)
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to set headers: {}", e)))?;

        let viewport = SetDeviceMetricsOverrideParams::new(
            i64::from(identity.viewport_width),
            i64::from(identity.viewport_height),
            1.0,
            false,
        );
        page.execute(viewport)
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to set viewport: {}", e)))?;

        Ok(())
    }

    async fn wait_until_ready(&self, page: &Page, target: &Target) -> Result<(), FetchError> {
        let selector = self.options.ready_selector.as_str();
        let poll = async {
            loop {
                if page.find_element(selector).await.is_ok() {
                    return;
                }
                sleep(READY_POLL_INTERVAL).await;
            }
        };

        timeout(self.options.content_ready_timeout, poll)
            .await
            .map_err(|_| FetchError::ContentTimeout {
                url: target.url.clone(),
                selector: selector.to_string(),
                timeout_ms: self.options.content_ready_timeout.as_millis() as u64,
            })
    }
}

#[async_trait]
impl PageFetcher for ChromiumFetcher {
    #[instrument(skip(self, target), fields(url = %target.url))]
    async fn fetch(&self, target: &Target) -> Result<RawPage, FetchError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| FetchError::Browser("browser already closed".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to open tab: {}", e)))?;

        let result = self.load(&page, target).await;

        // 无论成功与否都关闭标签页
        if let Err(e) = page.close().await {
            warn!("Failed to close tab for {}: {}", target.url, e);
        }

        result
    }

    async fn close(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            if self.owned {
                if let Err(e) = browser.close().await {
                    warn!("Failed to close browser: {}", e);
                }
                if let Err(e) = browser.wait().await {
                    debug!("Failed to wait for browser exit: {}", e);
                }
            }
            info!("Browser closed");
        }
        self.handler_task.abort();
    }
}

impl Drop for ChromiumFetcher {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}
