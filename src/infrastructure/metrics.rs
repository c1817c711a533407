// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 每个目标的处理结果，标签 `outcome` = success | empty | failed
pub const SCRAPE_TARGETS_TOTAL: &str = "scrape_targets_total";
/// 一次完整运行的耗时
pub const SCRAPE_RUN_DURATION_SECONDS: &str = "scrape_run_duration_seconds";
/// 因上一次运行未结束而跳过的触发
pub const SCHEDULER_SKIPPED_TICKS_TOTAL: &str = "scheduler_skipped_ticks_total";

/// 启动 Prometheus 导出
///
/// 未启用时不安装记录器，指标宏变为空操作
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        return;
    }

    let addr: SocketAddr = match settings.listen.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", settings.listen, e);
            return;
        }
    };

    // 安装失败（如端口被占用）只记录警告，抓取照常进行
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_counter!(
        SCRAPE_TARGETS_TOTAL,
        Unit::Count,
        "Processed targets by outcome"
    );
    describe_histogram!(
        SCRAPE_RUN_DURATION_SECONDS,
        Unit::Seconds,
        "Duration of a full scrape run"
    );
    describe_counter!(
        SCHEDULER_SKIPPED_TICKS_TOTAL,
        Unit::Count,
        "Ticks skipped because a run was still in progress"
    );

    info!("Metrics exporter listening on {}", addr);
}
