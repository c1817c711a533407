// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、提取服务和仓库接口
pub mod domain;

/// 引擎模块
///
/// 基于无头浏览器的页面抓取
pub mod engines;

/// 基础设施模块
///
/// 数据库、仓库实现和指标导出
pub mod infrastructure;

/// 队列模块
///
/// cron 调度
pub mod queue;

/// 工具模块
pub mod utils;

/// 工作器模块
///
/// 单次抓取运行
pub mod workers;
