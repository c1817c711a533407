// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据驱动的页面提取
pub mod extraction_profile;
pub mod extraction_service;
pub mod keyword_scan;
