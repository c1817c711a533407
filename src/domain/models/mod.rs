// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod casino_record;
pub mod raw_page;
pub mod run_report;
pub mod target;
