// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::casino_record::RecordStatus;
use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(
    rs_type = "String",
    db_type = "String(StringLen::N(20))",
    enum_name = "record_status"
)]
pub enum SeaRecordStatus {
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "error")]
    Error,
}

impl From<RecordStatus> for SeaRecordStatus {
    fn from(status: RecordStatus) -> Self {
        match status {
            RecordStatus::Success => SeaRecordStatus::Success,
            RecordStatus::Error => SeaRecordStatus::Error,
        }
    }
}

impl From<SeaRecordStatus> for RecordStatus {
    fn from(status: SeaRecordStatus) -> Self {
        match status {
            SeaRecordStatus::Success => RecordStatus::Success,
            SeaRecordStatus::Error => RecordStatus::Error,
        }
    }
}
