// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::casino_record::{PersistedRecord, RecordDraft};
use crate::domain::models::target::Target;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// 记录去重使用的自然键
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKey {
    /// 按来源地址去重，每个目标一条记录
    #[default]
    SourceUrl,
    /// 按页面上的名称去重
    Name,
}

impl IdentityKey {
    /// 取出草稿中对应的键值
    pub fn key_for(&self, draft: &RecordDraft) -> String {
        match self {
            IdentityKey::SourceUrl => draft.source_url.clone(),
            IdentityKey::Name => draft.name.clone(),
        }
    }
}

/// 赌场记录仓库特质
///
/// 写入一律是 upsert，同一个键最多一条记录
#[async_trait]
pub trait CasinoRecordRepository: Send + Sync {
    /// 按去重键插入或整体替换记录
    async fn upsert(
        &self,
        draft: RecordDraft,
        scraped_at: DateTime<Utc>,
    ) -> Result<PersistedRecord, RepositoryError>;

    /// 保存抓取失败生成的错误记录，去重规则与 `upsert` 相同
    ///
    /// 默认以目标标签作为名称
    async fn upsert_failure(
        &self,
        target: &Target,
        category: &str,
        message: String,
        scraped_at: DateTime<Utc>,
    ) -> Result<PersistedRecord, RepositoryError> {
        let draft = RecordDraft::failure(target.display_name(), &target.url, category, message);
        self.upsert(draft, scraped_at).await
    }

    /// 按去重键查找
    async fn find_by_identity(&self, key: &str) -> Result<Option<PersistedRecord>, RepositoryError>;

    /// 最近抓取的记录，按抓取时间倒序
    async fn find_recent(&self, limit: u64) -> Result<Vec<PersistedRecord>, RepositoryError>;
}
