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

use crate::domain::models::casino_record::{KeywordScanResult, PersistedRecord, RecordDraft};
use crate::domain::models::target::Target;
use crate::domain::repositories::casino_record_repository::{CasinoRecordRepository, IdentityKey};
use crate::infrastructure::database::entities::casino_record as record_entity;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::*;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 赌场记录仓库实现
pub struct CasinoRecordRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
    /// 去重键
    identity: IdentityKey,
}

impl CasinoRecordRepositoryImpl {
    /// 创建新的仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    /// * `identity` - 去重使用的自然键
    ///
    /// # 返回值
    ///
    /// 返回新的仓库实例
    pub fn new(db: Arc<DatabaseConnection>, identity: IdentityKey) -> Self {
        Self { db, identity }
    }

    /// 失败记录使用的名称
    ///
    /// 按名称去重时沿用该地址最近一次记录的名称，失败结果才能落到同一行
    async fn failure_name(&self, target: &Target) -> Result<String, RepositoryError> {
        if self.identity == IdentityKey::SourceUrl {
            return Ok(target.display_name().to_string());
        }

        let latest = record_entity::Entity::find()
            .filter(record_entity::Column::Url.eq(target.url.as_str()))
            .order_by_desc(record_entity::Column::ScrapedAt)
            .one(self.db.as_ref())
            .await?;

        Ok(latest
            .map(|model| model.name)
            .unwrap_or_else(|| target.display_name().to_string()))
    }
}

/// 草稿中的 JSON 列
struct DraftColumns {
    stats: Value,
    features: Value,
    heuristic: Option<Value>,
}

impl DraftColumns {
    fn from_draft(draft: &RecordDraft) -> Result<Self, RepositoryError> {
        Ok(Self {
            stats: Value::Object(draft.stats.clone()),
            features: serde_json::to_value(&draft.features)?,
            heuristic: draft
                .heuristic
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
        })
    }
}

fn to_domain(model: record_entity::Model) -> Result<PersistedRecord, RepositoryError> {
    let stats: Map<String, Value> = serde_json::from_value(model.stats)?;
    let features: BTreeSet<String> = serde_json::from_value(model.features)?;
    let heuristic: Option<KeywordScanResult> = model
        .heuristic
        .map(serde_json::from_value)
        .transpose()?;

    Ok(PersistedRecord {
        id: model.id,
        identity_key: model.identity_key,
        name: model.name,
        category: model.record_type,
        stats,
        features,
        source_url: model.url,
        has_data: model.has_data,
        status: model.status.into(),
        message: model.message,
        heuristic,
        scraped_at: model.scraped_at.into(),
        created_at: model.created_at.into(),
        updated_at: model.updated_at.into(),
    })
}

#[async_trait]
impl CasinoRecordRepository for CasinoRecordRepositoryImpl {
    async fn upsert(
        &self,
        draft: RecordDraft,
        scraped_at: DateTime<Utc>,
    ) -> Result<PersistedRecord, RepositoryError> {
        let key = self.identity.key_for(&draft);
        let columns = DraftColumns::from_draft(&draft)?;
        let now = Utc::now();

        let txn = self.db.begin().await?;

        let existing = record_entity::Entity::find()
            .filter(record_entity::Column::IdentityKey.eq(key.as_str()))
            .one(&txn)
            .await?;

        let model = match existing {
            Some(found) => {
                debug!(identity_key = %key, "Replacing existing record");
                // 整体替换，保留 id 和 created_at
                let mut model: record_entity::ActiveModel = found.into();
                model.name = Set(draft.name);
                model.record_type = Set(draft.category);
                model.stats = Set(columns.stats);
                model.features = Set(columns.features);
                model.url = Set(draft.source_url);
                model.has_data = Set(draft.has_data);
                model.status = Set(draft.status.into());
                model.message = Set(draft.message);
                model.heuristic = Set(columns.heuristic);
                model.scraped_at = Set(scraped_at.into());
                model.updated_at = Set(now.into());
                model.update(&txn).await?
            }
            None => {
                debug!(identity_key = %key, "Inserting new record");
                let model = record_entity::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    identity_key: Set(key),
                    name: Set(draft.name),
                    record_type: Set(draft.category),
                    stats: Set(columns.stats),
                    features: Set(columns.features),
                    url: Set(draft.source_url),
                    has_data: Set(draft.has_data),
                    status: Set(draft.status.into()),
                    message: Set(draft.message),
                    heuristic: Set(columns.heuristic),
                    scraped_at: Set(scraped_at.into()),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                };
                model.insert(&txn).await?
            }
        };

        txn.commit().await?;
        to_domain(model)
    }

    async fn upsert_failure(
        &self,
        target: &Target,
        category: &str,
        message: String,
        scraped_at: DateTime<Utc>,
    ) -> Result<PersistedRecord, RepositoryError> {
        let name = self.failure_name(target).await?;
        let draft = RecordDraft::failure(&name, &target.url, category, message);
        self.upsert(draft, scraped_at).await
    }

    async fn find_by_identity(&self, key: &str) -> Result<Option<PersistedRecord>, RepositoryError> {
        record_entity::Entity::find()
            .filter(record_entity::Column::IdentityKey.eq(key))
            .one(self.db.as_ref())
            .await?
            .map(to_domain)
            .transpose()
    }

    async fn find_recent(&self, limit: u64) -> Result<Vec<PersistedRecord>, RepositoryError> {
        let models = record_entity::Entity::find()
            .order_by_desc(record_entity::Column::ScrapedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;

        models.into_iter().map(to_domain).collect()
    }
}
