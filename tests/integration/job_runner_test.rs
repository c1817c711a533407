// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::fake_browser::{FakeLauncher, FakeResponse};
use crate::helpers::fixtures::*;
use crate::helpers::{default_extractor, setup_repository};
use async_trait::async_trait;
use casino_scraper::domain::models::casino_record::{
    PersistedRecord, RecordDraft, RecordStatus, NO_DATA_MESSAGE,
};
use casino_scraper::domain::models::target::Target;
use casino_scraper::domain::repositories::casino_record_repository::{
    CasinoRecordRepository, IdentityKey,
};
use casino_scraper::utils::errors::{RepositoryError, RunnerError};
use casino_scraper::workers::job_runner::JobRunner;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn three_targets() -> Vec<Target> {
    vec![
        Target::new(CRAZY_TIME_URL),
        Target::new(MONOPOLY_URL),
        Target::new(LIGHTNING_URL),
    ]
}

#[tokio::test]
async fn test_three_target_run_end_to_end() {
    let launcher = FakeLauncher::new()
        .with_page(CRAZY_TIME_URL, FakeResponse::Html(crazy_time_page()))
        .with_page(MONOPOLY_URL, FakeResponse::Html(empty_monopoly_page()))
        .with_page(
            LIGHTNING_URL,
            FakeResponse::NavigationError("timed out after 30000 ms".to_string()),
        );
    let repo = setup_repository(IdentityKey::SourceUrl).await;
    let runner = JobRunner::new(Arc::new(launcher.clone()), repo.clone(), default_extractor());

    let report = runner.run_once(&three_targets()).await.unwrap();

    assert_eq!(report.len(), 3);
    let urls: Vec<&str> = report.outcomes.iter().map(|o| o.target.url.as_str()).collect();
    assert_eq!(urls, vec![CRAZY_TIME_URL, MONOPOLY_URL, LIGHTNING_URL]);

    // 完整页面
    let crazy = report.outcomes[0].record().expect("crazy time should be scraped");
    assert_eq!(crazy.status, RecordStatus::Success);
    assert_eq!(crazy.name, "Crazy Time");
    assert!(crazy.has_data);
    assert_eq!(crazy.stats["rounds"].as_array().unwrap().len(), 2);
    assert_eq!(crazy.stats["top_multipliers"].as_array().unwrap().len(), 5);
    let wins = crazy.stats["win_records"].as_array().unwrap();
    assert_eq!(wins.len(), 2);
    assert_eq!(wins[0]["player"], "Alex_99");
    assert_eq!(wins[1]["player"], "HighRoller");
    assert!(crazy.heuristic.is_none());

    // 页面加载成功但没有数据
    let monopoly = report.outcomes[1].record().expect("monopoly should be scraped");
    assert_eq!(monopoly.status, RecordStatus::Error);
    assert!(!monopoly.has_data);
    assert_eq!(monopoly.message.as_deref(), Some(NO_DATA_MESSAGE));
    let heuristic = monopoly.heuristic.as_ref().expect("keyword scan should run");
    assert!(heuristic.features.contains("Live Dealer"));
    assert_eq!(heuristic.link, "https://partner.example/");

    // 导航失败
    let lightning = &report.outcomes[2];
    assert!(lightning.record().is_none());
    assert!(lightning.error().unwrap().contains("timed out"));

    let summary = report.summary();
    assert_eq!((summary.succeeded, summary.empty, summary.failed), (1, 1, 1));

    // 三个目标都留下记录，失败的目标存为错误记录
    let stored = repo.find_recent(10).await.unwrap();
    assert_eq!(stored.len(), 3);
    let failure = repo.find_by_identity(LIGHTNING_URL).await.unwrap().unwrap();
    assert_eq!(failure.status, RecordStatus::Error);
    assert!(failure.message.unwrap().contains("timed out"));

    assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
    assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_repeated_runs_keep_one_record_per_target() {
    let launcher = FakeLauncher::new()
        .with_page(CRAZY_TIME_URL, FakeResponse::Html(crazy_time_page()))
        .with_page(MONOPOLY_URL, FakeResponse::Html(empty_monopoly_page()))
        .with_page(LIGHTNING_URL, FakeResponse::ContentTimeout);
    let repo = setup_repository(IdentityKey::SourceUrl).await;
    let runner = JobRunner::new(Arc::new(launcher), repo.clone(), default_extractor());

    let first = runner.run_once(&three_targets()).await.unwrap();
    let second = runner.run_once(&three_targets()).await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(repo.find_recent(10).await.unwrap().len(), 3);

    let before = first.outcomes[0].record().unwrap();
    let after = second.outcomes[0].record().unwrap();
    assert_eq!(before.id, after.id);
    assert!(after.scraped_at >= before.scraped_at);
}

#[tokio::test]
async fn test_name_identity_failure_lands_on_existing_row() {
    let repo = setup_repository(IdentityKey::Name).await;
    let healthy = FakeLauncher::new()
        .with_page(CRAZY_TIME_URL, FakeResponse::Html(crazy_time_page()));
    let broken = FakeLauncher::new().with_page(CRAZY_TIME_URL, FakeResponse::ContentTimeout);
    let targets = vec![Target::new(CRAZY_TIME_URL)];

    JobRunner::new(Arc::new(healthy.clone()), repo.clone(), default_extractor())
        .run_once(&targets)
        .await
        .unwrap();
    let report = JobRunner::new(Arc::new(broken), repo.clone(), default_extractor())
        .run_once(&targets)
        .await
        .unwrap();
    assert!(report.outcomes[0].error().is_some());

    let stored = repo.find_recent(10).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].identity_key, "Crazy Time");
    assert_eq!(stored[0].status, RecordStatus::Error);

    // 恢复后仍然写回同一行
    JobRunner::new(Arc::new(healthy), repo.clone(), default_extractor())
        .run_once(&targets)
        .await
        .unwrap();
    let stored = repo.find_recent(10).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, RecordStatus::Success);
}

#[tokio::test]
async fn test_panic_in_one_target_does_not_stop_the_run() {
    let launcher = FakeLauncher::new()
        .with_page(CRAZY_TIME_URL, FakeResponse::Panic)
        .with_page(MONOPOLY_URL, FakeResponse::Html(empty_monopoly_page()));
    let repo = setup_repository(IdentityKey::SourceUrl).await;
    let runner = JobRunner::new(Arc::new(launcher.clone()), repo, default_extractor());

    let targets = vec![Target::new(CRAZY_TIME_URL), Target::new(MONOPOLY_URL)];
    let report = runner.run_once(&targets).await.unwrap();

    assert_eq!(report.len(), 2);
    let error = report.outcomes[0].error().expect("panic becomes a failure");
    assert!(error.contains("renderer crashed"));
    assert!(report.outcomes[1].record().is_some());
    assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_browser_unavailable_is_the_only_propagated_error() {
    let launcher = FakeLauncher::failing();
    let repo = setup_repository(IdentityKey::SourceUrl).await;
    let runner = JobRunner::new(Arc::new(launcher.clone()), repo.clone(), default_extractor());

    let result = runner.run_once(&three_targets()).await;

    assert!(matches!(result, Err(RunnerError::BrowserUnavailable(_))));
    assert!(launcher.fetched.lock().unwrap().is_empty());
    assert!(repo.find_recent(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_target_list_still_closes_browser() {
    let launcher = FakeLauncher::new();
    let repo = setup_repository(IdentityKey::SourceUrl).await;
    let runner = JobRunner::new(Arc::new(launcher.clone()), repo, default_extractor());

    let report = runner.run_once(&[]).await.unwrap();

    assert!(report.is_empty());
    assert!(report.finished_at >= report.started_at);
    assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
    assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
}

/// 所有写入都失败的仓库
struct UnavailableRepository;

#[async_trait]
impl CasinoRecordRepository for UnavailableRepository {
    async fn upsert(
        &self,
        _draft: RecordDraft,
        _scraped_at: DateTime<Utc>,
    ) -> Result<PersistedRecord, RepositoryError> {
        Err(RepositoryError::Database(DbErr::Custom(
            "connection refused".to_string(),
        )))
    }

    async fn find_by_identity(&self, _key: &str) -> Result<Option<PersistedRecord>, RepositoryError> {
        Ok(None)
    }

    async fn find_recent(&self, _limit: u64) -> Result<Vec<PersistedRecord>, RepositoryError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_persistence_failure_becomes_failed_outcome() {
    let launcher = FakeLauncher::new()
        .with_page(CRAZY_TIME_URL, FakeResponse::Html(crazy_time_page()))
        .with_page(MONOPOLY_URL, FakeResponse::NavigationError("net::ERR_FAILED".to_string()));
    let runner = JobRunner::new(
        Arc::new(launcher.clone()),
        Arc::new(UnavailableRepository),
        default_extractor(),
    );

    let targets = vec![Target::new(CRAZY_TIME_URL), Target::new(MONOPOLY_URL)];
    let report = runner.run_once(&targets).await.unwrap();

    assert_eq!(report.len(), 2);
    assert!(report.outcomes[0].error().unwrap().contains("connection refused"));
    assert!(report.outcomes[1].error().unwrap().contains("ERR_FAILED"));
    assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
}
