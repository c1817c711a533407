// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::setup_repository;
use casino_scraper::domain::models::casino_record::{
    KeywordScanResult, RecordDraft, RecordStatus,
};
use casino_scraper::domain::models::target::Target;
use casino_scraper::domain::repositories::casino_record_repository::{
    CasinoRecordRepository, IdentityKey,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Map};
use std::collections::BTreeSet;

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
}

fn draft(name: &str, url: &str, rounds: usize) -> RecordDraft {
    let mut stats = Map::new();
    let rows: Vec<_> = (0..rounds).map(|i| json!({ "result": i })).collect();
    stats.insert("rounds".to_string(), json!(rows));

    RecordDraft {
        name: name.to_string(),
        category: "live-game-show".to_string(),
        stats,
        features: BTreeSet::new(),
        source_url: url.to_string(),
        has_data: rounds > 0,
        status: if rounds > 0 {
            RecordStatus::Success
        } else {
            RecordStatus::Error
        },
        message: None,
        heuristic: None,
    }
}

#[tokio::test]
async fn test_upsert_is_idempotent_per_identity() {
    let repo = setup_repository(IdentityKey::SourceUrl).await;
    let url = "https://stats.example/crazy-time/";

    let first = repo.upsert(draft("Crazy Time", url, 3), at(10)).await.unwrap();
    let second = repo.upsert(draft("Crazy Time", url, 5), at(11)).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.created_at, second.created_at);
    assert_eq!(second.scraped_at, at(11));
    assert_eq!(second.stats["rounds"].as_array().unwrap().len(), 5);

    let all = repo.find_recent(10).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].scraped_at, at(11));
}

#[tokio::test]
async fn test_upsert_replaces_all_fields() {
    let repo = setup_repository(IdentityKey::SourceUrl).await;
    let url = "https://stats.example/monopoly-live/";

    repo.upsert(draft("Monopoly Live", url, 2), at(9)).await.unwrap();

    let mut empty = draft("Monopoly Live", url, 0);
    empty.message = Some("no data found".to_string());
    empty.heuristic = Some(KeywordScanResult {
        description: "Online casino".to_string(),
        features: BTreeSet::from(["Live Casino".to_string()]),
        link: "https://stats.example/monopoly-live/#casino".to_string(),
        score: 0.0,
        defaulted: BTreeSet::from(["score".to_string()]),
    });
    repo.upsert(empty.clone(), at(10)).await.unwrap();

    let stored = repo.find_by_identity(url).await.unwrap().unwrap();
    assert_eq!(stored.status, RecordStatus::Error);
    assert!(!stored.has_data);
    assert_eq!(stored.message.as_deref(), Some("no data found"));
    assert_eq!(stored.heuristic, empty.heuristic);
    assert!(stored.stats["rounds"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_name_identity_merges_sources() {
    let repo = setup_repository(IdentityKey::Name).await;

    repo.upsert(draft("Crazy Time", "https://a.example/crazy-time", 1), at(8))
        .await
        .unwrap();
    let latest = repo
        .upsert(draft("Crazy Time", "https://b.example/crazy-time", 1), at(9))
        .await
        .unwrap();

    assert_eq!(latest.identity_key, "Crazy Time");
    assert_eq!(latest.source_url, "https://b.example/crazy-time");
    assert_eq!(repo.find_recent(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_find_recent_orders_by_scraped_at_desc() {
    let repo = setup_repository(IdentityKey::SourceUrl).await;

    repo.upsert(draft("A", "https://stats.example/a", 1), at(8)).await.unwrap();
    repo.upsert(draft("B", "https://stats.example/b", 1), at(12)).await.unwrap();
    repo.upsert(draft("C", "https://stats.example/c", 1), at(10)).await.unwrap();

    let recent = repo.find_recent(2).await.unwrap();
    let names: Vec<&str> = recent.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["B", "C"]);
}

#[tokio::test]
async fn test_upsert_failure_stores_error_record() {
    let repo = setup_repository(IdentityKey::SourceUrl).await;
    let target = Target::new("https://stats.example/lightning-roulette/");

    let record = repo
        .upsert_failure(
            &target,
            "live-game-show",
            "Navigation failed".to_string(),
            at(7),
        )
        .await
        .unwrap();

    assert_eq!(record.status, RecordStatus::Error);
    assert_eq!(record.name, "stats.example/lightning-roulette");
    assert_eq!(record.message.as_deref(), Some("Navigation failed"));
    assert!(record.stats.is_empty());

    // 之后的成功结果替换错误记录
    repo.upsert(draft("Lightning Roulette", &target.url, 4), at(8))
        .await
        .unwrap();
    let stored = repo.find_by_identity(&target.url).await.unwrap().unwrap();
    assert_eq!(stored.id, record.id);
    assert_eq!(stored.status, RecordStatus::Success);
    assert!(stored.message.is_none());
}

#[tokio::test]
async fn test_name_identity_failure_reuses_stored_name() {
    let repo = setup_repository(IdentityKey::Name).await;
    let target = Target::new("https://stats.example/crazy-time/");

    let success = repo
        .upsert(draft("Crazy Time", &target.url, 3), at(8))
        .await
        .unwrap();
    let failure = repo
        .upsert_failure(&target, "live-game-show", "Navigation failed".to_string(), at(9))
        .await
        .unwrap();

    assert_eq!(failure.id, success.id);
    assert_eq!(failure.identity_key, "Crazy Time");
    assert_eq!(failure.status, RecordStatus::Error);
    assert_eq!(repo.find_recent(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_name_identity_failure_without_history_uses_label() {
    let repo = setup_repository(IdentityKey::Name).await;
    let target = Target::new("https://stats.example/monopoly-live/");

    let failure = repo
        .upsert_failure(&target, "live-game-show", "Navigation failed".to_string(), at(9))
        .await
        .unwrap();

    assert_eq!(failure.identity_key, "stats.example/monopoly-live");
}

#[tokio::test]
async fn test_find_by_identity_missing_returns_none() {
    let repo = setup_repository(IdentityKey::SourceUrl).await;
    assert!(repo
        .find_by_identity("https://stats.example/unknown")
        .await
        .unwrap()
        .is_none());
}
