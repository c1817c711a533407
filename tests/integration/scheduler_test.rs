// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::fake_browser::{FakeLauncher, FakeResponse, FetchGate};
use crate::helpers::fixtures::*;
use crate::helpers::{default_extractor, setup_repository};
use casino_scraper::domain::models::target::Target;
use casino_scraper::domain::repositories::casino_record_repository::IdentityKey;
use casino_scraper::queue::scheduler::{ScrapeScheduler, TriggerOutcome};
use casino_scraper::utils::errors::SchedulerError;
use casino_scraper::workers::job_runner::JobRunner;
use std::sync::Arc;
use std::time::Duration;

async fn scheduler_with(launcher: FakeLauncher, schedule: &str) -> ScrapeScheduler {
    let repo = setup_repository(IdentityKey::SourceUrl).await;
    let runner = Arc::new(JobRunner::new(Arc::new(launcher), repo, default_extractor()));
    ScrapeScheduler::new(schedule, vec![Target::new(CRAZY_TIME_URL)], runner).unwrap()
}

#[tokio::test]
async fn test_manual_trigger_is_single_flight() {
    let gate = FetchGate::default();
    let launcher = FakeLauncher::new()
        .with_page(CRAZY_TIME_URL, FakeResponse::Html(crazy_time_page()))
        .gated(gate.clone());
    let scheduler = Arc::new(scheduler_with(launcher, "* * * * *").await);

    let first = tokio::spawn({
        let scheduler = scheduler.clone();
        async move { scheduler.trigger_now().await }
    });

    // 等第一次运行进入 fetch
    gate.entered.notified().await;
    assert!(scheduler.is_running());

    let second = scheduler.trigger_now().await;
    assert!(matches!(second, TriggerOutcome::Skipped));

    let status = scheduler.status().await;
    assert!(status.is_running);
    assert_eq!(status.skipped_ticks, 1);

    gate.release.notify_one();
    let first = first.await.unwrap();
    match first {
        TriggerOutcome::Completed(report) => assert_eq!(report.len(), 1),
        other => panic!("expected completed run, got {:?}", other),
    }

    let status = scheduler.status().await;
    assert!(!status.is_running);
    assert_eq!(status.completed_runs, 1);
    assert!(scheduler.last_report().is_some());
}

#[tokio::test]
async fn test_failed_run_returns_to_idle() {
    let scheduler = scheduler_with(FakeLauncher::failing(), "*/5 * * * *").await;

    let outcome = scheduler.trigger_now().await;

    assert!(matches!(outcome, TriggerOutcome::Failed(_)));
    assert!(!scheduler.is_running());
    assert!(scheduler.last_report().is_none());

    // 之后的触发仍然会被接受
    assert!(matches!(
        scheduler.trigger_now().await,
        TriggerOutcome::Failed(_)
    ));
    assert_eq!(scheduler.status().await.completed_runs, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_before_and_after_start() {
    let launcher =
        FakeLauncher::new().with_page(CRAZY_TIME_URL, FakeResponse::Html(crazy_time_page()));
    let scheduler = scheduler_with(launcher, "0 0 * * *").await;

    let status = scheduler.status().await;
    assert_eq!(status.schedule, "0 0 * * *");
    assert!(status.next_run_estimate.is_none());

    scheduler.start().await.unwrap();
    let status = scheduler.status().await;
    let next = status.next_run_estimate.expect("started scheduler has a next tick");
    assert!(next > chrono::Utc::now());
    assert!(next - chrono::Utc::now() <= chrono::Duration::days(1));

    scheduler.shutdown().await.unwrap();
    assert!(scheduler.status().await.next_run_estimate.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cron_tick_runs_the_job() {
    let launcher =
        FakeLauncher::new().with_page(CRAZY_TIME_URL, FakeResponse::Html(crazy_time_page()));
    let scheduler = scheduler_with(launcher.clone(), "* * * * * *").await;

    scheduler.start().await.unwrap();

    let mut waited = Duration::ZERO;
    while scheduler.last_report().is_none() && waited < Duration::from_secs(5) {
        tokio::time::sleep(Duration::from_millis(100)).await;
        waited += Duration::from_millis(100);
    }
    scheduler.shutdown().await.unwrap();

    let report = scheduler.last_report().expect("cron tick should complete a run");
    assert_eq!(report.len(), 1);
    assert!(report.outcomes[0].record().is_some());
}

#[tokio::test]
async fn test_invalid_schedule_is_rejected() {
    let repo = setup_repository(IdentityKey::SourceUrl).await;
    let runner = Arc::new(JobRunner::new(
        Arc::new(FakeLauncher::new()),
        repo,
        default_extractor(),
    ));

    let result = ScrapeScheduler::new("every minute", Vec::new(), runner);

    assert!(matches!(result, Err(SchedulerError::InvalidSchedule(_))));
}
