//! Live runs against wikipedia.org.
//!
//! These need chromium and network access, so they are ignored by default:
//!
//! ```text
//! cargo test -p wikiprobe --features browser --test live_wikipedia -- --ignored
//! ```
//!
//! Set `WIKIPROBE_USERNAME`/`WIKIPROBE_PASSWORD` to exercise login and logout.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use wikiprobe::prelude::*;

fn live_config() -> Arc<ProbeConfig> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("wikiprobe=info"))
        .with_test_writer()
        .try_init();
    let config = ProbeConfig::default().with_env_overrides();
    config.validate().unwrap();
    Arc::new(config)
}

async fn run_live(kind: SuiteKind) -> SuiteReport {
    let config = live_config();
    let launcher = ChromiumLauncher::new(Arc::clone(&config));
    let suite = kind.build::<ChromiumDriver>();
    SuiteRunner::new(config).run(&launcher, &suite).await
}

fn assert_no_failures(report: &SuiteReport) {
    let failures: Vec<String> = report
        .cases
        .iter()
        .filter(|c| c.status == CaseStatus::Failed)
        .map(|c| format!("{}: {}", c.name, c.message.clone().unwrap_or_default()))
        .collect();
    assert!(failures.is_empty(), "failed cases:\n{}", failures.join("\n"));
}

#[tokio::test]
#[ignore = "requires chromium and network access"]
async fn test_live_navigation() {
    let report = run_live(SuiteKind::Navigation).await;
    assert_no_failures(&report);
    assert_eq!(report.cases.len(), 10);
}

#[tokio::test]
#[ignore = "requires chromium and network access"]
async fn test_live_authentication() {
    let report = run_live(SuiteKind::Authentication).await;
    assert_no_failures(&report);
}

#[tokio::test]
#[ignore = "requires chromium and network access"]
async fn test_live_content() {
    let report = run_live(SuiteKind::Content).await;
    assert_no_failures(&report);
}

#[tokio::test]
#[ignore = "requires chromium and network access"]
async fn test_live_search() {
    let report = run_live(SuiteKind::Search).await;
    assert_no_failures(&report);
}

#[tokio::test]
#[ignore = "requires chromium and network access"]
async fn test_live_stale_handle_after_navigation() {
    let config = live_config();
    let launcher = ChromiumLauncher::new(Arc::clone(&config));
    let mut driver = launcher.launch().await.unwrap();

    driver.goto(&config.main_page_url()).await.unwrap();
    let logo = driver.find(&By::class_name("mw-logo")).await.unwrap();
    assert!(driver.is_displayed(logo).await.unwrap());

    driver.goto(&config.article_url("Rust_(programming_language)")).await.unwrap();
    let err = driver.text(logo).await.unwrap_err();
    assert!(matches!(err, ProbeError::StaleElement { .. }));

    driver.back().await.unwrap();
    assert!(driver.current_url().await.unwrap().ends_with("Main_Page"));
    driver.close().await.unwrap();
}
