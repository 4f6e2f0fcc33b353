//! Integration tests for mail-extract.
//!
//! These tests require a real IMAP server and are disabled by default.
//! To run them:
//!
//! ```bash
//! # Set environment variables
//! export MAIL_EXTRACT_TEST_EMAIL="your@email.com"
//! export MAIL_EXTRACT_TEST_PASSWORD="your-app-password"
//!
//! # Run with the integration-tests feature
//! cargo test --features integration-tests -- --ignored
//! ```

use mail_extract::{Extractor, ExtractorConfig, ImapConfig, ImapMailGateway, MailGateway};
use std::env;
use std::time::Duration;
use tempfile::tempdir;

// ─────────────────────────────────────────────────────────────────────────────
// Test Configuration Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn get_test_config() -> Option<ImapConfig> {
    dotenvy::dotenv().ok();
    let email = env::var("MAIL_EXTRACT_TEST_EMAIL").ok()?;
    let password = env::var("MAIL_EXTRACT_TEST_PASSWORD").ok()?;

    ImapConfig::builder()
        .email(email)
        .password(password)
        .build()
        .ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore = "requires real IMAP server"]
async fn test_connect_and_logout() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping: MAIL_EXTRACT_TEST_EMAIL / MAIL_EXTRACT_TEST_PASSWORD not set");
        return;
    };

    let mut gateway = ImapMailGateway::connect(config)
        .await
        .expect("connect to IMAP server");

    gateway.logout().await.expect("clean logout");
}

#[tokio::test]
#[ignore = "requires real IMAP server"]
async fn test_list_recent_message_ids() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping: MAIL_EXTRACT_TEST_EMAIL / MAIL_EXTRACT_TEST_PASSWORD not set");
        return;
    };

    let mut gateway = ImapMailGateway::connect(config)
        .await
        .expect("connect to IMAP server")
        .with_max_age(Duration::from_secs(7 * 24 * 3600));

    let ids = gateway
        .list_attachment_message_ids("ALL")
        .await
        .expect("list message ids");

    // Ids come back in ascending UID order
    let mut sorted = ids.clone();
    sorted.sort_by_key(|id| id.as_str().parse::<u32>().unwrap_or(0));
    assert_eq!(ids, sorted);

    gateway.logout().await.expect("clean logout");
}

#[tokio::test]
#[ignore = "requires real IMAP server"]
async fn test_full_extraction_run() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping: MAIL_EXTRACT_TEST_EMAIL / MAIL_EXTRACT_TEST_PASSWORD not set");
        return;
    };

    let dir = tempdir().expect("create tempdir");
    let extractor_config = ExtractorConfig::builder()
        .output_base(dir.path().join("out"))
        .processed_log(dir.path().join("processed.txt"))
        .error_log(dir.path().join("errors.csv"))
        .build()
        .expect("valid config");

    let gateway = ImapMailGateway::connect(config)
        .await
        .expect("connect to IMAP server")
        .with_max_age(Duration::from_secs(24 * 3600));

    let mut extractor = Extractor::new(gateway, extractor_config);
    let summary = extractor.run().await.expect("extraction run");

    println!(
        "discovered={} processed={} fetch_failures={} unclassified={}",
        summary.discovered, summary.processed, summary.fetch_failures, summary.unclassified
    );
    assert_eq!(summary.already_processed, 0);

    extractor.into_gateway().logout().await.expect("clean logout");
}
