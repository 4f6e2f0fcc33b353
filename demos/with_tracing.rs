//! Example: Using tracing for observability.
//!
//! This example demonstrates how to enable structured logging using
//! the `tracing` ecosystem. All major operations in mail-extract emit
//! tracing spans and events.
//!
//! # Usage
//!
//! ```bash
//! export EMAIL_ADDRESS="your@email.com"
//! export EMAIL_PASSWORD="your-app-password"
//! # Set log level (trace, debug, info, warn, error)
//! export RUST_LOG=mail_extract=debug
//!
//! cargo run --example with_tracing
//! ```

use mail_extract::{Extractor, ExtractorConfig, ImapConfig, ImapMailGateway};
use std::env;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> mail_extract::Result<()> {
    // Initialize tracing subscriber with environment filter
    // Use RUST_LOG environment variable to control log levels
    // Example: RUST_LOG=mail_extract=debug,info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mail_extract=info")),
        )
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let email = env::var("EMAIL_ADDRESS").expect("EMAIL_ADDRESS environment variable required");
    let password =
        env::var("EMAIL_PASSWORD").expect("EMAIL_PASSWORD environment variable required");

    tracing::info!(email = %email, "Starting mail-extract example");

    let imap = ImapConfig::builder()
        .email(&email)
        .password(password)
        .build()?;

    let config = ExtractorConfig::builder()
        .output_base("out")
        .processed_log("state/processed.txt")
        .error_log("state/errors.csv")
        .build()?;

    tracing::debug!("Configuration built successfully");

    // Connect - this will emit spans for connection, TLS, and authentication
    let gateway = ImapMailGateway::connect(imap).await?;

    tracing::info!("Connection established, running extraction");

    // Run - this will emit spans for search, fetch, and filing operations
    let mut extractor = Extractor::new(gateway, config);
    let summary = extractor.run().await?;

    tracing::info!(
        processed = summary.processed,
        already_processed = summary.already_processed,
        fetch_failures = summary.fetch_failures,
        unclassified = summary.unclassified,
        "Run complete"
    );

    // Logout - emits a span for the logout operation
    extractor.into_gateway().logout().await?;

    tracing::info!("Example completed successfully");

    Ok(())
}
