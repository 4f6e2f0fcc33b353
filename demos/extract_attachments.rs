//! Basic example: Run one attachment extraction pass over a mailbox.
//!
//! This example demonstrates the most common use case - connecting to an IMAP
//! server, classifying message subjects, and filing every attachment under
//! `out/<MODULE>/<REF>/`. Re-running it skips everything already recorded in
//! the processed ledger.
//!
//! # Usage
//!
//! ```bash
//! export EMAIL_ADDRESS="your@email.com"
//! export EMAIL_PASSWORD="your-app-password"
//! cargo run --example extract_attachments
//! ```
//!
//! For Gmail, you'll need to use an [App Password](https://support.google.com/accounts/answer/185833).

use mail_extract::{Extractor, ExtractorConfig, ImapConfig, ImapMailGateway};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> mail_extract::Result<()> {
    // Read credentials from environment
    let email = env::var("EMAIL_ADDRESS").expect("EMAIL_ADDRESS environment variable required");
    let password =
        env::var("EMAIL_PASSWORD").expect("EMAIL_PASSWORD environment variable required");

    println!("Connecting to IMAP server for {}...", email);

    // Build configuration - IMAP host is auto-discovered from email domain
    let imap = ImapConfig::builder()
        .email(&email)
        .password(password)
        .build()?;

    let config = ExtractorConfig::builder()
        .output_base("out")
        .processed_log("state/processed.txt")
        .error_log("state/errors.csv")
        .build()?;

    // Connect and restrict discovery to the last 30 days
    let gateway = ImapMailGateway::connect(imap)
        .await?
        .with_max_age(Duration::from_secs(30 * 24 * 3600));

    println!("Connected! Running extraction...");

    let mut extractor = Extractor::new(gateway, config);
    let summary = extractor.run().await?;

    println!("Discovered:         {}", summary.discovered);
    println!("Already processed:  {}", summary.already_processed);
    println!("Processed this run: {}", summary.processed);
    println!("Fetch failures:     {}", summary.fetch_failures);
    println!("Unclassified:       {}", summary.unclassified);

    // Clean up
    extractor.into_gateway().logout().await?;

    Ok(())
}
