//! Example: Extending the classifier with custom rules.
//!
//! This example demonstrates how to:
//! - Add custom subject rules that are evaluated after the canonical set
//! - Switch the classifier into case-insensitive matching
//! - Run the extractor with a custom classifier
//!
//! # Usage
//!
//! ```bash
//! export EMAIL_ADDRESS="your@email.com"
//! export EMAIL_PASSWORD="your-app-password"
//! cargo run --example custom_rules
//! ```

use mail_extract::{Extractor, ExtractorConfig, ImapConfig, ImapMailGateway, SubjectClassifier};
use std::env;

/// Builds the classifier used by this deployment: the canonical rules, matched
/// without regard to case, plus invoice and delivery-note conventions.
fn build_classifier() -> mail_extract::Result<SubjectClassifier> {
    let mut classifier = SubjectClassifier::case_insensitive();

    // "INV No. 2024-0117" -> ("INV", "2024-0117")
    classifier.push_rule(&["INV", "Invoice"], " No. ")?;

    // "DN Dispatch 8812" -> ("DN", "8812")
    classifier.push_rule(&["DN"], " Dispatch ")?;

    Ok(classifier)
}

#[tokio::main]
async fn main() -> mail_extract::Result<()> {
    let email = env::var("EMAIL_ADDRESS").expect("EMAIL_ADDRESS environment variable required");
    let password =
        env::var("EMAIL_PASSWORD").expect("EMAIL_PASSWORD environment variable required");

    let classifier = build_classifier()?;
    println!("Classifier has {} rules", classifier.rule_count());

    // Dry-run the rules against a few sample subjects before connecting
    for subject in [
        "RQ #12345",
        "invoice no. 2024-0117",
        "DN Dispatch 8812",
        "lunch on friday?",
    ] {
        match classifier.classify(subject) {
            Some(c) => println!("  {:40} -> {}/{}", subject, c.module, c.reference_no),
            None => println!("  {:40} -> (unclassified)", subject),
        }
    }

    println!("\nConnecting to IMAP server for {}...", email);

    let imap = ImapConfig::builder()
        .email(&email)
        .password(password)
        .build()?;

    let config = ExtractorConfig::builder()
        .output_base("out")
        .processed_log("state/processed.txt")
        .error_log("state/errors.csv")
        .build()?;

    let gateway = ImapMailGateway::connect(imap).await?;

    let mut extractor = Extractor::with_classifier(gateway, config, build_classifier()?);
    let summary = extractor.run().await?;

    println!(
        "\nProcessed {} messages ({} unclassified)",
        summary.processed, summary.unclassified
    );

    extractor.into_gateway().logout().await?;

    Ok(())
}
