//! # mail-extract
//!
//! Async IMAP batch extractor that files email attachments into a directory
//! tree keyed by business module and reference number.
//!
//! This crate provides a high-level, async API for:
//! - Discovering candidate messages in an IMAP mailbox
//! - Classifying subjects into `(module, reference_no)` pairs with an ordered,
//!   first-match-wins rule table
//! - Materializing attachments under `{base}/{module}/{reference_no}/`
//! - Idempotent re-runs through append-only processed and error ledgers
//!
//! ## Features
//!
//! - **`observability`**: Enables OpenTelemetry integration for distributed tracing.
//!   Without this feature, tracing spans are still emitted but require no OTEL dependencies.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mail_extract::{Extractor, ExtractorConfig, ImapConfig, ImapMailGateway};
//!
//! # async fn example() -> mail_extract::Result<()> {
//! // Configure the IMAP connection
//! let imap = ImapConfig::builder()
//!     .email("user@gmail.com")
//!     .password("app-password")  // Use app-specific password for Gmail
//!     .build()?;
//!
//! // Configure the extraction run
//! let config = ExtractorConfig::builder()
//!     .output_base("out")
//!     .processed_log("state/processed.txt")
//!     .error_log("state/errors.csv")
//!     .build()?;
//!
//! // Connect and run one pass
//! let gateway = ImapMailGateway::connect(imap).await?;
//! let mut extractor = Extractor::new(gateway, config);
//! let summary = extractor.run().await?;
//! println!(
//!     "{} processed, {} already done, {} fetch failures",
//!     summary.processed, summary.already_processed, summary.fetch_failures
//! );
//!
//! // Clean up
//! extractor.into_gateway().logout().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Classification Rules
//!
//! ```
//! use mail_extract::SubjectClassifier;
//!
//! # fn example() -> mail_extract::Result<()> {
//! let mut classifier = SubjectClassifier::with_default_rules();
//! classifier.push_rule(&["INV"], " No. ")?;
//!
//! let c = classifier.classify("INV No. 2024-0117").unwrap();
//! assert_eq!(c.module, "INV");
//! assert_eq!(c.reference_no, "2024-0117");
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Gateways
//!
//! The extractor is generic over [`gateway::MailGateway`], so any message
//! source can drive it. Tests in this crate use an in-memory gateway; the
//! production path is [`ImapMailGateway`].
//!
//! ## Error Handling
//!
//! All errors implement `std::error::Error` and provide context. Use
//! [`Error::is_retryable`] to decide whether an operation can be retried, and
//! [`Error::is_fatal`] to detect ledger failures that must abort a run:
//!
//! ```
//! use mail_extract::Error;
//!
//! fn handle_error(error: &Error) {
//!     if error.is_retryable() {
//!         println!("Transient error, can retry: {}", error);
//!     } else {
//!         println!("Permanent error: {}", error);
//!     }
//! }
//! ```
//!
//! ## Observability
//!
//! The crate uses `tracing` for instrumentation. All major operations emit spans with
//! structured fields suitable for distributed tracing.
//!
//! ### Span Naming Convention
//!
//! - `Extractor::run` - One extraction pass
//! - `ImapMailGateway::connect` - Gateway connection
//! - `ImapMailGateway::logout` - Logout
//! - `session::authenticate` - IMAP authentication
//! - `connection::establish_tls` - TLS connection
//!
//! ### Standard Fields
//!
//! - `email` - Email address (masked in production)
//! - `imap_host` - IMAP server hostname
//! - `query` - IMAP search query for the run
//! - `message_id` - Message UID being fetched or filed
//!
//! Enable the `observability` feature for OpenTelemetry integration.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod classifier;
pub mod config;
pub mod error;
pub mod extractor;
pub mod gateway;
pub mod known_servers;
pub mod ledger;

// Internal modules
mod connection;
mod imap;
mod parser;
mod session;
mod store;

// Re-exports for ergonomic API
pub use classifier::{Classification, SubjectClassifier};
pub use config::{
    ExtractorConfig, ExtractorConfigBuilder, ImapConfig, ImapConfigBuilder, TimeoutConfig,
    UNCATEGORIZED_DIR,
};
pub use email_address::EmailAddress;
pub use error::{Error, ErrorCategory, Result};
pub use extractor::{Extractor, RunSummary};
pub use gateway::{Attachment, MailGateway, Message, MessageId};
pub use imap::ImapMailGateway;
pub use known_servers::ServerRegistry;
pub use ledger::{ErrorLedger, ErrorRecord, ProcessedLedger};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // Ensure all public types are accessible
        let _ = ImapConfig::builder();
        let _ = ExtractorConfig::builder();
        let _ = SubjectClassifier::with_default_rules();
        let _ = ProcessedLedger::new("processed.txt");
    }
}
