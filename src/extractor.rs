//! The extraction orchestrator.
//!
//! [`Extractor::run`] drives one batch pass: discover candidate message ids,
//! drop the ones already in the processed ledger, then fetch, classify, and
//! materialize each remaining message independently. Failures are isolated
//! per message and per attachment; only ledger I/O failures abort the run.
//!
//! # Example
//!
//! ```no_run
//! use mail_extract::{Extractor, ExtractorConfig, ImapConfig, ImapMailGateway};
//!
//! # async fn example() -> mail_extract::Result<()> {
//! let imap = ImapConfig::builder()
//!     .email("user@example.com")
//!     .password("app-password")
//!     .build()?;
//!
//! let config = ExtractorConfig::builder()
//!     .output_base("/var/mail-extract/out")
//!     .processed_log("/var/mail-extract/processed.txt")
//!     .error_log("/var/mail-extract/errors.csv")
//!     .build()?;
//!
//! let gateway = ImapMailGateway::connect(imap).await?;
//! let mut extractor = Extractor::new(gateway, config);
//! let summary = extractor.run().await?;
//! println!("saved attachments for {} messages", summary.processed);
//! # Ok(())
//! # }
//! ```

use crate::classifier::SubjectClassifier;
use crate::config::{ExtractorConfig, UNCATEGORIZED_DIR};
use crate::error::Result;
use crate::gateway::{MailGateway, Message};
use crate::ledger::{ErrorLedger, ErrorRecord, ProcessedLedger};
use crate::store;
use std::path::PathBuf;
use tracing::{debug, instrument, warn};

/// Counters for one extraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Candidate ids returned by the gateway.
    pub discovered: usize,
    /// Ids skipped because the processed ledger already had them.
    pub already_processed: usize,
    /// Messages handled to completion this run (classified or not).
    pub processed: usize,
    /// Messages whose fetch failed; they stay eligible for the next run.
    pub fetch_failures: usize,
    /// Messages routed to the fallback bucket for lack of a subject match.
    pub unclassified: usize,
}

/// Batch extractor: one [`run`](Self::run) per invocation, idempotent across
/// invocations through the processed ledger.
///
/// The gateway is injected, never global, so tests drive the extractor with
/// an in-memory fake.
pub struct Extractor<G: MailGateway> {
    gateway: G,
    config: ExtractorConfig,
    classifier: SubjectClassifier,
    processed: ProcessedLedger,
    history: ProcessedLedger,
    errors: ErrorLedger,
}

impl<G: MailGateway> Extractor<G> {
    /// Creates an extractor with the default classification rules.
    pub fn new(gateway: G, config: ExtractorConfig) -> Self {
        Self::with_classifier(gateway, config, SubjectClassifier::with_default_rules())
    }

    /// Creates an extractor with a custom classifier.
    pub fn with_classifier(
        gateway: G,
        config: ExtractorConfig,
        classifier: SubjectClassifier,
    ) -> Self {
        let processed = ProcessedLedger::new(&config.processed_log);
        let history = ProcessedLedger::new(config.effective_history_log());
        let errors = ErrorLedger::new(&config.error_log);

        Self {
            gateway,
            config,
            classifier,
            processed,
            history,
            errors,
        }
    }

    /// Returns the injected gateway, consuming the extractor.
    ///
    /// Useful for a clean logout after the run.
    pub fn into_gateway(self) -> G {
        self.gateway
    }

    /// Executes one extraction pass.
    ///
    /// Re-running with the same ledgers and an unchanged remote message set
    /// is a no-op: every id recorded as processed is filtered out up front.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails (nothing can be processed) or if
    /// a ledger write fails (continuing would risk duplicate reprocessing).
    /// All per-message and per-attachment failures are converted into error
    /// ledger rows instead of propagating.
    #[instrument(name = "Extractor::run", skip(self), fields(query = %self.config.query))]
    pub async fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        let candidates = self
            .gateway
            .list_attachment_message_ids(&self.config.query)
            .await?;
        summary.discovered = candidates.len();

        let seen = self.history.load()?;
        let remaining: Vec<_> = candidates
            .into_iter()
            .filter(|id| !seen.contains(id.as_str()))
            .collect();
        summary.already_processed = summary.discovered - remaining.len();

        debug!(
            discovered = summary.discovered,
            remaining = remaining.len(),
            "Filtered against processed ledger"
        );

        for id in remaining {
            let message = match self.gateway.fetch_message(&id).await {
                Ok(message) => message,
                Err(e) => {
                    // Not added to the processed ledger: retried next run
                    warn!(message_id = %id, error = %e, "Fetch failed, skipping message");
                    self.errors
                        .append(&ErrorRecord::new(id.as_str(), e.to_string()))?;
                    summary.fetch_failures += 1;
                    continue;
                }
            };

            let unclassified = self.handle_message(&message)?;
            if unclassified {
                summary.unclassified += 1;
            }

            // Exactly once, after every attachment has been attempted
            self.processed.append(message.id.as_str())?;
            summary.processed += 1;
        }

        debug!(?summary, "Run complete");

        Ok(summary)
    }

    /// Classifies one message and materializes its attachments.
    ///
    /// Returns `true` when the message fell into the fallback bucket. Only
    /// ledger failures propagate; storage failures become error rows.
    fn handle_message(&mut self, message: &Message) -> Result<bool> {
        let (destination, unclassified) = match self.classifier.classify(&message.subject) {
            Some(c) => {
                debug!(
                    message_id = %message.id,
                    module = %c.module,
                    reference_no = %c.reference_no,
                    "Classified message"
                );
                (self.classified_dir(&c.module, &c.reference_no), false)
            }
            None => {
                debug!(message_id = %message.id, "No rule matched subject");
                self.errors.append(&ErrorRecord::new(
                    message.id.as_str(),
                    format!("Module Ref No not found for subject: {}", message.subject),
                ))?;
                (self.config.output_base.join(UNCATEGORIZED_DIR), true)
            }
        };

        for attachment in &message.attachments {
            if let Err(e) = store::save_attachment(attachment, &destination) {
                // Other attachments of this message still proceed
                warn!(
                    message_id = %message.id,
                    filename = %attachment.filename,
                    error = %e,
                    "Failed to save attachment"
                );
                self.errors.append(&ErrorRecord::new(
                    message.id.as_str(),
                    format!("Failed to save attachment '{}': {e}", attachment.filename),
                ))?;
            }
        }

        Ok(unclassified)
    }

    /// Destination directory for a classified message:
    /// `{output_base}/{module}/{reference_no}/`.
    fn classified_dir(&self, module: &str, reference_no: &str) -> PathBuf {
        self.config.output_base.join(module).join(reference_no)
    }
}

impl<G: MailGateway> std::fmt::Debug for Extractor<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("output_base", &self.config.output_base)
            .field("query", &self.config.query)
            .field("rules", &self.classifier.rule_count())
            .finish_non_exhaustive()
    }
}
