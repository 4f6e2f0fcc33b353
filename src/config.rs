//! Configuration for the IMAP gateway and the extraction run.
//!
//! Both configs are created through validating builders with sensible
//! defaults:
//!
//! ```
//! use mail_extract::{ExtractorConfig, ImapConfig};
//!
//! let imap = ImapConfig::builder()
//!     .email("user@example.com")
//!     .password("app-password")
//!     .build()
//!     .expect("valid config");
//!
//! let extractor = ExtractorConfig::builder()
//!     .output_base("/var/mail-extract/out")
//!     .processed_log("/var/mail-extract/processed.txt")
//!     .error_log("/var/mail-extract/errors.csv")
//!     .build()
//!     .expect("valid config");
//! ```

use crate::error::{Error, Result};
use crate::known_servers::ServerRegistry;
use email_address::EmailAddress;
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name for attachments whose subject matched no rule.
pub const UNCATEGORIZED_DIR: &str = "Uncategorized";

/// Configuration for connecting to an IMAP server.
///
/// Create using [`ImapConfig::builder()`].
///
/// Note: The `password` field is stored as a [`SecretString`] to prevent
/// accidental logging of sensitive credentials. The `email` field is stored
/// as a validated [`EmailAddress`] type.
#[derive(Clone)]
pub struct ImapConfig {
    /// Email address (used for login and IMAP server discovery).
    email: EmailAddress,
    /// Email password or app-specific password (protected from accidental logging).
    password: SecretString,
    /// IMAP server hostname (auto-discovered from email domain if not set).
    pub imap_host: Option<String>,
    /// IMAP server port (default: 993 for IMAPS).
    pub imap_port: u16,
    /// Mailbox to extract from (default: INBOX).
    pub mailbox: String,
    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
}

impl std::fmt::Debug for ImapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImapConfig")
            .field("email", &self.email.as_str())
            .field("password", &"[REDACTED]")
            .field("imap_host", &self.imap_host)
            .field("imap_port", &self.imap_port)
            .field("mailbox", &self.mailbox)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl ImapConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ImapConfigBuilder {
        ImapConfigBuilder::default()
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the password as a string slice.
    ///
    /// Use this method when you need to pass the password to authentication.
    /// The password is intentionally not directly accessible to prevent accidental logging.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Returns the effective IMAP host, either explicitly configured or derived
    /// from the email domain.
    #[must_use]
    pub fn effective_imap_host(&self) -> String {
        if let Some(host) = &self.imap_host {
            host.clone()
        } else {
            crate::known_servers::discover_imap_host(self.email.as_str())
        }
    }

    /// Returns the full IMAP server address as "host:port".
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.effective_imap_host(), self.imap_port)
    }
}

/// Timeout configuration for IMAP operations.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout for establishing TCP/TLS connection.
    pub connect: Duration,
    /// Timeout for IMAP authentication.
    pub auth: Duration,
    /// Timeout for selecting a mailbox.
    pub select: Duration,
    /// Timeout for the message listing search.
    pub search: Duration,
    /// Timeout for fetching one message's content.
    pub message_fetch: Duration,
    /// Timeout for logout operation.
    pub logout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            auth: Duration::from_secs(30),
            select: Duration::from_secs(10),
            search: Duration::from_secs(30),
            message_fetch: Duration::from_secs(60),
            logout: Duration::from_secs(5),
        }
    }
}

/// Validates an email address format.
fn validate_email(email: &str) -> Result<EmailAddress> {
    EmailAddress::parse_with_options(email, email_address::Options::default()).map_err(|_| {
        Error::InvalidEmailFormat {
            email: email.to_string(),
        }
    })
}

/// Builder for [`ImapConfig`].
#[derive(Debug, Default)]
pub struct ImapConfigBuilder {
    email: Option<String>,
    password: Option<String>,
    imap_host: Option<String>,
    imap_port: Option<u16>,
    mailbox: Option<String>,
    timeouts: Option<TimeoutConfig>,
    server_registry: Option<ServerRegistry>,
}

impl ImapConfigBuilder {
    /// Sets the email address (required).
    ///
    /// The email domain is used to auto-discover the IMAP server if not explicitly set.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the password (required).
    ///
    /// For Gmail/Outlook, use an app-specific password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the IMAP server hostname explicitly.
    ///
    /// If not set, the server is auto-discovered from the email domain.
    #[must_use]
    pub fn imap_host(mut self, host: impl Into<String>) -> Self {
        self.imap_host = Some(host.into());
        self
    }

    /// Sets the IMAP server port.
    ///
    /// Default is 993 (IMAPS with TLS).
    #[must_use]
    pub fn imap_port(mut self, port: u16) -> Self {
        self.imap_port = Some(port);
        self
    }

    /// Sets the mailbox to extract from. Default is `"INBOX"`.
    #[must_use]
    pub fn mailbox(mut self, mailbox: impl Into<String>) -> Self {
        self.mailbox = Some(mailbox.into());
        self
    }

    /// Sets a custom server registry for IMAP host discovery.
    ///
    /// The registry is used during [`build()`](Self::build) to resolve the IMAP host
    /// if no explicit [`imap_host`](Self::imap_host) is set.
    #[must_use]
    pub fn server_registry(mut self, registry: ServerRegistry) -> Self {
        self.server_registry = Some(registry);
        self
    }

    /// Sets timeout configuration.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts
            .get_or_insert_with(TimeoutConfig::default)
            .connect = timeout;
        self
    }

    /// Sets the authentication timeout.
    #[must_use]
    pub fn auth_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.get_or_insert_with(TimeoutConfig::default).auth = timeout;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing or invalid.
    pub fn build(self) -> Result<ImapConfig> {
        let email_raw = self.email.ok_or_else(|| Error::InvalidConfig {
            message: "email is required".into(),
        })?;

        let email = validate_email(&email_raw)?;

        let password_raw = self.password.ok_or_else(|| Error::InvalidConfig {
            message: "password is required".into(),
        })?;

        // Resolve IMAP host: explicit > registry > default discovery
        let imap_host = self.imap_host.or_else(|| {
            self.server_registry
                .map(|registry| registry.discover(email.as_str()).into_owned())
        });

        Ok(ImapConfig {
            email,
            password: SecretString::from(password_raw),
            imap_host,
            imap_port: self.imap_port.unwrap_or(993),
            mailbox: self.mailbox.unwrap_or_else(|| "INBOX".into()),
            timeouts: self.timeouts.unwrap_or_default(),
        })
    }
}

/// Configuration for one extraction run.
///
/// Create using [`ExtractorConfig::builder()`]. The processed ledger may be
/// read from a separate historical path (`history_log`); when unset, the
/// write path (`processed_log`) doubles as the read path, so shared and
/// split ledger layouts both work.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Base directory of the attachment tree.
    pub output_base: PathBuf,
    /// Processed-message ledger to append to (one id per line).
    pub processed_log: PathBuf,
    /// Error ledger to append to (CSV rows of id, reason).
    pub error_log: PathBuf,
    /// Optional distinct processed ledger to read from.
    history_log: Option<PathBuf>,
    /// IMAP search query used to list candidate messages.
    pub query: String,
}

impl ExtractorConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ExtractorConfigBuilder {
        ExtractorConfigBuilder::default()
    }

    /// Returns the processed ledger path to read history from.
    ///
    /// This is `history_log` when configured, else `processed_log`.
    #[must_use]
    pub fn effective_history_log(&self) -> &Path {
        self.history_log.as_deref().unwrap_or(&self.processed_log)
    }
}

/// Builder for [`ExtractorConfig`].
#[derive(Debug, Default)]
pub struct ExtractorConfigBuilder {
    output_base: Option<PathBuf>,
    processed_log: Option<PathBuf>,
    error_log: Option<PathBuf>,
    history_log: Option<PathBuf>,
    query: Option<String>,
}

impl ExtractorConfigBuilder {
    /// Sets the base directory for the attachment tree (required).
    #[must_use]
    pub fn output_base(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_base = Some(path.into());
        self
    }

    /// Sets the processed-message ledger path (required).
    #[must_use]
    pub fn processed_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.processed_log = Some(path.into());
        self
    }

    /// Sets the error ledger path (required).
    #[must_use]
    pub fn error_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.error_log = Some(path.into());
        self
    }

    /// Sets a distinct processed ledger to read history from.
    ///
    /// When unset, history is read from the `processed_log` path.
    #[must_use]
    pub fn history_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_log = Some(path.into());
        self
    }

    /// Sets the IMAP search query used for discovery. Default is `"ALL"`.
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a required path is missing.
    pub fn build(self) -> Result<ExtractorConfig> {
        let output_base = self.output_base.ok_or_else(|| Error::InvalidConfig {
            message: "output_base is required".into(),
        })?;
        let processed_log = self.processed_log.ok_or_else(|| Error::InvalidConfig {
            message: "processed_log is required".into(),
        })?;
        let error_log = self.error_log.ok_or_else(|| Error::InvalidConfig {
            message: "error_log is required".into(),
        })?;

        Ok(ExtractorConfig {
            output_base,
            processed_log,
            error_log,
            history_log: self.history_log,
            query: self.query.unwrap_or_else(|| "ALL".into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imap_builder_minimal() {
        let config = ImapConfig::builder()
            .email("user@example.com")
            .password("secret")
            .build()
            .unwrap();

        assert_eq!(config.email(), "user@example.com");
        assert_eq!(config.password(), "secret");
        assert_eq!(config.imap_port, 993);
        assert_eq!(config.mailbox, "INBOX");
    }

    #[test]
    fn test_imap_builder_full() {
        let config = ImapConfig::builder()
            .email("user@example.com")
            .password("secret")
            .imap_host("mail.example.com")
            .imap_port(994)
            .mailbox("Archive")
            .connect_timeout(Duration::from_secs(60))
            .build()
            .unwrap();

        assert_eq!(config.imap_host, Some("mail.example.com".into()));
        assert_eq!(config.imap_port, 994);
        assert_eq!(config.mailbox, "Archive");
        assert_eq!(config.timeouts.connect, Duration::from_secs(60));
    }

    #[test]
    fn test_imap_builder_missing_fields() {
        assert!(ImapConfig::builder().password("secret").build().is_err());
        assert!(ImapConfig::builder()
            .email("user@example.com")
            .build()
            .is_err());
    }

    #[test]
    fn test_imap_builder_invalid_email() {
        let result = ImapConfig::builder()
            .email("invalid-email")
            .password("secret")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_server_address() {
        let config = ImapConfig::builder()
            .email("user@example.com")
            .password("secret")
            .imap_host("mail.example.com")
            .build()
            .unwrap();

        assert_eq!(config.server_address(), "mail.example.com:993");
    }

    #[test]
    fn test_password_not_in_debug() {
        let config = ImapConfig::builder()
            .email("user@example.com")
            .password("super-secret-password")
            .build()
            .unwrap();

        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("super-secret-password"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_imap_builder_with_server_registry() {
        let mut registry = ServerRegistry::new();
        registry.register("mycompany.com", "mail.internal.mycompany.com");

        let config = ImapConfig::builder()
            .email("user@mycompany.com")
            .password("secret")
            .server_registry(registry)
            .build()
            .unwrap();

        assert_eq!(config.effective_imap_host(), "mail.internal.mycompany.com");
    }

    #[test]
    fn test_explicit_host_overrides_registry() {
        let mut registry = ServerRegistry::new();
        registry.register("mycompany.com", "mail.internal.mycompany.com");

        let config = ImapConfig::builder()
            .email("user@mycompany.com")
            .password("secret")
            .imap_host("custom.host.com")
            .server_registry(registry)
            .build()
            .unwrap();

        assert_eq!(config.effective_imap_host(), "custom.host.com");
    }

    #[test]
    fn test_no_registry_uses_default_discovery() {
        let config = ImapConfig::builder()
            .email("user@gmail.com")
            .password("secret")
            .build()
            .unwrap();

        assert_eq!(config.effective_imap_host(), "imap.gmail.com");
    }

    #[test]
    fn test_extractor_builder_minimal() {
        let config = ExtractorConfig::builder()
            .output_base("/out")
            .processed_log("/logs/processed.txt")
            .error_log("/logs/errors.csv")
            .build()
            .unwrap();

        assert_eq!(config.output_base, PathBuf::from("/out"));
        assert_eq!(config.query, "ALL");
        // Shared ledger layout: history read path falls back to the write path
        assert_eq!(
            config.effective_history_log(),
            Path::new("/logs/processed.txt")
        );
    }

    #[test]
    fn test_extractor_builder_split_history() {
        let config = ExtractorConfig::builder()
            .output_base("/out")
            .processed_log("/logs/processed.txt")
            .error_log("/logs/errors.csv")
            .history_log("/archive/processed-2023.txt")
            .build()
            .unwrap();

        assert_eq!(
            config.effective_history_log(),
            Path::new("/archive/processed-2023.txt")
        );
    }

    #[test]
    fn test_extractor_builder_missing_paths() {
        assert!(ExtractorConfig::builder()
            .processed_log("/logs/p.txt")
            .error_log("/logs/e.csv")
            .build()
            .is_err());
        assert!(ExtractorConfig::builder()
            .output_base("/out")
            .error_log("/logs/e.csv")
            .build()
            .is_err());
        assert!(ExtractorConfig::builder()
            .output_base("/out")
            .processed_log("/logs/p.txt")
            .build()
            .is_err());
    }

    #[test]
    fn test_extractor_builder_custom_query() {
        let config = ExtractorConfig::builder()
            .output_base("/out")
            .processed_log("/logs/p.txt")
            .error_log("/logs/e.csv")
            .query("FROM workflow@corp.example")
            .build()
            .unwrap();

        assert_eq!(config.query, "FROM workflow@corp.example");
    }
}
