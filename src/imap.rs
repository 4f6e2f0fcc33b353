//! IMAP implementation of the [`MailGateway`] trait.
//!
//! [`ImapMailGateway`] owns the connection lifecycle: TLS, authentication,
//! mailbox selection, listing, per-message fetch, and logout. Each step runs
//! under its configured timeout.
//!
//! # Example
//!
//! ```no_run
//! use mail_extract::{ImapConfig, ImapMailGateway};
//! use mail_extract::gateway::MailGateway;
//!
//! # async fn example() -> mail_extract::Result<()> {
//! let config = ImapConfig::builder()
//!     .email("user@example.com")
//!     .password("app-password")
//!     .build()?;
//!
//! let mut gateway = ImapMailGateway::connect(config).await?;
//! let ids = gateway.list_attachment_message_ids("ALL").await?;
//! println!("{} candidate messages", ids.len());
//! gateway.logout().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::ImapConfig;
use crate::connection;
use crate::error::{Error, Result};
use crate::gateway::{MailGateway, Message, MessageId};
use crate::parser;
use crate::session::{self, AuthConfig, ImapSession};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument};

/// Async IMAP gateway for listing and fetching attachment messages.
///
/// Create using [`ImapMailGateway::connect`]; call
/// [`logout`](Self::logout) when the run is done.
pub struct ImapMailGateway {
    session: Box<ImapSession>,
    config: ImapConfig,
    /// Optional SINCE window applied to every listing query.
    max_age: Option<std::time::Duration>,
}

impl ImapMailGateway {
    /// Connects to the IMAP server, authenticates, and selects the
    /// configured mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection, authentication, or mailbox
    /// selection fails or times out.
    #[instrument(
        name = "ImapMailGateway::connect",
        skip_all,
        fields(
            email = %config.email(),
            imap_host = %config.effective_imap_host(),
            mailbox = %config.mailbox
        )
    )]
    pub async fn connect(config: ImapConfig) -> Result<Self> {
        let imap_host = config.effective_imap_host();
        let target_addr = config.server_address();
        let timeouts = &config.timeouts;

        let tls_stream = tokio::time::timeout(
            timeouts.connect,
            connection::establish_tls_connection(&imap_host, &target_addr),
        )
        .await
        .map_err(|_| Error::ConnectTimeout {
            target: target_addr.clone(),
            timeout: timeouts.connect,
        })??;

        debug!("TLS connection established");

        let auth_config = AuthConfig {
            email: config.email(),
            password: config.password(),
        };

        let mut session = tokio::time::timeout(
            timeouts.auth,
            session::authenticate(tls_stream, &auth_config),
        )
        .await
        .map_err(|_| Error::AuthTimeout {
            email: config.email().to_string(),
            timeout: timeouts.auth,
        })??;

        debug!("Authenticated");

        tokio::time::timeout(
            timeouts.select,
            session::select_mailbox(&mut session, &config.mailbox),
        )
        .await
        .map_err(|_| Error::SelectTimeout {
            mailbox: config.mailbox.clone(),
            timeout: timeouts.select,
        })??;

        debug!("Mailbox selected");

        Ok(Self {
            session: Box::new(session),
            config,
            max_age: None,
        })
    }

    /// Restricts every subsequent listing to messages no older than
    /// `max_age` (an IMAP `SINCE` date, day granularity).
    #[must_use]
    pub fn with_max_age(mut self, max_age: std::time::Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Logs out from the IMAP server.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout command fails or times out.
    #[instrument(name = "ImapMailGateway::logout", skip(self))]
    pub async fn logout(&mut self) -> Result<()> {
        let timeout = self.config.timeouts.logout;
        tokio::time::timeout(timeout, session::logout(&mut self.session))
            .await
            .map_err(|_| Error::LogoutTimeout { timeout })?
    }

    /// Returns the email address used for this connection.
    #[must_use]
    pub fn email(&self) -> &str {
        self.config.email()
    }

    /// Composes the effective search query, appending a SINCE window when
    /// one is configured.
    fn effective_query(&self, query: &str) -> String {
        match self.max_age {
            Some(max_age) => {
                let since = Utc::now()
                    - chrono::Duration::from_std(max_age).unwrap_or_else(|_| {
                        chrono::Duration::zero()
                    });
                // IMAP SINCE format: "DD-Mon-YYYY" (e.g. "07-Dec-2025")
                format!("{query} SINCE {}", since.date_naive().format("%d-%b-%Y"))
            }
            None => query.to_string(),
        }
    }

    /// Parses a [`MessageId`] back into the IMAP UID it wraps.
    fn parse_uid(id: &MessageId) -> Result<u32> {
        id.as_str()
            .parse()
            .map_err(|_| Error::MessageNotFound {
                message_id: id.to_string(),
            })
    }
}

#[async_trait]
impl MailGateway for ImapMailGateway {
    /// Lists candidate UIDs in one logical call (IMAP SEARCH has no paging),
    /// in ascending UID order.
    #[instrument(
        name = "ImapMailGateway::list",
        skip(self),
        fields(query = %query)
    )]
    async fn list_attachment_message_ids(&mut self, query: &str) -> Result<Vec<MessageId>> {
        let effective = self.effective_query(query);
        let timeout = self.config.timeouts.search;

        let uids = tokio::time::timeout(
            timeout,
            session::search_uids(&mut self.session, &effective),
        )
        .await
        .map_err(|_| Error::SearchTimeout { timeout })??;

        Ok(uids
            .into_iter()
            .map(|uid| MessageId::new(uid.to_string()))
            .collect())
    }

    /// Fetches one message's raw body and parses out the subject and all
    /// attachment payloads.
    #[instrument(
        name = "ImapMailGateway::fetch",
        skip(self),
        fields(message_id = %id)
    )]
    async fn fetch_message(&mut self, id: &MessageId) -> Result<Message> {
        let uid = Self::parse_uid(id)?;
        let timeout = self.config.timeouts.message_fetch;

        let raw = tokio::time::timeout(
            timeout,
            session::fetch_raw_message(&mut self.session, uid),
        )
        .await
        .map_err(|_| Error::FetchTimeout {
            message_id: id.to_string(),
            timeout,
        })??;

        parser::parse_message(id, &raw)
    }
}

impl std::fmt::Debug for ImapMailGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImapMailGateway")
            .field("email", &self.config.email())
            .field("imap_host", &self.config.effective_imap_host())
            .field("mailbox", &self.config.mailbox)
            .finish_non_exhaustive()
    }
}
