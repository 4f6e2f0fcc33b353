//! Internal IMAP session management.
//!
//! This module wraps async-imap operations with proper error handling.

use crate::connection::TlsStream;
use crate::error::{Error, Result};
use async_imap::Session;
use futures::StreamExt;
use tracing::{debug, instrument};

/// Type alias for IMAP session over TLS.
pub(crate) type ImapSession = Session<TlsStream>;

/// Authentication configuration for IMAP.
pub(crate) struct AuthConfig<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Authenticates to IMAP server and returns a session.
#[instrument(
    name = "session::authenticate",
    skip_all,
    fields(email = %config.email)
)]
pub(crate) async fn authenticate(
    tls_stream: TlsStream,
    config: &AuthConfig<'_>,
) -> Result<ImapSession> {
    let client = async_imap::Client::new(tls_stream);

    debug!("Authenticating to IMAP server");

    client
        .login(config.email, config.password)
        .await
        .map_err(|e| Error::ImapLogin {
            email: config.email.to_string(),
            source: e.0,
        })
}

/// Selects a mailbox (typically "INBOX").
#[instrument(name = "session::select", skip(session), fields(mailbox = %mailbox))]
pub(crate) async fn select_mailbox(session: &mut ImapSession, mailbox: &str) -> Result<()> {
    debug!("Selecting mailbox");

    session
        .select(mailbox)
        .await
        .map_err(|source| Error::SelectMailbox {
            mailbox: mailbox.to_string(),
            source,
        })?;

    Ok(())
}

/// Searches the selected mailbox and returns matching UIDs in ascending order.
///
/// UID order is arrival order, so the returned sequence preserves the
/// mailbox's discovery order for the extractor.
#[instrument(name = "session::search", skip(session), fields(query = %query))]
pub(crate) async fn search_uids(session: &mut ImapSession, query: &str) -> Result<Vec<u32>> {
    // NOOP first so the search sees the latest mailbox state
    session
        .noop()
        .await
        .map_err(|source| Error::ImapSearch {
            query: query.to_string(),
            source,
        })?;

    let uids = session
        .uid_search(query)
        .await
        .map_err(|source| Error::ImapSearch {
            query: query.to_string(),
            source,
        })?;

    let mut uids: Vec<u32> = uids.into_iter().collect();
    uids.sort_unstable();

    debug!(uid_count = uids.len(), "Search complete");

    Ok(uids)
}

/// Fetches the full raw body of a single message by UID.
#[instrument(name = "session::fetch", skip(session), fields(uid = %uid))]
pub(crate) async fn fetch_raw_message(session: &mut ImapSession, uid: u32) -> Result<Vec<u8>> {
    let uid_str = uid.to_string();

    let mut stream = session
        .uid_fetch(&uid_str, "BODY[]")
        .await
        .map_err(|source| Error::ImapFetch {
            message_id: uid_str.clone(),
            source,
        })?;

    while let Some(fetch_result) = stream.next().await {
        let fetch = fetch_result.map_err(|source| Error::FetchStream { source })?;
        if let Some(body) = fetch.body() {
            debug!(bytes = body.len(), "Fetched message body");
            return Ok(body.to_vec());
        }
    }

    Err(Error::MessageNotFound {
        message_id: uid_str,
    })
}

/// Logs out from IMAP session.
#[instrument(name = "session::logout", skip(session))]
pub(crate) async fn logout(session: &mut ImapSession) -> Result<()> {
    debug!("Logging out");

    session
        .logout()
        .await
        .map_err(|source| Error::ImapLogout { source })?;

    Ok(())
}
