//! IMAP server discovery from email domains.
//!
//! The original deployment of this tool was hard-wired to one provider; here
//! discovery is a lookup table with an `imap.{domain}` fallback, extensible at
//! runtime for internal mail hosts.
//!
//! # Example
//!
//! ```
//! use mail_extract::known_servers::{discover_imap_host, ServerRegistry};
//!
//! assert_eq!(discover_imap_host("user@gmail.com"), "imap.gmail.com");
//!
//! let mut registry = ServerRegistry::with_defaults();
//! registry.register("corp.example", "mail.corp.internal");
//! assert_eq!(registry.discover("user@corp.example"), "mail.corp.internal");
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Map of email domains to their IMAP server hostnames.
static KNOWN_SERVERS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    // Google
    m.insert("gmail.com", "imap.gmail.com");
    m.insert("googlemail.com", "imap.gmail.com");

    // Microsoft
    m.insert("hotmail.com", "imap-mail.outlook.com");
    m.insert("outlook.com", "imap-mail.outlook.com");
    m.insert("live.com", "imap-mail.outlook.com");

    // Yahoo
    m.insert("yahoo.com", "imap.mail.yahoo.com");

    // Apple
    m.insert("icloud.com", "imap.mail.me.com");
    m.insert("me.com", "imap.mail.me.com");
    m.insert("mac.com", "imap.mail.me.com");

    // AOL
    m.insert("aol.com", "imap.aol.com");

    // German providers
    m.insert("web.de", "imap.web.de");
    m.insert("gmx.de", "imap.gmx.net");
    m.insert("gmx.net", "imap.gmx.net");
    m.insert("gmx.com", "imap.gmx.net");

    m
});

/// Extracts the domain part of an email address, lowercased.
fn email_domain(email: &str) -> Option<String> {
    email.rsplit_once('@').map(|(_, d)| d.to_ascii_lowercase())
}

/// Discovers the IMAP host for an email address using the built-in table.
///
/// Unknown domains fall back to `imap.{domain}`, the most common convention.
#[must_use]
pub fn discover_imap_host(email: &str) -> String {
    let Some(domain) = email_domain(email) else {
        return format!("imap.{email}");
    };

    KNOWN_SERVERS
        .get(domain.as_str())
        .map_or_else(|| format!("imap.{domain}"), |host| (*host).to_string())
}

/// A customizable registry for IMAP server discovery.
///
/// Custom mappings take precedence over the built-in defaults, so internal
/// mail hosts or provider proxies can be wired in without forking the table.
#[derive(Debug, Clone, Default)]
pub struct ServerRegistry {
    custom: HashMap<String, String>,
    use_defaults: bool,
}

impl ServerRegistry {
    /// Creates an empty registry without built-in defaults.
    ///
    /// Use [`Self::with_defaults`] if you want to include the standard mappings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            custom: HashMap::new(),
            use_defaults: false,
        }
    }

    /// Creates a registry that consults the built-in defaults after custom
    /// mappings.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            custom: HashMap::new(),
            use_defaults: true,
        }
    }

    /// Registers a domain-to-host mapping. Domains are case-insensitive.
    pub fn register(&mut self, domain: impl Into<String>, imap_host: impl Into<String>) {
        self.custom
            .insert(domain.into().to_ascii_lowercase(), imap_host.into());
    }

    /// Registers several mappings at once.
    pub fn register_many<D, H>(&mut self, mappings: impl IntoIterator<Item = (D, H)>)
    where
        D: Into<String>,
        H: Into<String>,
    {
        for (domain, host) in mappings {
            self.register(domain, host);
        }
    }

    /// Resolves the IMAP host for an email address.
    ///
    /// Resolution order: custom mappings, then built-in defaults (if this
    /// registry carries them), then the `imap.{domain}` fallback.
    #[must_use]
    pub fn discover<'a>(&'a self, email: &str) -> Cow<'a, str> {
        let Some(domain) = email_domain(email) else {
            return Cow::Owned(format!("imap.{email}"));
        };

        if let Some(host) = self.custom.get(&domain) {
            return Cow::Borrowed(host);
        }

        if self.use_defaults {
            if let Some(host) = KNOWN_SERVERS.get(domain.as_str()) {
                return Cow::Borrowed(host);
            }
        }

        Cow::Owned(format!("imap.{domain}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_provider() {
        assert_eq!(discover_imap_host("user@gmail.com"), "imap.gmail.com");
        assert_eq!(
            discover_imap_host("user@outlook.com"),
            "imap-mail.outlook.com"
        );
    }

    #[test]
    fn test_unknown_domain_fallback() {
        assert_eq!(
            discover_imap_host("user@somewhere.example"),
            "imap.somewhere.example"
        );
    }

    #[test]
    fn test_domain_case_insensitive() {
        assert_eq!(discover_imap_host("user@GMAIL.com"), "imap.gmail.com");
    }

    #[test]
    fn test_registry_custom_mapping() {
        let mut registry = ServerRegistry::new();
        registry.register("corp.example", "mail.corp.internal");

        assert_eq!(registry.discover("user@corp.example"), "mail.corp.internal");
        // No defaults: known providers also fall back
        assert_eq!(registry.discover("user@gmail.com"), "imap.gmail.com");
    }

    #[test]
    fn test_registry_custom_overrides_builtin() {
        let mut registry = ServerRegistry::with_defaults();
        registry.register("gmail.com", "gmail-proxy.internal");

        assert_eq!(registry.discover("user@gmail.com"), "gmail-proxy.internal");
        assert_eq!(registry.discover("user@web.de"), "imap.web.de");
    }

    #[test]
    fn test_registry_register_many() {
        let mut registry = ServerRegistry::new();
        registry.register_many([
            ("corp.example", "mail.corp.internal"),
            ("partner.example", "imap.partner.example"),
        ]);

        assert_eq!(registry.discover("a@corp.example"), "mail.corp.internal");
        assert_eq!(
            registry.discover("b@partner.example"),
            "imap.partner.example"
        );
    }
}
