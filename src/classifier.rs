//! Subject classification for routing attachments.
//!
//! A [`SubjectClassifier`] maps a free-text subject line to an optional
//! `(module, reference number)` pair by applying an **ordered** list of
//! [`ExtractionRule`]s. The first rule whose pattern matches wins; later rules
//! are never evaluated once one matches. "No match" is a normal outcome, not
//! an error.
//!
//! # Example
//!
//! ```
//! use mail_extract::classifier::SubjectClassifier;
//!
//! let classifier = SubjectClassifier::with_default_rules();
//!
//! let c = classifier.classify("Fwd: RQ #12345 needs review").unwrap();
//! assert_eq!(c.module, "RQ");
//! assert_eq!(c.reference_no, "12345");
//!
//! assert!(classifier.classify("lunch on friday?").is_none());
//! ```

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// The short module codes recognized by the default rules, longest token first
/// so the pattern alternation never truncates a longer code into a shorter one.
const MODULE_TOKENS: &[&str] = &["Purchase Requisition", "PRQ", "PR", "PO", "RQ"];

/// Long-form module names and the short codes they normalize to.
///
/// Normalization applies uniformly across every rule in the list.
const LONG_FORM_CODES: &[(&str, &str)] = &[("Purchase Requisition", "PRQ")];

/// The delimiters of the canonical rule set, in evaluation order.
const DEFAULT_DELIMITERS: &[&str] = &[" #", " Approval of ", " Approval ", " Reviewer "];

/// Precompiled canonical rules (case-sensitive). Compilation cannot fail:
/// every token and delimiter is escaped before it reaches the regex engine.
static DEFAULT_RULES: Lazy<Vec<ExtractionRule>> = Lazy::new(|| {
    DEFAULT_DELIMITERS
        .iter()
        .map(|delim| {
            ExtractionRule::new(MODULE_TOKENS, delim, false).expect("escaped pattern compiles")
        })
        .collect()
});

/// A successful subject classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Short workflow-category code (e.g. `"RQ"`, `"PO"`), used as the
    /// first-level directory key.
    pub module: String,
    /// Opaque reference token, used as the second-level directory key.
    pub reference_no: String,
}

/// One ordered extraction rule: a module-token alternation, a delimiter, and
/// the first non-whitespace run after the delimiter as the reference number.
///
/// The pattern is searched anywhere in the subject (unanchored).
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    regex: Regex,
    description: String,
}

impl ExtractionRule {
    /// Builds a rule recognizing `"<MODULE><delimiter><REF>"` for any of the
    /// given module tokens.
    ///
    /// Tokens and delimiter are taken literally (regex metacharacters are
    /// escaped). With `case_insensitive` the whole pattern matches without
    /// regard to case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRule`] if the assembled pattern fails to
    /// compile (possible only for custom token sets that overflow regex
    /// limits).
    pub fn new(tokens: &[&str], delimiter: &str, case_insensitive: bool) -> Result<Self> {
        let alternation = tokens
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let flags = if case_insensitive { "(?i)" } else { "" };
        let pattern = format!(
            "{flags}({alternation})(?:{delim})(\\S+)",
            delim = regex::escape(delimiter)
        );

        let regex = Regex::new(&pattern).map_err(|source| Error::InvalidRule {
            pattern: pattern.clone(),
            source,
        })?;

        Ok(Self {
            regex,
            description: format!("'<MODULE>{delimiter}<REF>'"),
        })
    }

    /// Applies the rule to a subject, returning the raw `(module token,
    /// reference number)` pair on a match.
    fn apply<'a>(&self, subject: &'a str) -> Option<(&'a str, &'a str)> {
        self.regex.captures(subject).and_then(|caps| {
            let module = caps.get(1)?.as_str();
            let reference = caps.get(2)?.as_str();
            Some((module, reference))
        })
    }

    /// Returns a human-readable description of the rule, used in logging.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Ordered, first-match-wins subject classifier.
///
/// Constructed with the canonical rule set via
/// [`with_default_rules`](Self::with_default_rules) (case-sensitive, the
/// default) or [`case_insensitive`](Self::case_insensitive). Additional rules
/// can be appended with [`push_rule`](Self::push_rule); they are evaluated
/// after the canonical ones.
#[derive(Debug, Clone)]
pub struct SubjectClassifier {
    rules: Vec<ExtractionRule>,
    case_insensitive: bool,
}

impl Default for SubjectClassifier {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

impl SubjectClassifier {
    /// Creates a classifier with the canonical rule set, matching module
    /// tokens case-sensitively.
    #[must_use]
    pub fn with_default_rules() -> Self {
        Self {
            rules: DEFAULT_RULES.clone(),
            case_insensitive: false,
        }
    }

    /// Creates a classifier with the canonical rule set, matching without
    /// regard to case. Matched modules are normalized to their canonical
    /// uppercase codes.
    #[must_use]
    pub fn case_insensitive() -> Self {
        let rules = DEFAULT_DELIMITERS
            .iter()
            .map(|delim| {
                ExtractionRule::new(MODULE_TOKENS, delim, true).expect("escaped pattern compiles")
            })
            .collect();
        Self {
            rules,
            case_insensitive: true,
        }
    }

    /// Appends a custom rule recognizing `"<MODULE><delimiter><REF>"` for the
    /// given tokens. Custom rules are evaluated after all existing rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRule`] if the pattern fails to compile.
    pub fn push_rule(&mut self, tokens: &[&str], delimiter: &str) -> Result<()> {
        self.rules
            .push(ExtractionRule::new(tokens, delimiter, self.case_insensitive)?);
        Ok(())
    }

    /// Classifies a subject line.
    ///
    /// Rules are tried in order and the first match is returned immediately;
    /// a subject matching several rules is always classified by the earliest
    /// one. Returns `None` when no rule matches.
    #[must_use]
    pub fn classify(&self, subject: &str) -> Option<Classification> {
        for rule in &self.rules {
            if let Some((module, reference_no)) = rule.apply(subject) {
                return Some(Classification {
                    module: self.normalize_module(module),
                    reference_no: reference_no.to_string(),
                });
            }
        }
        None
    }

    /// Returns the number of rules, canonical plus custom.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Maps a matched module token to its canonical short code.
    ///
    /// Long-form names collapse to their short codes in every rule; in
    /// case-insensitive mode the token is also folded to uppercase so
    /// `"rq"` and `"RQ"` land in the same directory.
    fn normalize_module(&self, token: &str) -> String {
        for (long_form, code) in LONG_FORM_CODES {
            let hit = if self.case_insensitive {
                token.eq_ignore_ascii_case(long_form)
            } else {
                token == *long_form
            };
            if hit {
                return (*code).to_string();
            }
        }

        if self.case_insensitive {
            token.to_ascii_uppercase()
        } else {
            token.to_string()
        }
    }
}
