//! Origin trust predicate for inbound guest messages.
//!
//! The container evaluates [`OriginPolicy::is_trusted`] once per inbound
//! message, before any handler sees it. The predicate is independent of the
//! transport that carried the message.

use crate::error::{BridgeError, Result};
use regex_lite::Regex;
use url::Url;

/// Prefix marking a config entry as a whole-origin regular expression.
const REGEX_PREFIX: &str = "regex:";
/// Prefix marking a config entry as a one-level https subdomain wildcard.
const WILDCARD_PREFIX: &str = "*.";

/// A single allow-list entry.
#[derive(Debug, Clone)]
pub enum OriginRule {
    /// Serialized origin (`scheme://host[:port]`), compared after normalization.
    Exact(String),
    /// `*.<domain>`: any single-label https subdomain of `domain` on the default port.
    Subdomain(String),
    /// Regular expression that must match the whole normalized origin.
    Pattern(Regex),
}

impl OriginRule {
    /// Parses a config entry: `regex:<pattern>`, `*.<domain>`, or a literal origin.
    pub fn parse(entry: &str) -> Result<Self> {
        let entry = entry.trim();
        if let Some(pattern) = entry.strip_prefix(REGEX_PREFIX) {
            let anchored = format!("^(?:{pattern})$");
            return Regex::new(&anchored)
                .map(Self::Pattern)
                .map_err(|e| invalid(entry, e.to_string()));
        }

        if let Some(domain) = entry.strip_prefix(WILDCARD_PREFIX) {
            let domain = domain.trim_end_matches('/').to_ascii_lowercase();
            if domain.is_empty() || domain.contains(['/', ':', '*']) || !domain.contains('.') {
                return Err(invalid(entry, "wildcard must name a registrable domain"));
            }
            return Ok(Self::Subdomain(domain));
        }

        let url = Url::parse(entry).map_err(|e| invalid(entry, e.to_string()))?;
        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(invalid(entry, "origin is opaque"));
        }
        if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
            return Err(invalid(entry, "origin must not carry a path, query or fragment"));
        }
        Ok(Self::Exact(origin.ascii_serialization()))
    }

    fn matches(&self, normalized: &str, parsed: Option<&Url>) -> bool {
        match self {
            Self::Exact(origin) => origin == normalized,
            Self::Subdomain(domain) => parsed.is_some_and(|url| {
                url.scheme() == "https"
                    && url.port().is_none()
                    && url
                        .host_str()
                        .and_then(|host| host.strip_suffix(domain.as_str()))
                        .and_then(|rest| rest.strip_suffix('.'))
                        .is_some_and(|label| !label.is_empty() && !label.contains('.'))
            }),
            Self::Pattern(re) => re.is_match(normalized),
        }
    }
}

fn invalid(rule: &str, reason: impl Into<String>) -> BridgeError {
    BridgeError::InvalidOrigin {
        rule: rule.to_string(),
        reason: reason.into(),
    }
}

/// Allow-list of trusted child origins. Read-only once built; an empty
/// policy trusts nothing.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    rules: Vec<OriginRule>,
}

impl OriginPolicy {
    /// Policy that rejects every origin.
    pub fn deny_all() -> Self {
        Self::default()
    }

    /// Builds a policy from config entries. Any invalid entry fails the whole
    /// policy rather than silently widening or narrowing it.
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = entries
            .into_iter()
            .map(|entry| OriginRule::parse(entry.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn from_rules(rules: Vec<OriginRule>) -> Self {
        Self { rules }
    }

    /// Whether `origin` (as reported by the transport) is allowed to talk to
    /// mounted content.
    pub fn is_trusted(&self, origin: &str) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        let parsed = Url::parse(origin.trim()).ok();
        let normalized = match &parsed {
            Some(url) if url.origin().is_tuple() => url.origin().ascii_serialization(),
            _ => origin.trim().to_string(),
        };
        self.rules
            .iter()
            .any(|rule| rule.matches(&normalized, parsed.as_ref()))
    }

    pub fn rules(&self) -> &[OriginRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
