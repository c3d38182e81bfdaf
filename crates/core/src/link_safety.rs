#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use tracing::warn;
use url::Url;

pub const DEFAULT_DENIED_DOMAINS: &[&str] = &[
    "malware.com",
    "phishing.com",
    "scam.com",
    "spam.com",
    "virus.com",
];

pub const DENIED_REASON: &str = "Domain blacklisted";

/// Known-bad domains. A host is denied when it contains any entry as a substring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenyList {
    entries: BTreeSet<String>,
}

impl DenyList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|entry| entry.as_ref().trim().trim_end_matches('.').to_ascii_lowercase())
            .filter(|entry| !entry.is_empty())
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn matching_entry(&self, host: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| host.contains(entry.as_str()))
            .map(String::as_str)
    }
}

impl Default for DenyList {
    fn default() -> Self {
        Self::new(DEFAULT_DENIED_DOMAINS)
    }
}

/// What to do with a link whose host cannot be extracted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParseFailurePolicy {
    /// Allow the link and report it as unchecked.
    #[default]
    FailOpen,
    /// Reject the link.
    FailClosed,
}

impl ParseFailurePolicy {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" | "fail-open" | "fail_open" => Some(Self::FailOpen),
            "closed" | "fail-closed" | "fail_closed" => Some(Self::FailClosed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FailOpen => "open",
            Self::FailClosed => "closed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkVerdict {
    pub safe: bool,
    pub checked: bool,
    pub reason: Option<String>,
}

impl LinkVerdict {
    fn unchecked() -> Self {
        Self {
            safe: true,
            checked: false,
            reason: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LinkParseError {
    #[error("url is empty")]
    Empty,
    #[error("url host is empty")]
    EmptyHost,
    #[error("{0}")]
    Invalid(#[from] url::ParseError),
}

#[derive(Clone, Debug, Default)]
pub struct LinkSafetyChecker {
    deny_list: DenyList,
    on_parse_failure: ParseFailurePolicy,
}

impl LinkSafetyChecker {
    pub fn new(deny_list: DenyList, on_parse_failure: ParseFailurePolicy) -> Self {
        Self {
            deny_list,
            on_parse_failure,
        }
    }

    pub fn deny_list(&self) -> &DenyList {
        &self.deny_list
    }

    pub fn on_parse_failure(&self) -> ParseFailurePolicy {
        self.on_parse_failure
    }

    pub fn check(&self, link: Option<&str>) -> LinkVerdict {
        let Some(link) = link.map(str::trim).filter(|link| !link.is_empty()) else {
            return LinkVerdict::unchecked();
        };

        let host = match parse_link_host(link) {
            Ok(host) => host,
            Err(err) => {
                return match self.on_parse_failure {
                    ParseFailurePolicy::FailOpen => {
                        warn!(error = %err, "link safety check skipped: url could not be parsed");
                        LinkVerdict {
                            safe: true,
                            checked: false,
                            reason: Some(format!("url parse failed: {err}")),
                        }
                    }
                    ParseFailurePolicy::FailClosed => LinkVerdict {
                        safe: false,
                        checked: false,
                        reason: Some("Invalid URL".to_string()),
                    },
                };
            }
        };

        match self.deny_list.matching_entry(&host) {
            Some(_) => LinkVerdict {
                safe: false,
                checked: true,
                reason: Some(DENIED_REASON.to_string()),
            },
            None => LinkVerdict {
                safe: true,
                checked: true,
                reason: None,
            },
        }
    }
}

/// Extracts the lowercased host of a link with a WHATWG URL parser, so tabs and newlines are
/// dropped, `\` acts as a path separator and the host is percent-decoded. Links without a scheme
/// are read as `https://`.
pub fn parse_link_host(raw: &str) -> Result<String, LinkParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LinkParseError::Empty);
    }

    let parsed = if has_scheme(trimmed) {
        Url::parse(trimmed)?
    } else {
        Url::parse(&format!("https://{trimmed}"))?
    };

    parsed
        .host_str()
        .map(|host| host.trim_end_matches('.').to_ascii_lowercase())
        .filter(|host| !host.is_empty())
        .ok_or(LinkParseError::EmptyHost)
}

fn has_scheme(link: &str) -> bool {
    link.split_once("://").is_some_and(|(scheme, _)| {
        let mut chars = scheme.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}
