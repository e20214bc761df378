//! Classification of add failures.
//!
//! The engine answers a refused add with free text, so the best we can do is
//! match known phrases. The mapping is best-effort and may drift between
//! engine versions; anything unknown falls back to a raw excerpt.

use std::fmt;

/// Maximum number of characters of the engine's body kept in a reason.
pub const EXCERPT_CHARS: usize = 200;

/// Why the engine refused an add, with an excerpt of what it said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The torrent is already in the engine's list.
    AlreadyExists(String),
    /// Not enough disk space on the engine side.
    InsufficientSpace(String),
    /// The engine failed to read or write a file.
    FileError(String),
    /// Nothing recognizable; the excerpt is all we have.
    Unclassified(String),
    /// The engine returned no body at all.
    EmptyBody,
}

impl RejectReason {
    /// Classify a response body.
    pub fn classify(body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return RejectReason::EmptyBody;
        }

        let excerpt: String = trimmed.chars().take(EXCERPT_CHARS).collect();
        let lower = trimmed.to_lowercase();

        let already = lower.contains("already")
            && (lower.contains("exists")
                || lower.contains("in the list")
                || lower.contains("duplicate"));
        let no_space = (lower.contains("not enough")
            && (lower.contains("space") || lower.contains("disk")))
            || (lower.contains("insufficient") && lower.contains("space"));

        if already {
            RejectReason::AlreadyExists(excerpt)
        } else if no_space {
            RejectReason::InsufficientSpace(excerpt)
        } else if lower.contains("error") && lower.contains("file") {
            RejectReason::FileError(excerpt)
        } else {
            RejectReason::Unclassified(excerpt)
        }
    }

    /// The raw excerpt, if any.
    pub fn excerpt(&self) -> Option<&str> {
        match self {
            RejectReason::AlreadyExists(s)
            | RejectReason::InsufficientSpace(s)
            | RejectReason::FileError(s)
            | RejectReason::Unclassified(s) => Some(s),
            RejectReason::EmptyBody => None,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::AlreadyExists(s) => write!(f, "torrent already exists: {}", s),
            RejectReason::InsufficientSpace(s) => write!(f, "not enough disk space: {}", s),
            RejectReason::FileError(s) => write!(f, "file error: {}", s),
            RejectReason::Unclassified(s) => write!(f, "{}", s),
            RejectReason::EmptyBody => write!(f, "(no response body)"),
        }
    }
}

/// Collapse newlines and cut a body down for log lines.
pub(crate) fn log_excerpt(body: &str, max_chars: usize) -> String {
    body.replace(['\n', '\r'], " ").chars().take(max_chars).collect()
}
