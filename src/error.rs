//! Structured error types for docpress.
//!
//! The taxonomy separates things the caller can fix (bad layout, bad filters,
//! exceeded limits) from things it cannot (storage outages). Degraded-render
//! conditions — a missing photo, an unresolvable binding — are deliberately
//! *not* errors; they are logged and the affected element is skipped, because
//! a missing attachment should never block an invoice from being issued.

use thiserror::Error;

/// The unified error type returned by all public docpress API functions.
#[derive(Debug, Error)]
pub enum DocpressError {
    /// A layout document failed structural validation. Reported before any
    /// drawing begins; no partial document is produced.
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// Bad caller input outside the layout itself (e.g. a malformed or
    /// reversed export date range). 400-class.
    #[error("{0}")]
    InvalidInput(String),

    /// A resource cap was exceeded. The message names the specific limit so
    /// callers can narrow scope and retry themselves.
    #[error("{0}")]
    LimitExceeded(String),

    /// PDF generation failed in a way that is not per-element degradable.
    #[error("Render error: {0}")]
    Render(String),

    /// A storage or query collaborator failed. Propagated untouched — there
    /// is no safe degraded behavior for a backend outage.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Input failed to parse as JSON.
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a revision was exported without a PDF. Self-healing is best-effort;
/// the reason is surfaced so tests and callers can assert on it instead of
/// inferring it from a file's absence. Storage outages are never a skip —
/// they propagate as [`DocpressError::Storage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Stored bytes were missing and regeneration from the snapshot failed.
    RegenerationFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::RegenerationFailed(msg) => write!(f, "regeneration failed: {}", msg),
        }
    }
}
