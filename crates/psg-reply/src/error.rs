//! Reply decoding error type.

use psg_cfg::CfgError;
use thiserror::Error;

use crate::log::Diagnostic;

#[derive(Debug, Error)]
pub enum ReplyError {
    /// A segment was never closed, or an end marker appeared with no
    /// matching start.
    #[error("reply truncated at segment `{segment}` (marker at byte {offset})")]
    TruncatedResponse { segment: String, offset: usize },

    #[error("content outside any segment at byte {offset}: `{text}`")]
    StrayContent { offset: usize, text: String },

    #[error("{segment} line {line}: {reason}")]
    Table {
        segment: String,
        line: usize,
        reason: String,
    },

    #[error("binary grid: {reason}")]
    Grid { reason: String },

    #[error("log line {line}: {reason}: `{text}`")]
    Log {
        line: usize,
        text: String,
        reason: String,
    },

    #[error("configuration: {0}")]
    Config(#[from] CfgError),

    #[error("{}", .errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Service { errors: Vec<Diagnostic> },

    #[error("no payload for blob `{id}` referenced by {key}")]
    MissingBlob { key: String, id: String },

    #[error("transport failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ReplyError {
    pub(crate) fn table(segment: &str, line: usize, reason: impl Into<String>) -> Self {
        Self::Table {
            segment: segment.to_string(),
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn grid(reason: impl Into<String>) -> Self {
        Self::Grid {
            reason: reason.into(),
        }
    }
}
