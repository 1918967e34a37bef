//! Service log (`LOG` segment).
//!
//! Diagnostic lines have the form `LEVEL: APP: message`, where `LEVEL` is
//! `ERROR` or `WARNING`. Other lines are progress chatter and are skipped.

use std::fmt;

use tracing::{debug, warn};

use crate::error::ReplyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "ERROR" => Some(Self::Error),
            "WARNING" => Some(Self::Warning),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
        }
    }
}

/// Service component that raised a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum App {
    GlobES,
    Pumas,
    Generator,
    Other(String),
}

impl App {
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "globes" => Self::GlobES,
            "pumas" => Self::Pumas,
            "generator" => Self::Generator,
            _ => Self::Other(label.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::GlobES => "GlobES",
            Self::Pumas => "PUMAS",
            Self::Generator => "Generator",
            Self::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub app: App,
    pub message: String,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {}",
            self.severity.as_str(),
            self.app.as_str(),
            self.message
        )
    }
}

fn log_error(line: usize, text: &str, reason: &str) -> ReplyError {
    ReplyError::Log {
        line,
        text: text.to_string(),
        reason: reason.to_string(),
    }
}

/// Extracts the diagnostics from a log body. Warnings are also emitted
/// through `tracing`.
pub fn parse(body: &[u8]) -> Result<Vec<Diagnostic>, ReplyError> {
    let text = String::from_utf8_lossy(body);
    let mut out = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        let Some((label, rest)) = line.split_once(':') else {
            continue;
        };
        let Some(severity) = Severity::from_label(label.trim()) else {
            continue;
        };
        let Some((app, message)) = rest.split_once(':') else {
            return Err(log_error(n + 1, line, "missing application"));
        };
        let (app, message) = (app.trim(), message.trim());
        if app.is_empty() {
            return Err(log_error(n + 1, line, "missing application"));
        }
        if message.is_empty() {
            return Err(log_error(n + 1, line, "empty message"));
        }
        let diagnostic = Diagnostic {
            severity,
            app: App::from_label(app),
            message: message.to_string(),
        };
        match severity {
            Severity::Warning => warn!(app = diagnostic.app.as_str(), "{}", diagnostic.message),
            Severity::Error => debug!(app = diagnostic.app.as_str(), "{}", diagnostic.message),
        }
        out.push(diagnostic);
    }
    Ok(out)
}
