//! Configuration mapping error type.

use thiserror::Error;

/// Every error names the fully-qualified key (or line) it concerns together
/// with the raw text or value involved.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CfgError {
    #[error("{key}: required field has no value")]
    MissingRequiredField { key: String },

    #[error("{key}: invalid value `{value}`: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("{key}: `{value}` is not convertible to `{expected}` ({reason})")]
    IncompatibleUnit {
        key: String,
        value: String,
        expected: String,
        reason: String,
    },

    #[error("{key}: cannot decode `{raw}`: {reason}")]
    Decode {
        key: String,
        raw: String,
        reason: String,
    },

    #[error("line {line}: malformed configuration line `{text}`")]
    MalformedLine { line: usize, text: String },

    #[error("{key}: conflicting values `{first}` and `{second}`")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },

    #[error("{key}: unrecognized token `{token}` (expected one of: {})", .expected.join(", "))]
    UnrecognizedToken {
        key: String,
        token: String,
        expected: Vec<String>,
    },

    #[error("unknown keys: {}", .keys.join(", "))]
    UnknownKeys { keys: Vec<String> },

    #[error("{key}: declared more than once in the schema")]
    DuplicateSchemaKey { key: String },

    #[error("{key}: no {table} entry in the catalog")]
    MissingCatalogEntry { key: String, table: &'static str },

    #[error("{model}: no field or model named `{attr}`")]
    UnknownField { model: String, attr: String },

    #[error("cannot merge `{right}` into `{left}`: schemas differ")]
    SchemaMismatch { left: String, right: String },

    #[error("configuration text is not valid UTF-8 (byte {offset})")]
    InvalidUtf8 { offset: usize },

    #[error("{} error(s) while decoding configuration: {}", .errors.len(), join_errors(.errors))]
    Deserialize { errors: Vec<CfgError> },
}

fn join_errors(errors: &[CfgError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CfgError {
    pub(crate) fn invalid(key: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(key: &str, raw: &str, reason: impl Into<String>) -> Self {
        Self::Decode {
            key: key.to_string(),
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }

    /// Flattens nested aggregates into a single list of leaf errors.
    pub fn leaves(&self) -> Vec<&CfgError> {
        match self {
            Self::Deserialize { errors } => errors.iter().flat_map(|e| e.leaves()).collect(),
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_key_and_raw_text() {
        let e = CfgError::decode("OBJECT-DIAMETER", "abc", "not a number");
        assert_eq!(
            e.to_string(),
            "OBJECT-DIAMETER: cannot decode `abc`: not a number"
        );
        let e = CfgError::UnrecognizedToken {
            key: "OBJECT".into(),
            token: "Black Hole".into(),
            expected: vec!["Planet".into(), "Moon".into()],
        };
        assert_eq!(
            e.to_string(),
            "OBJECT: unrecognized token `Black Hole` (expected one of: Planet, Moon)"
        );
    }

    #[test]
    fn leaves_flattens_aggregates() {
        let inner = CfgError::Deserialize {
            errors: vec![CfgError::MissingRequiredField { key: "A".into() }],
        };
        let outer = CfgError::Deserialize {
            errors: vec![inner, CfgError::UnknownKeys { keys: vec!["B".into()] }],
        };
        assert_eq!(outer.leaves().len(), 2);
        assert!(outer.to_string().starts_with("2 error(s)"));
    }
}
