//! Closed-vocabulary fields.

use serde::{Deserialize, Serialize};

use super::{raw, Entries, FieldCtx, FieldKind, Lines};
use crate::catalog::UnitCode;
use crate::error::CfgError;
use crate::value::Value;

/// What decode does with a token outside the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTokenPolicy {
    #[default]
    Reject,
    /// Keep the raw token; it is also accepted again on encode.
    Passthrough,
}

// ---------------------------------------------------------------------------
// Enumeration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EnumField {
    tokens: Vec<String>,
    policy: UnknownTokenPolicy,
}

impl EnumField {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            policy: UnknownTokenPolicy::Reject,
        }
    }

    pub fn with_policy(mut self, policy: UnknownTokenPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }
}

impl FieldKind for EnumField {
    fn kind(&self) -> &'static str {
        "enumeration"
    }

    fn normalize(&self, _ctx: &FieldCtx<'_>, value: Value) -> Result<Value, CfgError> {
        Ok(match value {
            Value::Str(s) => Value::Token(s),
            other => other,
        })
    }

    fn validate(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<(), CfgError> {
        let Value::Token(token) = value else {
            return Err(ctx.type_error("a token", value));
        };
        if self.contains(token) {
            return Ok(());
        }
        match self.policy {
            UnknownTokenPolicy::Passthrough => super::check_text(&ctx.key(), token, false),
            UnknownTokenPolicy::Reject => Err(CfgError::invalid(
                &ctx.key(),
                token,
                format!("not one of: {}", self.tokens.join(", ")),
            )),
        }
    }

    fn encode(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Lines, CfgError> {
        let token = value.as_str().ok_or_else(|| ctx.type_error("a token", value))?;
        Ok(vec![(ctx.key(), token.to_string())])
    }

    fn decode(&self, ctx: &FieldCtx<'_>, entries: &Entries) -> Result<Option<Value>, CfgError> {
        let Some(text) = raw(ctx, entries) else {
            return Ok(None);
        };
        let token = text.trim();
        if self.contains(token) {
            return Ok(Some(Value::Token(token.to_string())));
        }
        match self.policy {
            UnknownTokenPolicy::Passthrough => {
                tracing::warn!(key = %ctx.key(), token, "keeping unrecognized token");
                Ok(Some(Value::Token(token.to_string())))
            }
            UnknownTokenPolicy::Reject => Err(CfgError::UnrecognizedToken {
                key: ctx.key(),
                token: token.to_string(),
                expected: self.tokens.clone(),
            }),
        }
    }

    fn box_clone(&self) -> Box<dyn FieldKind> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Unit selected by code
// ---------------------------------------------------------------------------

/// A unit chosen from a code table, e.g. `GENERATOR-RADUNITS=Jy`.
#[derive(Debug, Clone)]
pub struct UnitCodeField {
    codes: Vec<UnitCode>,
}

impl UnitCodeField {
    pub fn new(codes: Vec<UnitCode>) -> Self {
        Self { codes }
    }

    fn by_code(&self, code: &str) -> Option<&UnitCode> {
        self.codes.iter().find(|c| c.code == code)
    }

    fn code_list(&self) -> Vec<String> {
        self.codes.iter().map(|c| c.code.clone()).collect()
    }
}

impl FieldKind for UnitCodeField {
    fn kind(&self) -> &'static str {
        "unit code"
    }

    fn normalize(&self, ctx: &FieldCtx<'_>, value: Value) -> Result<Value, CfgError> {
        let Value::Str(text) = value else {
            return Ok(value);
        };
        if let Some(c) = self.by_code(&text) {
            return Ok(Value::Unit(c.unit.clone()));
        }
        psg_units::Unit::parse(&text)
            .map(Value::Unit)
            .map_err(|e| CfgError::invalid(&ctx.key(), &text, e.to_string()))
    }

    fn validate(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<(), CfgError> {
        let Value::Unit(unit) = value else {
            return Err(ctx.type_error("a unit", value));
        };
        if self.codes.iter().any(|c| &c.unit == unit) {
            Ok(())
        } else {
            Err(CfgError::invalid(
                &ctx.key(),
                unit,
                format!("no unit code for this unit (codes: {})", self.code_list().join(", ")),
            ))
        }
    }

    fn encode(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Lines, CfgError> {
        let unit = value.as_unit().ok_or_else(|| ctx.type_error("a unit", value))?;
        let code = self
            .codes
            .iter()
            .find(|c| &c.unit == unit)
            .ok_or_else(|| CfgError::invalid(&ctx.key(), unit, "no unit code for this unit"))?;
        Ok(vec![(ctx.key(), code.code.clone())])
    }

    fn decode(&self, ctx: &FieldCtx<'_>, entries: &Entries) -> Result<Option<Value>, CfgError> {
        let Some(text) = raw(ctx, entries) else {
            return Ok(None);
        };
        match self.by_code(text.trim()) {
            Some(c) => Ok(Some(Value::Unit(c.unit.clone()))),
            None => Err(CfgError::UnrecognizedToken {
                key: ctx.key(),
                token: text.trim().to_string(),
                expected: self.code_list(),
            }),
        }
    }

    fn box_clone(&self) -> Box<dyn FieldKind> {
        Box::new(self.clone())
    }
}
