//! String, integer, float and boolean fields.

use super::{check_text, raw, Entries, FieldCtx, FieldKind, Lines};
use crate::error::CfgError;
use crate::format::{parse_float, NumberFormat};
use crate::value::Value;

// ---------------------------------------------------------------------------
// String
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct StrField {
    max_len: Option<usize>,
}

impl StrField {
    pub fn new() -> Self {
        Self { max_len: None }
    }

    pub fn max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }
}

impl FieldKind for StrField {
    fn kind(&self) -> &'static str {
        "string"
    }

    fn validate(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<(), CfgError> {
        let Value::Str(s) = value else {
            return Err(ctx.type_error("a string", value));
        };
        check_text(&ctx.key(), s, false)?;
        if let Some(max) = self.max_len {
            let len = s.chars().count();
            if len > max {
                return Err(CfgError::invalid(
                    &ctx.key(),
                    s,
                    format!("{len} characters exceeds the limit of {max}"),
                ));
            }
        }
        Ok(())
    }

    fn encode(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Lines, CfgError> {
        let text = value.as_str().unwrap_or_default();
        Ok(vec![(ctx.key(), text.to_string())])
    }

    fn decode(&self, ctx: &FieldCtx<'_>, entries: &Entries) -> Result<Option<Value>, CfgError> {
        Ok(raw(ctx, entries).map(|s| Value::Str(s.to_string())))
    }

    fn box_clone(&self) -> Box<dyn FieldKind> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Integer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct IntField;

impl IntField {
    pub fn new() -> Self {
        Self
    }
}

impl FieldKind for IntField {
    fn kind(&self) -> &'static str {
        "integer"
    }

    fn validate(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<(), CfgError> {
        match value {
            Value::Int(_) => Ok(()),
            other => Err(ctx.type_error("an integer", other)),
        }
    }

    fn encode(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Lines, CfgError> {
        let v = value.as_i64().ok_or_else(|| ctx.type_error("an integer", value))?;
        Ok(vec![(ctx.key(), v.to_string())])
    }

    fn decode(&self, ctx: &FieldCtx<'_>, entries: &Entries) -> Result<Option<Value>, CfgError> {
        let Some(text) = raw(ctx, entries) else {
            return Ok(None);
        };
        text.trim()
            .parse::<i64>()
            .map(|v| Some(Value::Int(v)))
            .map_err(|_| CfgError::decode(&ctx.key(), text, "not an integer"))
    }

    fn box_clone(&self) -> Box<dyn FieldKind> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Float
// ---------------------------------------------------------------------------

/// Plain float without a unit. Lossy beyond the pinned precision.
#[derive(Debug, Clone, Default)]
pub struct FloatField {
    format: NumberFormat,
}

impl FloatField {
    pub fn new() -> Self {
        Self {
            format: NumberFormat::default(),
        }
    }

    pub fn with_format(mut self, format: NumberFormat) -> Self {
        self.format = format;
        self
    }
}

impl FieldKind for FloatField {
    fn kind(&self) -> &'static str {
        "float"
    }

    fn normalize(&self, _ctx: &FieldCtx<'_>, value: Value) -> Result<Value, CfgError> {
        Ok(match value {
            Value::Int(i) => Value::Float(i as f64),
            other => other,
        })
    }

    fn validate(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<(), CfgError> {
        match value {
            Value::Float(f) if f.is_finite() => Ok(()),
            Value::Float(f) => Err(CfgError::invalid(&ctx.key(), f, "not a finite number")),
            other => Err(ctx.type_error("a float", other)),
        }
    }

    fn encode(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Lines, CfgError> {
        let v = value.as_f64().ok_or_else(|| ctx.type_error("a float", value))?;
        Ok(vec![(ctx.key(), self.format.format(v))])
    }

    fn decode(&self, ctx: &FieldCtx<'_>, entries: &Entries) -> Result<Option<Value>, CfgError> {
        let Some(text) = raw(ctx, entries) else {
            return Ok(None);
        };
        parse_float(text)
            .map(|v| Some(Value::Float(v)))
            .map_err(|reason| CfgError::decode(&ctx.key(), text, reason))
    }

    fn box_clone(&self) -> Box<dyn FieldKind> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Boolean
// ---------------------------------------------------------------------------

/// Encodes as `Y` / `N`. `YES` and `NO` are accepted on decode, so those
/// spellings do not survive a round trip.
#[derive(Debug, Clone, Default)]
pub struct BoolField;

impl BoolField {
    pub fn new() -> Self {
        Self
    }
}

impl FieldKind for BoolField {
    fn kind(&self) -> &'static str {
        "boolean"
    }

    fn validate(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<(), CfgError> {
        match value {
            Value::Bool(_) => Ok(()),
            other => Err(ctx.type_error("a boolean", other)),
        }
    }

    fn encode(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Lines, CfgError> {
        let v = value.as_bool().ok_or_else(|| ctx.type_error("a boolean", value))?;
        Ok(vec![(ctx.key(), if v { "Y" } else { "N" }.to_string())])
    }

    fn decode(&self, ctx: &FieldCtx<'_>, entries: &Entries) -> Result<Option<Value>, CfgError> {
        let Some(text) = raw(ctx, entries) else {
            return Ok(None);
        };
        match text.trim().to_ascii_uppercase().as_str() {
            "Y" | "YES" => Ok(Some(Value::Bool(true))),
            "N" | "NO" => Ok(Some(Value::Bool(false))),
            _ => Err(CfgError::decode(&ctx.key(), text, "expected `Y` or `N`")),
        }
    }

    fn box_clone(&self) -> Box<dyn FieldKind> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, &str)]) -> Entries {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn string_round_trip_and_limit() {
        let kind = StrField::new().max_len(5);
        let ctx = FieldCtx::new("OBJECT", "NAME");
        let v = Value::from("Mars");
        kind.validate(&ctx, &v).unwrap();
        assert_eq!(
            kind.encode(&ctx, &v).unwrap(),
            vec![("OBJECT-NAME".to_string(), "Mars".to_string())]
        );
        assert_eq!(
            kind.decode(&ctx, &entries(&[("NAME", "Mars")])).unwrap(),
            Some(v)
        );
        assert!(kind.validate(&ctx, &Value::from("Jupiter")).is_err());
        assert!(kind.validate(&ctx, &Value::from("a\nb")).is_err());
    }

    #[test]
    fn integer_decode_errors_carry_raw_text() {
        let ctx = FieldCtx::new("GEOMETRY", "DISK-ANGLES");
        let err = IntField::new()
            .decode(&ctx, &entries(&[("DISK-ANGLES", "3.5")]))
            .unwrap_err();
        assert_eq!(
            err,
            CfgError::Decode {
                key: "GEOMETRY-DISK-ANGLES".into(),
                raw: "3.5".into(),
                reason: "not an integer".into(),
            }
        );
    }

    #[test]
    fn float_normalizes_integers() {
        let ctx = FieldCtx::new("", "W");
        let kind = FloatField::new().with_format(NumberFormat::Fixed(1));
        let v = kind.normalize(&ctx, Value::Int(3)).unwrap();
        assert_eq!(v, Value::Float(3.0));
        assert_eq!(kind.encode(&ctx, &v).unwrap()[0].1, "3.0");
        assert!(kind.validate(&ctx, &Value::Float(f64::NAN)).is_err());
    }

    #[test]
    fn boolean_tokens() {
        let ctx = FieldCtx::new("GENERATOR", "LOGRAD");
        let kind = BoolField::new();
        for (text, expected) in [("Y", true), ("YES", true), ("n", false), ("NO", false)] {
            let got = kind.decode(&ctx, &entries(&[("LOGRAD", text)])).unwrap();
            assert_eq!(got, Some(Value::Bool(expected)), "{text}");
        }
        assert!(kind.decode(&ctx, &entries(&[("LOGRAD", "1")])).is_err());
        assert_eq!(
            kind.encode(&ctx, &Value::Bool(false)).unwrap()[0].1,
            "N"
        );
    }
}
