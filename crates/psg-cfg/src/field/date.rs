//! Date/time field, minute resolution: `2024/03/21 06:30`.

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use super::{raw, Entries, FieldCtx, FieldKind, Lines};
use crate::error::CfgError;
use crate::format::DATE_FORMAT;
use crate::value::Value;

/// Layouts accepted from callers in addition to [`DATE_FORMAT`].
const INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

#[derive(Debug, Clone, Default)]
pub struct DateField;

impl DateField {
    pub fn new() -> Self {
        Self
    }
}

/// `YYYY/MM/DD HH:MM`, digits and separators only.
fn has_service_shape(text: &str) -> bool {
    let b = text.as_bytes();
    b.len() == 16
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b'/',
            10 => *c == b' ',
            13 => *c == b':',
            _ => c.is_ascii_digit(),
        })
}

fn parse_input(text: &str) -> Option<NaiveDateTime> {
    if has_service_shape(text) {
        return NaiveDateTime::parse_from_str(text, DATE_FORMAT).ok();
    }
    INPUT_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl FieldKind for DateField {
    fn kind(&self) -> &'static str {
        "date"
    }

    fn normalize(&self, ctx: &FieldCtx<'_>, value: Value) -> Result<Value, CfgError> {
        match value {
            Value::Str(text) => parse_input(text.trim())
                .map(Value::Date)
                .ok_or_else(|| CfgError::invalid(&ctx.key(), &text, "unrecognized date layout")),
            other => Ok(other),
        }
    }

    fn validate(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<(), CfgError> {
        let Value::Date(date) = value else {
            return Err(ctx.type_error("a date", value));
        };
        if date.second() != 0 || date.nanosecond() != 0 {
            return Err(CfgError::invalid(
                &ctx.key(),
                date,
                "dates are written to the minute; seconds must be zero",
            ));
        }
        Ok(())
    }

    fn encode(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Lines, CfgError> {
        let date = value.as_date().ok_or_else(|| ctx.type_error("a date", value))?;
        Ok(vec![(ctx.key(), date.format(DATE_FORMAT).to_string())])
    }

    fn decode(&self, ctx: &FieldCtx<'_>, entries: &Entries) -> Result<Option<Value>, CfgError> {
        let Some(text) = raw(ctx, entries) else {
            return Ok(None);
        };
        let trimmed = text.trim();
        if !has_service_shape(trimmed) {
            return Err(CfgError::decode(&ctx.key(), text, "expected YYYY/MM/DD HH:MM"));
        }
        NaiveDateTime::parse_from_str(trimmed, DATE_FORMAT)
            .map(|d| Some(Value::Date(d)))
            .map_err(|e| CfgError::decode(&ctx.key(), text, e.to_string()))
    }

    fn box_clone(&self) -> Box<dyn FieldKind> {
        Box::new(self.clone())
    }
}
