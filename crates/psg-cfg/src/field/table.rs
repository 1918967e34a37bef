//! Delimited array fields.
//!
//! Lists and tables write an empty sequence as the absent token rather than
//! an empty value, and read that token back as an empty sequence.

use psg_units::Unit;

use super::{check_text, raw, Entries, FieldCtx, FieldKind, FloatField, Lines};
use crate::error::CfgError;
use crate::format::{parse_float, NumberFormat, ABSENT_TOKEN, LIST_DELIMITER};
use crate::value::{Table, Value};

fn split(text: &str) -> impl Iterator<Item = &str> {
    text.split(LIST_DELIMITER).map(str::trim)
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// Element type of a [`ListField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Text,
    Int,
    Float(NumberFormat),
}

#[derive(Debug, Clone)]
pub struct ListField {
    element: Element,
    absent: String,
}

impl ListField {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            absent: ABSENT_TOKEN.to_string(),
        }
    }

    pub fn with_absent_token(mut self, token: impl Into<String>) -> Self {
        self.absent = token.into();
        self
    }

    fn check_element(&self, key: &str, item: &Value) -> Result<(), CfgError> {
        match (self.element, item) {
            (Element::Text, Value::Str(s)) => {
                check_text(key, s, true)?;
                if s.is_empty() || *s == self.absent {
                    return Err(CfgError::invalid(
                        key,
                        s,
                        "element would be read back as a different list",
                    ));
                }
                Ok(())
            }
            (Element::Int, Value::Int(_)) => Ok(()),
            (Element::Float(_), Value::Float(f)) if f.is_finite() => Ok(()),
            _ => Err(CfgError::invalid(
                key,
                item,
                format!("unexpected {} element", item.type_name()),
            )),
        }
    }

    fn render(&self, item: &Value) -> String {
        match (self.element, item) {
            (Element::Float(fmt), Value::Float(f)) => fmt.format(*f),
            _ => item.to_string(),
        }
    }

    fn parse(&self, key: &str, text: &str) -> Result<Value, CfgError> {
        match self.element {
            Element::Text => Ok(Value::Str(text.to_string())),
            Element::Int => text
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| CfgError::decode(key, text, "not an integer")),
            Element::Float(_) => parse_float(text)
                .map(Value::Float)
                .map_err(|r| CfgError::decode(key, text, r)),
        }
    }
}

impl FieldKind for ListField {
    fn kind(&self) -> &'static str {
        "list"
    }

    fn normalize(&self, _ctx: &FieldCtx<'_>, value: Value) -> Result<Value, CfgError> {
        Ok(match value {
            Value::List(items) if matches!(self.element, Element::Float(_)) => Value::List(
                items
                    .into_iter()
                    .map(|v| match v {
                        Value::Int(i) => Value::Float(i as f64),
                        other => other,
                    })
                    .collect(),
            ),
            other => other,
        })
    }

    fn validate(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<(), CfgError> {
        let items = value.as_list().ok_or_else(|| ctx.type_error("a list", value))?;
        let key = ctx.key();
        items.iter().try_for_each(|item| self.check_element(&key, item))
    }

    fn encode(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Lines, CfgError> {
        let items = value.as_list().ok_or_else(|| ctx.type_error("a list", value))?;
        let text = if items.is_empty() {
            self.absent.clone()
        } else {
            items
                .iter()
                .map(|i| self.render(i))
                .collect::<Vec<_>>()
                .join(&LIST_DELIMITER.to_string())
        };
        Ok(vec![(ctx.key(), text)])
    }

    fn decode(&self, ctx: &FieldCtx<'_>, entries: &Entries) -> Result<Option<Value>, CfgError> {
        let Some(text) = raw(ctx, entries) else {
            return Ok(None);
        };
        let key = ctx.key();
        let trimmed = text.trim();
        if trimmed == self.absent {
            return Ok(Some(Value::List(Vec::new())));
        }
        if trimmed.is_empty() {
            return Err(CfgError::decode(
                &key,
                text,
                format!("empty value; an empty list is written as `{}`", self.absent),
            ));
        }
        split(trimmed)
            .map(|item| self.parse(&key, item))
            .collect::<Result<Vec<_>, _>>()
            .map(|items| Some(Value::List(items)))
    }

    fn box_clone(&self) -> Box<dyn FieldKind> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// `y@x` records. Both axes are converted to the field's units on encode.
#[derive(Debug, Clone)]
pub struct TableField {
    x_unit: Unit,
    y_unit: Unit,
    format: NumberFormat,
    absent: String,
}

impl TableField {
    pub fn new(x_unit: Unit, y_unit: Unit) -> Self {
        Self {
            x_unit,
            y_unit,
            format: NumberFormat::Scientific(4),
            absent: ABSENT_TOKEN.to_string(),
        }
    }

    pub fn with_format(mut self, format: NumberFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_absent_token(mut self, token: impl Into<String>) -> Self {
        self.absent = token.into();
        self
    }

    fn factors(&self, key: &str, table: &Table) -> Result<(f64, f64), CfgError> {
        let fx = table.x_unit.conversion_factor(&self.x_unit).map_err(|e| {
            CfgError::IncompatibleUnit {
                key: key.to_string(),
                value: format!("x axis in {}", table.x_unit),
                expected: self.x_unit.to_string(),
                reason: e.to_string(),
            }
        })?;
        let fy = table.y_unit.conversion_factor(&self.y_unit).map_err(|e| {
            CfgError::IncompatibleUnit {
                key: key.to_string(),
                value: format!("y axis in {}", table.y_unit),
                expected: self.y_unit.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok((fx, fy))
    }
}

impl FieldKind for TableField {
    fn kind(&self) -> &'static str {
        "table"
    }

    fn validate(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<(), CfgError> {
        let table = value.as_table().ok_or_else(|| ctx.type_error("a table", value))?;
        let key = ctx.key();
        if table.x.len() != table.y.len() {
            return Err(CfgError::invalid(
                &key,
                value,
                format!("{} x values but {} y values", table.x.len(), table.y.len()),
            ));
        }
        if table.x.iter().chain(&table.y).any(|v| !v.is_finite()) {
            return Err(CfgError::invalid(&key, value, "not a finite number"));
        }
        if table.is_empty() {
            return Ok(());
        }
        self.factors(&key, table).map(|_| ())
    }

    fn encode(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Lines, CfgError> {
        let table = value.as_table().ok_or_else(|| ctx.type_error("a table", value))?;
        if table.is_empty() {
            return Ok(vec![(ctx.key(), self.absent.clone())]);
        }
        let (fx, fy) = self.factors(&ctx.key(), table)?;
        let text = table
            .x
            .iter()
            .zip(&table.y)
            .map(|(x, y)| format!("{}@{}", self.format.format(y * fy), self.format.format(x * fx)))
            .collect::<Vec<_>>()
            .join(&LIST_DELIMITER.to_string());
        Ok(vec![(ctx.key(), text)])
    }

    fn decode(&self, ctx: &FieldCtx<'_>, entries: &Entries) -> Result<Option<Value>, CfgError> {
        let Some(text) = raw(ctx, entries) else {
            return Ok(None);
        };
        let key = ctx.key();
        let trimmed = text.trim();
        let mut table = Table::empty().with_units(self.x_unit.clone(), self.y_unit.clone());
        if trimmed == self.absent {
            return Ok(Some(Value::Table(table)));
        }
        for record in split(trimmed) {
            let (y, x) = record
                .split_once('@')
                .ok_or_else(|| CfgError::decode(&key, record, "expected `y@x`"))?;
            let y = parse_float(y).map_err(|r| CfgError::decode(&key, record, r))?;
            let x = parse_float(x).map_err(|r| CfgError::decode(&key, record, r))?;
            table.x.push(x);
            table.y.push(y);
        }
        Ok(Some(Value::Table(table)))
    }

    fn box_clone(&self) -> Box<dyn FieldKind> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Float or table
// ---------------------------------------------------------------------------

/// A float that may be given as a `y@x` table under the same key instead:
/// `SURFACE-ALBEDO=0.3000` or `SURFACE-ALBEDO=1.0000e-01@1.0000e+00,...`.
/// Decode tries a float first.
#[derive(Debug, Clone)]
pub struct FloatOrTableField {
    scalar: FloatField,
    table: TableField,
}

impl FloatOrTableField {
    pub fn new(scalar: FloatField, table: TableField) -> Self {
        Self { scalar, table }
    }
}

impl FieldKind for FloatOrTableField {
    fn kind(&self) -> &'static str {
        "float or table"
    }

    fn normalize(&self, ctx: &FieldCtx<'_>, value: Value) -> Result<Value, CfgError> {
        match value {
            Value::Table(_) => Ok(value),
            other => self.scalar.normalize(ctx, other),
        }
    }

    fn validate(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<(), CfgError> {
        match value {
            Value::Table(_) => self.table.validate(ctx, value),
            Value::Float(_) => self.scalar.validate(ctx, value),
            other => Err(ctx.type_error("a float or a table", other)),
        }
    }

    fn encode(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Lines, CfgError> {
        match value {
            Value::Table(_) => self.table.encode(ctx, value),
            _ => self.scalar.encode(ctx, value),
        }
    }

    fn decode(&self, ctx: &FieldCtx<'_>, entries: &Entries) -> Result<Option<Value>, CfgError> {
        let Some(text) = raw(ctx, entries) else {
            return Ok(None);
        };
        match parse_float(text) {
            Ok(v) => Ok(Some(Value::Float(v))),
            Err(_) => self.table.decode(ctx, entries),
        }
    }

    fn box_clone(&self) -> Box<dyn FieldKind> {
        Box::new(self.clone())
    }
}
