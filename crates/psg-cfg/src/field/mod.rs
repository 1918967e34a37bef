//! Field descriptors and the [`FieldKind`] capability trait.
//!
//! A [`Field`] couples a descriptor (attribute name, key segment, null
//! policy, default) with its current value. How a value is validated and
//! mapped to and from text lines is delegated to the field's
//! [`FieldKind`]; every variant in this module tree implements it.

mod blob;
mod choice;
mod date;
mod quantity;
mod records;
mod scalar;
mod table;

pub use blob::BlobRefField;
pub use choice::{EnumField, UnitCodeField, UnknownTokenPolicy};
pub use date::DateField;
pub use quantity::{CodedQuantityField, MultiQuantityField, QuantityField};
pub use records::{ColumnKind, ProfileField, RecordColumn, RecordsField};
pub use scalar::{BoolField, FloatField, IntField, StrField};
pub use table::{Element, FloatOrTableField, ListField, TableField};

use std::fmt;

use indexmap::IndexMap;

use crate::error::CfgError;
use crate::key::{join, KeyPattern};
use crate::value::Value;

/// Raw `key → text` entries, keyed relative to the model being decoded.
pub type Entries = IndexMap<String, String>;

/// Encoded `(fully-qualified key, text)` lines.
pub type Lines = Vec<(String, String)>;

/// Where a field sits: the owning model's fully-qualified prefix and the
/// field's own key segment.
#[derive(Debug, Clone, Copy)]
pub struct FieldCtx<'a> {
    pub path: &'a str,
    pub name: &'a str,
}

impl<'a> FieldCtx<'a> {
    pub fn new(path: &'a str, name: &'a str) -> Self {
        Self { path, name }
    }

    /// Fully-qualified primary key.
    pub fn key(&self) -> String {
        join(self.path, self.name)
    }

    /// Fully-qualifies a key relative to the owning model.
    pub fn qualify(&self, rel: &str) -> String {
        join(self.path, rel)
    }

    pub(crate) fn type_error(&self, expected: &str, value: &Value) -> CfgError {
        CfgError::invalid(
            &self.key(),
            value,
            format!("expected {expected}, got {}", value.type_name()),
        )
    }
}

/// Behaviour of one field variant.
pub trait FieldKind: fmt::Debug + Send + Sync {
    /// Short variant name used in diagnostics.
    fn kind(&self) -> &'static str;

    /// Keys this field owns, relative to its model. Defaults to the field's
    /// own name.
    fn keys(&self, name: &str) -> Vec<KeyPattern> {
        vec![KeyPattern::Exact(name.to_string())]
    }

    /// Converts caller input into the variant's stored form (`"Planet"` into
    /// a token, an integer into a float).
    fn normalize(&self, _ctx: &FieldCtx<'_>, value: Value) -> Result<Value, CfgError> {
        Ok(value)
    }

    fn validate(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<(), CfgError>;

    /// Renders a validated value into one or more lines.
    fn encode(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Lines, CfgError>;

    /// Reads the field's keys from `entries`; `None` when none are present.
    fn decode(&self, ctx: &FieldCtx<'_>, entries: &Entries) -> Result<Option<Value>, CfgError>;

    fn box_clone(&self) -> Box<dyn FieldKind>;
}

impl Clone for Box<dyn FieldKind> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullPolicy {
    #[default]
    Optional,
    Required,
}

/// A field descriptor together with its current value.
#[derive(Debug, Clone)]
pub struct Field {
    attr: String,
    name: String,
    null: NullPolicy,
    default: Option<Value>,
    kind: Box<dyn FieldKind>,
    value: Option<Value>,
}

impl Field {
    /// `attr` is the accessor name (`star_distance`), `name` the key segment
    /// (`DISTANCE`).
    pub fn new(attr: impl Into<String>, name: impl Into<String>, kind: impl FieldKind + 'static) -> Self {
        Self {
            attr: attr.into(),
            name: name.into(),
            null: NullPolicy::Optional,
            default: None,
            kind: Box::new(kind),
            value: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.null = NullPolicy::Required;
        self
    }

    /// Value used when the field is absent from decoded text. It is also
    /// the initial value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.value = Some(value.clone());
        self.default = Some(value);
        self
    }

    pub fn attr(&self) -> &str {
        &self.attr
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn null_policy(&self) -> NullPolicy {
        self.null
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn kind(&self) -> &dyn FieldKind {
        self.kind.as_ref()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Relative key patterns.
    pub fn patterns(&self) -> Vec<KeyPattern> {
        self.kind.keys(&self.name)
    }

    pub(crate) fn set(&mut self, path: &str, value: Value) -> Result<(), CfgError> {
        let ctx = FieldCtx::new(path, &self.name);
        let value = self.kind.normalize(&ctx, value)?;
        self.kind.validate(&ctx, &value)?;
        self.value = Some(value);
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.value = None;
    }

    /// Stores an already validated value.
    pub(crate) fn replace(&mut self, value: Value) {
        self.value = Some(value);
    }

    /// Normalizes and validates the default against the field kind.
    pub(crate) fn check_default(&mut self, path: &str) -> Result<(), CfgError> {
        if let Some(default) = self.default.take() {
            let ctx = FieldCtx::new(path, &self.name);
            let default = self.kind.normalize(&ctx, default)?;
            self.kind.validate(&ctx, &default)?;
            self.value = Some(default.clone());
            self.default = Some(default);
        }
        Ok(())
    }

    pub(crate) fn encode(&self, path: &str) -> Result<Lines, CfgError> {
        let ctx = FieldCtx::new(path, &self.name);
        match &self.value {
            None if self.null == NullPolicy::Required => {
                Err(CfgError::MissingRequiredField { key: ctx.key() })
            }
            None => Ok(Vec::new()),
            Some(value) => {
                self.kind.validate(&ctx, value)?;
                let lines = self.kind.encode(&ctx, value)?;
                for (key, text) in &lines {
                    if text.contains(['=', '\n', '\r']) {
                        return Err(CfgError::invalid(
                            key,
                            text,
                            "text may not contain `=` or a line break",
                        ));
                    }
                }
                Ok(lines)
            }
        }
    }

    pub(crate) fn decode(&mut self, path: &str, entries: &Entries) -> Result<(), CfgError> {
        let ctx = FieldCtx::new(path, &self.name);
        match self.kind.decode(&ctx, entries) {
            Ok(Some(value)) => {
                self.value = Some(value);
                Ok(())
            }
            Ok(None) => {
                self.value = self.default.clone();
                if self.value.is_none() && self.null == NullPolicy::Required {
                    return Err(CfgError::MissingRequiredField { key: ctx.key() });
                }
                Ok(())
            }
            Err(e) => {
                self.value = self.default.clone();
                Err(e)
            }
        }
    }

    /// Whether two fields describe the same slot of a schema.
    pub(crate) fn same_shape(&self, other: &Field) -> bool {
        self.attr == other.attr && self.name == other.name && self.kind.kind() == other.kind.kind()
    }
}

impl PartialEq for Field {
    /// Fields compare by what they would put on the wire; values that cannot
    /// be encoded fall back to direct comparison.
    fn eq(&self, other: &Self) -> bool {
        if !self.same_shape(other) {
            return false;
        }
        match (self.encode(""), other.encode("")) {
            (Ok(a), Ok(b)) => a == b,
            _ => self.value == other.value,
        }
    }
}

/// Looks up the raw text for a single-key field.
pub(crate) fn raw<'e>(ctx: &FieldCtx<'_>, entries: &'e Entries) -> Option<&'e str> {
    entries.get(ctx.name).map(String::as_str)
}

/// Rejects text that cannot survive as a list element or a single value.
pub(crate) fn check_text(key: &str, text: &str, delimited: bool) -> Result<(), CfgError> {
    if text.contains(['=', '\n', '\r']) {
        return Err(CfgError::invalid(
            key,
            text,
            "text may not contain `=` or a line break",
        ));
    }
    if delimited && text.contains(crate::format::LIST_DELIMITER) {
        return Err(CfgError::invalid(key, text, "element may not contain `,`"));
    }
    if delimited && text.trim() != text {
        return Err(CfgError::invalid(
            key,
            text,
            "element may not start or end with whitespace",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_unset_field_fails_encode() {
        let f = Field::new("name", "NAME", StrField::new()).required();
        assert_eq!(
            f.encode("OBJECT"),
            Err(CfgError::MissingRequiredField {
                key: "OBJECT-NAME".into()
            })
        );
    }

    #[test]
    fn optional_unset_field_contributes_nothing() {
        let f = Field::new("name", "NAME", StrField::new());
        assert_eq!(f.encode("OBJECT").unwrap(), vec![]);
    }

    #[test]
    fn absent_key_yields_default() {
        let mut f = Field::new("weight", "WEIGHT", FloatField::new()).with_default(28.97);
        f.set("ATMOSPHERE", Value::Float(44.0)).unwrap();
        f.decode("ATMOSPHERE", &Entries::new()).unwrap();
        assert_eq!(f.value(), Some(&Value::Float(28.97)));
    }

    #[test]
    fn absent_required_key_is_reported() {
        let mut f = Field::new("name", "NAME", StrField::new()).required();
        let err = f.decode("OBJECT", &Entries::new()).unwrap_err();
        assert_eq!(
            err,
            CfgError::MissingRequiredField {
                key: "OBJECT-NAME".into()
            }
        );
    }

    #[test]
    fn delimited_text_must_be_trimmed() {
        assert!(check_text("K", " a", true).is_err());
        assert!(check_text("K", "a\t", true).is_err());
        assert!(check_text("K", "a b", true).is_ok());
        assert!(check_text("K", " a", false).is_ok());
    }

    #[test]
    fn equality_uses_encoded_text() {
        let mut a = Field::new("w", "W", FloatField::new());
        let mut b = a.clone();
        a.set("", Value::Float(1.0)).unwrap();
        b.set("", Value::Float(1.001)).unwrap();
        assert_eq!(a, b);
        b.set("", Value::Float(1.01)).unwrap();
        assert_ne!(a, b);
    }
}
