//! Models: named, ordered bags of fields and nested models.
//!
//! Every model contributes its name as a key prefix. A model knows its
//! fully-qualified path (`OBJECT-STAR`), which is fixed when the schema is
//! assembled, so errors raised by a nested model name full keys.

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::CfgError;
use crate::field::{Entries, Field, Lines};
use crate::key::{join, strip, KeyPattern};
use crate::value::Value;

#[derive(Debug, Clone)]
pub enum Slot {
    Field(Field),
    Model(Model),
}

impl Slot {
    fn attr(&self) -> &str {
        match self {
            Self::Field(f) => f.attr(),
            Self::Model(m) => m.attr(),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct ModelBuilder {
    attr: String,
    name: String,
    slots: Vec<Slot>,
}

impl ModelBuilder {
    pub fn field(mut self, field: Field) -> Self {
        self.slots.push(Slot::Field(field));
        self
    }

    pub fn model(mut self, model: Model) -> Self {
        self.slots.push(Slot::Model(model));
        self
    }

    /// Assembles the model, rejecting duplicate attributes, duplicate
    /// fully-qualified keys and defaults the field kind does not accept.
    pub fn build(self) -> Result<Model, CfgError> {
        let mut slots = IndexMap::with_capacity(self.slots.len());
        for slot in self.slots {
            let attr = slot.attr().to_string();
            if slots.contains_key(&attr) {
                return Err(CfgError::DuplicateSchemaKey {
                    key: join(&self.name, &attr),
                });
            }
            slots.insert(attr, slot);
        }
        let mut model = Model {
            attr: self.attr,
            name: self.name.clone(),
            path: self.name,
            slots,
        };
        model.reroot("");
        model.check_defaults()?;
        check_unique(&model.key_patterns())?;
        Ok(model)
    }
}

/// Rejects any two patterns that could match the same key.
pub(crate) fn check_unique(patterns: &[KeyPattern]) -> Result<(), CfgError> {
    for (i, a) in patterns.iter().enumerate() {
        if let Some(b) = patterns[i + 1..].iter().find(|b| a.overlaps(b)) {
            let key = match (a, b) {
                (KeyPattern::Exact(k), _) | (_, KeyPattern::Exact(k)) => k.clone(),
                _ => a.label(),
            };
            return Err(CfgError::DuplicateSchemaKey { key });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Model {
    attr: String,
    name: String,
    path: String,
    slots: IndexMap<String, Slot>,
}

impl Model {
    /// `attr` is the accessor name (`star`), `name` the key segment (`STAR`).
    pub fn builder(attr: impl Into<String>, name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            attr: attr.into(),
            name: name.into(),
            slots: Vec::new(),
        }
    }

    pub fn attr(&self) -> &str {
        &self.attr
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully-qualified key prefix.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn reroot(&mut self, parent: &str) {
        self.path = join(parent, &self.name);
        for slot in self.slots.values_mut() {
            if let Slot::Model(child) = slot {
                child.reroot(&self.path);
            }
        }
    }

    fn check_defaults(&mut self) -> Result<(), CfgError> {
        let path = &self.path;
        for slot in self.slots.values_mut() {
            match slot {
                Slot::Field(f) => f.check_default(path)?,
                Slot::Model(m) => m.check_defaults()?,
            }
        }
        Ok(())
    }

    /// Fully-qualified key patterns of every field in this subtree.
    pub fn key_patterns(&self) -> Vec<KeyPattern> {
        let mut out = Vec::new();
        for slot in self.slots.values() {
            match slot {
                Slot::Field(f) => out.extend(f.patterns().iter().map(|p| p.qualify(&self.path))),
                Slot::Model(m) => out.extend(m.key_patterns()),
            }
        }
        out
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.values()
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.slots.values().filter_map(|s| match s {
            Slot::Field(f) => Some(f),
            Slot::Model(_) => None,
        })
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.slots.values().filter_map(|s| match s {
            Slot::Model(m) => Some(m),
            Slot::Field(_) => None,
        })
    }

    pub fn field(&self, attr: &str) -> Option<&Field> {
        match self.slots.get(attr) {
            Some(Slot::Field(f)) => Some(f),
            _ => None,
        }
    }

    pub fn child(&self, attr: &str) -> Option<&Model> {
        match self.slots.get(attr) {
            Some(Slot::Model(m)) => Some(m),
            _ => None,
        }
    }

    pub fn child_mut(&mut self, attr: &str) -> Option<&mut Model> {
        match self.slots.get_mut(attr) {
            Some(Slot::Model(m)) => Some(m),
            _ => None,
        }
    }

    fn unknown(&self, attr: &str) -> CfgError {
        CfgError::UnknownField {
            model: self.path.clone(),
            attr: attr.to_string(),
        }
    }

    /// Current value of a field, `None` when unset or not a field.
    pub fn get(&self, attr: &str) -> Option<&Value> {
        self.field(attr)?.value()
    }

    /// Validates and stores a value.
    pub fn set(&mut self, attr: &str, value: impl Into<Value>) -> Result<(), CfgError> {
        let path = &self.path;
        match self.slots.get_mut(attr) {
            Some(Slot::Field(f)) => f.set(path, value.into()),
            _ => Err(CfgError::UnknownField {
                model: path.clone(),
                attr: attr.to_string(),
            }),
        }
    }

    pub fn unset(&mut self, attr: &str) -> Result<(), CfgError> {
        match self.slots.get_mut(attr) {
            Some(Slot::Field(f)) => {
                f.clear();
                Ok(())
            }
            _ => Err(self.unknown(attr)),
        }
    }

    /// Resolves a dotted attribute path such as `star.distance`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        match path.split_once('.') {
            Some((head, rest)) => self.child(head)?.get_path(rest),
            None => self.get(path),
        }
    }

    pub fn set_path(&mut self, path: &str, value: impl Into<Value>) -> Result<(), CfgError> {
        match path.split_once('.') {
            Some((head, rest)) => match self.child_mut(head) {
                Some(child) => child.set_path(rest, value),
                None => Err(self.unknown(head)),
            },
            None => self.set(path, value),
        }
    }

    pub fn unset_path(&mut self, path: &str) -> Result<(), CfgError> {
        match path.split_once('.') {
            Some((head, rest)) => match self.child_mut(head) {
                Some(child) => child.unset_path(rest),
                None => Err(self.unknown(head)),
            },
            None => self.unset(path),
        }
    }

    /// Unsets every field in the subtree.
    pub fn clear(&mut self) {
        for slot in self.slots.values_mut() {
            match slot {
                Slot::Field(f) => f.clear(),
                Slot::Model(m) => m.clear(),
            }
        }
    }

    /// Whether no field in the subtree holds a value.
    pub fn is_empty(&self) -> bool {
        self.slots.values().all(|s| match s {
            Slot::Field(f) => !f.is_set(),
            Slot::Model(m) => m.is_empty(),
        })
    }

    // -----------------------------------------------------------------------
    // Serialize
    // -----------------------------------------------------------------------

    /// Nested models first, in declaration order, then own fields in
    /// declaration order. Fails as a whole on the first invalid field.
    pub fn serialize(&self) -> Result<Lines, CfgError> {
        let mut lines = Vec::new();
        self.serialize_into(&mut lines)?;
        debug!(model = %self.path, lines = lines.len(), "serialized model");
        Ok(lines)
    }

    pub(crate) fn serialize_into(&self, out: &mut Lines) -> Result<(), CfgError> {
        for child in self.models() {
            child.serialize_into(out)?;
        }
        for field in self.fields() {
            let lines = field.encode(&self.path)?;
            trace!(model = %self.path, field = field.attr(), lines = lines.len(), "encoded field");
            out.extend(lines);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Deserialize
    // -----------------------------------------------------------------------

    /// Populates the subtree from fully-qualified entries. Keys outside this
    /// model's prefix are ignored; keys inside it that no field claims are
    /// returned. Every field is attempted; failures are aggregated.
    pub fn deserialize(&mut self, entries: &Entries) -> Result<Vec<String>, CfgError> {
        let scoped: Entries = entries
            .iter()
            .filter_map(|(k, v)| strip(&self.path, k).map(|rel| (rel.to_string(), v.clone())))
            .collect();
        let mut errors = Vec::new();
        let mut unknown = Vec::new();
        self.decode_scoped(&scoped, &mut errors, &mut unknown);
        debug!(
            model = %self.path,
            keys = scoped.len(),
            errors = errors.len(),
            unknown = unknown.len(),
            "deserialized model"
        );
        if errors.is_empty() {
            Ok(unknown)
        } else {
            Err(CfgError::Deserialize { errors })
        }
    }

    /// `entries` are keyed relative to this model.
    pub(crate) fn decode_scoped(
        &mut self,
        entries: &Entries,
        errors: &mut Vec<CfgError>,
        unknown: &mut Vec<String>,
    ) {
        let mut taken = vec![false; entries.len()];
        let path = &self.path;

        for slot in self.slots.values_mut() {
            let Slot::Field(field) = slot else { continue };
            let patterns = field.patterns();
            for (i, key) in entries.keys().enumerate() {
                if patterns.iter().any(|p| p.matches(key)) {
                    taken[i] = true;
                }
            }
            match field.decode(path, entries) {
                Ok(()) => trace!(model = %path, field = field.attr(), "decoded field"),
                Err(e) => errors.push(e),
            }
        }

        for slot in self.slots.values_mut() {
            let Slot::Model(child) = slot else { continue };
            let mut routed = Entries::new();
            for (i, (key, value)) in entries.iter().enumerate() {
                if taken[i] {
                    continue;
                }
                if let Some(rel) = strip(&child.name, key) {
                    routed.insert(rel.to_string(), value.clone());
                    taken[i] = true;
                }
            }
            child.decode_scoped(&routed, errors, unknown);
        }

        for (i, key) in entries.keys().enumerate() {
            if !taken[i] {
                unknown.push(join(path, key));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Merge
    // -----------------------------------------------------------------------

    /// A copy of `self` overridden by every field set in `other`.
    pub fn merge(&self, other: &Model) -> Result<Model, CfgError> {
        let mut merged = self.clone();
        merged.merge_from(other)?;
        Ok(merged)
    }

    /// Overrides fields in place with every field set in `other`. Both models
    /// must share a schema; nothing is changed when they do not.
    pub fn merge_from(&mut self, other: &Model) -> Result<(), CfgError> {
        if !self.same_schema(other) {
            return Err(CfgError::SchemaMismatch {
                left: self.path.clone(),
                right: other.path.clone(),
            });
        }
        self.apply(other);
        Ok(())
    }

    pub fn same_schema(&self, other: &Model) -> bool {
        self.name == other.name
            && self.slots.len() == other.slots.len()
            && self
                .slots
                .iter()
                .zip(&other.slots)
                .all(|((ka, a), (kb, b))| {
                    ka == kb
                        && match (a, b) {
                            (Slot::Field(x), Slot::Field(y)) => x.same_shape(y),
                            (Slot::Model(x), Slot::Model(y)) => x.same_schema(y),
                            _ => false,
                        }
                })
    }

    fn apply(&mut self, other: &Model) {
        for (slot, theirs) in self.slots.values_mut().zip(other.slots.values()) {
            match (slot, theirs) {
                (Slot::Field(mine), Slot::Field(theirs)) => {
                    if let Some(v) = theirs.value() {
                        mine.replace(v.clone());
                    }
                }
                (Slot::Model(mine), Slot::Model(theirs)) => mine.apply(theirs),
                _ => {}
            }
        }
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.slots.len() == other.slots.len()
            && self
                .slots
                .iter()
                .zip(&other.slots)
                .all(|((ka, a), (kb, b))| {
                    ka == kb
                        && match (a, b) {
                            (Slot::Field(x), Slot::Field(y)) => x == y,
                            (Slot::Model(x), Slot::Model(y)) => x == y,
                            _ => false,
                        }
                })
    }
}
