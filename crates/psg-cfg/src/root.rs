//! Root configuration: the ordered set of top-level models and the text
//! codec around it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::CfgError;
use crate::field::{Entries, Lines};
use crate::format::TextFormat;
use crate::key::strip;
use crate::model::{check_unique, Model, Slot};
use crate::value::{BlobRef, Value};

/// What decoding does with keys no field claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeyPolicy {
    /// Report them as [`CfgError::UnknownKeys`].
    #[default]
    Reject,
    /// Return them to the caller and log a warning.
    Collect,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseOptions {
    pub format: TextFormat,
    pub unknown_keys: UnknownKeyPolicy,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_unknown_keys(mut self, policy: UnknownKeyPolicy) -> Self {
        self.unknown_keys = policy;
        self
    }
}

/// Splits configuration text into entries.
///
/// Blank lines are skipped and a trailing `\r` is dropped. A key repeated
/// with the same value is accepted; with a different value it is a
/// [`CfgError::DuplicateKey`].
pub fn parse_entries(bytes: &[u8], format: &TextFormat) -> Result<Entries, CfgError> {
    let text = std::str::from_utf8(bytes).map_err(|e| CfgError::InvalidUtf8 {
        offset: e.valid_up_to(),
    })?;
    let mut entries = Entries::new();
    let terminator = if format.terminator.is_empty() {
        "\n"
    } else {
        format.terminator.as_str()
    };
    for (n, line) in text.split(terminator).enumerate() {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = format.split_line(line).ok_or_else(|| CfgError::MalformedLine {
            line: n + 1,
            text: line.to_string(),
        })?;
        match entries.get(key) {
            Some(first) if first != value => {
                return Err(CfgError::DuplicateKey {
                    key: key.to_string(),
                    first: first.clone(),
                    second: value.to_string(),
                });
            }
            Some(_) => {}
            None => {
                entries.insert(key.to_string(), value.to_string());
            }
        }
    }
    Ok(entries)
}

/// The top-level models of one simulation request, in wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct RootConfig {
    models: IndexMap<String, Model>,
}

impl RootConfig {
    /// Rejects duplicate model names and any fully-qualified key shared by
    /// two fields anywhere in the tree.
    pub fn new(models: Vec<Model>) -> Result<Self, CfgError> {
        let mut map = IndexMap::with_capacity(models.len());
        for mut model in models {
            model.reroot("");
            if map.contains_key(model.attr()) || map.values().any(|m: &Model| m.name() == model.name()) {
                return Err(CfgError::DuplicateSchemaKey {
                    key: model.name().to_string(),
                });
            }
            map.insert(model.attr().to_string(), model);
        }
        let patterns: Vec<_> = map.values().flat_map(Model::key_patterns).collect();
        check_unique(&patterns)?;
        Ok(Self { models: map })
    }

    /// Standard schema built from [`Catalog::psg`].
    pub fn psg() -> Result<Self, CfgError> {
        crate::psg::root(&Catalog::psg())
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    /// Top-level model by accessor name.
    pub fn model(&self, attr: &str) -> Option<&Model> {
        self.models.get(attr)
    }

    pub fn model_mut(&mut self, attr: &str) -> Option<&mut Model> {
        self.models.get_mut(attr)
    }

    fn unknown(&self, attr: &str) -> CfgError {
        CfgError::UnknownField {
            model: String::new(),
            attr: attr.to_string(),
        }
    }

    /// `target.name`, `target.star.distance`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let (head, rest) = path.split_once('.')?;
        self.model(head)?.get_path(rest)
    }

    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), CfgError> {
        let Some((head, rest)) = path.split_once('.') else {
            return Err(self.unknown(path));
        };
        match self.models.get_mut(head) {
            Some(m) => m.set_path(rest, value),
            None => Err(self.unknown(head)),
        }
    }

    pub fn unset(&mut self, path: &str) -> Result<(), CfgError> {
        let Some((head, rest)) = path.split_once('.') else {
            return Err(self.unknown(path));
        };
        match self.models.get_mut(head) {
            Some(m) => m.unset_path(rest),
            None => Err(self.unknown(head)),
        }
    }

    pub fn clear(&mut self) {
        self.models.values_mut().for_each(Model::clear);
    }

    pub fn is_empty(&self) -> bool {
        self.models.values().all(Model::is_empty)
    }

    /// Field-wise override by every field set in `other`.
    pub fn merge(&self, other: &RootConfig) -> Result<RootConfig, CfgError> {
        let mut merged = self.clone();
        merged.merge_from(other)?;
        Ok(merged)
    }

    pub fn merge_from(&mut self, other: &RootConfig) -> Result<(), CfgError> {
        let aligned = self.models.len() == other.models.len()
            && self
                .models
                .iter()
                .zip(&other.models)
                .all(|((ka, a), (kb, b))| ka == kb && a.same_schema(b));
        if !aligned {
            return Err(CfgError::SchemaMismatch {
                left: "root".to_string(),
                right: "root".to_string(),
            });
        }
        for (mine, theirs) in self.models.values_mut().zip(other.models.values()) {
            mine.merge_from(theirs)?;
        }
        Ok(())
    }

    /// Every blob reference set in the tree with its fully-qualified key.
    pub fn blob_refs(&self) -> Vec<(String, BlobRef)> {
        fn walk(model: &Model, out: &mut Vec<(String, BlobRef)>) {
            for slot in model.slots() {
                match slot {
                    Slot::Field(f) => {
                        if let Some(Value::Blob(b)) = f.value() {
                            out.push((crate::key::join(model.path(), f.name()), b.clone()));
                        }
                    }
                    Slot::Model(m) => walk(m, out),
                }
            }
        }
        let mut out = Vec::new();
        for model in self.models.values() {
            walk(model, &mut out);
        }
        out
    }

    // -----------------------------------------------------------------------
    // Text
    // -----------------------------------------------------------------------

    /// All lines of every model in declared order. Nothing is returned if
    /// any field fails.
    pub fn serialize(&self) -> Result<Lines, CfgError> {
        let mut lines = Vec::new();
        for model in self.models.values() {
            model.serialize_into(&mut lines)?;
        }
        Ok(lines)
    }

    pub fn to_text(&self) -> Result<Vec<u8>, CfgError> {
        self.to_text_with(&TextFormat::default())
    }

    /// Lines joined by the terminator, without a trailing terminator.
    pub fn to_text_with(&self, format: &TextFormat) -> Result<Vec<u8>, CfgError> {
        let lines = self.serialize()?;
        for (key, value) in &lines {
            if !format.terminator.is_empty() && value.contains(format.terminator.as_str()) {
                return Err(CfgError::invalid(
                    key,
                    value,
                    "text contains the line terminator",
                ));
            }
        }
        let text = lines
            .iter()
            .map(|(k, v)| format.render_line(k, v))
            .collect::<Vec<_>>()
            .join(&format.terminator);
        debug!(lines = lines.len(), bytes = text.len(), "rendered configuration");
        Ok(text.into_bytes())
    }

    /// Decodes text against the standard schema with default options.
    pub fn from_text(bytes: &[u8]) -> Result<Self, CfgError> {
        let mut cfg = Self::psg()?;
        cfg.read_text(bytes, &ParseOptions::default())?;
        Ok(cfg)
    }

    /// Replaces every value in the tree with what `bytes` holds.
    ///
    /// Each top-level model is decoded independently; if any fails, the
    /// others are still populated and one aggregate error is returned.
    /// Returns the unclaimed keys under [`UnknownKeyPolicy::Collect`].
    pub fn read_text(&mut self, bytes: &[u8], options: &ParseOptions) -> Result<Vec<String>, CfgError> {
        let entries = parse_entries(bytes, &options.format)?;
        self.read_entries(&entries, options.unknown_keys)
    }

    pub fn read_entries(
        &mut self,
        entries: &Entries,
        policy: UnknownKeyPolicy,
    ) -> Result<Vec<String>, CfgError> {
        let mut taken = vec![false; entries.len()];
        let mut errors = Vec::new();
        let mut unknown = Vec::new();
        for model in self.models.values_mut() {
            let mut scoped = Entries::new();
            for (i, (key, value)) in entries.iter().enumerate() {
                if taken[i] {
                    continue;
                }
                if let Some(rel) = strip(model.path(), key) {
                    scoped.insert(rel.to_string(), value.clone());
                    taken[i] = true;
                }
            }
            let before = errors.len();
            model.decode_scoped(&scoped, &mut errors, &mut unknown);
            debug!(
                model = %model.path(),
                keys = scoped.len(),
                errors = errors.len() - before,
                "decoded model"
            );
        }
        for (i, key) in entries.keys().enumerate() {
            if !taken[i] {
                unknown.push(key.clone());
            }
        }
        if !unknown.is_empty() {
            match policy {
                UnknownKeyPolicy::Reject => errors.push(CfgError::UnknownKeys {
                    keys: unknown.clone(),
                }),
                UnknownKeyPolicy::Collect => {
                    warn!(count = unknown.len(), keys = ?unknown, "ignoring unknown keys");
                }
            }
        }
        if errors.is_empty() {
            Ok(unknown)
        } else {
            Err(CfgError::Deserialize { errors })
        }
    }
}
