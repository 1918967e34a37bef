//! Multi-key record fields: parallel-column tables with a count key, and the
//! layered atmospheric profile.

use super::quantity::resolve_unit;
use super::{check_text, Entries, FieldCtx, FieldKind, Lines};
use crate::catalog::UnitCode;
use crate::error::CfgError;
use crate::format::{parse_float, NumberFormat, ABSENT_TOKEN, LIST_DELIMITER};
use crate::key::{index_of, KeyPattern};
use crate::value::{Profile, Species, Value};
use psg_units::Quantity;

fn join_cells<I: IntoIterator<Item = String>>(cells: I) -> String {
    cells
        .into_iter()
        .collect::<Vec<_>>()
        .join(&LIST_DELIMITER.to_string())
}

fn split_cells(text: &str) -> Vec<&str> {
    text.split(LIST_DELIMITER).map(str::trim).collect()
}

/// Cells of one column, which must hold exactly `n` of them.
fn column<'e>(
    ctx: &FieldCtx<'_>,
    entries: &'e Entries,
    rel: &str,
    n: usize,
) -> Result<Vec<&'e str>, CfgError> {
    let key = ctx.qualify(rel);
    let text = entries
        .get(rel)
        .ok_or_else(|| CfgError::decode(&key, "", format!("missing; {n} rows declared")))?;
    let cells = split_cells(text);
    if cells.len() != n {
        return Err(CfgError::decode(
            &key,
            text,
            format!("{} cells but {n} rows declared", cells.len()),
        ));
    }
    Ok(cells)
}

fn parse_count(key: &str, text: &str) -> Result<usize, CfgError> {
    text.trim()
        .parse::<usize>()
        .map_err(|_| CfgError::decode(key, text, "not a count"))
}

// ---------------------------------------------------------------------------
// Parallel-column records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum ColumnKind {
    Text,
    Number(NumberFormat),
    /// Quantity column with a per-row unit code on a companion key.
    Coded { unit_key: String, codes: Vec<UnitCode> },
}

#[derive(Debug, Clone)]
pub struct RecordColumn {
    pub key: String,
    pub kind: ColumnKind,
}

impl RecordColumn {
    pub fn text(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: ColumnKind::Text,
        }
    }

    pub fn number(key: impl Into<String>, format: NumberFormat) -> Self {
        Self {
            key: key.into(),
            kind: ColumnKind::Number(format),
        }
    }

    pub fn coded(key: impl Into<String>, unit_key: impl Into<String>, codes: Vec<UnitCode>) -> Self {
        Self {
            key: key.into(),
            kind: ColumnKind::Coded {
                unit_key: unit_key.into(),
                codes,
            },
        }
    }
}

/// Rows of typed cells spread over one key per column.
///
/// `ATMOSPHERE-NGAS=2`, `ATMOSPHERE-GAS=H2O,CO2`, `ATMOSPHERE-ABUN=1,400`,
/// `ATMOSPHERE-UNIT=scl,ppmv`. The field name is the count key.
#[derive(Debug, Clone)]
pub struct RecordsField {
    columns: Vec<RecordColumn>,
}

impl RecordsField {
    pub fn new(columns: Vec<RecordColumn>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[RecordColumn] {
        &self.columns
    }

    fn column_keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        for c in &self.columns {
            keys.push(c.key.as_str());
            if let ColumnKind::Coded { unit_key, .. } = &c.kind {
                keys.push(unit_key.as_str());
            }
        }
        keys
    }

    fn check_cell(&self, key: &str, column: &RecordColumn, cell: &Value) -> Result<(), CfgError> {
        match (&column.kind, cell) {
            (ColumnKind::Text, Value::Str(s) | Value::Token(s)) => {
                if s.is_empty() {
                    return Err(CfgError::invalid(key, s, "empty cell"));
                }
                check_text(key, s, true)
            }
            (ColumnKind::Number(_), Value::Float(f)) if f.is_finite() => Ok(()),
            (ColumnKind::Number(_), Value::Int(_)) => Ok(()),
            (ColumnKind::Coded { codes, .. }, Value::Quantity(q)) => {
                let code = resolve_unit(codes, key, q)?;
                let v = q.to_value(&code.unit).map_err(|e| CfgError::IncompatibleUnit {
                    key: key.to_string(),
                    value: q.to_string(),
                    expected: code.unit.to_string(),
                    reason: e.to_string(),
                })?;
                if v.is_finite() {
                    Ok(())
                } else {
                    Err(CfgError::invalid(key, q, "not a finite number"))
                }
            }
            _ => Err(CfgError::invalid(
                key,
                cell,
                format!("unexpected {} cell", cell.type_name()),
            )),
        }
    }
}

impl FieldKind for RecordsField {
    fn kind(&self) -> &'static str {
        "records"
    }

    fn keys(&self, name: &str) -> Vec<KeyPattern> {
        std::iter::once(name)
            .chain(self.column_keys())
            .map(|k| KeyPattern::Exact(k.to_string()))
            .collect()
    }

    fn validate(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<(), CfgError> {
        let rows = value
            .as_records()
            .ok_or_else(|| ctx.type_error("records", value))?;
        for (i, row) in rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(CfgError::invalid(
                    &ctx.key(),
                    value,
                    format!(
                        "row {} has {} cells, expected {}",
                        i + 1,
                        row.len(),
                        self.columns.len()
                    ),
                ));
            }
            for (column, cell) in self.columns.iter().zip(row) {
                self.check_cell(&ctx.qualify(&column.key), column, cell)?;
            }
        }
        Ok(())
    }

    fn encode(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Lines, CfgError> {
        let rows = value
            .as_records()
            .ok_or_else(|| ctx.type_error("records", value))?;
        let mut lines = vec![(ctx.key(), rows.len().to_string())];
        if rows.is_empty() {
            return Ok(lines);
        }
        for (col, column) in self.columns.iter().enumerate() {
            let key = ctx.qualify(&column.key);
            let cells = rows.iter().filter_map(|r| r.get(col));
            match &column.kind {
                ColumnKind::Text => {
                    lines.push((key, join_cells(cells.map(ToString::to_string))));
                }
                ColumnKind::Number(fmt) => {
                    let rendered = cells.map(|c| fmt.format(c.as_f64().unwrap_or(f64::NAN)));
                    lines.push((key, join_cells(rendered)));
                }
                ColumnKind::Coded { unit_key, codes } => {
                    let mut values = Vec::with_capacity(rows.len());
                    let mut units = Vec::with_capacity(rows.len());
                    for cell in cells {
                        let q = cell
                            .as_quantity()
                            .ok_or_else(|| ctx.type_error("a quantity", cell))?;
                        let code = resolve_unit(codes, &key, q)?;
                        let v = q.to_value(&code.unit).map_err(|e| CfgError::IncompatibleUnit {
                            key: key.clone(),
                            value: q.to_string(),
                            expected: code.unit.to_string(),
                            reason: e.to_string(),
                        })?;
                        values.push(code.format.format(v));
                        units.push(code.code.clone());
                    }
                    lines.push((key, join_cells(values)));
                    lines.push((ctx.qualify(unit_key), join_cells(units)));
                }
            }
        }
        Ok(lines)
    }

    fn decode(&self, ctx: &FieldCtx<'_>, entries: &Entries) -> Result<Option<Value>, CfgError> {
        let Some(count_raw) = entries.get(ctx.name) else {
            if let Some(k) = self.column_keys().into_iter().find(|k| entries.contains_key(*k)) {
                return Err(CfgError::decode(
                    &ctx.qualify(k),
                    &entries[k],
                    format!("present without its count key {}", ctx.key()),
                ));
            }
            return Ok(None);
        };
        let n = parse_count(&ctx.key(), count_raw)?;
        if n == 0 {
            return Ok(Some(Value::Records(Vec::new())));
        }
        if self.columns.is_empty() {
            return Err(CfgError::decode(&ctx.key(), count_raw, "no columns to hold the rows"));
        }
        // Every column is checked against `n` before any row is built.
        let mut columns: Vec<Vec<Value>> = Vec::with_capacity(self.columns.len());
        for c in &self.columns {
            let key = ctx.qualify(&c.key);
            let cells = column(ctx, entries, &c.key, n)?;
            let values: Vec<Value> = match &c.kind {
                ColumnKind::Text => cells
                    .into_iter()
                    .map(|cell| Value::Str(cell.to_string()))
                    .collect(),
                ColumnKind::Number(_) => cells
                    .into_iter()
                    .map(|cell| {
                        parse_float(cell)
                            .map(Value::Float)
                            .map_err(|r| CfgError::decode(&key, cell, r))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                ColumnKind::Coded { unit_key, codes } => {
                    let units = column(ctx, entries, unit_key, n)?;
                    cells
                        .into_iter()
                        .zip(units)
                        .map(|(cell, code)| -> Result<Value, CfgError> {
                            let unit = codes.iter().find(|c| c.code == code).ok_or_else(|| {
                                CfgError::UnrecognizedToken {
                                    key: ctx.qualify(unit_key),
                                    token: code.to_string(),
                                    expected: codes.iter().map(|c| c.code.clone()).collect(),
                                }
                            })?;
                            let v = parse_float(cell).map_err(|r| CfgError::decode(&key, cell, r))?;
                            Ok(Value::Quantity(Quantity::new(v, unit.unit.clone())))
                        })
                        .collect::<Result<Vec<_>, _>>()?
                }
            };
            columns.push(values);
        }
        let mut cells: Vec<_> = columns.into_iter().map(Vec::into_iter).collect();
        let rows = (0..n)
            .map(|_| cells.iter_mut().filter_map(Iterator::next).collect())
            .collect();
        Ok(Some(Value::Records(rows)))
    }

    fn box_clone(&self) -> Box<dyn FieldKind> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Layered profile
// ---------------------------------------------------------------------------

/// Vertical profile written as a species list, a layer count and one key per
/// layer: `LAYER-<n>=pressure,temperature,species...`, indexed from 1.
///
/// The field name is the layer count key.
#[derive(Debug, Clone)]
pub struct ProfileField {
    molecules_key: String,
    layer_prefix: String,
    format: NumberFormat,
}

impl Default for ProfileField {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileField {
    pub fn new() -> Self {
        Self {
            molecules_key: "LAYERS-MOLECULES".to_string(),
            layer_prefix: "LAYER-".to_string(),
            format: NumberFormat::Scientific(6),
        }
    }

    pub fn with_format(mut self, format: NumberFormat) -> Self {
        self.format = format;
        self
    }

    fn layer_key(&self, index: usize) -> String {
        format!("{}{}", self.layer_prefix, index)
    }
}

impl FieldKind for ProfileField {
    fn kind(&self) -> &'static str {
        "profile"
    }

    fn keys(&self, name: &str) -> Vec<KeyPattern> {
        vec![
            KeyPattern::Exact(self.molecules_key.clone()),
            KeyPattern::Exact(name.to_string()),
            KeyPattern::Indexed(self.layer_prefix.clone()),
        ]
    }

    fn validate(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<(), CfgError> {
        let p = value
            .as_profile()
            .ok_or_else(|| ctx.type_error("a profile", value))?;
        let key = ctx.key();
        let n = p.pressure.len();
        if p.temperature.len() != n {
            return Err(CfgError::invalid(
                &key,
                value,
                format!("{n} pressures but {} temperatures", p.temperature.len()),
            ));
        }
        for (i, s) in p.species.iter().enumerate() {
            if s.name.is_empty() || s.name == ABSENT_TOKEN {
                return Err(CfgError::invalid(&key, &s.name, "invalid species name"));
            }
            check_text(&key, &s.name, true)?;
            if p.species[..i].iter().any(|o| o.name == s.name) {
                return Err(CfgError::invalid(&key, &s.name, "species listed twice"));
            }
            if s.values.len() != n {
                return Err(CfgError::invalid(
                    &key,
                    &s.name,
                    format!("{} values for {n} layers", s.values.len()),
                ));
            }
        }
        let all = p
            .pressure
            .iter()
            .chain(&p.temperature)
            .chain(p.species.iter().flat_map(|s| &s.values));
        for v in all {
            if !v.is_finite() {
                return Err(CfgError::invalid(&key, v, "not a finite number"));
            }
        }
        Ok(())
    }

    fn encode(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Lines, CfgError> {
        let p = value
            .as_profile()
            .ok_or_else(|| ctx.type_error("a profile", value))?;
        if p.is_empty() {
            return Ok(Vec::new());
        }
        let molecules = if p.species.is_empty() {
            ABSENT_TOKEN.to_string()
        } else {
            join_cells(p.species.iter().map(|s| s.name.clone()))
        };
        let mut lines = Vec::with_capacity(p.len() + 2);
        lines.push((ctx.qualify(&self.molecules_key), molecules));
        lines.push((ctx.key(), p.len().to_string()));
        for i in 0..p.len() {
            let cells = [p.pressure[i], p.temperature[i]]
                .into_iter()
                .chain(p.species.iter().map(|s| s.values[i]))
                .map(|v| self.format.format(v));
            lines.push((ctx.qualify(&self.layer_key(i + 1)), join_cells(cells)));
        }
        Ok(lines)
    }

    fn decode(&self, ctx: &FieldCtx<'_>, entries: &Entries) -> Result<Option<Value>, CfgError> {
        let stray = |limit: usize| {
            entries.iter().find(|(k, _)| match index_of(&self.layer_prefix, k) {
                Some(i) => i == 0 || i > limit,
                None => false,
            })
        };
        let Some(count_raw) = entries.get(ctx.name) else {
            if let Some((k, v)) = stray(0).or_else(|| entries.get_key_value(&self.molecules_key)) {
                return Err(CfgError::decode(
                    &ctx.qualify(k),
                    v,
                    format!("present without its count key {}", ctx.key()),
                ));
            }
            return Ok(None);
        };
        let n = parse_count(&ctx.key(), count_raw)?;
        if let Some((k, v)) = stray(n) {
            return Err(CfgError::decode(
                &ctx.qualify(k),
                v,
                format!("layer index outside 1..={n}"),
            ));
        }
        // With no stray layers, a count above the number of layer keys means
        // one is missing, and the first gap lies at or below `present + 1`.
        let present = entries
            .keys()
            .filter(|k| index_of(&self.layer_prefix, k).is_some())
            .count();
        if present < n {
            let missing = (1..=n)
                .find(|i| !entries.contains_key(&self.layer_key(*i)))
                .unwrap_or(n);
            return Err(CfgError::decode(
                &ctx.qualify(&self.layer_key(missing)),
                "",
                format!("missing; {n} layers declared"),
            ));
        }
        let names: Vec<String> = match entries.get(&self.molecules_key).map(|t| t.trim()) {
            None | Some(ABSENT_TOKEN) | Some("") => Vec::new(),
            Some(text) => split_cells(text).into_iter().map(str::to_string).collect(),
        };
        let mut profile = Profile {
            pressure: Vec::with_capacity(n),
            temperature: Vec::with_capacity(n),
            species: names
                .into_iter()
                .map(|name| Species {
                    name,
                    values: Vec::with_capacity(n),
                })
                .collect(),
        };
        let width = 2 + profile.species.len();
        for i in 1..=n {
            let rel = self.layer_key(i);
            let key = ctx.qualify(&rel);
            let text = entries
                .get(&rel)
                .ok_or_else(|| CfgError::decode(&key, "", format!("missing; {n} layers declared")))?;
            let cells = split_cells(text);
            if cells.len() != width {
                return Err(CfgError::decode(
                    &key,
                    text,
                    format!("{} cells, expected {width}", cells.len()),
                ));
            }
            let mut values = Vec::with_capacity(width);
            for cell in cells {
                values.push(parse_float(cell).map_err(|r| CfgError::decode(&key, text, r))?);
            }
            profile.pressure.push(values[0]);
            profile.temperature.push(values[1]);
            for (s, v) in profile.species.iter_mut().zip(&values[2..]) {
                s.values.push(*v);
            }
        }
        Ok(Some(Value::Profile(profile)))
    }

    fn box_clone(&self) -> Box<dyn FieldKind> {
        Box::new(self.clone())
    }
}
