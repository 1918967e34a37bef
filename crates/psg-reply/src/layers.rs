//! Layer-by-layer atmosphere product (`LYR` segment).
//!
//! ```text
//! # Molecules considered: H2O,CO2
//! # Aerosols considered: Water
//! # Alt[km] Pressure[bar] Temperature[K] H2O CO2 Water Water-size[m]
//! # 0.000 1.000e+00 288.00 1.0e-02 4.0e-04 1.0e-06 1.0e-06
//! # 1.000 8.870e-01 281.50 8.0e-03 4.0e-04 9.0e-07 1.0e-06
//! #
//! # Alt[km] Pressure[bar] Temperature[K] H2O CO2 Water Water-size[m]
//! # 0.000 1.000e+00 288.00 2.1e+25 8.4e+23 1.2e-03 1.0e-06
//! # Integrated column: 2.1e+25 8.4e+23 1.2e-03
//! ```
//!
//! `Label: value` lines are metadata. A line starting with `Alt[km]` names
//! the columns of the numeric lines that follow it. Numeric lines must hold
//! a decimal point; anything else closes the current table. The first table
//! is the vertical profile, the second the column density of every layer.

use indexmap::IndexMap;
use psg_units::Unit;
use tracing::{debug, warn};

use crate::error::ReplyError;
use crate::reply::LYR;
use crate::table::Column;

const MOLECULES: &str = "Molecules considered";
const AEROSOLS: &str = "Aerosols considered";
const NAME_LINE: &str = "Alt[km]";
const INTEGRATED: &str = "Integrated";
const SIZE_SUFFIX: &str = "_size";

fn unit(label: &str) -> Unit {
    Unit::parse(label).unwrap_or_else(|_| Unit::opaque(label))
}

fn list(value: Option<&String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Row of floats, if `content` is one.
fn numeric(content: &str) -> Option<Vec<f64>> {
    if !content.contains('.') {
        return None;
    }
    content
        .split_whitespace()
        .map(|t| t.parse::<f64>().ok())
        .collect()
}

/// Units given to abundance columns, which carry no unit in their header.
#[derive(Debug, Clone)]
struct SpeciesUnits {
    molecule: Unit,
    aerosol: Unit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerTable {
    columns: Vec<Column>,
}

impl LayerTable {
    fn build(
        names: &[&str],
        rows: &[Vec<f64>],
        molecules: &[String],
        aerosols: &[String],
        species: &SpeciesUnits,
    ) -> Self {
        let columns = names
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let (base, bracket) = match raw.split_once('[') {
                    Some((base, rest)) => (base, Some(rest.trim_end_matches(']'))),
                    None => (*raw, None),
                };
                let bracket_unit = bracket.map(unit).unwrap_or_else(Unit::dimensionless);
                let (name, unit) = if molecules.iter().any(|m| m == raw) {
                    (raw.to_string(), species.molecule.clone())
                } else if aerosols.iter().any(|a| a == raw) {
                    (raw.to_string(), species.aerosol.clone())
                } else if i > 0 && base.to_ascii_lowercase().contains("size") {
                    (format!("{}{SIZE_SUFFIX}", names[i - 1]), bracket_unit)
                } else {
                    (base.to_string(), bracket_unit)
                };
                Column {
                    name,
                    unit,
                    values: rows.iter().map(|r| r[i]).collect(),
                }
            })
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Altitude of each layer, in km.
    pub fn altitude(&self) -> &Column {
        &self.columns[0]
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns[0].values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerProduct {
    /// Every `Label: value` line, in file order.
    pub metadata: IndexMap<String, String>,
    pub molecules: Vec<String>,
    pub aerosols: Vec<String>,
    /// Pressure, temperature and abundances per layer.
    pub profile: LayerTable,
    /// Column density per layer: molecules in m-2, aerosols in kg m-2.
    pub column_density: Option<LayerTable>,
    /// Values of the `Integrated` line, if any.
    pub integrated: Vec<f64>,
}

struct RawTable<'a> {
    names: Vec<&'a str>,
    rows: Vec<Vec<f64>>,
}

impl LayerProduct {
    pub fn parse(body: &[u8]) -> Result<Self, ReplyError> {
        let text = std::str::from_utf8(body).map_err(|e| {
            ReplyError::table(LYR, 0, format!("not UTF-8 at byte {}", e.valid_up_to()))
        })?;

        let mut metadata = IndexMap::new();
        let mut integrated = Vec::new();
        let mut names: Option<Vec<&str>> = None;
        let mut tables: Vec<RawTable<'_>> = Vec::new();
        let mut current: Option<RawTable<'_>> = None;

        for (n, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            let content = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();

            if let Some(row) = numeric(content) {
                if current.is_none() {
                    let names = names.clone().ok_or_else(|| {
                        ReplyError::table(LYR, n + 1, "layer data before any column header")
                    })?;
                    current = Some(RawTable {
                        names,
                        rows: Vec::new(),
                    });
                }
                if let Some(table) = current.as_mut() {
                    if row.len() != table.names.len() {
                        return Err(ReplyError::table(
                            LYR,
                            n + 1,
                            format!("{} values, expected {}", row.len(), table.names.len()),
                        ));
                    }
                    table.rows.push(row);
                }
                continue;
            }

            if let Some(table) = current.take() {
                tables.push(table);
            }
            if content.starts_with(NAME_LINE) {
                names = Some(content.split_whitespace().collect());
            } else if content.starts_with(INTEGRATED) {
                let values = content.split_once(':').map_or(content, |(_, v)| v);
                integrated = values
                    .split_whitespace()
                    .filter_map(|t| t.parse().ok())
                    .collect();
            } else if let Some((label, value)) = content.split_once(':') {
                metadata.insert(label.trim().to_string(), value.trim().to_string());
            }
        }
        if let Some(table) = current.take() {
            tables.push(table);
        }

        let molecules = list(metadata.get(MOLECULES));
        let aerosols = list(metadata.get(AEROSOLS));
        let mut tables = tables.into_iter();
        let profile = tables
            .next()
            .ok_or_else(|| ReplyError::table(LYR, 0, "no layer table"))?;
        let profile = LayerTable::build(
            &profile.names,
            &profile.rows,
            &molecules,
            &aerosols,
            &SpeciesUnits {
                molecule: Unit::dimensionless(),
                aerosol: Unit::dimensionless(),
            },
        );
        let column_density = tables.next().map(|t| {
            LayerTable::build(
                &t.names,
                &t.rows,
                &molecules,
                &aerosols,
                &SpeciesUnits {
                    molecule: unit("m-2"),
                    aerosol: unit("kg m-2"),
                },
            )
        });
        let extra = tables.count();
        if extra > 0 {
            warn!(tables = extra, "ignoring extra layer tables");
        }
        debug!(layers = profile.len(), "parsed layer product");

        Ok(Self {
            metadata,
            molecules,
            aerosols,
            profile,
            column_density,
            integrated,
        })
    }
}
