//! Whitespace-separated spectral tables (`RAD`, `TRN`, `NOI`).
//!
//! ```text
//! # Spectral unit: [um]
//! # Radiance unit: [W/m2/um]
//! # Wave/freq Total Noise Stellar Planet
//! 1.00000 2.1e-07 1.0e-09 2.0e-07 1.0e-08
//! ```
//!
//! Column names come from the last `#` line. The first column is the
//! spectral axis; the others share the value unit.

use std::sync::LazyLock;

use psg_units::Unit;
use regex::Regex;

use crate::error::ReplyError;

fn unit(label: &str) -> Unit {
    Unit::parse(label).unwrap_or_else(|_| Unit::opaque(label))
}

static BRACKETED: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").ok());

/// Unit in the first `[...]` of the header line whose label starts with one
/// of `labels`.
fn header_unit(headers: &[&str], labels: &[&str]) -> Option<Unit> {
    let bracketed = BRACKETED.as_ref()?;
    headers
        .iter()
        .find(|h| labels.iter().any(|l| h.starts_with(l)))
        .and_then(|h| bracketed.captures(h))
        .and_then(|c| c.get(1))
        .map(|m| unit(m.as_str().trim()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub unit: Unit,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpectralTable {
    columns: Vec<Column>,
}

impl SpectralTable {
    /// `segment` names the table in errors.
    pub fn parse(segment: &str, body: &[u8]) -> Result<Self, ReplyError> {
        let text = std::str::from_utf8(body).map_err(|e| {
            ReplyError::table(segment, 0, format!("not UTF-8 at byte {}", e.valid_up_to()))
        })?;

        let headers: Vec<&str> = text
            .lines()
            .filter_map(|l| l.trim_start().strip_prefix('#'))
            .map(str::trim)
            .collect();
        let names: Vec<&str> = headers
            .last()
            .map(|h| h.split_whitespace().collect())
            .unwrap_or_default();
        if names.is_empty() {
            return Err(ReplyError::table(segment, 0, "no column header"));
        }
        let spectral = header_unit(&headers, &["Spectral unit"]).unwrap_or_else(Unit::dimensionless);
        let value = header_unit(
            &headers,
            &["Radiance unit", "Noise unit", "Transmittance unit", "Flux unit"],
        )
        .unwrap_or_else(Unit::dimensionless);

        let mut columns: Vec<Column> = names
            .iter()
            .enumerate()
            .map(|(i, name)| Column {
                name: name.to_string(),
                unit: if i == 0 { spectral.clone() } else { value.clone() },
                values: Vec::new(),
            })
            .collect();

        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let cells: Vec<&str> = line.split_whitespace().collect();
            if cells.len() != columns.len() {
                return Err(ReplyError::table(
                    segment,
                    n + 1,
                    format!("{} values but {} columns", cells.len(), columns.len()),
                ));
            }
            for (column, cell) in columns.iter_mut().zip(cells) {
                let v = cell.parse::<f64>().map_err(|_| {
                    ReplyError::table(segment, n + 1, format!("`{cell}` is not a number"))
                })?;
                column.values.push(v);
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Spectral axis.
    pub fn spectral(&self) -> &Column {
        &self.columns[0]
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns[0].values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAD: &str = "\
# Planetary Spectrum Generator
# Spectral unit: [um]
# Radiance unit: [W/m2/um]
# Wave/freq Total Noise Planet
1.000 2.0e-07 1.0e-09 2.0e-07
1.500 3.0e-07 1.0e-09 3.0e-07
";

    #[test]
    fn columns_and_units_from_header() {
        let t = SpectralTable::parse("RAD", RAD.as_bytes()).unwrap();
        assert_eq!(t.names().collect::<Vec<_>>(), ["Wave/freq", "Total", "Noise", "Planet"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.spectral().unit, Unit::parse("um").unwrap());
        assert_eq!(t.spectral().values, vec![1.0, 1.5]);
        let total = t.column("Total").unwrap();
        assert_eq!(total.unit, Unit::parse("W m-2 um-1").unwrap());
        assert_eq!(total.values, vec![2.0e-7, 3.0e-7]);
    }

    #[test]
    fn header_pattern_is_shared() {
        assert!(BRACKETED.is_some());
        let headers = ["Spectral unit: [ um ]", "Noise unit: [W/m2/um]"];
        assert_eq!(header_unit(&headers, &["Spectral unit"]), Some(unit("um")));
        assert_eq!(header_unit(&headers, &["Flux unit"]), None);
    }

    #[test]
    fn missing_value_unit_is_dimensionless() {
        let t = SpectralTable::parse("TRN", b"# Spectral unit: [um]\n# Wave/freq Total\n1 0.9\n").unwrap();
        assert!(t.column("Total").unwrap().unit.is_dimensionless());
    }

    #[test]
    fn ragged_rows_name_the_line() {
        let err = SpectralTable::parse("RAD", b"# Wave/freq Total\n1 2\n3\n").unwrap_err();
        assert!(matches!(err, ReplyError::Table { line: 3, .. }));
        let err = SpectralTable::parse("RAD", b"# Wave/freq Total\n1 x\n").unwrap_err();
        assert!(matches!(err, ReplyError::Table { line: 2, .. }));
        assert!(SpectralTable::parse("RAD", b"1 2\n").is_err());
    }
}
