//! In-memory values held by configuration fields.

use std::fmt;

use chrono::NaiveDateTime;
use psg_units::{Quantity, Unit};

use crate::format::DATE_FORMAT;

/// Value of one field. Which variants a field accepts is decided by its
/// [`FieldKind`](crate::field::FieldKind).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Member of a closed vocabulary.
    Token(String),
    Quantity(Quantity),
    /// Several quantities sharing one unit-code key (`RANGE1`/`RANGE2`).
    Vector(Vec<Quantity>),
    Unit(Unit),
    Date(NaiveDateTime),
    List(Vec<Value>),
    Table(Table),
    /// Rows of a parallel-column record table.
    Records(Vec<Vec<Value>>),
    Profile(Profile),
    Blob(BlobRef),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "boolean",
            Self::Token(_) => "token",
            Self::Quantity(_) => "quantity",
            Self::Vector(_) => "quantity vector",
            Self::Unit(_) => "unit",
            Self::Date(_) => "date",
            Self::List(_) => "list",
            Self::Table(_) => "table",
            Self::Records(_) => "records",
            Self::Profile(_) => "profile",
            Self::Blob(_) => "blob reference",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Token(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_quantity(&self) -> Option<&Quantity> {
        match self {
            Self::Quantity(q) => Some(q),
            Self::Vector(v) if v.len() == 1 => v.first(),
            _ => None,
        }
    }

    pub fn as_quantities(&self) -> Option<&[Quantity]> {
        match self {
            Self::Quantity(q) => Some(std::slice::from_ref(q)),
            Self::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_unit(&self) -> Option<&Unit> {
        match self {
            Self::Unit(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_records(&self) -> Option<&[Vec<Value>]> {
        match self {
            Self::Records(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_profile(&self) -> Option<&Profile> {
        match self {
            Self::Profile(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&BlobRef> {
        match self {
            Self::Blob(b) => Some(b),
            _ => None,
        }
    }

    pub fn molecules(&self) -> Option<Vec<Molecule>> {
        self.as_records()?
            .iter()
            .map(|r| Molecule::from_record(r))
            .collect()
    }

    pub fn aerosols(&self) -> Option<Vec<Aerosol>> {
        self.as_records()?
            .iter()
            .map(|r| Aerosol::from_record(r))
            .collect()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) | Self::Token(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Quantity(q) => write!(f, "{q}"),
            Self::Vector(v) => {
                let parts: Vec<String> = v.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Self::Unit(u) => write!(f, "{u}"),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::List(l) => {
                let parts: Vec<String> = l.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Self::Table(t) => write!(f, "table of {} points", t.len()),
            Self::Records(r) => write!(f, "{} records", r.len()),
            Self::Profile(p) => write!(f, "profile of {} layers", p.len()),
            Self::Blob(b) => write!(f, "blob {}", b.id),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Quantity> for Value {
    fn from(v: Quantity) -> Self {
        Self::Quantity(v)
    }
}

impl From<Vec<Quantity>> for Value {
    fn from(v: Vec<Quantity>) -> Self {
        Self::Vector(v)
    }
}

impl From<Unit> for Value {
    fn from(v: Unit) -> Self {
        Self::Unit(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::Date(v)
    }
}

impl From<Table> for Value {
    fn from(v: Table) -> Self {
        Self::Table(v)
    }
}

impl From<Profile> for Value {
    fn from(v: Profile) -> Self {
        Self::Profile(v)
    }
}

impl From<BlobRef> for Value {
    fn from(v: BlobRef) -> Self {
        Self::Blob(v)
    }
}

impl From<Vec<Molecule>> for Value {
    fn from(v: Vec<Molecule>) -> Self {
        Self::Records(v.into_iter().map(Molecule::into_record).collect())
    }
}

impl From<Vec<Aerosol>> for Value {
    fn from(v: Vec<Aerosol>) -> Self {
        Self::Records(v.into_iter().map(Aerosol::into_record).collect())
    }
}

// ---------------------------------------------------------------------------
// Compound values
// ---------------------------------------------------------------------------

/// Tabulated `y(x)` with units on both axes, encoded as `y@x,y@x,...`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub x_unit: Unit,
    pub y_unit: Unit,
}

impl Table {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            x,
            y,
            x_unit: Unit::dimensionless(),
            y_unit: Unit::dimensionless(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn with_units(mut self, x_unit: Unit, y_unit: Unit) -> Self {
        self.x_unit = x_unit;
        self.y_unit = y_unit;
        self
    }

    pub fn len(&self) -> usize {
        self.x.len().min(self.y.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Vertical atmospheric profile.
///
/// Pressure is in bar and temperature in K; every species column holds one
/// abundance per layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Profile {
    pub pressure: Vec<f64>,
    pub temperature: Vec<f64>,
    pub species: Vec<Species>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub name: String,
    pub values: Vec<f64>,
}

impl Profile {
    pub fn new(pressure: Vec<f64>, temperature: Vec<f64>) -> Self {
        Self {
            pressure,
            temperature,
            species: Vec::new(),
        }
    }

    pub fn with_species(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.species.push(Species {
            name: name.into(),
            values,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.pressure.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressure.is_empty()
    }

    pub fn species(&self, name: &str) -> Option<&[f64]> {
        self.species
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.values.as_slice())
    }
}

/// Reference to a binary payload sent next to the configuration.
///
/// Only `id` is written to the configuration text; the bytes travel through
/// the request's binary side channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobRef {
    pub id: String,
}

impl BlobRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Gas species in the atmosphere.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub name: String,
    /// Spectroscopic database, e.g. `HIT[1]`.
    pub database: String,
    pub abundance: Quantity,
}

impl Molecule {
    pub fn new(name: impl Into<String>, database: impl Into<String>, abundance: Quantity) -> Self {
        Self {
            name: name.into(),
            database: database.into(),
            abundance,
        }
    }

    pub fn into_record(self) -> Vec<Value> {
        vec![
            Value::Str(self.name),
            Value::Str(self.database),
            Value::Quantity(self.abundance),
        ]
    }

    pub fn from_record(record: &[Value]) -> Option<Self> {
        match record {
            [name, database, abundance] => Some(Self::new(
                name.as_str()?,
                database.as_str()?,
                abundance.as_quantity()?.clone(),
            )),
            _ => None,
        }
    }
}

/// Aerosol species in the atmosphere.
#[derive(Debug, Clone, PartialEq)]
pub struct Aerosol {
    pub name: String,
    pub database: String,
    pub abundance: Quantity,
    /// Effective particle radius.
    pub size: Quantity,
}

impl Aerosol {
    pub fn new(
        name: impl Into<String>,
        database: impl Into<String>,
        abundance: Quantity,
        size: Quantity,
    ) -> Self {
        Self {
            name: name.into(),
            database: database.into(),
            abundance,
            size,
        }
    }

    pub fn into_record(self) -> Vec<Value> {
        vec![
            Value::Str(self.name),
            Value::Str(self.database),
            Value::Quantity(self.abundance),
            Value::Quantity(self.size),
        ]
    }

    pub fn from_record(record: &[Value]) -> Option<Self> {
        match record {
            [name, database, abundance, size] => Some(Self::new(
                name.as_str()?,
                database.as_str()?,
                abundance.as_quantity()?.clone(),
                size.as_quantity()?.clone(),
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn molecules_convert_through_records() {
        let h2o = Molecule::new(
            "H2O",
            "HIT[1]",
            Quantity::new(1.0, Unit::parse("ppmv").unwrap()),
        );
        let v = Value::from(vec![h2o.clone()]);
        assert_eq!(v.molecules(), Some(vec![h2o]));
        assert_eq!(v.aerosols(), None);
    }

    #[test]
    fn numeric_accessors() {
        assert_eq!(Value::from(3).as_f64(), Some(3.0));
        assert_eq!(Value::from(2.5).as_i64(), None);
        assert_eq!(Value::Token("Planet".into()).as_str(), Some("Planet"));
    }

    #[test]
    fn profile_species_lookup() {
        let p = Profile::new(vec![1.0, 0.1], vec![290.0, 250.0])
            .with_species("CO2", vec![4e-4, 4e-4]);
        assert_eq!(p.len(), 2);
        assert_eq!(p.species("CO2"), Some(&[4e-4, 4e-4][..]));
        assert_eq!(p.species("N2"), None);
    }
}
