use std::fmt;

use crate::unit::{Unit, UnitError};

/// A magnitude attached to a [`Unit`].
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn dimensionless(value: f64) -> Self {
        Self::new(value, Unit::dimensionless())
    }

    /// Magnitude expressed in `unit`.
    pub fn to_value(&self, unit: &Unit) -> Result<f64, UnitError> {
        Ok(self.value * self.unit.conversion_factor(unit)?)
    }

    pub fn to(&self, unit: &Unit) -> Result<Quantity, UnitError> {
        Ok(Quantity::new(self.to_value(unit)?, unit.clone()))
    }

    /// Compares magnitudes after conversion, within a relative tolerance.
    pub fn approx_eq(&self, other: &Quantity, rel: f64) -> bool {
        match other.to_value(&self.unit) {
            Ok(v) => (self.value - v).abs() <= rel * self.value.abs().max(v.abs()),
            Err(_) => false,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.symbol().is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.unit)
        }
    }
}
