//! Units: a symbol, a dimension and a scale to the coherent base unit.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::dimension::Dimension;
use crate::registry;

const SCALE_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitError {
    #[error("unknown unit symbol `{0}`")]
    UnknownSymbol(String),
    #[error("invalid exponent in unit term `{0}`")]
    InvalidExponent(String),
    #[error("cannot convert `{from}` ({from_dim}) to `{to}` ({to_dim})")]
    Incompatible {
        from: String,
        to: String,
        from_dim: String,
        to_dim: String,
    },
}

/// A physical unit.
///
/// Equality ignores the symbol: `W/m2/um` and `W m-2 um-1` are the same unit.
/// Opaque units (labels the parser could not resolve) only equal an opaque
/// unit with the same label.
#[derive(Debug, Clone)]
pub struct Unit {
    symbol: String,
    dimension: Dimension,
    scale: f64,
    opaque: bool,
}

impl Unit {
    pub fn new(symbol: impl Into<String>, dimension: Dimension, scale: f64) -> Self {
        Self {
            symbol: symbol.into(),
            dimension,
            scale,
            opaque: false,
        }
    }

    pub fn dimensionless() -> Self {
        Self::new("", Dimension::none(), 1.0)
    }

    pub fn opaque(label: impl Into<String>) -> Self {
        Self {
            symbol: label.into(),
            dimension: Dimension::none(),
            scale: 1.0,
            opaque: true,
        }
    }

    /// Parses a unit expression.
    ///
    /// Terms are separated by whitespace or `*`; a term following `/` is
    /// inverted. Each term is a registered symbol with an optional integer
    /// exponent suffix: `m2`, `cm-1`, `s^-2`.
    ///
    /// Examples: `km s-1`, `W sr-1 m-2 um-1`, `W/m2/um`, `g cm-3`.
    pub fn parse(text: &str) -> Result<Self, UnitError> {
        let text = text.trim();
        let mut dimension = Dimension::none();
        let mut scale = 1.0;
        let mut invert_next = false;
        let mut term = String::new();
        let mut terms: Vec<(String, bool)> = Vec::new();
        for ch in text.chars() {
            match ch {
                ' ' | '\t' | '*' | '/' => {
                    if !term.is_empty() {
                        terms.push((std::mem::take(&mut term), invert_next));
                        invert_next = false;
                    }
                    if ch == '/' {
                        invert_next = true;
                    }
                }
                _ => term.push(ch),
            }
        }
        if !term.is_empty() {
            terms.push((term, invert_next));
        }
        for (term, inverted) in terms {
            let (symbol, mut exp) = split_exponent(&term)?;
            let entry = registry::lookup(symbol)
                .ok_or_else(|| UnitError::UnknownSymbol(symbol.to_string()))?;
            if inverted {
                exp = -exp;
            }
            dimension = dimension.mul(entry.dimension.powi(exp));
            scale *= entry.scale.powi(exp as i32);
        }
        Ok(Self::new(text, dimension, scale))
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    pub fn is_dimensionless(&self) -> bool {
        !self.opaque && self.dimension.is_dimensionless()
    }

    pub fn is_compatible(&self, other: &Unit) -> bool {
        match (self.opaque, other.opaque) {
            (false, false) => self.dimension == other.dimension,
            (true, true) => self.symbol == other.symbol,
            _ => false,
        }
    }

    /// Factor `f` such that `x [self] == x * f [to]`.
    pub fn conversion_factor(&self, to: &Unit) -> Result<f64, UnitError> {
        if !self.is_compatible(to) {
            return Err(UnitError::Incompatible {
                from: self.label(),
                to: to.label(),
                from_dim: self.dimension_label(),
                to_dim: to.dimension_label(),
            });
        }
        Ok(self.scale / to.scale)
    }

    pub fn mul(&self, other: &Unit) -> Unit {
        let symbol = match (self.symbol.is_empty(), other.symbol.is_empty()) {
            (true, _) => other.symbol.clone(),
            (_, true) => self.symbol.clone(),
            _ => format!("{} {}", self.symbol, other.symbol),
        };
        Unit {
            symbol,
            dimension: self.dimension.mul(other.dimension),
            scale: self.scale * other.scale,
            opaque: self.opaque || other.opaque,
        }
    }

    pub fn powi(&self, n: i8) -> Unit {
        Unit {
            symbol: format!("({}){}", self.symbol, n),
            dimension: self.dimension.powi(n),
            scale: self.scale.powi(n as i32),
            opaque: self.opaque,
        }
    }

    fn label(&self) -> String {
        if self.symbol.is_empty() {
            "dimensionless".to_string()
        } else {
            self.symbol.clone()
        }
    }

    fn dimension_label(&self) -> String {
        if self.opaque {
            "unresolved".to_string()
        } else {
            self.dimension.to_string()
        }
    }
}

fn split_exponent(term: &str) -> Result<(&str, i8), UnitError> {
    let digits_start = term
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);
    let Some(mut start) = digits_start else {
        return Ok((term.trim_end_matches('^'), 1));
    };
    if term[..start].ends_with('-') || term[..start].ends_with('+') {
        start -= 1;
    }
    let symbol = term[..start].trim_end_matches('^');
    if symbol.is_empty() {
        return Err(UnitError::InvalidExponent(term.to_string()));
    }
    let exp: i8 = term[start..]
        .parse()
        .map_err(|_| UnitError::InvalidExponent(term.to_string()))?;
    if exp == 0 {
        return Err(UnitError::InvalidExponent(term.to_string()));
    }
    Ok((symbol, exp))
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        if self.opaque || other.opaque {
            return self.opaque && other.opaque && self.symbol == other.symbol;
        }
        if self.dimension != other.dimension {
            return false;
        }
        let diff = (self.scale - other.scale).abs();
        diff <= SCALE_TOLERANCE * self.scale.abs().max(other.scale.abs())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::Base;

    #[test]
    fn parse_compound_spellings_agree() {
        let a = Unit::parse("W/m2/um").unwrap();
        let b = Unit::parse("W m-2 um-1").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.symbol(), "W/m2/um");
    }

    #[test]
    fn parse_exponent_forms() {
        let a = Unit::parse("m s^-2").unwrap();
        let b = Unit::parse("m s-2").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dimension().exponent(Base::Time), -2);
        assert_eq!(Unit::parse("cm-1").unwrap().dimension().exponent(Base::Length), -1);
    }

    #[test]
    fn parse_rejects_unknown_and_zero_exponent() {
        assert_eq!(
            Unit::parse("furlong"),
            Err(UnitError::UnknownSymbol("furlong".into()))
        );
        assert!(matches!(Unit::parse("m0"), Err(UnitError::InvalidExponent(_))));
        assert!(matches!(Unit::parse("2"), Err(UnitError::InvalidExponent(_))));
    }

    #[test]
    fn empty_text_is_dimensionless() {
        let u = Unit::parse("").unwrap();
        assert!(u.is_dimensionless());
        assert_eq!(u, Unit::dimensionless());
    }

    #[test]
    fn conversion_factor_between_lengths() {
        let km = Unit::parse("km").unwrap();
        let m = Unit::parse("m").unwrap();
        assert_eq!(km.conversion_factor(&m).unwrap(), 1e3);
        let err = km.conversion_factor(&Unit::parse("s").unwrap()).unwrap_err();
        assert!(err.to_string().contains("`km` (length)"));
    }

    #[test]
    fn ratio_units_differ_by_scale() {
        let ppm = Unit::parse("ppmv").unwrap();
        let ppb = Unit::parse("ppbv").unwrap();
        assert!(ppm.is_compatible(&ppb));
        assert_ne!(ppm, ppb);
        assert_eq!(ppm, Unit::parse("ppm").unwrap());
    }

    #[test]
    fn opaque_units_only_match_themselves() {
        let a = Unit::opaque("counts/bin");
        assert_eq!(a, Unit::opaque("counts/bin"));
        assert_ne!(a, Unit::dimensionless());
        assert!(!a.is_compatible(&Unit::dimensionless()));
        assert!(a.conversion_factor(&Unit::opaque("other")).is_err());
    }

    #[test]
    fn mul_and_powi() {
        let m = Unit::parse("m").unwrap();
        let s = Unit::parse("s").unwrap();
        let v = m.mul(&s.powi(-1));
        assert_eq!(v, Unit::parse("m s-1").unwrap());
        assert_eq!(Unit::dimensionless().mul(&m).symbol(), "m");
    }
}
