//! Quantity-valued fields.
//!
//! [`QuantityField`] writes a magnitude converted to the key's canonical
//! unit; decode attaches that unit. [`CodedQuantityField`] writes the
//! magnitude in a unit of the caller's choosing, picked from an allowed list,
//! and names that unit with a code on a companion key.
//! [`MultiQuantityField`] packs a fixed number of quantities, each with its
//! own canonical unit, into one delimited value.

use psg_units::{Quantity, Unit};

use super::{raw, Entries, FieldCtx, FieldKind, Lines};
use crate::catalog::{Canonical, UnitCode};
use crate::error::CfgError;
use crate::format::{parse_float, NumberFormat, LIST_DELIMITER};
use crate::key::KeyPattern;
use crate::value::Value;

fn incompatible(key: &str, q: &Quantity, expected: &str, reason: impl ToString) -> CfgError {
    CfgError::IncompatibleUnit {
        key: key.to_string(),
        value: q.to_string(),
        expected: expected.to_string(),
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Canonical unit
// ---------------------------------------------------------------------------

/// Lossy beyond the pinned precision; decoded quantities always carry the
/// canonical unit.
#[derive(Debug, Clone)]
pub struct QuantityField {
    unit: Unit,
    format: NumberFormat,
}

impl QuantityField {
    pub fn new(unit: Unit) -> Self {
        Self {
            unit,
            format: NumberFormat::default(),
        }
    }

    pub fn with_format(mut self, format: NumberFormat) -> Self {
        self.format = format;
        self
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    fn magnitude(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<f64, CfgError> {
        let q = value
            .as_quantity()
            .ok_or_else(|| ctx.type_error("a quantity", value))?;
        let v = q
            .to_value(&self.unit)
            .map_err(|e| incompatible(&ctx.key(), q, self.unit.symbol(), e))?;
        if !v.is_finite() {
            return Err(CfgError::invalid(&ctx.key(), q, "not a finite number"));
        }
        Ok(v)
    }
}

impl FieldKind for QuantityField {
    fn kind(&self) -> &'static str {
        "quantity"
    }

    fn validate(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<(), CfgError> {
        match value {
            Value::Quantity(_) => self.magnitude(ctx, value).map(|_| ()),
            other => Err(ctx.type_error("a quantity", other)),
        }
    }

    fn encode(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Lines, CfgError> {
        let v = self.magnitude(ctx, value)?;
        Ok(vec![(ctx.key(), self.format.format(v))])
    }

    fn decode(&self, ctx: &FieldCtx<'_>, entries: &Entries) -> Result<Option<Value>, CfgError> {
        let Some(text) = raw(ctx, entries) else {
            return Ok(None);
        };
        let v = parse_float(text).map_err(|reason| CfgError::decode(&ctx.key(), text, reason))?;
        Ok(Some(Value::Quantity(Quantity::new(v, self.unit.clone()))))
    }

    fn box_clone(&self) -> Box<dyn FieldKind> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Several canonical units
// ---------------------------------------------------------------------------

/// `GEOMETRY-USER-PARAMETER=45.0000,1000.0000`: one slot per quantity, each
/// written in its slot's canonical unit.
#[derive(Debug, Clone)]
pub struct MultiQuantityField {
    slots: Vec<Canonical>,
}

impl MultiQuantityField {
    pub fn new(slots: Vec<Canonical>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[Canonical] {
        &self.slots
    }

    fn magnitudes(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Vec<f64>, CfgError> {
        let quantities = value
            .as_quantities()
            .ok_or_else(|| ctx.type_error("quantities", value))?;
        if quantities.len() != self.slots.len() {
            return Err(CfgError::invalid(
                &ctx.key(),
                value,
                format!("expected {} quantities, got {}", self.slots.len(), quantities.len()),
            ));
        }
        let key = ctx.key();
        self.slots
            .iter()
            .zip(quantities)
            .map(|(slot, q)| {
                let v = q
                    .to_value(&slot.unit)
                    .map_err(|e| incompatible(&key, q, slot.unit.symbol(), e))?;
                if v.is_finite() {
                    Ok(v)
                } else {
                    Err(CfgError::invalid(&key, q, "not a finite number"))
                }
            })
            .collect()
    }
}

impl FieldKind for MultiQuantityField {
    fn kind(&self) -> &'static str {
        "multi quantity"
    }

    fn validate(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<(), CfgError> {
        match value {
            Value::Vector(_) => self.magnitudes(ctx, value).map(|_| ()),
            other => Err(ctx.type_error("quantities", other)),
        }
    }

    fn encode(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Lines, CfgError> {
        let text = self
            .slots
            .iter()
            .zip(self.magnitudes(ctx, value)?)
            .map(|(slot, v)| slot.format.format(v))
            .collect::<Vec<_>>()
            .join(&LIST_DELIMITER.to_string());
        Ok(vec![(ctx.key(), text)])
    }

    fn decode(&self, ctx: &FieldCtx<'_>, entries: &Entries) -> Result<Option<Value>, CfgError> {
        let Some(text) = raw(ctx, entries) else {
            return Ok(None);
        };
        let key = ctx.key();
        let cells: Vec<&str> = text.split(LIST_DELIMITER).map(str::trim).collect();
        if cells.len() != self.slots.len() {
            return Err(CfgError::decode(
                &key,
                text,
                format!("{} values, expected {}", cells.len(), self.slots.len()),
            ));
        }
        self.slots
            .iter()
            .zip(cells)
            .map(|(slot, cell)| {
                parse_float(cell)
                    .map(|v| Quantity::new(v, slot.unit.clone()))
                    .map_err(|r| CfgError::decode(&key, text, r))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|q| Some(Value::Vector(q)))
    }

    fn box_clone(&self) -> Box<dyn FieldKind> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Unit code
// ---------------------------------------------------------------------------

/// One or more magnitudes sharing a unit-code key.
///
/// The unit is resolved from the first quantity: the allowed unit with the
/// same dimension, or, when several allowed units share that dimension, the
/// allowed unit equal to it. Remaining quantities are converted to it.
#[derive(Debug, Clone)]
pub struct CodedQuantityField {
    value_keys: Vec<String>,
    unit_key: String,
    codes: Vec<UnitCode>,
}

impl CodedQuantityField {
    /// A single value keyed by the field name.
    pub fn new(unit_key: impl Into<String>, codes: Vec<UnitCode>) -> Self {
        Self {
            value_keys: Vec::new(),
            unit_key: unit_key.into(),
            codes,
        }
    }

    /// Several values; the field name is then only an accessor.
    pub fn with_value_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    fn value_keys<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        if self.value_keys.is_empty() {
            vec![name]
        } else {
            self.value_keys.iter().map(String::as_str).collect()
        }
    }

    fn code_list(&self) -> Vec<String> {
        self.codes.iter().map(|c| c.code.clone()).collect()
    }

    /// Allowed unit code used to write `q`.
    pub fn resolve(&self, key: &str, q: &Quantity) -> Result<&UnitCode, CfgError> {
        resolve_unit(&self.codes, key, q)
    }
}

pub(crate) fn resolve_unit<'c>(
    codes: &'c [UnitCode],
    key: &str,
    q: &Quantity,
) -> Result<&'c UnitCode, CfgError> {
    let candidates: Vec<&UnitCode> = codes
        .iter()
        .filter(|c| c.unit.is_compatible(&q.unit))
        .collect();
    match candidates.as_slice() {
        [] => {
            let allowed: Vec<&str> = codes.iter().map(|c| c.unit.symbol()).collect();
            Err(incompatible(
                key,
                q,
                &allowed.join(" | "),
                "no allowed unit has this dimension",
            ))
        }
        [only] => Ok(*only),
        several => several.iter().copied().find(|c| c.unit == q.unit).ok_or_else(|| {
            let allowed: Vec<&str> = several.iter().map(|c| c.unit.symbol()).collect();
            CfgError::invalid(
                key,
                q,
                format!("ambiguous unit; use exactly one of: {}", allowed.join(", ")),
            )
        }),
    }
}

impl FieldKind for CodedQuantityField {
    fn kind(&self) -> &'static str {
        "coded quantity"
    }

    fn keys(&self, name: &str) -> Vec<KeyPattern> {
        let mut keys: Vec<KeyPattern> = self
            .value_keys(name)
            .into_iter()
            .map(|k| KeyPattern::Exact(k.to_string()))
            .collect();
        keys.push(KeyPattern::Exact(self.unit_key.clone()));
        keys
    }

    fn normalize(&self, _ctx: &FieldCtx<'_>, value: Value) -> Result<Value, CfgError> {
        Ok(match value {
            Value::Vector(mut v) if v.len() == 1 && self.value_keys.len() <= 1 => {
                Value::Quantity(v.remove(0))
            }
            Value::Quantity(q) if self.value_keys.len() > 1 => Value::Vector(vec![q]),
            other => other,
        })
    }

    fn validate(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<(), CfgError> {
        self.encode(ctx, value).map(|_| ())
    }

    fn encode(&self, ctx: &FieldCtx<'_>, value: &Value) -> Result<Lines, CfgError> {
        let keys = self.value_keys(ctx.name);
        let quantities = value
            .as_quantities()
            .ok_or_else(|| ctx.type_error("a quantity", value))?;
        if quantities.len() != keys.len() {
            return Err(CfgError::invalid(
                &ctx.key(),
                value,
                format!("expected {} quantities, got {}", keys.len(), quantities.len()),
            ));
        }
        let Some(first) = quantities.first() else {
            return Ok(Vec::new());
        };
        let code = resolve_unit(&self.codes, &ctx.key(), first)?;
        let mut lines = Vec::with_capacity(keys.len() + 1);
        for (key, q) in keys.iter().zip(quantities) {
            let key = ctx.qualify(key);
            let v = q
                .to_value(&code.unit)
                .map_err(|e| incompatible(&key, q, code.unit.symbol(), e))?;
            if !v.is_finite() {
                return Err(CfgError::invalid(&key, q, "not a finite number"));
            }
            lines.push((key, code.format.format(v)));
        }
        lines.push((ctx.qualify(&self.unit_key), code.code.clone()));
        Ok(lines)
    }

    fn decode(&self, ctx: &FieldCtx<'_>, entries: &Entries) -> Result<Option<Value>, CfgError> {
        let keys = self.value_keys(ctx.name);
        let raws: Vec<Option<&String>> = keys.iter().map(|k| entries.get(*k)).collect();
        let unit_raw = entries.get(&self.unit_key);
        if raws.iter().all(Option::is_none) && unit_raw.is_none() {
            return Ok(None);
        }
        let Some(unit_raw) = unit_raw else {
            return Err(CfgError::decode(
                &ctx.qualify(&self.unit_key),
                "",
                "unit code missing for a value key that is present",
            ));
        };
        let code = self
            .codes
            .iter()
            .find(|c| c.code == unit_raw.trim())
            .ok_or_else(|| CfgError::UnrecognizedToken {
                key: ctx.qualify(&self.unit_key),
                token: unit_raw.trim().to_string(),
                expected: self.code_list(),
            })?;
        let mut quantities = Vec::with_capacity(keys.len());
        for (key, text) in keys.iter().zip(raws) {
            let qualified = ctx.qualify(key);
            let text = text.ok_or_else(|| {
                CfgError::decode(&qualified, "", "value missing next to its unit code")
            })?;
            let v = parse_float(text).map_err(|r| CfgError::decode(&qualified, text, r))?;
            quantities.push(Quantity::new(v, code.unit.clone()));
        }
        Ok(Some(if quantities.len() == 1 && self.value_keys.len() <= 1 {
            Value::Quantity(quantities.remove(0))
        } else {
            Value::Vector(quantities)
        }))
    }

    fn box_clone(&self) -> Box<dyn FieldKind> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(s: &str) -> Unit {
        Unit::parse(s).unwrap()
    }

    fn gravity() -> CodedQuantityField {
        CodedQuantityField::new(
            "GRAVITY-UNIT",
            vec![
                UnitCode::new(u("m s-2"), "g", NumberFormat::Fixed(3)),
                UnitCode::new(u("g cm-3"), "rho", NumberFormat::Fixed(3)),
                UnitCode::new(u("kg"), "kg", NumberFormat::Scientific(3)),
            ],
        )
    }

    fn entries(pairs: &[(&str, &str)]) -> Entries {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn quantity_converts_to_canonical_unit() {
        let kind = QuantityField::new(u("km")).with_format(NumberFormat::Fixed(1));
        let ctx = FieldCtx::new("OBJECT", "DIAMETER");
        let v = Value::Quantity(Quantity::new(12_742_000.0, u("m")));
        assert_eq!(kind.encode(&ctx, &v).unwrap()[0].1, "12742.0");
        let err = kind
            .validate(&ctx, &Value::Quantity(Quantity::new(1.0, u("s"))))
            .unwrap_err();
        assert!(matches!(err, CfgError::IncompatibleUnit { ref key, .. } if key == "OBJECT-DIAMETER"));
        let back = kind.decode(&ctx, &entries(&[("DIAMETER", "12742.0")])).unwrap();
        assert_eq!(back, Some(Value::Quantity(Quantity::new(12742.0, u("km")))));
    }

    #[test]
    fn quantity_rejects_bare_numbers() {
        let kind = QuantityField::new(u("K"));
        let ctx = FieldCtx::new("SURFACE", "TEMPERATURE");
        assert!(kind.validate(&ctx, &Value::Float(300.0)).is_err());
    }

    fn user_parameter() -> MultiQuantityField {
        MultiQuantityField::new(vec![
            Canonical {
                unit: u("deg"),
                format: NumberFormat::Fixed(4),
            },
            Canonical {
                unit: u("km"),
                format: NumberFormat::Fixed(4),
            },
        ])
    }

    #[test]
    fn multi_quantity_converts_each_slot() {
        let kind = user_parameter();
        let ctx = FieldCtx::new("GEOMETRY", "USER-PARAMETER");
        let v = Value::Vector(vec![
            Quantity::new(std::f64::consts::FRAC_PI_4, u("rad")),
            Quantity::new(2500.0, u("m")),
        ]);
        kind.validate(&ctx, &v).unwrap();
        let lines = kind.encode(&ctx, &v).unwrap();
        assert_eq!(
            lines,
            vec![("GEOMETRY-USER-PARAMETER".to_string(), "45.0000,2.5000".to_string())]
        );
        let back = kind
            .decode(&ctx, &entries(&[("USER-PARAMETER", lines[0].1.as_str())]))
            .unwrap();
        assert_eq!(
            back,
            Some(Value::Vector(vec![
                Quantity::new(45.0, u("deg")),
                Quantity::new(2.5, u("km")),
            ]))
        );
        assert_eq!(kind.encode(&ctx, &back.unwrap()).unwrap(), lines);
    }

    #[test]
    fn multi_quantity_checks_slot_count_and_units() {
        let kind = user_parameter();
        let ctx = FieldCtx::new("GEOMETRY", "USER-PARAMETER");
        let short = Value::Vector(vec![Quantity::new(1.0, u("deg"))]);
        assert!(kind.validate(&ctx, &short).is_err());
        let swapped = Value::Vector(vec![Quantity::new(1.0, u("km")), Quantity::new(1.0, u("deg"))]);
        assert!(matches!(
            kind.validate(&ctx, &swapped),
            Err(CfgError::IncompatibleUnit { .. })
        ));
        let err = kind
            .decode(&ctx, &entries(&[("USER-PARAMETER", "1.0")]))
            .unwrap_err();
        assert!(matches!(err, CfgError::Decode { ref key, .. } if key == "GEOMETRY-USER-PARAMETER"));
    }

    #[test]
    fn coded_picks_unit_by_dimension() {
        let kind = gravity();
        let ctx = FieldCtx::new("OBJECT", "GRAVITY");
        let lines = kind
            .encode(&ctx, &Value::Quantity(Quantity::new(5.97e24, u("kg"))))
            .unwrap();
        assert_eq!(
            lines,
            vec![
                ("OBJECT-GRAVITY".to_string(), "5.970e+24".to_string()),
                ("OBJECT-GRAVITY-UNIT".to_string(), "kg".to_string()),
            ]
        );
        let lines = kind
            .encode(&ctx, &Value::Quantity(Quantity::new(981.0, u("cm s-2"))))
            .unwrap();
        assert_eq!(lines[0].1, "9.810");
        assert_eq!(lines[1].1, "g");
    }

    #[test]
    fn coded_ambiguous_units_require_exact_match() {
        let kind = CodedQuantityField::new(
            "ALTITUDE-UNIT",
            vec![
                UnitCode::new(u("AU"), "AU", NumberFormat::Fixed(4)),
                UnitCode::new(u("km"), "km", NumberFormat::Fixed(4)),
            ],
        );
        let ctx = FieldCtx::new("GEOMETRY", "OBS-ALTITUDE");
        let ok = kind
            .encode(&ctx, &Value::Quantity(Quantity::new(1.5, u("AU"))))
            .unwrap();
        assert_eq!(ok[1].1, "AU");
        let err = kind
            .encode(&ctx, &Value::Quantity(Quantity::new(1500.0, u("m"))))
            .unwrap_err();
        assert!(err.to_string().contains("ambiguous unit"));
    }

    #[test]
    fn coded_vector_shares_one_code() {
        let kind = CodedQuantityField::new(
            "RANGEUNIT",
            vec![
                UnitCode::new(u("um"), "um", NumberFormat::Fixed(3)),
                UnitCode::new(u("GHz"), "GHz", NumberFormat::Fixed(3)),
            ],
        )
        .with_value_keys(["RANGE1", "RANGE2"]);
        let ctx = FieldCtx::new("GENERATOR", "RANGE");
        let v = Value::Vector(vec![Quantity::new(1.0, u("um")), Quantity::new(2.5, u("um"))]);
        let lines = kind.encode(&ctx, &v).unwrap();
        assert_eq!(
            lines,
            vec![
                ("GENERATOR-RANGE1".to_string(), "1.000".to_string()),
                ("GENERATOR-RANGE2".to_string(), "2.500".to_string()),
                ("GENERATOR-RANGEUNIT".to_string(), "um".to_string()),
            ]
        );
        let back = kind
            .decode(
                &ctx,
                &entries(&[("RANGE1", "1.000"), ("RANGE2", "2.500"), ("RANGEUNIT", "um")]),
            )
            .unwrap();
        assert_eq!(back, Some(v));
    }

    #[test]
    fn coded_decode_requires_unit_code() {
        let kind = gravity();
        let ctx = FieldCtx::new("OBJECT", "GRAVITY");
        let err = kind.decode(&ctx, &entries(&[("GRAVITY", "9.8")])).unwrap_err();
        assert!(matches!(err, CfgError::Decode { ref key, .. } if key == "OBJECT-GRAVITY-UNIT"));
        let err = kind
            .decode(&ctx, &entries(&[("GRAVITY", "9.8"), ("GRAVITY-UNIT", "furlong")]))
            .unwrap_err();
        assert!(matches!(err, CfgError::UnrecognizedToken { .. }));
        assert_eq!(kind.decode(&ctx, &Entries::new()).unwrap(), None);
    }
}
