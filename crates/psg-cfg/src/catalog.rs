//! Schema-definition tables: canonical units, number formats, token
//! vocabularies and unit-code lists, keyed by fully-qualified key.
//!
//! The tables are plain data handed to the schema builders in
//! [`crate::psg`]; nothing is fetched at run time.

use std::collections::HashMap;

use psg_units::Unit;

use crate::error::CfgError;
use crate::field::{EnumField, MultiQuantityField, QuantityField, UnitCodeField, UnknownTokenPolicy};
use crate::format::NumberFormat;

/// An allowed unit, the code that names it on the wire, and how magnitudes
/// in that unit are written.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitCode {
    pub unit: Unit,
    pub code: String,
    pub format: NumberFormat,
}

impl UnitCode {
    pub fn new(unit: Unit, code: impl Into<String>, format: NumberFormat) -> Self {
        Self {
            unit,
            code: code.into(),
            format,
        }
    }
}

/// Canonical unit and format of a quantity key, or of one slot of a
/// multi-quantity key.
#[derive(Debug, Clone, PartialEq)]
pub struct Canonical {
    pub unit: Unit,
    pub format: NumberFormat,
}

/// Parses a catalog unit expression; unresolvable labels become opaque
/// units that only match themselves.
fn unit(text: &str) -> Unit {
    Unit::parse(text).unwrap_or_else(|_| Unit::opaque(text))
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    units: HashMap<String, Canonical>,
    slots: HashMap<String, Vec<Canonical>>,
    vocabularies: HashMap<String, Vec<String>>,
    unit_codes: HashMap<String, Vec<UnitCode>>,
    token_policy: UnknownTokenPolicy,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, key: &str, unit_text: &str, format: NumberFormat) -> Self {
        self.units.insert(
            key.to_string(),
            Canonical {
                unit: unit(unit_text),
                format,
            },
        );
        self
    }

    /// `slots` are `(unit expression, format)` pairs in wire order.
    pub fn with_slot_units(mut self, key: &str, slots: &[(&str, NumberFormat)]) -> Self {
        self.slots.insert(
            key.to_string(),
            slots
                .iter()
                .map(|(u, format)| Canonical {
                    unit: unit(u),
                    format: *format,
                })
                .collect(),
        );
        self
    }

    pub fn with_vocabulary(mut self, key: &str, tokens: &[&str]) -> Self {
        self.vocabularies
            .insert(key.to_string(), tokens.iter().map(|t| t.to_string()).collect());
        self
    }

    /// `codes` are `(unit expression, code, format)` triples.
    pub fn with_unit_codes(mut self, key: &str, codes: &[(&str, &str, NumberFormat)]) -> Self {
        self.unit_codes.insert(
            key.to_string(),
            codes
                .iter()
                .map(|(u, code, format)| UnitCode::new(unit(u), *code, *format))
                .collect(),
        );
        self
    }

    /// Policy given to every enumeration field built from this catalog.
    pub fn with_token_policy(mut self, policy: UnknownTokenPolicy) -> Self {
        self.token_policy = policy;
        self
    }

    pub fn token_policy(&self) -> UnknownTokenPolicy {
        self.token_policy
    }

    pub fn canonical(&self, key: &str) -> Result<&Canonical, CfgError> {
        self.units.get(key).ok_or_else(|| CfgError::MissingCatalogEntry {
            key: key.to_string(),
            table: "canonical unit",
        })
    }

    pub fn slot_units(&self, key: &str) -> Result<&[Canonical], CfgError> {
        self.slots
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| CfgError::MissingCatalogEntry {
                key: key.to_string(),
                table: "slot unit",
            })
    }

    pub fn vocabulary(&self, key: &str) -> Result<&[String], CfgError> {
        self.vocabularies
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| CfgError::MissingCatalogEntry {
                key: key.to_string(),
                table: "vocabulary",
            })
    }

    pub fn unit_codes(&self, key: &str) -> Result<&[UnitCode], CfgError> {
        self.unit_codes
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| CfgError::MissingCatalogEntry {
                key: key.to_string(),
                table: "unit code",
            })
    }

    pub fn quantity_field(&self, key: &str) -> Result<QuantityField, CfgError> {
        let c = self.canonical(key)?;
        Ok(QuantityField::new(c.unit.clone()).with_format(c.format))
    }

    pub fn multi_quantity_field(&self, key: &str) -> Result<MultiQuantityField, CfgError> {
        Ok(MultiQuantityField::new(self.slot_units(key)?.to_vec()))
    }

    pub fn enum_field(&self, key: &str) -> Result<EnumField, CfgError> {
        Ok(EnumField::new(self.vocabulary(key)?.to_vec()).with_policy(self.token_policy))
    }

    pub fn unit_code_field(&self, key: &str) -> Result<UnitCodeField, CfgError> {
        Ok(UnitCodeField::new(self.unit_codes(key)?.to_vec()))
    }

    /// Tables of the Planetary Spectrum Generator.
    pub fn psg() -> Self {
        use NumberFormat::{Fixed, Scientific};

        const STAR_TYPES: &[&str] = &["O", "B", "A", "F", "G", "K", "M", ""];
        let wave: [(&str, &str, NumberFormat); 8] = [
            ("um", "um", Fixed(4)),
            ("nm", "nm", Fixed(4)),
            ("mm", "mm", Fixed(4)),
            ("An", "An", Fixed(4)),
            ("cm-1", "cm", Fixed(4)),
            ("MHz", "MHz", Fixed(4)),
            ("GHz", "GHz", Fixed(4)),
            ("kHz", "kHz", Fixed(4)),
        ];
        let mut resolution = vec![("RP", "RP", Fixed(4))];
        resolution.extend_from_slice(&wave);

        Self::new()
            // OBJECT
            .with_vocabulary(
                "OBJECT",
                &["Exoplanet", "Planet", "Asteroid", "Moon", "Comet", "Object"],
            )
            .with_unit("OBJECT-DIAMETER", "km", Fixed(3))
            .with_unit_codes(
                "OBJECT-GRAVITY-UNIT",
                &[
                    ("m s-2", "g", Fixed(4)),
                    ("g cm-3", "rho", Fixed(4)),
                    ("kg", "kg", Scientific(4)),
                ],
            )
            .with_unit("OBJECT-STAR-DISTANCE", "AU", Fixed(6))
            .with_unit("OBJECT-STAR-VELOCITY", "km s-1", Fixed(4))
            .with_vocabulary("OBJECT-STAR-TYPE", STAR_TYPES)
            .with_unit("OBJECT-STAR-TEMPERATURE", "K", Fixed(1))
            .with_unit("OBJECT-STAR-RADIUS", "R_sun", Fixed(4))
            .with_unit("OBJECT-SOLAR-LONGITUDE", "deg", Fixed(3))
            .with_unit("OBJECT-SOLAR-LATITUDE", "deg", Fixed(3))
            .with_unit("OBJECT-SEASON", "deg", Fixed(3))
            .with_unit("OBJECT-INCLINATION", "deg", Fixed(3))
            .with_unit("OBJECT-POSITION-ANGLE", "deg", Fixed(3))
            .with_unit("OBJECT-OBS-LONGITUDE", "deg", Fixed(3))
            .with_unit("OBJECT-OBS-LATITUDE", "deg", Fixed(3))
            .with_unit("OBJECT-OBS-VELOCITY", "km s-1", Fixed(4))
            .with_unit("OBJECT-PERIOD", "day", Fixed(5))
            // GEOMETRY
            .with_vocabulary(
                "GEOMETRY",
                &["Observatory", "Nadir", "Limb", "Occultation", "LookingUp", "Star"],
            )
            .with_unit_codes(
                "GEOMETRY-OFFSET-UNIT",
                &[
                    ("arcsec", "arcsec", Fixed(4)),
                    ("arcmin", "arcmin", Fixed(4)),
                    ("deg", "deg", Fixed(4)),
                    ("km", "km", Fixed(4)),
                    ("diameter", "diameter", Fixed(4)),
                ],
            )
            .with_unit_codes(
                "GEOMETRY-ALTITUDE-UNIT",
                &[
                    ("AU", "AU", Fixed(4)),
                    ("km", "km", Fixed(4)),
                    ("diameter", "diameter", Fixed(4)),
                    ("pc", "pc", Fixed(4)),
                ],
            )
            .with_unit("GEOMETRY-AZIMUTH", "deg", Fixed(3))
            .with_slot_units("GEOMETRY-USER-PARAMETER", &[("deg", Fixed(4)), ("km", Fixed(4))])
            .with_vocabulary("GEOMETRY-STELLAR-TYPE", STAR_TYPES)
            .with_unit("GEOMETRY-STELLAR-TEMPERATURE", "K", Fixed(1))
            // ATMOSPHERE
            .with_vocabulary("ATMOSPHERE-STRUCTURE", &["None", "Equilibrium", "Coma"])
            .with_unit_codes(
                "ATMOSPHERE-PUNIT",
                &[
                    ("bar", "bar", Scientific(4)),
                    ("mbar", "mbar", Scientific(4)),
                    ("kbar", "kbar", Scientific(4)),
                    ("Pa", "Pa", Scientific(4)),
                    ("atm", "atm", Scientific(4)),
                ],
            )
            .with_unit("ATMOSPHERE-TEMPERATURE", "K", Fixed(2))
            .with_unit_codes(
                "ATMOSPHERE-UNIT",
                &[
                    ("%", "%", Scientific(2)),
                    ("ppmv", "ppmv", Scientific(2)),
                    ("ppbv", "ppbv", Scientific(2)),
                    ("pptv", "pptv", Scientific(2)),
                    ("m-2", "m2", Scientific(2)),
                    ("scl", "scl", Scientific(2)),
                ],
            )
            .with_unit_codes(
                "ATMOSPHERE-AUNIT",
                &[
                    ("%", "%", Scientific(2)),
                    ("ppmv", "ppmv", Scientific(2)),
                    ("ppbv", "ppbv", Scientific(2)),
                    ("pptv", "pptv", Scientific(2)),
                    ("m-2", "m2", Scientific(2)),
                    ("scl", "scl", Scientific(2)),
                ],
            )
            .with_unit_codes(
                "ATMOSPHERE-ASUNI",
                &[
                    ("um", "um", Scientific(2)),
                    ("m", "m", Scientific(2)),
                    ("scl", "scl", Scientific(2)),
                ],
            )
            // SURFACE
            .with_unit("SURFACE-TEMPERATURE", "K", Fixed(2))
            .with_unit("SURFACE-ALBEDO-WAVE", "um", Fixed(4))
            // GENERATOR
            .with_unit_codes("GENERATOR-RANGEUNIT", &wave)
            .with_unit_codes("GENERATOR-RESOLUTIONUNIT", &resolution)
            .with_vocabulary(
                "GENERATOR-TELESCOPE",
                &["SINGLE", "ARRAY", "CORONA", "AOTF", "LIDAR"],
            )
            .with_unit("GENERATOR-DIAMTELE", "m", Fixed(3))
            .with_unit_codes(
                "GENERATOR-BEAM-UNIT",
                &[
                    ("arcsec", "arcsec", Fixed(4)),
                    ("arcmin", "arcmin", Fixed(4)),
                    ("deg", "deg", Fixed(4)),
                    ("km", "km", Fixed(4)),
                    ("diameter", "diameter", Fixed(4)),
                    ("diffrac", "diffrac", Fixed(4)),
                ],
            )
            .with_vocabulary(
                "GENERATOR-NOISE",
                &["NO", "TRX", "RMS", "BKG", "NEP", "D*", "CCD"],
            )
            .with_unit("GENERATOR-NOISETIME", "s", Fixed(3))
            .with_unit("GENERATOR-NOISEOTEMP", "K", Fixed(2))
            .with_unit_codes(
                "GENERATOR-RADUNITS",
                &[
                    ("W sr-1 m-2 um-1", "Wsrm2um", Fixed(4)),
                    ("W sr-1 m-2 cm-1", "Wsrm2cm", Fixed(4)),
                    ("W sr-1 m-2 Hz-1", "Wsrm2Hz", Fixed(4)),
                    ("Jy arcsec-2", "Jyarc", Fixed(4)),
                    ("K", "K", Fixed(4)),
                    ("W sr-1 m-2", "Wsrm2", Fixed(4)),
                    ("W sr-1 um-1", "Wsrum", Fixed(4)),
                    ("W sr-1 cm-1", "Wsrcm", Fixed(4)),
                    ("W sr-1", "Wsr", Fixed(4)),
                    ("W um-1", "Wum", Fixed(4)),
                    ("W cm-1", "Wcm", Fixed(4)),
                    ("W", "W", Fixed(4)),
                    ("ph s-1", "ph", Fixed(4)),
                    ("W m-2", "Wm2", Fixed(4)),
                    ("erg s-1 cm-2", "erg", Fixed(4)),
                    ("W m-2 um-1", "Wm2um", Fixed(4)),
                    ("W m-2 cm-1", "Wm2cm", Fixed(4)),
                    ("Jy", "Jy", Fixed(4)),
                    ("mJy", "mJy", Fixed(4)),
                    ("", "rel", Fixed(4)),
                    ("mag", "V", Fixed(4)),
                ],
            )
    }
}
