//! Base unit symbols understood by [`Unit::parse`](crate::Unit::parse).

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::OnceLock;

use crate::dimension::{Base, Dimension};

/// A registry entry: dimension plus scale relative to the coherent base unit.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Entry {
    pub dimension: Dimension,
    pub scale: f64,
}

fn d(base: Base) -> Dimension {
    Dimension::base(base)
}

fn energy() -> Dimension {
    d(Base::Mass)
        .mul(d(Base::Length).powi(2))
        .mul(d(Base::Time).powi(-2))
}

fn power() -> Dimension {
    energy().mul(d(Base::Time).powi(-1))
}

fn pressure() -> Dimension {
    d(Base::Mass)
        .mul(d(Base::Length).powi(-1))
        .mul(d(Base::Time).powi(-2))
}

fn spectral_flux_density() -> Dimension {
    // W m-2 Hz-1
    power().mul(d(Base::Length).powi(-2)).mul(d(Base::Time))
}

fn table() -> HashMap<&'static str, Entry> {
    let length = d(Base::Length);
    let mass = d(Base::Mass);
    let time = d(Base::Time);
    let angle = d(Base::Angle);
    let freq = time.powi(-1);
    let none = Dimension::none();

    let rows: Vec<(&'static str, Dimension, f64)> = vec![
        ("m", length, 1.0),
        ("km", length, 1e3),
        ("cm", length, 1e-2),
        ("mm", length, 1e-3),
        ("um", length, 1e-6),
        ("micron", length, 1e-6),
        ("nm", length, 1e-9),
        ("An", length, 1e-10),
        ("AU", length, 1.495_978_707e11),
        ("pc", length, 3.085_677_581_491_367e16),
        ("R_sun", length, 6.957e8),
        ("R_earth", length, 6.378_1e6),
        ("R_jup", length, 7.149_2e7),
        ("g", mass, 1e-3),
        ("kg", mass, 1.0),
        ("s", time, 1.0),
        ("min", time, 60.0),
        ("h", time, 3_600.0),
        ("day", time, 86_400.0),
        ("yr", time, 3.155_76e7),
        ("K", d(Base::Temperature), 1.0),
        ("rad", angle, 1.0),
        ("deg", angle, PI / 180.0),
        ("arcmin", angle, PI / 10_800.0),
        ("arcsec", angle, PI / 648_000.0),
        ("sr", d(Base::SolidAngle), 1.0),
        ("Hz", freq, 1.0),
        ("kHz", freq, 1e3),
        ("MHz", freq, 1e6),
        ("GHz", freq, 1e9),
        ("J", energy(), 1.0),
        ("erg", energy(), 1e-7),
        ("W", power(), 1.0),
        ("Jy", spectral_flux_density(), 1e-26),
        ("mJy", spectral_flux_density(), 1e-29),
        ("Pa", pressure(), 1.0),
        ("bar", pressure(), 1e5),
        ("mbar", pressure(), 1e2),
        ("ubar", pressure(), 1e-1),
        ("kbar", pressure(), 1e8),
        ("atm", pressure(), 101_325.0),
        ("ph", d(Base::Photon), 1.0),
        ("%", none, 1e-2),
        ("ppm", none, 1e-6),
        ("ppmv", none, 1e-6),
        ("ppb", none, 1e-9),
        ("ppbv", none, 1e-9),
        ("ppt", none, 1e-12),
        ("pptv", none, 1e-12),
        ("scl", none, 1.0),
        ("diameter", d(Base::Diameter), 1.0),
        ("mag", d(Base::Magnitude), 1.0),
        ("RP", d(Base::ResolvingPower), 1.0),
        ("diffrac", d(Base::Diffraction), 1.0),
    ];
    rows.into_iter()
        .map(|(sym, dimension, scale)| (sym, Entry { dimension, scale }))
        .collect()
}

pub(crate) fn lookup(symbol: &str) -> Option<Entry> {
    static TABLE: OnceLock<HashMap<&'static str, Entry>> = OnceLock::new();
    TABLE.get_or_init(table).get(symbol).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_and_unknown() {
        let km = lookup("km").expect("km");
        assert_eq!(km.dimension, Dimension::base(Base::Length));
        assert_eq!(km.scale, 1e3);
        assert!(lookup("furlong").is_none());
    }

    #[test]
    fn jansky_is_flux_density() {
        let jy = lookup("Jy").expect("Jy");
        assert_eq!(jy.dimension.exponent(Base::Mass), 1);
        assert_eq!(jy.dimension.exponent(Base::Time), -2);
        assert_eq!(jy.dimension.exponent(Base::Length), 0);
    }
}
