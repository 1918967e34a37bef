//! Unit parsing and conversion matrix.

use proptest::prelude::*;
use psg_units::{Base, Quantity, Unit, UnitError};

fn u(s: &str) -> Unit {
    Unit::parse(s).expect("unit must parse")
}

// ---------------------------------------------------------------------------
// Canonical conversions used by the PSG catalog
// ---------------------------------------------------------------------------

#[test]
fn units_matrix_canonical_conversions() {
    let cases: &[(&str, f64, &str, f64)] = &[
        ("AU", 1.0, "km", 1.495_978_707e8),
        ("m", 1.0, "km", 1e-3),
        ("arcmin", 60.0, "deg", 1.0),
        ("arcsec", 3600.0, "deg", 1.0),
        ("atm", 1.0, "bar", 1.013_25),
        ("mbar", 1000.0, "bar", 1.0),
        ("day", 1.0, "h", 24.0),
        ("m s-1", 1000.0, "km s-1", 1.0),
        ("GHz", 1.0, "MHz", 1000.0),
        ("%", 1.0, "ppmv", 1e4),
        ("W/m2/um", 1.0, "W m-2 um-1", 1.0),
        ("erg s-1 cm-2", 1000.0, "W m-2", 1.0),
    ];
    for (from, v, to, expected) in cases {
        let got = Quantity::new(*v, u(from)).to_value(&u(to)).expect("compatible");
        assert!(
            (got - expected).abs() <= 1e-9 * expected.abs(),
            "{v} {from} -> {to}: got {got}, expected {expected}"
        );
    }
}

#[test]
fn units_matrix_incompatible_pairs() {
    let pairs = [
        ("km", "s"),
        ("K", "deg"),
        ("deg", "sr"),
        ("km", "diameter"),
        ("arcsec", "diffrac"),
        ("um", "cm-1"),
        ("Jy", "W m-2"),
    ];
    for (from, to) in pairs {
        let err = u(from).conversion_factor(&u(to)).unwrap_err();
        assert!(
            matches!(err, UnitError::Incompatible { .. }),
            "{from} -> {to} must be incompatible"
        );
    }
}

#[test]
fn units_matrix_dimension_of_compound_units() {
    let w = u("W sr-1 m-2 um-1");
    assert_eq!(w.dimension().exponent(Base::Mass), 1);
    assert_eq!(w.dimension().exponent(Base::Length), -1);
    assert_eq!(w.dimension().exponent(Base::Time), -3);
    assert_eq!(w.dimension().exponent(Base::SolidAngle), -1);

    let density = u("g cm-3");
    assert_eq!(density.dimension().exponent(Base::Mass), 1);
    assert_eq!(density.dimension().exponent(Base::Length), -3);
    assert!((density.scale() - 1e3).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

const LENGTHS: &[&str] = &["m", "km", "cm", "mm", "um", "nm", "An", "AU", "pc"];

proptest! {
    #[test]
    fn units_matrix_conversion_is_invertible(
        v in -1.0e6f64..1.0e6,
        a in 0..LENGTHS.len(),
        b in 0..LENGTHS.len(),
    ) {
        let from = u(LENGTHS[a]);
        let to = u(LENGTHS[b]);
        let there = Quantity::new(v, from.clone()).to(&to).unwrap();
        let back = there.to_value(&from).unwrap();
        prop_assert!((back - v).abs() <= 1e-9 * v.abs().max(1.0));
    }

    #[test]
    fn units_matrix_inverted_terms_match_negative_exponents(
        num in 0..LENGTHS.len(),
        den in 0..LENGTHS.len(),
    ) {
        let slash = u(&format!("{}/{}", LENGTHS[num], LENGTHS[den]));
        let exp = u(&format!("{} {}-1", LENGTHS[num], LENGTHS[den]));
        prop_assert_eq!(slash, exp);
    }
}
