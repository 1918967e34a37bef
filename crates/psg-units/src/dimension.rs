//! Dimension vectors over the base quantities PSG distinguishes.

use std::fmt;

/// Number of base dimensions tracked by [`Dimension`].
pub const BASE_COUNT: usize = 11;

/// Base dimensions.
///
/// The last four are PSG pseudo-dimensions: values expressed in planet
/// diameters, magnitudes, resolving power or diffraction units cannot be
/// converted to anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Base {
    Length,
    Mass,
    Time,
    Temperature,
    Angle,
    SolidAngle,
    Photon,
    Diameter,
    Magnitude,
    ResolvingPower,
    Diffraction,
}

impl Base {
    pub const ALL: [Base; BASE_COUNT] = [
        Self::Length,
        Self::Mass,
        Self::Time,
        Self::Temperature,
        Self::Angle,
        Self::SolidAngle,
        Self::Photon,
        Self::Diameter,
        Self::Magnitude,
        Self::ResolvingPower,
        Self::Diffraction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::Mass => "mass",
            Self::Time => "time",
            Self::Temperature => "temperature",
            Self::Angle => "angle",
            Self::SolidAngle => "solid angle",
            Self::Photon => "photon",
            Self::Diameter => "diameter",
            Self::Magnitude => "magnitude",
            Self::ResolvingPower => "resolving power",
            Self::Diffraction => "diffraction",
        }
    }
}

/// Integer exponents over [`Base`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension([i8; BASE_COUNT]);

impl Dimension {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn base(base: Base) -> Self {
        let mut exps = [0; BASE_COUNT];
        exps[base as usize] = 1;
        Self(exps)
    }

    pub fn exponent(&self, base: Base) -> i8 {
        self.0[base as usize]
    }

    pub fn is_dimensionless(&self) -> bool {
        self.0.iter().all(|e| *e == 0)
    }

    pub fn mul(self, other: Dimension) -> Self {
        let mut exps = self.0;
        for (e, o) in exps.iter_mut().zip(other.0) {
            *e += o;
        }
        Self(exps)
    }

    pub fn powi(self, n: i8) -> Self {
        let mut exps = self.0;
        for e in exps.iter_mut() {
            *e *= n;
        }
        Self(exps)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return f.write_str("dimensionless");
        }
        let mut first = true;
        for base in Base::ALL {
            let exp = self.exponent(base);
            if exp == 0 {
                continue;
            }
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            f.write_str(base.as_str())?;
            if exp != 1 {
                write!(f, "^{exp}")?;
            }
        }
        Ok(())
    }
}
