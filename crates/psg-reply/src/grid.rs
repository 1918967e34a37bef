//! Binary GCM grids carried in `BINARY` segments.
//!
//! The layout is described by the `ATMOSPHERE-GCM-PARAMETERS` value:
//! `nlon,nlat,nlayer,lon0,lat0,dlon,dlat,Var1,Var2,...`. The body is the
//! variables' little-endian `f32` data, concatenated in header order.

use std::fmt;
use std::str::FromStr;

use crate::error::ReplyError;

/// Variables stored as two 3-D blocks.
const DOUBLE: &[&str] = &["Winds"];
/// Variables stored as a single 2-D layer.
const FLAT: &[&str] = &["Tsurf", "Psurf", "Albedo", "Emissivity"];

const SIZE_SUFFIX: &str = "_size";

#[derive(Debug, Clone, PartialEq)]
pub struct GcmHeader {
    pub nlon: usize,
    pub nlat: usize,
    pub nlayer: usize,
    pub lon0: f64,
    pub lat0: f64,
    pub dlon: f64,
    pub dlat: f64,
    pub variables: Vec<String>,
}

fn coord<T: FromStr>(fields: &[&str], i: usize, what: &str) -> Result<T, ReplyError> {
    let raw = fields
        .get(i)
        .ok_or_else(|| ReplyError::grid(format!("header has no {what}")))?;
    raw.trim()
        .parse()
        .map_err(|_| ReplyError::grid(format!("{what} `{raw}` is not a number")))
}

impl GcmHeader {
    pub fn parse(text: &str) -> Result<Self, ReplyError> {
        let fields: Vec<&str> = text.trim().split(',').collect();
        let header = Self {
            nlon: coord(&fields, 0, "nlon")?,
            nlat: coord(&fields, 1, "nlat")?,
            nlayer: coord(&fields, 2, "nlayer")?,
            lon0: coord(&fields, 3, "lon0")?,
            lat0: coord(&fields, 4, "lat0")?,
            dlon: coord(&fields, 5, "dlon")?,
            dlat: coord(&fields, 6, "dlat")?,
            variables: fields
                .iter()
                .skip(7)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect(),
        };
        if header.nlon == 0 || header.nlat == 0 || header.nlayer == 0 {
            return Err(ReplyError::grid("grid dimensions must be positive"));
        }
        if header.checked_total().and_then(|n| n.checked_mul(4)).is_none() {
            return Err(ReplyError::grid(format!(
                "header `{}` describes more values than can be addressed",
                text.trim()
            )));
        }
        Ok(header)
    }

    pub fn lons(&self) -> Vec<f64> {
        (0..self.nlon).map(|i| self.lon0 + i as f64 * self.dlon).collect()
    }

    pub fn lats(&self) -> Vec<f64> {
        (0..self.nlat).map(|i| self.lat0 + i as f64 * self.dlat).collect()
    }

    /// Row-major shape of `var`: `[nlon, nlat]`, `[nlayer, nlon, nlat]` or
    /// `[2, nlayer, nlon, nlat]`.
    pub fn shape(&self, var: &str) -> Vec<usize> {
        if DOUBLE.contains(&var) {
            vec![2, self.nlayer, self.nlon, self.nlat]
        } else if FLAT.contains(&var) {
            vec![self.nlon, self.nlat]
        } else {
            vec![self.nlayer, self.nlon, self.nlat]
        }
    }

    /// Number of `f32` values `var` occupies. Saturates for headers not
    /// built through [`GcmHeader::parse`].
    pub fn size(&self, var: &str) -> usize {
        self.shape(var).iter().fold(1, |acc: usize, n| acc.saturating_mul(*n))
    }

    /// Total number of values the header describes.
    pub fn total(&self) -> usize {
        self.variables
            .iter()
            .fold(0, |acc: usize, v| acc.saturating_add(self.size(v)))
    }

    fn checked_total(&self) -> Option<usize> {
        self.variables.iter().try_fold(0usize, |acc, v| {
            let size = self
                .shape(v)
                .iter()
                .try_fold(1usize, |acc, n| acc.checked_mul(*n))?;
            acc.checked_add(size)
        })
    }

    /// Aerosol names: variables `X` for which `X_size` is also present.
    pub fn aerosols(&self) -> Vec<&str> {
        self.variables
            .iter()
            .filter(|v| {
                let sized = format!("{v}{SIZE_SUFFIX}");
                self.variables.iter().any(|o| o.as_str() == sized)
            })
            .map(String::as_str)
            .collect()
    }

    fn offset(&self, var: &str) -> Option<usize> {
        let mut start = 0;
        for v in &self.variables {
            if v == var {
                return Some(start);
            }
            start = start.saturating_add(self.size(v));
        }
        None
    }
}

impl fmt::Display for GcmHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{}",
            self.nlon, self.nlat, self.nlayer, self.lon0, self.lat0, self.dlon, self.dlat
        )?;
        for v in &self.variables {
            write!(f, ",{v}")?;
        }
        Ok(())
    }
}

/// One variable's slice of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Variable<'a> {
    pub name: &'a str,
    pub values: &'a [f32],
}

#[derive(Debug, Clone, PartialEq)]
pub struct GcmGrid {
    header: GcmHeader,
    data: Vec<f32>,
}

impl GcmGrid {
    pub fn new(header: GcmHeader, data: Vec<f32>) -> Result<Self, ReplyError> {
        if header.checked_total() != Some(data.len()) {
            return Err(ReplyError::grid(format!(
                "header describes {} values, body holds {}",
                header.total(),
                data.len()
            )));
        }
        Ok(Self { header, data })
    }

    pub fn from_bytes(header: GcmHeader, bytes: &[u8]) -> Result<Self, ReplyError> {
        if bytes.len() % 4 != 0 {
            return Err(ReplyError::grid(format!(
                "body length {} is not a multiple of 4",
                bytes.len()
            )));
        }
        let data = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self::new(header, data)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    pub fn header(&self) -> &GcmHeader {
        &self.header
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn variable(&self, name: &str) -> Option<Variable<'_>> {
        let start = self.header.offset(name)?;
        let end = start + self.header.size(name);
        let name = self.header.variables.iter().find(|v| *v == name)?;
        Some(Variable {
            name,
            values: &self.data[start..end],
        })
    }

    /// Overwrites `name`'s values; the length must match its shape.
    pub fn set_variable(&mut self, name: &str, values: &[f32]) -> Result<(), ReplyError> {
        let start = self
            .header
            .offset(name)
            .ok_or_else(|| ReplyError::grid(format!("no variable `{name}`")))?;
        let size = self.header.size(name);
        if values.len() != size {
            return Err(ReplyError::grid(format!(
                "`{name}` holds {size} values, got {}",
                values.len()
            )));
        }
        self.data[start..start + size].copy_from_slice(values);
        Ok(())
    }

    /// Renames a variable. The new name must keep the variable's layout
    /// and must not already be in use.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), ReplyError> {
        if old != new && self.header.variables.iter().any(|v| v == new) {
            return Err(ReplyError::grid(format!("variable `{new}` already exists")));
        }
        if self.header.shape(old) != self.header.shape(new) {
            return Err(ReplyError::grid(format!(
                "`{old}` and `{new}` have different layouts"
            )));
        }
        let slot = self
            .header
            .variables
            .iter_mut()
            .find(|v| *v == old)
            .ok_or_else(|| ReplyError::grid(format!("no variable `{old}`")))?;
        *slot = new.to_string();
        Ok(())
    }

    /// Drops `name` and its data. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(start) = self.header.offset(name) else {
            return false;
        };
        let size = self.header.size(name);
        self.data.drain(start..start + size);
        self.header.variables.retain(|v| v != name);
        true
    }
}
