//! Number rendering and line syntax of the configuration text.

use serde::{Deserialize, Serialize};

/// Date/time layout used by every date field.
pub const DATE_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Token written for an empty list or table.
pub const ABSENT_TOKEN: &str = "None";

/// Delimiter between list elements and table records.
pub const LIST_DELIMITER: char = ',';

/// How a floating-point value is rendered for one key.
///
/// The rendering is pinned per key so repeated serialization is
/// byte-identical and decode → encode reproduces the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    /// `{:.p}`: `0.50`, `-12.000`.
    Fixed(u8),
    /// printf `%.pe`: `1.23e+03`, `5.00e-07`.
    Scientific(u8),
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::Fixed(2)
    }
}

impl NumberFormat {
    pub fn format(self, value: f64) -> String {
        match self {
            Self::Fixed(p) => format!("{:.*}", p as usize, value),
            Self::Scientific(p) => format_scientific(value, p as usize),
        }
    }
}

fn format_scientific(value: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, value);
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        // inf / NaN
        None => raw,
    }
}

/// Parses a finite float the way the service writes them.
pub(crate) fn parse_float(raw: &str) -> Result<f64, String> {
    let v: f64 = raw
        .trim()
        .parse()
        .map_err(|_| "not a number".to_string())?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err("not a finite number".to_string())
    }
}

// ---------------------------------------------------------------------------
// Line syntax
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    /// `KEY=VALUE`
    #[default]
    Equals,
    /// `<KEY>VALUE`
    Tagged,
}

/// Line syntax plus line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFormat {
    pub syntax: Syntax,
    pub terminator: String,
}

impl Default for TextFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl TextFormat {
    pub fn new() -> Self {
        Self {
            syntax: Syntax::Equals,
            terminator: "\n".to_string(),
        }
    }

    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn with_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = terminator.into();
        self
    }

    pub fn render_line(&self, key: &str, value: &str) -> String {
        match self.syntax {
            Syntax::Equals => format!("{key}={value}"),
            Syntax::Tagged => format!("<{key}>{value}"),
        }
    }

    /// Splits one line into key and value; `None` when the separator is
    /// missing or the key is empty.
    pub fn split_line<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let (key, value) = match self.syntax {
            Syntax::Equals => line.split_once('=')?,
            Syntax::Tagged => line.strip_prefix('<')?.split_once('>')?,
        };
        let key = key.trim();
        if key.is_empty() {
            None
        } else {
            Some((key, value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_formatting() {
        assert_eq!(NumberFormat::Fixed(2).format(0.5), "0.50");
        assert_eq!(NumberFormat::Fixed(3).format(-12.0), "-12.000");
        assert_eq!(NumberFormat::Fixed(0).format(7.4), "7");
    }

    #[test]
    fn scientific_formatting_is_printf_style() {
        assert_eq!(NumberFormat::Scientific(2).format(1234.0), "1.23e+03");
        assert_eq!(NumberFormat::Scientific(2).format(5e-7), "5.00e-07");
        assert_eq!(NumberFormat::Scientific(6).format(0.0), "0.000000e+00");
        assert_eq!(NumberFormat::Scientific(1).format(-2.5e120), "-2.5e+120");
    }

    #[test]
    fn formatted_numbers_reparse_to_same_text() {
        for fmt in [NumberFormat::Fixed(2), NumberFormat::Scientific(3)] {
            for v in [0.1, 1.0 / 3.0, 299_792.458, -6.02e23] {
                let text = fmt.format(v);
                let again = fmt.format(parse_float(&text).unwrap());
                assert_eq!(text, again);
            }
        }
    }

    #[test]
    fn parse_float_rejects_non_finite() {
        assert!(parse_float("inf").is_err());
        assert!(parse_float("NaN").is_err());
        assert!(parse_float("1,5").is_err());
        assert_eq!(parse_float(" 2.5 ").unwrap(), 2.5);
    }

    #[test]
    fn split_line_per_syntax() {
        let eq = TextFormat::new();
        assert_eq!(eq.split_line("A-B=x=y"), Some(("A-B", "x=y")));
        assert_eq!(eq.split_line("=x"), None);
        assert_eq!(eq.split_line("novalue"), None);

        let tagged = TextFormat::new().with_syntax(Syntax::Tagged);
        assert_eq!(tagged.split_line("<OBJECT>Planet"), Some(("OBJECT", "Planet")));
        assert_eq!(tagged.render_line("OBJECT", "Planet"), "<OBJECT>Planet");
        assert_eq!(tagged.split_line("OBJECT=Planet"), None);
    }
}
