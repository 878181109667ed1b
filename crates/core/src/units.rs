//! Linear units and conversions
//!
//! Every unit carries a factor expressed as "units per meter". Pixel values
//! divided by the pixels-per-unit factor are treated as meters before being
//! converted into the display unit, so `px` shares the meter's factor of 1.

use std::fmt;
use std::str::FromStr;

/// Enumerated linear units supported by the measurement engine
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Pseudo-unit meaning "no real-world scale"
    Px,
    Mm,
    #[default]
    Cm,
    M,
    Km,
    In,
    Ft,
    Yd,
    Mi,
}

/// All units in display order
pub const UNITS: [Unit; 9] = [
    Unit::Px,
    Unit::Mm,
    Unit::Cm,
    Unit::M,
    Unit::Km,
    Unit::In,
    Unit::Ft,
    Unit::Yd,
    Unit::Mi,
];

impl Unit {
    /// Units per meter
    pub fn factor(self) -> f64 {
        match self {
            Unit::Px => 1.0,
            Unit::Mm => 1000.0,
            Unit::Cm => 100.0,
            Unit::M => 1.0,
            Unit::Km => 0.001,
            Unit::In => 39.3701,
            Unit::Ft => 3.28084,
            Unit::Yd => 1.09361,
            Unit::Mi => 0.000621371,
        }
    }

    /// Short symbol used in labels and serialized data
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Px => "px",
            Unit::Mm => "mm",
            Unit::Cm => "cm",
            Unit::M => "m",
            Unit::Km => "km",
            Unit::In => "in",
            Unit::Ft => "ft",
            Unit::Yd => "yd",
            Unit::Mi => "mi",
        }
    }

    /// Whether this unit carries a real-world meaning
    pub fn is_physical(self) -> bool {
        self != Unit::Px
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Returned when a unit name is not one of [`UNITS`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown unit: {0}")]
pub struct UnknownUnit(pub String);

impl FromStr for Unit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        UNITS
            .iter()
            .copied()
            .find(|unit| unit.symbol() == lower)
            .ok_or_else(|| UnknownUnit(s.to_string()))
    }
}

/// Convert a linear value between units
pub fn convert_distance(value: f64, from: Unit, to: Unit) -> f64 {
    value * (to.factor() / from.factor())
}

/// Convert an area value between units (square of the linear ratio)
pub fn convert_area(value: f64, from: Unit, to: Unit) -> f64 {
    let ratio = to.factor() / from.factor();
    value * ratio * ratio
}

/// Format a linear value for display, e.g. `"12.50 cm"`
pub fn format_measurement(value: f64, unit: Unit) -> String {
    format!("{:.2} {}", value, unit)
}

/// Suffix used for area values
pub fn format_area_unit(unit: Unit) -> String {
    match unit {
        Unit::In => "sq in".to_string(),
        other => format!("{}²", other),
    }
}

/// Format an area value for display, e.g. `"3.00 m²"`
pub fn format_area(value: f64, unit: Unit) -> String {
    format!("{:.2} {}", value, format_area_unit(unit))
}

/// Parse free-form input such as `"12.5"`, `"12,5 cm"` or `"3ft"`
///
/// Returns `None` for the value when the text is not a non-negative decimal
/// number. The unit defaults to meters when absent or unrecognised.
pub fn parse_input_with_unit(input: &str) -> (Option<f64>, Unit) {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(split);
    let suffix = suffix.trim();

    if !suffix.chars().all(|c| c.is_ascii_alphabetic()) {
        return (None, Unit::M);
    }

    let value = parse_decimal(number);
    let unit = if suffix.is_empty() {
        Unit::M
    } else {
        suffix.parse().unwrap_or(Unit::M)
    };

    (value, unit)
}

/// Strict decimal: digits, optionally one separator (`.` or `,`) followed by digits
fn parse_decimal(text: &str) -> Option<f64> {
    let normalized = text.replacen(',', ".", 1);
    let mut parts = normalized.splitn(2, '.');
    let whole = parts.next()?;
    let fraction = parts.next();

    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if let Some(fraction) = fraction {
        if fraction.is_empty() || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }

    normalized.parse().ok()
}
