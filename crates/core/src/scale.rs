//! Scale setting: pixels-per-unit factor, display unit and display scale
//!
//! The display scale follows the "100 content pixels equal N units"
//! convention, so `scale == 100 / pixels_per_unit` holds after every write.

use crate::error::ScaleError;
use crate::units::{convert_area, convert_distance, Unit};

/// Content pixels covered by one display-scale step
pub const DISPLAY_SCALE_PIXELS: f64 = 100.0;

/// Calibration factor and unit shared by every measurement in a store
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSetting {
    pixels_per_unit: f64,
    unit: Unit,
    scale: f64,
}

impl Default for ScaleSetting {
    fn default() -> Self {
        Self {
            pixels_per_unit: 100.0,
            unit: Unit::Cm,
            scale: 1.0,
        }
    }
}

impl ScaleSetting {
    /// Create a scale setting from a pixels-per-unit factor
    pub fn new(pixels_per_unit: f64, unit: Unit) -> Result<Self, ScaleError> {
        validate(pixels_per_unit)?;
        Ok(Self {
            pixels_per_unit,
            unit,
            scale: DISPLAY_SCALE_PIXELS / pixels_per_unit,
        })
    }

    /// Create a scale setting from a display scale value
    pub fn from_display_scale(scale: f64, unit: Unit) -> Result<Self, ScaleError> {
        validate(scale)?;
        Self::new(DISPLAY_SCALE_PIXELS / scale, unit)
    }

    /// Pixels per unit (content pixels per meter-equivalent)
    pub fn pixels_per_unit(&self) -> f64 {
        self.pixels_per_unit
    }

    /// Display unit
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Display scale (`100 / pixels_per_unit`)
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Replace the pixels-per-unit factor, recomputing the display scale
    pub fn set_pixels_per_unit(&mut self, pixels_per_unit: f64) -> Result<(), ScaleError> {
        validate(pixels_per_unit)?;
        self.pixels_per_unit = pixels_per_unit;
        self.scale = DISPLAY_SCALE_PIXELS / pixels_per_unit;
        Ok(())
    }

    /// Replace the display scale, recomputing the pixels-per-unit factor
    pub fn set_scale(&mut self, scale: f64) -> Result<(), ScaleError> {
        validate(scale)?;
        let pixels_per_unit = DISPLAY_SCALE_PIXELS / scale;
        validate(pixels_per_unit)?;
        self.scale = scale;
        self.pixels_per_unit = pixels_per_unit;
        Ok(())
    }

    /// Replace the display unit without touching the factor
    pub fn set_unit(&mut self, unit: Unit) {
        self.unit = unit;
    }

    /// Convert a content-pixel length into the display unit
    pub fn to_real_distance(&self, pixel_distance: f64) -> f64 {
        convert_distance(pixel_distance / self.pixels_per_unit, Unit::M, self.unit)
    }

    /// Convert a square-content-pixel area into the display unit
    pub fn to_real_area(&self, pixel_area: f64) -> f64 {
        let square_meters = pixel_area / (self.pixels_per_unit * self.pixels_per_unit);
        convert_area(square_meters, Unit::M, self.unit)
    }
}

fn validate(value: f64) -> Result<(), ScaleError> {
    if !value.is_finite() {
        return Err(ScaleError::NotFinite);
    }
    if value <= 0.0 {
        return Err(ScaleError::NonPositive(value));
    }
    Ok(())
}
