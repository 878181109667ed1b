//! Calibration dialog model
//!
//! Headless state for the "enter the real-world value" step that follows
//! tracing a calibration reference:
//! - Value input field (digits and one decimal separator)
//! - Unit selector (cycling through every unit, defaulting to the current one)
//! - Confirm/dismiss with validation errors kept on the dialog
//!
//! A rejected confirm leaves the dialog open with an error message; nothing
//! in the store changes until a confirm succeeds.

use crate::calibration::{CalibrationKind, CalibrationReference};
use takeoff_core::{parse_input_with_unit, CalibrationError, Unit, UNITS};

/// Result of a successful confirm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationResult {
    pub pixels_per_unit: f64,
    pub unit: Unit,
}

/// Calibration dialog for entering the known size of a reference
#[derive(Debug, Clone, Default)]
pub struct CalibrationDialog {
    /// Reference being calibrated; `Some` while the dialog is visible
    reference: Option<CalibrationReference>,

    /// Current value input text
    value_input: String,

    /// Currently selected unit index into [`UNITS`]
    selected_unit_index: usize,

    /// Last validation failure
    error: Option<CalibrationError>,
}

impl CalibrationDialog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the dialog for a finished reference, preselecting `default_unit`
    pub fn show(&mut self, reference: CalibrationReference, default_unit: Unit) {
        self.reference = Some(reference);
        self.value_input.clear();
        self.error = None;
        self.set_unit(default_unit);
    }

    /// Hide the dialog and drop its reference
    pub fn hide(&mut self) {
        self.reference = None;
        self.value_input.clear();
        self.error = None;
    }

    pub fn is_visible(&self) -> bool {
        self.reference.is_some()
    }

    pub fn reference(&self) -> Option<&CalibrationReference> {
        self.reference.as_ref()
    }

    pub fn kind(&self) -> Option<CalibrationKind> {
        self.reference.as_ref().map(CalibrationReference::kind)
    }

    pub fn value_input(&self) -> &str {
        &self.value_input
    }

    /// Replace the whole input text (paste or programmatic entry)
    pub fn set_value_input(&mut self, text: impl Into<String>) {
        self.value_input = text.into();
        self.error = None;
    }

    pub fn selected_unit(&self) -> Unit {
        UNITS[self.selected_unit_index]
    }

    pub fn set_unit(&mut self, unit: Unit) {
        if let Some(index) = UNITS.iter().position(|&u| u == unit) {
            self.selected_unit_index = index;
        }
    }

    /// Cycle to the next unit
    pub fn cycle_unit(&mut self) {
        self.selected_unit_index = (self.selected_unit_index + 1) % UNITS.len();
    }

    /// Append a character to the input (only digits and one decimal separator)
    pub fn append_char(&mut self, c: char) {
        let has_separator = self.value_input.contains(['.', ',']);
        let should_append = c.is_ascii_digit() || (matches!(c, '.' | ',') && !has_separator);
        if should_append {
            self.value_input.push(c);
            self.error = None;
        }
    }

    /// Remove the last character
    pub fn backspace(&mut self) {
        if self.value_input.pop().is_some() {
            self.error = None;
        }
    }

    pub fn clear_input(&mut self) {
        self.value_input.clear();
        self.error = None;
    }

    /// Parse the input into a value and unit
    ///
    /// Accepts a comma decimal separator. A unit typed after the number
    /// (`"12,5 ft"`) overrides the selector.
    pub fn parse_value(&self) -> Result<(f64, Unit), CalibrationError> {
        let text = self.value_input.trim();
        if text.is_empty() {
            return Err(CalibrationError::MissingValue);
        }

        let (value, typed_unit) = parse_input_with_unit(text);
        let value = value.ok_or_else(|| CalibrationError::InvalidNumber(text.to_string()))?;
        if value <= 0.0 {
            return Err(CalibrationError::NonPositiveValue(value));
        }

        let has_suffix = text.chars().any(|c| c.is_ascii_alphabetic());
        let unit = if has_suffix {
            typed_unit
        } else {
            self.selected_unit()
        };
        Ok((value, unit))
    }

    /// Validate the input and solve for the new scale
    ///
    /// On failure the error is kept for display and the dialog stays open.
    pub fn confirm(&mut self) -> Result<CalibrationResult, CalibrationError> {
        let result = self.try_confirm();
        if let Err(err) = &result {
            tracing::warn!(%err, "calibration input rejected");
            self.error = Some(err.clone());
        }
        result
    }

    fn try_confirm(&self) -> Result<CalibrationResult, CalibrationError> {
        let reference = self
            .reference
            .as_ref()
            .ok_or(CalibrationError::NotEnoughPoints {
                required: 2,
                actual: 0,
            })?;
        let (value, unit) = self.parse_value()?;
        let pixels_per_unit = reference.solve(value, unit)?;
        Ok(CalibrationResult {
            pixels_per_unit,
            unit,
        })
    }

    pub fn error(&self) -> Option<&CalibrationError> {
        self.error.as_ref()
    }

    /// Message for the current validation failure
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Prompt text shown above the input
    pub fn prompt(&self) -> Option<String> {
        let reference = self.reference.as_ref()?;
        Some(match reference.kind() {
            CalibrationKind::Distance => format!(
                "Enter the real-world length of the {:.1} px reference line",
                reference.pixel_extent()
            ),
            CalibrationKind::Area => format!(
                "Enter the real-world area of the {:.1} px² reference shape",
                reference.pixel_extent()
            ),
        })
    }
}
