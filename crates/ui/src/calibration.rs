//! Scale calibration from a drawn reference
//!
//! The user traces a reference of known size (a distance between two points
//! or a closed area) and enters its real-world value. The solver turns that
//! into a new pixels-per-unit factor:
//!
//! - distance: `ppu = pixel_distance / convert_distance(value, unit, px)`
//! - area: `ppu = sqrt(pixel_area / convert_area(value, unit, px))`
//!
//! `px` shares the meter's factor, so the result is content pixels per meter,
//! the same convention the store uses.

use takeoff_core::{
    convert_area, convert_distance, distance_between, polygon_area, CalibrationError, Point, Unit,
};

/// Which kind of reference is being traced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationKind {
    Distance,
    Area,
}

impl CalibrationKind {
    /// Points needed before the reference can be finished
    pub fn required_points(self) -> usize {
        match self {
            CalibrationKind::Distance => 2,
            CalibrationKind::Area => 3,
        }
    }
}

/// A finished reference shape, in content space
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationReference {
    kind: CalibrationKind,
    points: Vec<Point>,
}

impl CalibrationReference {
    /// Validate a traced reference
    ///
    /// Distance references measure from the first to the last point. Area
    /// references need three or more points and a non-zero enclosed area.
    pub fn new(kind: CalibrationKind, points: Vec<Point>) -> Result<Self, CalibrationError> {
        let required = kind.required_points();
        let distinct = match points.as_slice() {
            [first, .., last] if points.len() > 2 && first == last => points.len() - 1,
            _ => points.len(),
        };
        if distinct < required {
            return Err(CalibrationError::NotEnoughPoints {
                required,
                actual: distinct,
            });
        }

        let reference = Self { kind, points };
        if reference.pixel_extent() <= 0.0 {
            return Err(CalibrationError::DegenerateReference);
        }
        Ok(reference)
    }

    pub fn kind(&self) -> CalibrationKind {
        self.kind
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Pixel distance (first to last point) or pixel area, by kind
    pub fn pixel_extent(&self) -> f64 {
        match self.kind {
            CalibrationKind::Distance => match self.points.as_slice() {
                [first, .., last] => distance_between(first, last),
                _ => 0.0,
            },
            CalibrationKind::Area => polygon_area(&self.points),
        }
    }

    /// Solve for pixels per unit given the entered real-world value
    pub fn solve(&self, value: f64, unit: Unit) -> Result<f64, CalibrationError> {
        match self.kind {
            CalibrationKind::Distance => solve_distance(self.pixel_extent(), value, unit),
            CalibrationKind::Area => solve_area(self.pixel_extent(), value, unit),
        }
    }
}

/// Pixels per unit from a reference length
pub fn solve_distance(pixel_distance: f64, value: f64, unit: Unit) -> Result<f64, CalibrationError> {
    check_value(value)?;
    finite_positive(pixel_distance / convert_distance(value, unit, Unit::Px), unit)
}

/// Pixels per unit from a reference area
pub fn solve_area(pixel_area: f64, value: f64, unit: Unit) -> Result<f64, CalibrationError> {
    check_value(value)?;
    finite_positive((pixel_area / convert_area(value, unit, Unit::Px)).sqrt(), unit)
}

fn check_value(value: f64) -> Result<(), CalibrationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CalibrationError::NonPositiveValue(value));
    }
    Ok(())
}

fn finite_positive(pixels_per_unit: f64, unit: Unit) -> Result<f64, CalibrationError> {
    if pixels_per_unit.is_finite() && pixels_per_unit > 0.0 {
        Ok(pixels_per_unit)
    } else {
        Err(CalibrationError::InvalidScale { unit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_reference() {
        let reference = CalibrationReference::new(
            CalibrationKind::Distance,
            vec![Point::new(0.0, 0.0), Point::new(30.0, 40.0)],
        )
        .unwrap();
        assert_eq!(reference.pixel_extent(), 50.0);
        assert!((reference.solve(5.0, Unit::M).unwrap() - 10.0).abs() < 1e-12);
        assert!((reference.solve(500.0, Unit::Cm).unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_area_reference() {
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
            Point::new(0.0, 0.0),
        ];
        let reference = CalibrationReference::new(CalibrationKind::Area, square).unwrap();
        // 10 000 px² covering 4 m² means 50 px per meter
        assert!((reference.solve(4.0, Unit::M).unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_reference_validation() {
        assert_eq!(
            CalibrationReference::new(CalibrationKind::Distance, vec![Point::new(1.0, 1.0)]),
            Err(CalibrationError::NotEnoughPoints {
                required: 2,
                actual: 1
            })
        );
        assert_eq!(
            CalibrationReference::new(
                CalibrationKind::Distance,
                vec![Point::new(1.0, 1.0), Point::new(1.0, 1.0)]
            ),
            Err(CalibrationError::DegenerateReference)
        );

        let closed_pair = vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(0.0, 0.0)];
        assert!(matches!(
            CalibrationReference::new(CalibrationKind::Area, closed_pair),
            Err(CalibrationError::NotEnoughPoints { required: 3, actual: 2 })
        ));

        let collinear = vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(10.0, 0.0)];
        assert_eq!(
            CalibrationReference::new(CalibrationKind::Area, collinear),
            Err(CalibrationError::DegenerateReference)
        );
    }

    #[test]
    fn test_rejects_non_positive_value() {
        assert_eq!(
            solve_distance(50.0, 0.0, Unit::M),
            Err(CalibrationError::NonPositiveValue(0.0))
        );
        assert_eq!(
            solve_area(50.0, -2.0, Unit::M),
            Err(CalibrationError::NonPositiveValue(-2.0))
        );
        assert!(matches!(
            solve_distance(50.0, f64::NAN, Unit::M),
            Err(CalibrationError::NonPositiveValue(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_result() {
        assert_eq!(
            solve_distance(0.0, 5.0, Unit::Ft),
            Err(CalibrationError::InvalidScale { unit: Unit::Ft })
        );
    }
}
