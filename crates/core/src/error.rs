//! Error types shared across the measurement engine

use crate::measurement::ShapeKind;
use crate::units::Unit;

/// Rejected write to the scale setting
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScaleError {
    #[error("pixels per unit must be positive, got {0}")]
    NonPositive(f64),

    #[error("scale value is not a finite number")]
    NotFinite,
}

/// Rejected calibration input
///
/// The store is never mutated when one of these is produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibrationError {
    #[error("enter a real-world value")]
    MissingValue,

    #[error("'{0}' is not a number")]
    InvalidNumber(String),

    #[error("the real-world value must be greater than zero")]
    NonPositiveValue(f64),

    #[error("reference needs at least {required} points, got {actual}")]
    NotEnoughPoints { required: usize, actual: usize },

    #[error("the reference shape has no extent")]
    DegenerateReference,

    #[error("calibration would produce an invalid scale for {unit}")]
    InvalidScale { unit: Unit },
}

/// Stored measurement that does not describe a line or polygon
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeasurementError {
    #[error("{kind:?} needs at least {required} distinct points, got {actual}")]
    TooFewPoints {
        kind: ShapeKind,
        required: usize,
        actual: usize,
    },
}

/// Failure reported by a persistence collaborator
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("persistence unavailable: {0}")]
    Unavailable(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
