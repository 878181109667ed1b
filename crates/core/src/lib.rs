//! Takeoff Core Library
//!
//! Geometry, units, measurement model, scale and undo/redo history for the
//! measurement engine. Everything here is synchronous and UI-agnostic.

pub mod config;
pub mod csv_export;
pub mod error;
pub mod geometry;
pub mod history;
pub mod measurement;
pub mod persistence;
pub mod scale;
pub mod store;
pub mod units;

pub use config::{ConfigError, EngineConfig, CLOSE_THRESHOLD};
pub use csv_export::{
    export_measurements_csv, export_set_csv, CsvExportConfig, CsvExportError, CsvExportResult,
};
pub use error::{
    CalibrationError, MeasurementError, PersistenceError, PersistenceResult, ScaleError,
};
pub use geometry::{distance_between, polygon_area, Point};
pub use history::{History, HistorySnapshot};
pub use measurement::{Measurement, MeasurementId, ShapeKind};
pub use persistence::{InMemoryRepository, MeasurementRepository, MeasurementSet};
pub use scale::{ScaleSetting, DISPLAY_SCALE_PIXELS};
pub use store::MeasurementStore;
pub use units::{
    convert_area, convert_distance, format_area, format_area_unit, format_measurement,
    parse_input_with_unit, Unit, UnknownUnit, UNITS,
};
