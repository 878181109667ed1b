//! CSV export for committed measurements
//!
//! Produces one row per measurement for spreadsheets and quantity
//! take-off reports.

use crate::geometry::Point;
use crate::measurement::{Measurement, ShapeKind};
use crate::persistence::MeasurementSet;
use crate::units::{format_area_unit, Unit};
use std::io::Write;

/// Error types for CSV export
#[derive(Debug, thiserror::Error)]
pub enum CsvExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),
}

pub type CsvExportResult<T> = Result<T, CsvExportError>;

/// Configuration for CSV export
#[derive(Debug, Clone)]
pub struct CsvExportConfig {
    /// Include column headers in the output
    pub include_headers: bool,

    /// CSV delimiter character
    pub delimiter: u8,

    /// Only export shapes of this kind (None = all)
    pub kind_filter: Option<ShapeKind>,
}

impl Default for CsvExportConfig {
    fn default() -> Self {
        Self {
            include_headers: true,
            delimiter: b',',
            kind_filter: None,
        }
    }
}

/// Export measurements to CSV format
///
/// CSV columns:
/// - Index: 1-based position in commit order
/// - ID: Unique measurement identifier
/// - Kind: `line` or `polygon`
/// - Points: Content-space vertices as `(x,y)` joined by `;`
/// - Distance: Real-world length (lines only)
/// - Area: Real-world area (polygons only)
/// - Unit: Unit symbol (`sq in` style for areas)
/// - Label: Formatted value with unit
pub fn export_measurements_csv<W: Write>(
    writer: W,
    measurements: &[Measurement],
    unit: Unit,
    config: &CsvExportConfig,
) -> CsvExportResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(config.include_headers)
        .from_writer(writer);

    if config.include_headers {
        csv_writer.write_record([
            "Index", "ID", "Kind", "Points", "Distance", "Area", "Unit", "Label",
        ])?;
    }

    let rows = measurements
        .iter()
        .enumerate()
        .filter(|(_, m)| config.kind_filter.map_or(true, |kind| m.kind() == kind));

    for (index, measurement) in rows {
        let (distance, area, unit_label) = match measurement.kind() {
            ShapeKind::Line => (
                format!("{:.4}", measurement.distance()),
                String::new(),
                unit.symbol().to_string(),
            ),
            ShapeKind::Polygon => (
                String::new(),
                format!("{:.4}", measurement.area()),
                format_area_unit(unit),
            ),
        };

        csv_writer.write_record(&[
            (index + 1).to_string(),
            measurement.id().to_string(),
            kind_name(measurement.kind()).to_string(),
            format_points(measurement.points()),
            distance,
            area,
            unit_label,
            measurement.formatted_value(unit),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Export a whole measurement set using its stored unit
pub fn export_set_csv<W: Write>(
    writer: W,
    set: &MeasurementSet,
    config: &CsvExportConfig,
) -> CsvExportResult<()> {
    export_measurements_csv(writer, &set.measurements, set.unit, config)
}

fn kind_name(kind: ShapeKind) -> &'static str {
    match kind {
        ShapeKind::Line => "line",
        ShapeKind::Polygon => "polygon",
    }
}

fn format_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("({:.2},{:.2})", p.x, p.y))
        .collect::<Vec<_>>()
        .join(";")
}
