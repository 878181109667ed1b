//! Committed measurement shapes
//!
//! A measurement is either a line (two distinct vertices) or a polygon
//! (three or more distinct vertices forming a closed ring). The kind is
//! decided once at commit time and stored, never re-inferred from the
//! point count.

use crate::error::MeasurementError;
use crate::geometry::{distance_between, point_near_segment, polygon_area, Point};
use crate::scale::ScaleSetting;
use crate::units::{convert_area, convert_distance, format_area, format_measurement, Unit};

/// Unique identifier for measurements
pub type MeasurementId = uuid::Uuid;

/// Shape kind, fixed at commit time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Straight distance between the first two points
    Line,
    /// Closed ring measured by area
    Polygon,
}

impl ShapeKind {
    /// Classify a committed point sequence
    ///
    /// Repeated consecutive positions collapse into one vertex and a trailing
    /// duplicate of the first point is a closing marker. Returns `None` when
    /// fewer than two distinct vertices remain.
    pub fn classify(points: &[Point]) -> Option<ShapeKind> {
        match vertices(points).len() {
            0 | 1 => None,
            2 => Some(ShapeKind::Line),
            _ => Some(ShapeKind::Polygon),
        }
    }

    /// Distinct vertices this kind needs
    pub fn required_vertices(self) -> usize {
        match self {
            ShapeKind::Line => 2,
            ShapeKind::Polygon => 3,
        }
    }
}

fn vertices(points: &[Point]) -> Vec<Point> {
    let mut vertices = points.to_vec();
    vertices.dedup();
    if vertices.len() > 2 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices
}

/// A committed measurement
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "MeasurementRecord")]
pub struct Measurement {
    id: MeasurementId,
    kind: ShapeKind,
    points: Vec<Point>,
    /// Real-world length; meaningful for lines only
    distance: f64,
    /// Real-world area; meaningful for polygons only
    area: f64,
}

impl Measurement {
    /// Build a measurement from committed points, computing its value
    ///
    /// Consecutive repeats of a position are dropped. Returns `None` when
    /// the points do not describe a line or polygon.
    pub fn from_points(mut points: Vec<Point>, scale: &ScaleSetting) -> Option<Self> {
        points.dedup();
        let kind = ShapeKind::classify(&points)?;
        let mut measurement = Self {
            id: MeasurementId::new_v4(),
            kind,
            points,
            distance: 0.0,
            area: 0.0,
        };
        measurement.recompute(scale);
        Some(measurement)
    }

    /// Get the measurement ID
    pub fn id(&self) -> MeasurementId {
        self.id
    }

    /// Get the shape kind
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Get the committed points
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Stored distance (lines)
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Stored area (polygons)
    pub fn area(&self) -> f64 {
        self.area
    }

    /// The semantically valid value for this kind
    pub fn value(&self) -> f64 {
        match self.kind {
            ShapeKind::Line => self.distance,
            ShapeKind::Polygon => self.area,
        }
    }

    /// Whether the first point is duplicated as the last
    pub fn is_closed(&self) -> bool {
        self.points.len() > 2 && self.points.first() == self.points.last()
    }

    /// Distance in content pixels between the first two points
    pub fn pixel_distance(&self) -> f64 {
        match self.points.as_slice() {
            [a, b, ..] => distance_between(a, b),
            _ => 0.0,
        }
    }

    /// Area in square content pixels
    pub fn pixel_area(&self) -> f64 {
        polygon_area(&self.points)
    }

    /// Recompute the kind's value from raw points and the given scale
    pub fn recompute(&mut self, scale: &ScaleSetting) {
        match self.kind {
            ShapeKind::Line => self.distance = scale.to_real_distance(self.pixel_distance()),
            ShapeKind::Polygon => self.area = scale.to_real_area(self.pixel_area()),
        }
    }

    /// Reinterpret the stored value as `from` and convert it to `to`
    ///
    /// Does not look at the geometry; repeated conversions chain.
    pub fn convert_value(&mut self, from: Unit, to: Unit) {
        match self.kind {
            ShapeKind::Line => self.distance = convert_distance(self.distance, from, to),
            ShapeKind::Polygon => self.area = convert_area(self.area, from, to),
        }
    }

    /// Move one point, mirroring edits to the ring ends of closed polygons
    ///
    /// Returns false when `point_index` is out of range.
    pub fn move_point(&mut self, point_index: usize, new_point: Point) -> bool {
        let len = self.points.len();
        if point_index >= len {
            return false;
        }

        let mirror = self.kind == ShapeKind::Polygon && len > 3 && self.is_closed();
        self.points[point_index] = new_point;
        if mirror {
            if point_index == 0 {
                self.points[len - 1] = new_point;
            } else if point_index == len - 1 {
                self.points[0] = new_point;
            }
        }
        true
    }

    /// Formatted value with unit, e.g. `"1.00 m"` or `"2.50 m²"`
    pub fn formatted_value(&self, unit: Unit) -> String {
        match self.kind {
            ShapeKind::Line => format_measurement(self.distance, unit),
            ShapeKind::Polygon => format_area(self.area, unit),
        }
    }

    /// Whether `point` touches this shape's outline within `tolerance`
    pub fn hit_outline(&self, point: &Point, tolerance: f64) -> bool {
        match self.kind {
            ShapeKind::Line => match self.points.as_slice() {
                [a, b, ..] => point_near_segment(point, a, b, tolerance),
                _ => false,
            },
            ShapeKind::Polygon => {
                let n = self.points.len();
                (0..n).any(|i| {
                    let next = (i + 1) % n;
                    point_near_segment(point, &self.points[i], &self.points[next], tolerance)
                })
            }
        }
    }

    /// Index of the point handle nearest to `point` within `radius`
    pub fn hit_handle(&self, point: &Point, radius: f64) -> Option<usize> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, distance_between(p, point)))
            .filter(|(_, d)| *d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

/// Wire shape accepted when loading measurements
///
/// Older sets carry neither `id` nor `kind`; both are filled in on load.
#[derive(Debug, Clone, serde::Deserialize)]
pub(crate) struct MeasurementRecord {
    #[serde(default)]
    id: Option<MeasurementId>,
    #[serde(default)]
    kind: Option<ShapeKind>,
    points: Vec<Point>,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    area: f64,
}

impl TryFrom<MeasurementRecord> for Measurement {
    type Error = MeasurementError;

    fn try_from(record: MeasurementRecord) -> Result<Self, Self::Error> {
        let kind = record.kind.unwrap_or(if record.points.len() <= 3 {
            ShapeKind::Line
        } else {
            ShapeKind::Polygon
        });

        let actual = vertices(&record.points).len();
        let required = kind.required_vertices();
        if actual < required {
            return Err(MeasurementError::TooFewPoints {
                kind,
                required,
                actual,
            });
        }

        Ok(Self {
            id: record.id.unwrap_or_else(MeasurementId::new_v4),
            kind,
            points: record.points,
            distance: record.distance,
            area: record.area,
        })
    }
}

/// Deserialize a measurement list, dropping records that are not valid shapes
pub(crate) fn deserialize_measurements<'de, D>(deserializer: D) -> Result<Vec<Measurement>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let records: Vec<MeasurementRecord> = serde::Deserialize::deserialize(deserializer)?;
    Ok(records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match Measurement::try_from(record) {
            Ok(measurement) => Some(measurement),
            Err(err) => {
                tracing::warn!(index, %err, "dropping stored measurement");
                None
            }
        })
        .collect())
}
