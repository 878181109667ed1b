//! Render snapshot
//!
//! The presentation layer never touches the store. Each paint cycle it takes
//! an immutable [`RenderSnapshot`]: committed shapes with their labels, the
//! live preview of the shape being drawn, and the interaction mode. Shapes
//! carry both content-space points and their screen projection so the host
//! can draw without knowing the pan/zoom math.

use crate::calibration::CalibrationKind;
use crate::interaction::{InteractionController, InteractionMode, Tool};
use crate::viewport::CoordinateMapper;
use takeoff_core::geometry::path_center;
use takeoff_core::{
    distance_between, format_area_unit, format_measurement, polygon_area, Measurement,
    MeasurementId, MeasurementStore, Point, ShapeKind, Unit,
};

/// Screen distance between a shape and its value label
pub const LABEL_OFFSET: f64 = 20.0;

/// One committed measurement as the renderer sees it
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementView {
    pub index: usize,
    pub id: MeasurementId,
    pub kind: ShapeKind,
    pub points: Vec<Point>,
    pub screen_points: Vec<Point>,
    pub value: f64,
    pub label: String,
    /// Label position in screen space
    pub label_position: Point,
    /// Point handles and label are drawn only when true
    pub shows_details: bool,
    pub selected: bool,
    pub hovered: bool,
    pub closed: bool,
}

/// Shape under construction with the cursor appended
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewShape {
    pub points: Vec<Point>,
    pub screen_points: Vec<Point>,
    /// Length of the last segment in the display unit
    pub segment_length: f64,
    /// Live area in the display unit once three points are present
    pub area: Option<f64>,
    pub tooltip: String,
    /// Set while tracing a calibration reference
    pub calibration: Option<CalibrationKind>,
}

/// Everything the renderer reads in one paint cycle
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSnapshot {
    pub measurements: Vec<MeasurementView>,
    pub measure_points: Vec<Point>,
    pub preview: Option<PreviewShape>,
    pub mode: InteractionMode,
    pub tool: Tool,
    pub selected: Option<usize>,
    pub hovered: Option<usize>,
    pub show_all: bool,
    pub unit: Unit,
    pub pixels_per_unit: f64,
    pub scale: f64,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl RenderSnapshot {
    pub fn capture(
        store: &MeasurementStore,
        controller: &InteractionController,
        mapper: &CoordinateMapper,
    ) -> Self {
        let unit = store.unit();
        let measurements = store
            .measurements()
            .iter()
            .enumerate()
            .map(|(index, m)| MeasurementView {
                index,
                id: m.id(),
                kind: m.kind(),
                points: m.points().to_vec(),
                screen_points: project(mapper, m.points()),
                value: m.value(),
                label: m.formatted_value(unit),
                label_position: label_position(m, mapper),
                shows_details: store.shows_details(index),
                selected: store.selected() == Some(index),
                hovered: store.hovered() == Some(index),
                closed: m.is_closed(),
            })
            .collect();

        Self {
            measurements,
            measure_points: store.measure_points().to_vec(),
            preview: preview(store, controller, mapper),
            mode: controller.mode(),
            tool: controller.tool(),
            selected: store.selected(),
            hovered: store.hovered(),
            show_all: store.show_all(),
            unit,
            pixels_per_unit: store.pixels_per_unit(),
            scale: store.scale().scale(),
            can_undo: store.can_undo(),
            can_redo: store.can_redo(),
        }
    }
}

fn project(mapper: &CoordinateMapper, points: &[Point]) -> Vec<Point> {
    points.iter().map(|p| mapper.to_screen(*p)).collect()
}

/// Screen position of a measurement's value label
///
/// The anchor is the average of segment midpoints. Lines push the label off
/// along the segment normal, polygons lift it straight up.
pub fn label_position(measurement: &Measurement, mapper: &CoordinateMapper) -> Point {
    let screen = project(mapper, measurement.points());
    let center = path_center(&screen);

    match (measurement.kind(), screen.as_slice()) {
        (ShapeKind::Line, [a, b, ..]) => {
            let (dx, dy) = (b.x - a.x, b.y - a.y);
            let length = distance_between(a, b);
            if length <= f64::EPSILON {
                return center;
            }
            Point::new(
                center.x - dy / length * LABEL_OFFSET,
                center.y + dx / length * LABEL_OFFSET,
            )
        }
        (ShapeKind::Polygon, _) => Point::new(center.x, center.y - LABEL_OFFSET),
        _ => center,
    }
}

fn preview(
    store: &MeasurementStore,
    controller: &InteractionController,
    mapper: &CoordinateMapper,
) -> Option<PreviewShape> {
    let calibration = match controller.mode() {
        InteractionMode::Measuring => None,
        InteractionMode::SettingScale { kind, .. } => Some(kind),
        InteractionMode::Idle | InteractionMode::DraggingPoint { .. } => return None,
    };
    if store.measure_points().is_empty() {
        return None;
    }

    let mut points = store.measure_points().to_vec();
    let awaiting_value = matches!(
        controller.mode(),
        InteractionMode::SettingScale {
            awaiting_value: true,
            ..
        }
    );
    if let (Some(cursor), false) = (controller.cursor(), awaiting_value) {
        points.push(cursor);
    }

    let pixel_segment = match points.as_slice() {
        [.., a, b] => distance_between(a, b),
        _ => 0.0,
    };
    let pixel_area = (points.len() >= 3).then(|| polygon_area(&points));

    let (segment_length, area, tooltip) = match calibration {
        // The reference is traced before any real-world scale applies
        Some(_) => {
            let tooltip = match pixel_area {
                Some(a) => format!("{:.2} px² ({:.2} px)", a, pixel_segment),
                None => format_measurement(pixel_segment, Unit::Px),
            };
            (pixel_segment, pixel_area, tooltip)
        }
        None => {
            let scale = store.scale();
            let unit = store.unit();
            let segment = scale.to_real_distance(pixel_segment);
            let area = pixel_area.map(|a| scale.to_real_area(a));
            let tooltip = match area {
                Some(a) => format!(
                    "{:.2} {} ({:.2} {})",
                    a,
                    format_area_unit(unit),
                    segment,
                    unit
                ),
                None => format_measurement(segment, unit),
            };
            (segment, area, tooltip)
        }
    };

    Some(PreviewShape {
        screen_points: project(mapper, &points),
        points,
        segment_length,
        area,
        tooltip,
        calibration,
    })
}
