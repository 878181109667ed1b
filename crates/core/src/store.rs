//! Measurement store
//!
//! The authoritative in-memory model for one open file: committed
//! measurements, the in-progress point buffer, selection and hover, drag
//! bracketing, the scale setting and a linear undo/redo history.
//!
//! Geometry operations never fail loudly. Bad indices or point counts are
//! no-ops reported through the return value. Only scale writes return an
//! error, and a rejected write leaves the store untouched.

use crate::config::EngineConfig;
use crate::error::ScaleError;
use crate::geometry::Point;
use crate::history::{History, HistorySnapshot};
use crate::measurement::{Measurement, MeasurementId};
use crate::persistence::MeasurementSet;
use crate::scale::ScaleSetting;
use crate::units::Unit;

/// Owner of all measurement state for one session
#[derive(Debug, Clone)]
pub struct MeasurementStore {
    measurements: Vec<Measurement>,
    measure_points: Vec<Point>,
    selected: Option<usize>,
    hovered: Option<usize>,
    show_all: bool,
    dragging: bool,
    last_stable: Option<Vec<Measurement>>,
    scale: ScaleSetting,
    default_scale: ScaleSetting,
    history: History,
}

impl Default for MeasurementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementStore {
    /// Create an empty store with the default scale (100 px per unit, cm)
    pub fn new() -> Self {
        Self::with_scale(ScaleSetting::default(), None)
    }

    /// Create an empty store using the configured default scale and history cap
    pub fn with_config(config: &EngineConfig) -> Self {
        let scale = ScaleSetting::new(config.default_pixels_per_unit, config.default_unit)
            .unwrap_or_else(|err| {
                tracing::warn!(%err, "configured default scale rejected, using built-in default");
                ScaleSetting::default()
            });
        Self::with_scale(scale, config.max_history)
    }

    fn with_scale(scale: ScaleSetting, max_history: Option<usize>) -> Self {
        let history = History::new().with_max_entries(max_history);
        let mut store = Self {
            measurements: Vec::new(),
            measure_points: Vec::new(),
            selected: None,
            hovered: None,
            show_all: false,
            dragging: false,
            last_stable: None,
            scale,
            default_scale: scale,
            history,
        };
        store.add_history_entry();
        store
    }

    /// Committed measurements in commit order
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn measurement(&self, index: usize) -> Option<&Measurement> {
        self.measurements.get(index)
    }

    /// Index of the measurement with the given ID
    pub fn index_of(&self, id: MeasurementId) -> Option<usize> {
        self.measurements.iter().position(|m| m.id() == id)
    }

    /// In-progress point buffer
    pub fn measure_points(&self) -> &[Point] {
        &self.measure_points
    }

    pub fn scale(&self) -> &ScaleSetting {
        &self.scale
    }

    pub fn pixels_per_unit(&self) -> f64 {
        self.scale.pixels_per_unit()
    }

    pub fn unit(&self) -> Unit {
        self.scale.unit()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Replace the in-progress buffer
    pub fn set_measure_points(&mut self, points: Vec<Point>) {
        self.measure_points = points;
    }

    /// Append one point to the in-progress buffer
    pub fn push_measure_point(&mut self, point: Point) {
        self.measure_points.push(point);
    }

    pub fn clear_measure_points(&mut self) {
        self.measure_points.clear();
    }

    /// Commit a shape, computing its value with the current scale
    ///
    /// Clears the point buffer on success. Does not touch history; callers
    /// follow up with [`MeasurementStore::add_history_entry`].
    pub fn add_measurement(&mut self, points: Vec<Point>) -> Option<MeasurementId> {
        let count = points.len();
        let Some(measurement) = Measurement::from_points(points, &self.scale) else {
            tracing::debug!(points = count, "ignoring commit of degenerate shape");
            return None;
        };

        let id = measurement.id();
        tracing::debug!(
            %id,
            kind = ?measurement.kind(),
            value = measurement.value(),
            "measurement committed"
        );
        self.measurements.push(measurement);
        self.measure_points.clear();
        Some(id)
    }

    /// Move one point of a committed measurement and recompute its value
    ///
    /// Closed rings keep their closure when an end point moves. No history
    /// entry is written; drags snapshot once on release.
    pub fn update_measurement_point(
        &mut self,
        measurement_index: usize,
        point_index: usize,
        new_point: Point,
    ) -> bool {
        let scale = self.scale;
        let Some(measurement) = self.measurements.get_mut(measurement_index) else {
            return false;
        };
        if !measurement.move_point(point_index, new_point) {
            return false;
        }
        measurement.recompute(&scale);
        true
    }

    /// Delete a measurement and snapshot history
    pub fn remove_measurement(&mut self, index: usize) -> Option<Measurement> {
        if index >= self.measurements.len() {
            return None;
        }
        let removed = self.measurements.remove(index);
        self.selected = shift_after_removal(self.selected, index);
        self.hovered = shift_after_removal(self.hovered, index);
        tracing::debug!(id = %removed.id(), index, "measurement removed");
        self.add_history_entry();
        Some(removed)
    }

    /// Recompute every measurement from its raw points
    pub fn recompute_all(&mut self) {
        let scale = self.scale;
        for measurement in &mut self.measurements {
            measurement.recompute(&scale);
        }
    }

    /// Snapshot current measurements and scale, discarding any redo branch
    pub fn add_history_entry(&mut self) {
        self.history
            .push(HistorySnapshot::capture(&self.measurements, self.scale));
        tracing::debug!(
            index = ?self.history.index(),
            len = self.history.len(),
            "history entry added"
        );
    }

    /// Restore the previous snapshot; false at the oldest entry
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        tracing::debug!(index = ?self.history.index(), "undo");
        true
    }

    /// Restore the next snapshot; false at the newest entry
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        tracing::debug!(index = ?self.history.index(), "redo");
        true
    }

    /// Drop every history entry
    pub fn reset_history(&mut self) {
        self.history.reset();
    }

    fn restore(&mut self, snapshot: HistorySnapshot) {
        self.measurements = snapshot.measurements;
        self.scale = snapshot.scale;
        let len = self.measurements.len();
        self.selected = self.selected.filter(|&i| i < len);
        self.hovered = self.hovered.filter(|&i| i < len);
    }

    /// Set pixels per unit; the display scale follows
    pub fn set_unit_scale(&mut self, pixels_per_unit: f64) -> Result<(), ScaleError> {
        self.scale.set_pixels_per_unit(pixels_per_unit)
    }

    /// Set the display scale; pixels per unit follows
    pub fn set_scale(&mut self, display_scale: f64) -> Result<(), ScaleError> {
        self.scale.set_scale(display_scale)
    }

    /// Switch the display unit by converting every stored value in place
    ///
    /// Values are not recomputed from geometry, so repeated switches chain
    /// their conversions.
    pub fn update_measurements_unit(&mut self, new_unit: Unit) {
        let old_unit = self.scale.unit();
        if old_unit == new_unit {
            return;
        }
        for measurement in &mut self.measurements {
            measurement.convert_value(old_unit, new_unit);
        }
        self.scale.set_unit(new_unit);
        tracing::debug!(from = %old_unit, to = %new_unit, "measurement unit changed");
    }

    /// Install a calibrated scale, recompute from geometry and snapshot
    pub fn apply_calibration(&mut self, pixels_per_unit: f64, unit: Unit) -> Result<(), ScaleError> {
        self.scale.set_pixels_per_unit(pixels_per_unit)?;
        self.scale.set_unit(unit);
        self.recompute_all();
        tracing::debug!(pixels_per_unit, %unit, "calibration applied");
        self.add_history_entry();
        Ok(())
    }

    /// Restore the scale this store was created with, recompute and snapshot
    pub fn reset_scale(&mut self) {
        self.scale = self.default_scale;
        self.recompute_all();
        self.add_history_entry();
    }

    /// Begin a drag gesture, remembering the last stable state
    pub fn start_dragging(&mut self) {
        self.dragging = true;
        self.last_stable = Some(self.measurements.clone());
    }

    /// End a drag gesture; always appends one history entry
    pub fn stop_dragging(&mut self) {
        if !self.dragging {
            return;
        }
        if !self.drag_changed() {
            tracing::debug!("drag ended without changes");
        }
        self.dragging = false;
        self.last_stable = None;
        self.add_history_entry();
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Whether the current drag has moved anything since it started
    pub fn drag_changed(&self) -> bool {
        self.last_stable
            .as_ref()
            .is_some_and(|stable| *stable != self.measurements)
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Select a measurement (or clear with `None`); out-of-range clears
    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|&i| i < self.measurements.len());
    }

    /// Select `index`, or clear the selection if it is already selected
    pub fn toggle_selection(&mut self, index: usize) {
        if self.selected == Some(index) {
            self.selected = None;
        } else {
            self.select(Some(index));
        }
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn set_hovered(&mut self, index: Option<usize>) {
        self.hovered = index.filter(|&i| i < self.measurements.len());
    }

    pub fn show_all(&self) -> bool {
        self.show_all
    }

    pub fn set_show_all(&mut self, show_all: bool) {
        self.show_all = show_all;
    }

    /// Whether a measurement is currently "shown with details"
    ///
    /// Point handles and labels are drawn, and draggable, only for these.
    pub fn shows_details(&self, index: usize) -> bool {
        index < self.measurements.len()
            && (self.show_all || self.selected == Some(index) || self.hovered == Some(index))
    }

    /// Replace the whole state with a loaded set
    ///
    /// History restarts from a single baseline snapshot of the loaded state.
    pub fn load(&mut self, set: MeasurementSet) {
        let scale = set.scale_setting().unwrap_or_else(|err| {
            tracing::warn!(%err, "stored scale rejected, keeping current scale");
            self.scale
        });
        self.measurements = set.measurements;
        self.scale = scale;
        self.measure_points.clear();
        self.selected = None;
        self.hovered = None;
        self.dragging = false;
        self.last_stable = None;
        self.history.reset();
        self.add_history_entry();
        tracing::debug!(count = self.measurements.len(), "measurement set loaded");
    }

    /// Export the committed state in interchange form
    pub fn to_measurement_set(&self) -> MeasurementSet {
        MeasurementSet::new(self.measurements.clone(), self.scale)
    }
}

fn shift_after_removal(index: Option<usize>, removed: usize) -> Option<usize> {
    match index {
        Some(i) if i == removed => None,
        Some(i) if i > removed => Some(i - 1),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meter_store() -> MeasurementStore {
        let mut store = MeasurementStore::new();
        store.set_unit_scale(100.0).unwrap();
        store.update_measurements_unit(Unit::M);
        store.reset_history();
        store.add_history_entry();
        store
    }

    fn line(x: f64) -> Vec<Point> {
        vec![Point::new(x, 0.0), Point::new(x, 100.0)]
    }

    fn closed_square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 100.0),
            Point::new(100.0, 100.0),
            Point::new(100.0, 0.0),
            Point::new(0.0, 0.0),
        ]
    }

    #[test]
    fn test_new_store_has_baseline_entry() {
        let store = MeasurementStore::new();
        assert_eq!(store.history().len(), 1);
        assert_eq!(store.history().index(), Some(0));
        assert_eq!(store.pixels_per_unit(), 100.0);
        assert_eq!(store.unit(), Unit::Cm);
        assert_eq!(store.scale().scale(), 1.0);
    }

    #[test]
    fn test_add_measurement_line_and_polygon() {
        let mut store = meter_store();
        store.set_measure_points(line(0.0));

        store.add_measurement(line(0.0)).unwrap();
        store.add_measurement(closed_square()).unwrap();

        assert!(store.measure_points().is_empty());
        assert!((store.measurements()[0].distance() - 1.0).abs() < 1e-9);
        assert!((store.measurements()[1].area() - 1.0).abs() < 1e-9);
        // Commit alone does not snapshot
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_add_measurement_degenerate_is_noop() {
        let mut store = meter_store();
        store.set_measure_points(vec![Point::new(1.0, 1.0)]);
        assert!(store.add_measurement(vec![Point::new(1.0, 1.0)]).is_none());
        assert!(store.measurements().is_empty());
        assert_eq!(store.measure_points().len(), 1);
    }

    #[test]
    fn test_undo_redo_reproduces_commit() {
        let mut store = meter_store();
        store.add_measurement(closed_square()).unwrap();
        store.add_history_entry();
        let committed = store.measurements().to_vec();

        assert!(store.undo());
        assert!(store.measurements().is_empty());
        assert!(store.redo());
        assert_eq!(store.measurements(), committed.as_slice());
    }

    #[test]
    fn test_undo_redo_at_bounds_are_ignored() {
        let mut store = meter_store();
        assert!(!store.undo());
        assert!(!store.redo());
        assert_eq!(store.history().index(), Some(0));
    }

    #[test]
    fn test_new_action_after_undo_discards_redo() {
        let mut store = meter_store();
        store.add_measurement(line(0.0));
        store.add_history_entry();
        store.add_measurement(line(10.0));
        store.add_history_entry();

        store.undo();
        store.add_measurement(line(20.0));
        store.add_history_entry();

        assert!(!store.redo());
        assert_eq!(store.measurements().len(), 2);
        assert_eq!(store.measurements()[1].points()[0].x, 20.0);
    }

    #[test]
    fn test_update_point_recomputes_and_keeps_closure() {
        let mut store = meter_store();
        store.add_measurement(closed_square());

        assert!(store.update_measurement_point(0, 0, Point::new(0.0, -100.0)));
        let m = &store.measurements()[0];
        assert_eq!(m.points()[0], m.points()[4]);
        assert!((m.area() - 1.5).abs() < 1e-9);

        assert!(!store.update_measurement_point(3, 0, Point::new(0.0, 0.0)));
        assert!(!store.update_measurement_point(0, 9, Point::new(0.0, 0.0)));
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_remove_snapshots_and_fixes_selection() {
        let mut store = meter_store();
        store.add_measurement(line(0.0));
        store.add_measurement(line(10.0));
        store.add_measurement(line(20.0));
        store.select(Some(2));

        let removed = store.remove_measurement(0).unwrap();
        assert_eq!(removed.points()[0].x, 0.0);
        assert_eq!(store.selected(), Some(1));
        assert_eq!(store.history().len(), 2);

        assert!(store.remove_measurement(5).is_none());
        assert_eq!(store.history().len(), 2);

        store.remove_measurement(1);
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_scale_writes_keep_inverse() {
        let mut store = MeasurementStore::new();
        store.set_unit_scale(25.0).unwrap();
        assert!((store.scale().scale() - 4.0).abs() < 1e-12);
        store.set_scale(0.5).unwrap();
        assert!((store.pixels_per_unit() - 200.0).abs() < 1e-12);

        assert!(store.set_unit_scale(0.0).is_err());
        assert!(store.set_scale(-1.0).is_err());
        assert!((store.pixels_per_unit() - 200.0).abs() < 1e-12);
    }

    #[test]
    fn test_update_unit_converts_stored_values() {
        let mut store = meter_store();
        store.add_measurement(line(0.0));
        store.add_measurement(closed_square());

        store.update_measurements_unit(Unit::Cm);
        assert_eq!(store.unit(), Unit::Cm);
        assert!((store.measurements()[0].distance() - 100.0).abs() < 1e-9);
        assert!((store.measurements()[1].area() - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_calibration_recomputes_from_geometry() {
        let mut store = meter_store();
        store.add_measurement(line(0.0));

        store.apply_calibration(10.0, Unit::M).unwrap();
        assert!((store.measurements()[0].distance() - 10.0).abs() < 1e-9);
        assert_eq!(store.history().len(), 2);

        assert!(store.apply_calibration(-1.0, Unit::M).is_err());
        assert_eq!(store.pixels_per_unit(), 10.0);
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn test_rescale_paths_differ_after_drift() {
        let mut store = meter_store();
        store.add_measurement(line(0.0));

        // Unit path converts the stored value, recompute path starts from points
        store.update_measurements_unit(Unit::Ft);
        let converted = store.measurements()[0].distance();
        store.recompute_all();
        let recomputed = store.measurements()[0].distance();
        assert!((converted - recomputed).abs() < 1e-9);

        store.update_measurements_unit(Unit::M);
        store.set_unit_scale(50.0).unwrap();
        assert!((store.measurements()[0].distance() - 1.0).abs() < 1e-9);
        store.recompute_all();
        assert!((store.measurements()[0].distance() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_bracket_always_snapshots() {
        let mut store = meter_store();
        store.add_measurement(line(0.0));

        store.start_dragging();
        assert!(store.is_dragging());
        assert!(!store.drag_changed());
        store.stop_dragging();
        assert_eq!(store.history().len(), 2);

        store.start_dragging();
        store.update_measurement_point(0, 1, Point::new(0.0, 200.0));
        assert!(store.drag_changed());
        store.stop_dragging();
        assert!(!store.is_dragging());
        assert_eq!(store.history().len(), 3);
    }

    #[test]
    fn test_shows_details() {
        let mut store = meter_store();
        store.add_measurement(line(0.0));
        store.add_measurement(line(10.0));
        assert!(!store.shows_details(0));

        store.set_hovered(Some(0));
        assert!(store.shows_details(0));
        store.toggle_selection(1);
        assert!(store.shows_details(1));
        store.toggle_selection(1);
        assert!(!store.shows_details(1));

        store.set_show_all(true);
        assert!(store.shows_details(1));
        assert!(!store.shows_details(7));
    }

    #[test]
    fn test_load_resets_history_to_baseline() {
        let mut source = meter_store();
        source.add_measurement(closed_square());
        let set = source.to_measurement_set();

        let mut store = MeasurementStore::new();
        store.add_measurement(line(0.0));
        store.add_history_entry();
        store.set_measure_points(line(5.0));

        store.load(set);
        assert_eq!(store.measurements().len(), 1);
        assert_eq!(store.unit(), Unit::M);
        assert!(store.measure_points().is_empty());
        assert_eq!(store.history().len(), 1);
        assert!(!store.undo());
    }

    #[test]
    fn test_with_config_uses_defaults() {
        let config = EngineConfig::default()
            .with_default_scale(10.0, Unit::Ft)
            .with_max_history(Some(3));
        let mut store = MeasurementStore::with_config(&config);
        assert_eq!(store.unit(), Unit::Ft);
        assert_eq!(store.pixels_per_unit(), 10.0);

        for _ in 0..5 {
            store.add_history_entry();
        }
        assert_eq!(store.history().len(), 3);
    }

    #[test]
    fn test_reset_scale() {
        let mut store = MeasurementStore::new();
        store.apply_calibration(10.0, Unit::Ft).unwrap();
        store.reset_scale();
        assert_eq!(*store.scale(), ScaleSetting::default());
        assert_eq!(store.history().len(), 3);
    }
}
