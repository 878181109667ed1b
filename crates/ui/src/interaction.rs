//! Interaction state machine
//!
//! Turns pointer and keyboard events into measurement store calls. The
//! controller owns only the active mode, the selected tool and the pointer
//! bookkeeping needed to tell clicks from drags; all measurement data lives
//! in the injected [`MeasurementStore`].
//!
//! ```text
//! Idle --click (measure tool)--> Measuring
//! Measuring --click near first/last point--> commit --> Idle
//! Measuring --double-click / Escape / Enter--> commit or discard --> Idle
//! Idle|Measuring --press on a detailed shape's point--> DraggingPoint
//! DraggingPoint --release--> previous mode
//! Idle|Measuring --set-scale tool--> SettingScale
//! ```

use crate::calibration::{CalibrationKind, CalibrationReference};
use crate::input::{InputEvent, Key, KeyInput, PointerTracker, Shortcut};
use crate::viewport::CoordinateMapper;
use takeoff_core::geometry::is_point_close;
use takeoff_core::{EngineConfig, MeasurementStore, Point};

/// Active drawing tool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    #[default]
    Measure,
    SetScale(CalibrationKind),
}

/// Mode to return to when a point drag ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResumeMode {
    Idle,
    Measuring,
}

/// Exactly one interaction mode is active at a time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum InteractionMode {
    #[default]
    Idle,
    Measuring,
    #[serde(rename_all = "camelCase")]
    DraggingPoint {
        measurement: usize,
        point: usize,
        resume: ResumeMode,
    },
    /// Tracing a calibration reference; `awaiting_value` once it is finished
    /// and the value dialog is open
    #[serde(rename_all = "camelCase")]
    SettingScale {
        kind: CalibrationKind,
        awaiting_value: bool,
    },
}

/// What an event did, so the host knows whether to save or open a dialog
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    /// Nothing happened
    Ignored,
    /// Transient state changed (buffer, hover, selection, cursor)
    Updated,
    /// Committed state changed; persist it
    Changed,
    /// A calibration reference is complete and needs a real-world value
    CalibrationCaptured(CalibrationReference),
    /// Calibration was abandoned
    CalibrationCancelled,
}

impl InteractionOutcome {
    pub fn is_change(&self) -> bool {
        matches!(self, InteractionOutcome::Changed)
    }
}

/// Thresholds the controller needs from the engine configuration
#[derive(Debug, Clone, Copy, PartialEq)]
struct Thresholds {
    close: f64,
    handle: f64,
    hover: f64,
    click_slop: f64,
}

impl From<&EngineConfig> for Thresholds {
    fn from(config: &EngineConfig) -> Self {
        Self {
            close: config.close_threshold,
            handle: config.handle_radius,
            hover: config.hover_tolerance,
            click_slop: config.click_slop,
        }
    }
}

/// Drives mode transitions and forwards intent to the store
#[derive(Debug, Clone)]
pub struct InteractionController {
    mode: InteractionMode,
    tool: Tool,
    pointer: PointerTracker,
    cursor: Option<Point>,
    thresholds: Thresholds,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl InteractionController {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            mode: InteractionMode::Idle,
            tool: Tool::Measure,
            pointer: PointerTracker::default(),
            cursor: None,
            thresholds: Thresholds::from(config),
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Last pointer position in content space, if the pointer is over the surface
    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    /// Process one input event
    pub fn handle(
        &mut self,
        store: &mut MeasurementStore,
        mapper: &CoordinateMapper,
        event: &InputEvent,
    ) -> InteractionOutcome {
        match *event {
            InputEvent::PointerDown { x, y } => {
                let screen = Point::new(x, y);
                self.pointer.press(screen);
                self.pointer_down(store, mapper.to_content(screen))
            }
            InputEvent::PointerMove { x, y } => {
                let screen = Point::new(x, y);
                self.pointer.track(screen, self.thresholds.click_slop);
                self.pointer_move(store, mapper.to_content(screen))
            }
            InputEvent::PointerUp { x, y } => {
                let screen = Point::new(x, y);
                let content = mapper.to_content(screen);
                if let InteractionMode::DraggingPoint { resume, .. } = self.mode {
                    self.pointer.cancel();
                    return self.finish_drag(store, resume);
                }
                if self.pointer.release(screen, self.thresholds.click_slop) {
                    self.click(store, content)
                } else {
                    InteractionOutcome::Ignored
                }
            }
            InputEvent::PointerLeave => {
                self.cursor = None;
                store.set_hovered(None);
                InteractionOutcome::Updated
            }
            InputEvent::DoubleClick { x, y } => {
                self.cursor = Some(mapper.to_content(Point::new(x, y)));
                self.double_click(store)
            }
            InputEvent::Key(key) => self.key(store, key),
        }
    }

    /// Switch tools; entering set-scale discards any shape in progress
    pub fn select_tool(&mut self, store: &mut MeasurementStore, tool: Tool) -> InteractionOutcome {
        let mut outcome = InteractionOutcome::Updated;
        if let InteractionMode::DraggingPoint { .. } = self.mode {
            store.stop_dragging();
            self.pointer.cancel();
            outcome = InteractionOutcome::Changed;
        }

        let was_calibrating = matches!(self.mode, InteractionMode::SettingScale { .. });
        store.clear_measure_points();
        self.tool = tool;
        self.mode = match tool {
            Tool::Measure => InteractionMode::Idle,
            Tool::SetScale(kind) => InteractionMode::SettingScale {
                kind,
                awaiting_value: false,
            },
        };
        tracing::debug!(?tool, mode = ?self.mode, "tool selected");

        if was_calibrating && tool == Tool::Measure && outcome != InteractionOutcome::Changed {
            return InteractionOutcome::CalibrationCancelled;
        }
        outcome
    }

    /// Leave calibration after the new scale was applied or the dialog dismissed
    pub fn finish_calibration(&mut self, store: &mut MeasurementStore) {
        store.clear_measure_points();
        self.tool = Tool::Measure;
        self.mode = InteractionMode::Idle;
    }

    /// Abandon calibration (Escape or dialog dismiss)
    pub fn cancel_calibration(&mut self, store: &mut MeasurementStore) -> InteractionOutcome {
        if !matches!(self.mode, InteractionMode::SettingScale { .. }) {
            return InteractionOutcome::Ignored;
        }
        self.finish_calibration(store);
        tracing::debug!("calibration cancelled");
        InteractionOutcome::CalibrationCancelled
    }

    fn pointer_down(&mut self, store: &mut MeasurementStore, content: Point) -> InteractionOutcome {
        let resume = match self.mode {
            InteractionMode::Idle => ResumeMode::Idle,
            InteractionMode::Measuring => ResumeMode::Measuring,
            _ => return InteractionOutcome::Ignored,
        };

        let Some((measurement, point)) = self.handle_at(store, &content) else {
            return InteractionOutcome::Ignored;
        };
        store.start_dragging();
        self.mode = InteractionMode::DraggingPoint {
            measurement,
            point,
            resume,
        };
        tracing::debug!(measurement, point, "point drag started");
        InteractionOutcome::Updated
    }

    fn pointer_move(&mut self, store: &mut MeasurementStore, content: Point) -> InteractionOutcome {
        self.cursor = Some(content);
        match self.mode {
            InteractionMode::DraggingPoint {
                measurement, point, ..
            } => {
                store.update_measurement_point(measurement, point, content);
            }
            InteractionMode::Idle | InteractionMode::Measuring => {
                let hovered = self.shape_at(store, &content);
                store.set_hovered(hovered);
            }
            InteractionMode::SettingScale { .. } => {}
        }
        InteractionOutcome::Updated
    }

    fn finish_drag(&mut self, store: &mut MeasurementStore, resume: ResumeMode) -> InteractionOutcome {
        store.stop_dragging();
        self.mode = match resume {
            ResumeMode::Idle => InteractionMode::Idle,
            ResumeMode::Measuring => InteractionMode::Measuring,
        };
        tracing::debug!(mode = ?self.mode, "point drag finished");
        InteractionOutcome::Changed
    }

    fn click(&mut self, store: &mut MeasurementStore, content: Point) -> InteractionOutcome {
        self.cursor = Some(content);
        match self.mode {
            InteractionMode::Idle => {
                if let Some(index) = self.shape_at(store, &content) {
                    store.toggle_selection(index);
                    return InteractionOutcome::Updated;
                }
                store.select(None);
                store.set_measure_points(vec![content]);
                self.mode = InteractionMode::Measuring;
                tracing::debug!("measuring started");
                InteractionOutcome::Updated
            }
            InteractionMode::Measuring => self.measuring_click(store, content),
            InteractionMode::SettingScale {
                kind,
                awaiting_value: false,
            } => self.calibration_click(store, kind, content),
            InteractionMode::SettingScale { .. } | InteractionMode::DraggingPoint { .. } => {
                InteractionOutcome::Ignored
            }
        }
    }

    fn measuring_click(&mut self, store: &mut MeasurementStore, content: Point) -> InteractionOutcome {
        let buffer = store.measure_points();
        let closes = match buffer {
            // A repeat click on a lone start point would only make a zero-length line
            [only] if is_point_close(&content, only, self.thresholds.close) => {
                return InteractionOutcome::Ignored;
            }
            [first, .., last] => {
                is_point_close(&content, first, self.thresholds.close)
                    || is_point_close(&content, last, self.thresholds.close)
            }
            _ => false,
        };

        if closes {
            let mut points = buffer.to_vec();
            points.push(points[0]);
            return self.commit(store, points);
        }

        store.push_measure_point(content);
        InteractionOutcome::Updated
    }

    fn calibration_click(
        &mut self,
        store: &mut MeasurementStore,
        kind: CalibrationKind,
        content: Point,
    ) -> InteractionOutcome {
        let buffered = store.measure_points().len();
        match kind {
            CalibrationKind::Distance => {
                let repeats_first = store
                    .measure_points()
                    .first()
                    .is_some_and(|first| is_point_close(&content, first, self.thresholds.close));
                if buffered >= 2 || repeats_first {
                    return InteractionOutcome::Ignored;
                }
                store.push_measure_point(content);
                if buffered + 1 == 2 {
                    return self.capture_reference(store, kind);
                }
                InteractionOutcome::Updated
            }
            CalibrationKind::Area => {
                let closes = buffered >= kind.required_points()
                    && store
                        .measure_points()
                        .first()
                        .is_some_and(|first| is_point_close(&content, first, self.thresholds.close));
                if closes {
                    let mut points = store.measure_points().to_vec();
                    points.push(points[0]);
                    store.set_measure_points(points);
                    return self.capture_reference(store, kind);
                }
                let repeats_last = store
                    .measure_points()
                    .last()
                    .is_some_and(|last| is_point_close(&content, last, self.thresholds.close));
                if repeats_last {
                    return InteractionOutcome::Ignored;
                }
                store.push_measure_point(content);
                InteractionOutcome::Updated
            }
        }
    }

    fn double_click(&mut self, store: &mut MeasurementStore) -> InteractionOutcome {
        match self.mode {
            InteractionMode::Measuring => self.finish_shape(store),
            InteractionMode::SettingScale {
                kind,
                awaiting_value: false,
            } => self.force_finish_reference(store, kind),
            _ => InteractionOutcome::Ignored,
        }
    }

    fn key(&mut self, store: &mut MeasurementStore, input: KeyInput) -> InteractionOutcome {
        if let Some(shortcut) = input.shortcut() {
            return self.history_shortcut(store, shortcut);
        }

        match (input.key, self.mode) {
            (Key::Escape | Key::Enter, InteractionMode::Measuring) => self.finish_shape(store),
            (Key::Escape, InteractionMode::SettingScale { .. }) => self.cancel_calibration(store),
            (
                Key::Enter,
                InteractionMode::SettingScale {
                    kind,
                    awaiting_value: false,
                },
            ) => self.force_finish_reference(store, kind),
            (Key::Delete | Key::Backspace, InteractionMode::Idle | InteractionMode::Measuring) => {
                match store.selected() {
                    Some(index) => {
                        store.remove_measurement(index);
                        InteractionOutcome::Changed
                    }
                    None => InteractionOutcome::Ignored,
                }
            }
            _ => InteractionOutcome::Ignored,
        }
    }

    fn history_shortcut(&mut self, store: &mut MeasurementStore, shortcut: Shortcut) -> InteractionOutcome {
        if !matches!(self.mode, InteractionMode::Idle | InteractionMode::Measuring) {
            return InteractionOutcome::Ignored;
        }
        let moved = match shortcut {
            Shortcut::Undo => store.undo(),
            Shortcut::Redo => store.redo(),
        };
        if moved {
            InteractionOutcome::Changed
        } else {
            InteractionOutcome::Ignored
        }
    }

    /// Commit the buffer (closing polygons) or discard it if too short
    fn finish_shape(&mut self, store: &mut MeasurementStore) -> InteractionOutcome {
        let mut points = store.measure_points().to_vec();
        if points.len() < 2 {
            store.clear_measure_points();
            self.mode = InteractionMode::Idle;
            tracing::debug!("discarded unfinished shape");
            return InteractionOutcome::Updated;
        }
        if points.len() > 2 {
            points.push(points[0]);
        }
        self.commit(store, points)
    }

    fn commit(&mut self, store: &mut MeasurementStore, points: Vec<Point>) -> InteractionOutcome {
        self.mode = InteractionMode::Idle;
        if store.add_measurement(points).is_some() {
            store.add_history_entry();
            InteractionOutcome::Changed
        } else {
            store.clear_measure_points();
            InteractionOutcome::Updated
        }
    }

    fn force_finish_reference(
        &mut self,
        store: &mut MeasurementStore,
        kind: CalibrationKind,
    ) -> InteractionOutcome {
        if kind == CalibrationKind::Area {
            let points = store.measure_points();
            let closed = points.len() > 2 && points.first() == points.last();
            if points.len() >= kind.required_points() && !closed {
                let mut points = points.to_vec();
                points.push(points[0]);
                store.set_measure_points(points);
            }
        }
        self.capture_reference(store, kind)
    }

    fn capture_reference(&mut self, store: &MeasurementStore, kind: CalibrationKind) -> InteractionOutcome {
        match CalibrationReference::new(kind, store.measure_points().to_vec()) {
            Ok(reference) => {
                self.mode = InteractionMode::SettingScale {
                    kind,
                    awaiting_value: true,
                };
                tracing::debug!(?kind, extent = reference.pixel_extent(), "calibration reference captured");
                InteractionOutcome::CalibrationCaptured(reference)
            }
            Err(err) => {
                tracing::debug!(%err, "calibration reference not ready");
                InteractionOutcome::Ignored
            }
        }
    }

    /// Topmost shape whose outline is under `point`
    fn shape_at(&self, store: &MeasurementStore, point: &Point) -> Option<usize> {
        store
            .measurements()
            .iter()
            .enumerate()
            .rev()
            .find(|(_, m)| m.hit_outline(point, self.thresholds.hover))
            .map(|(index, _)| index)
    }

    /// Topmost draggable point handle under `point`
    fn handle_at(&self, store: &MeasurementStore, point: &Point) -> Option<(usize, usize)> {
        store
            .measurements()
            .iter()
            .enumerate()
            .rev()
            .filter(|(index, _)| store.shows_details(*index))
            .find_map(|(index, m)| {
                m.hit_handle(point, self.thresholds.handle)
                    .map(|point_index| (index, point_index))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use takeoff_core::{ShapeKind, Unit};

    struct Harness {
        store: MeasurementStore,
        controller: InteractionController,
        mapper: CoordinateMapper,
    }

    impl Harness {
        fn new() -> Self {
            let mut store = MeasurementStore::new();
            store.set_unit_scale(100.0).unwrap();
            store.update_measurements_unit(Unit::M);
            Self {
                store,
                controller: InteractionController::default(),
                mapper: CoordinateMapper::default(),
            }
        }

        fn send(&mut self, event: InputEvent) -> InteractionOutcome {
            self.controller.handle(&mut self.store, &self.mapper, &event)
        }

        fn click(&mut self, x: f64, y: f64) -> InteractionOutcome {
            self.send(InputEvent::PointerDown { x, y });
            self.send(InputEvent::PointerUp { x, y })
        }

        /// Two clicks followed by the dblclick the host reports after them
        fn double_click(&mut self, x: f64, y: f64) -> [InteractionOutcome; 3] {
            let first = self.click(x, y);
            let second = self.click(x, y);
            [first, second, self.send(InputEvent::DoubleClick { x, y })]
        }

        fn key(&mut self, key: Key) -> InteractionOutcome {
            self.send(InputEvent::key(key))
        }
    }

    #[test]
    fn test_click_starts_measuring() {
        let mut h = Harness::new();
        assert_eq!(h.click(10.0, 10.0), InteractionOutcome::Updated);
        assert_eq!(h.controller.mode(), InteractionMode::Measuring);
        assert_eq!(h.store.measure_points(), &[Point::new(10.0, 10.0)]);
    }

    #[test]
    fn test_close_near_first_point_commits_exact_closure() {
        let mut h = Harness::new();
        h.click(0.0, 0.0);
        h.click(0.0, 100.0);
        let outcome = h.click(3.0, 4.0);

        assert_eq!(outcome, InteractionOutcome::Changed);
        assert_eq!(h.controller.mode(), InteractionMode::Idle);
        let m = &h.store.measurements()[0];
        assert_eq!(m.points().len(), 3);
        assert_eq!(m.points()[2], m.points()[0]);
        assert_eq!(m.kind(), ShapeKind::Line);
        assert!((m.distance() - 1.0).abs() < 1e-9);
        assert!(h.store.measure_points().is_empty());
    }

    #[test]
    fn test_close_near_last_point_commits() {
        let mut h = Harness::new();
        h.click(0.0, 0.0);
        h.click(0.0, 100.0);
        h.click(100.0, 100.0);
        h.click(100.0, 0.0);
        h.click(101.0, 2.0);

        let m = &h.store.measurements()[0];
        assert_eq!(m.kind(), ShapeKind::Polygon);
        assert_eq!(m.points().len(), 5);
        assert!((m.area() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_click_near_lone_first_point_is_ignored() {
        let mut h = Harness::new();
        h.click(0.0, 0.0);
        assert_eq!(h.click(2.0, 2.0), InteractionOutcome::Ignored);
        assert_eq!(h.controller.mode(), InteractionMode::Measuring);
        assert_eq!(h.store.measure_points(), &[Point::new(0.0, 0.0)]);
    }

    #[test]
    fn test_enter_after_repeated_click_commits_nothing() {
        let mut h = Harness::new();
        h.click(5.0, 5.0);
        h.click(5.0, 5.0);
        assert_eq!(h.key(Key::Enter), InteractionOutcome::Updated);
        assert!(h.store.measurements().is_empty());
        assert_eq!(h.store.history().len(), 1);
        assert_eq!(h.controller.mode(), InteractionMode::Idle);
    }

    #[test]
    fn test_double_click_on_empty_canvas_commits_nothing() {
        let mut h = Harness::new();
        let outcomes = h.double_click(40.0, 40.0);

        assert_eq!(
            outcomes,
            [
                InteractionOutcome::Updated,
                InteractionOutcome::Ignored,
                InteractionOutcome::Updated
            ]
        );
        assert!(h.store.measurements().is_empty());
        assert!(h.store.measure_points().is_empty());
        assert_eq!(h.store.history().len(), 1);
        assert_eq!(h.controller.mode(), InteractionMode::Idle);
    }

    #[test]
    fn test_drag_release_is_not_a_click() {
        let mut h = Harness::new();
        h.send(InputEvent::PointerDown { x: 0.0, y: 0.0 });
        h.send(InputEvent::PointerMove { x: 50.0, y: 0.0 });
        assert_eq!(
            h.send(InputEvent::PointerUp { x: 50.0, y: 0.0 }),
            InteractionOutcome::Ignored
        );
        assert_eq!(h.controller.mode(), InteractionMode::Idle);
    }

    #[test]
    fn test_double_click_finishes_path_once() {
        let mut h = Harness::new();
        h.click(0.0, 0.0);
        h.click(0.0, 100.0);
        let outcomes = h.double_click(100.0, 100.0);

        // The second click lands on the last point and closes the ring; the
        // dblclick that follows finds nothing left to finish
        assert_eq!(
            outcomes,
            [
                InteractionOutcome::Updated,
                InteractionOutcome::Changed,
                InteractionOutcome::Ignored
            ]
        );
        assert_eq!(h.store.measurements().len(), 1);
        let m = &h.store.measurements()[0];
        assert_eq!(m.kind(), ShapeKind::Polygon);
        assert_eq!(m.points().len(), 4);
        assert_eq!(m.points()[3], m.points()[0]);
        assert!((m.area() - 0.5).abs() < 1e-9);
        assert_eq!(h.store.history().len(), 2);
        assert_eq!(h.controller.mode(), InteractionMode::Idle);
    }

    #[test]
    fn test_bare_double_click_closes_polygon() {
        let mut h = Harness::new();
        h.click(0.0, 0.0);
        h.click(0.0, 100.0);
        h.click(100.0, 100.0);
        assert_eq!(
            h.send(InputEvent::DoubleClick { x: 100.0, y: 100.0 }),
            InteractionOutcome::Changed
        );
        let m = &h.store.measurements()[0];
        assert_eq!(m.points().len(), 4);
        assert_eq!(m.points()[3], m.points()[0]);
    }

    #[test]
    fn test_escape_and_enter_finish_or_discard() {
        let mut h = Harness::new();
        h.click(0.0, 0.0);
        assert_eq!(h.key(Key::Escape), InteractionOutcome::Updated);
        assert!(h.store.measure_points().is_empty());
        assert!(h.store.measurements().is_empty());

        h.click(0.0, 0.0);
        h.click(0.0, 50.0);
        assert_eq!(h.key(Key::Enter), InteractionOutcome::Changed);
        assert_eq!(h.store.measurements().len(), 1);
        assert_eq!(h.store.measurements()[0].points().len(), 2);
        assert_eq!(h.controller.mode(), InteractionMode::Idle);
    }

    #[test]
    fn test_drag_point_of_detailed_shape() {
        let mut h = Harness::new();
        h.click(0.0, 0.0);
        h.click(0.0, 100.0);
        h.key(Key::Enter);
        let history_len = h.store.history().len();

        // Handles are inert until the shape shows details
        h.send(InputEvent::PointerDown { x: 0.0, y: 100.0 });
        assert_eq!(h.controller.mode(), InteractionMode::Idle);
        h.send(InputEvent::PointerUp { x: 60.0, y: 60.0 });

        h.store.set_show_all(true);
        h.send(InputEvent::PointerDown { x: 1.0, y: 99.0 });
        assert!(matches!(
            h.controller.mode(),
            InteractionMode::DraggingPoint {
                measurement: 0,
                point: 1,
                resume: ResumeMode::Idle
            }
        ));
        h.send(InputEvent::PointerMove { x: 0.0, y: 200.0 });
        assert!((h.store.measurements()[0].distance() - 2.0).abs() < 1e-9);
        assert_eq!(h.store.history().len(), history_len);

        assert_eq!(
            h.send(InputEvent::PointerUp { x: 0.0, y: 200.0 }),
            InteractionOutcome::Changed
        );
        assert_eq!(h.controller.mode(), InteractionMode::Idle);
        assert_eq!(h.store.history().len(), history_len + 1);
        assert!(h.store.measure_points().is_empty());
    }

    #[test]
    fn test_click_on_shape_toggles_selection_and_delete() {
        let mut h = Harness::new();
        h.click(0.0, 0.0);
        h.click(0.0, 100.0);
        h.key(Key::Enter);

        h.click(2.0, 50.0);
        assert_eq!(h.store.selected(), Some(0));
        assert_eq!(h.controller.mode(), InteractionMode::Idle);

        h.click(2.0, 50.0);
        assert_eq!(h.store.selected(), None);
        h.click(2.0, 50.0);

        assert_eq!(h.key(Key::Delete), InteractionOutcome::Changed);
        assert!(h.store.measurements().is_empty());
        assert_eq!(h.key(Key::Delete), InteractionOutcome::Ignored);
    }

    #[test]
    fn test_click_off_outline_starts_measuring_with_shapes_present() {
        let mut h = Harness::new();
        h.click(0.0, 0.0);
        h.click(0.0, 100.0);
        h.key(Key::Enter);
        h.click(2.0, 50.0);

        // Outside hover tolerance the click is a new start point and clears selection
        h.click(20.0, 50.0);
        assert_eq!(h.controller.mode(), InteractionMode::Measuring);
        assert_eq!(h.store.selected(), None);
        assert_eq!(h.store.measure_points(), &[Point::new(20.0, 50.0)]);
    }

    #[test]
    fn test_hover_tracks_outline() {
        let mut h = Harness::new();
        h.click(0.0, 0.0);
        h.click(0.0, 100.0);
        h.key(Key::Enter);

        h.send(InputEvent::PointerMove { x: 3.0, y: 40.0 });
        assert_eq!(h.store.hovered(), Some(0));
        h.send(InputEvent::PointerMove { x: 30.0, y: 40.0 });
        assert_eq!(h.store.hovered(), None);
    }

    #[test]
    fn test_undo_redo_shortcuts() {
        let mut h = Harness::new();
        h.click(0.0, 0.0);
        h.click(0.0, 100.0);
        h.key(Key::Enter);

        let undo = InputEvent::Key(KeyInput::with_modifiers(Key::Char('z'), Modifiers::ctrl()));
        let redo = InputEvent::Key(KeyInput::with_modifiers(Key::Char('z'), Modifiers::ctrl_shift()));
        assert_eq!(h.send(undo), InteractionOutcome::Changed);
        assert!(h.store.measurements().is_empty());
        assert_eq!(h.send(redo), InteractionOutcome::Changed);
        assert_eq!(h.store.measurements().len(), 1);
        assert_eq!(h.send(redo), InteractionOutcome::Ignored);
    }

    #[test]
    fn test_distance_calibration_capture() {
        let mut h = Harness::new();
        h.click(5.0, 5.0);
        h.controller
            .select_tool(&mut h.store, Tool::SetScale(CalibrationKind::Distance));
        assert!(h.store.measure_points().is_empty());

        h.click(0.0, 0.0);
        let outcome = h.click(30.0, 40.0);
        let InteractionOutcome::CalibrationCaptured(reference) = outcome else {
            panic!("expected captured reference, got {outcome:?}");
        };
        assert_eq!(reference.pixel_extent(), 50.0);
        assert_eq!(
            h.controller.mode(),
            InteractionMode::SettingScale {
                kind: CalibrationKind::Distance,
                awaiting_value: true
            }
        );

        // Further clicks are ignored while the dialog is open
        assert_eq!(h.click(90.0, 90.0), InteractionOutcome::Ignored);
        assert_eq!(h.store.measure_points().len(), 2);
    }

    #[test]
    fn test_area_calibration_closes_near_first_point() {
        let mut h = Harness::new();
        h.controller
            .select_tool(&mut h.store, Tool::SetScale(CalibrationKind::Area));
        h.click(0.0, 0.0);
        h.click(100.0, 0.0);
        h.click(100.0, 100.0);
        let outcome = h.click(2.0, 3.0);

        let InteractionOutcome::CalibrationCaptured(reference) = outcome else {
            panic!("expected captured reference, got {outcome:?}");
        };
        assert_eq!(reference.points().len(), 4);
        assert_eq!(reference.points()[3], Point::new(0.0, 0.0));
        assert!((reference.pixel_extent() - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn test_area_calibration_double_click_sequence() {
        let mut h = Harness::new();
        h.controller
            .select_tool(&mut h.store, Tool::SetScale(CalibrationKind::Area));
        h.click(0.0, 0.0);
        h.click(200.0, 0.0);
        h.click(200.0, 200.0);
        let [first, second, last] = h.double_click(0.0, 200.0);

        assert_eq!(first, InteractionOutcome::Updated);
        assert_eq!(second, InteractionOutcome::Ignored);
        let InteractionOutcome::CalibrationCaptured(reference) = last else {
            panic!("expected captured reference, got {last:?}");
        };
        assert_eq!(reference.points().len(), 5);
        assert_eq!(reference.points()[4], reference.points()[0]);
        assert!((reference.pixel_extent() - 40_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance_calibration_double_click_on_one_spot() {
        let mut h = Harness::new();
        h.controller
            .select_tool(&mut h.store, Tool::SetScale(CalibrationKind::Distance));
        let outcomes = h.double_click(10.0, 10.0);

        assert_eq!(
            outcomes,
            [
                InteractionOutcome::Updated,
                InteractionOutcome::Ignored,
                InteractionOutcome::Ignored
            ]
        );
        assert_eq!(h.store.measure_points(), &[Point::new(10.0, 10.0)]);
        assert_eq!(
            h.controller.mode(),
            InteractionMode::SettingScale {
                kind: CalibrationKind::Distance,
                awaiting_value: false
            }
        );
    }

    #[test]
    fn test_calibration_escape_cancels() {
        let mut h = Harness::new();
        h.controller
            .select_tool(&mut h.store, Tool::SetScale(CalibrationKind::Area));
        h.click(0.0, 0.0);
        h.click(100.0, 0.0);

        assert_eq!(h.key(Key::Escape), InteractionOutcome::CalibrationCancelled);
        assert_eq!(h.controller.tool(), Tool::Measure);
        assert_eq!(h.controller.mode(), InteractionMode::Idle);
        assert!(h.store.measure_points().is_empty());
        assert_eq!(h.store.history().len(), 1);
    }

    #[test]
    fn test_calibration_enter_needs_enough_points() {
        let mut h = Harness::new();
        h.controller
            .select_tool(&mut h.store, Tool::SetScale(CalibrationKind::Area));
        h.click(0.0, 0.0);
        h.click(100.0, 0.0);
        assert_eq!(h.key(Key::Enter), InteractionOutcome::Ignored);

        h.click(100.0, 100.0);
        assert!(matches!(
            h.key(Key::Enter),
            InteractionOutcome::CalibrationCaptured(_)
        ));
    }

    #[test]
    fn test_mapper_is_applied_to_events() {
        let mut h = Harness::new();
        h.mapper.set_transform(crate::viewport::PanZoom::new(2.0, 10.0, 10.0));
        h.click(10.0, 10.0);
        h.click(10.0, 210.0);
        h.key(Key::Enter);

        let m = &h.store.measurements()[0];
        assert_eq!(m.points()[0], Point::new(0.0, 0.0));
        assert_eq!(m.points()[1], Point::new(0.0, 100.0));
    }
}
