//! Measurement session for one current file
//!
//! A [`MeasureSession`] is constructed when a file becomes current and torn
//! down when it is closed. It owns the store, the interaction controller,
//! the coordinate mapper and the calibration dialog, and talks to the
//! persistence collaborator:
//! - load once on open
//! - save after every committing action (never on drag ticks)
//! - report failures as notices; in-memory state stays authoritative

use crate::calibration_dialog::{CalibrationDialog, CalibrationResult};
use crate::input::{InputEvent, Key, KeyInput, Modifiers};
use crate::interaction::{InteractionController, InteractionOutcome, Tool};
use crate::notice::Notice;
use crate::scene::RenderSnapshot;
use crate::viewport::{CoordinateMapper, PanZoom};
use takeoff_core::{
    CalibrationError, EngineConfig, MeasurementRepository, MeasurementStore, Point, ScaleError,
    Unit,
};

/// The file measurements belong to
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentFile {
    pub id: String,
    pub name: String,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl CurrentFile {
    pub fn new(id: impl Into<String>, name: impl Into<String>, pixel_width: u32, pixel_height: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            pixel_width,
            pixel_height,
        }
    }
}

/// Rejected session action; the session state is unchanged
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error(transparent)]
    Scale(#[from] ScaleError),

    #[error("no calibration is waiting for a value")]
    NoCalibrationPending,
}

/// Scriptable session input, one step of a recorded or replayed session
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum SessionCommand {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    PointerLeave,
    DoubleClick { x: f64, y: f64 },
    /// Press and release at the same position
    Click { x: f64, y: f64 },
    Key {
        key: Key,
        #[serde(default)]
        modifiers: Modifiers,
    },
    SelectTool { tool: Tool },
    /// Replace the calibration dialog's input text
    DialogInput { text: String },
    DialogUnit { unit: Unit },
    ConfirmCalibration,
    CancelCalibration,
    SetDisplayScale { scale: f64 },
    SetUnit { unit: Unit },
    ResetScale,
    ShowAll { enabled: bool },
    Undo,
    Redo,
    Delete { index: usize },
    #[serde(rename_all = "camelCase")]
    SetTransform {
        scale: f64,
        translate_x: f64,
        translate_y: f64,
    },
}

/// Measurement session bound to one file and one persistence collaborator
#[derive(Debug)]
pub struct MeasureSession<R: MeasurementRepository> {
    file: CurrentFile,
    store: MeasurementStore,
    controller: InteractionController,
    mapper: CoordinateMapper,
    dialog: CalibrationDialog,
    repository: R,
    notices: Vec<Notice>,
}

impl<R: MeasurementRepository> MeasureSession<R> {
    /// Open a session and load the file's stored measurements
    pub fn open(file: CurrentFile, repository: R, config: &EngineConfig) -> Self {
        let mut session = Self {
            store: MeasurementStore::with_config(config),
            controller: InteractionController::new(config),
            mapper: CoordinateMapper::default(),
            dialog: CalibrationDialog::new(),
            repository,
            notices: Vec::new(),
            file,
        };
        session.load();
        session
    }

    fn load(&mut self) {
        match self.repository.load_measurement_set(&self.file.id) {
            Ok(Some(set)) => {
                tracing::debug!(file = %self.file.id, count = set.measurements.len(), "loaded measurements");
                if let Err(err) = set.scale_setting() {
                    self.notices.push(Notice::warning(format!(
                        "Stored scale for {} was ignored: {}",
                        self.file.name, err
                    )));
                }
                self.store.load(set);
            }
            Ok(None) => {
                tracing::debug!(file = %self.file.id, "no stored measurements");
            }
            Err(err) => {
                tracing::warn!(file = %self.file.id, %err, "failed to load measurements");
                self.notices.push(Notice::error(format!(
                    "Could not load measurements for {}: {}",
                    self.file.name, err
                )));
            }
        }
    }

    fn save(&mut self) {
        let set = self.store.to_measurement_set();
        if let Err(err) = self.repository.save_measurement_set(&self.file.id, &set) {
            tracing::warn!(file = %self.file.id, %err, "failed to save measurements");
            self.notices
                .push(Notice::error(format!("Could not save measurements: {}", err)));
        }
    }

    pub fn file(&self) -> &CurrentFile {
        &self.file
    }

    pub fn store(&self) -> &MeasurementStore {
        &self.store
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn dialog(&self) -> &CalibrationDialog {
        &self.dialog
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Feed one input event through the interaction layer
    ///
    /// Key presses go to the calibration dialog while it is open.
    pub fn handle_event(&mut self, event: &InputEvent) -> InteractionOutcome {
        if let (InputEvent::Key(key), true) = (event, self.dialog.is_visible()) {
            return self.dialog_key(*key);
        }

        let outcome = self.controller.handle(&mut self.store, &self.mapper, event);
        self.after(&outcome);
        outcome
    }

    fn after(&mut self, outcome: &InteractionOutcome) {
        match outcome {
            InteractionOutcome::Changed => self.save(),
            InteractionOutcome::CalibrationCaptured(reference) => {
                self.dialog.show(reference.clone(), self.store.unit());
            }
            InteractionOutcome::CalibrationCancelled => self.dialog.hide(),
            InteractionOutcome::Ignored | InteractionOutcome::Updated => {}
        }
    }

    fn dialog_key(&mut self, input: KeyInput) -> InteractionOutcome {
        match input.key {
            Key::Escape => self.cancel_calibration(),
            Key::Enter => match self.confirm_calibration() {
                Ok(_) => InteractionOutcome::Changed,
                Err(_) => InteractionOutcome::Updated,
            },
            Key::Backspace | Key::Delete => {
                self.dialog.backspace();
                InteractionOutcome::Updated
            }
            Key::Char(c) => {
                self.dialog.append_char(c);
                InteractionOutcome::Updated
            }
        }
    }

    /// Read the latest pan/zoom transform
    pub fn set_transform(&mut self, transform: PanZoom) {
        self.mapper.set_transform(transform);
    }

    /// Screen position of the drawing surface's top-left corner
    pub fn set_origin(&mut self, origin: Point) {
        self.mapper.set_origin(origin);
    }

    pub fn select_tool(&mut self, tool: Tool) -> InteractionOutcome {
        self.dialog.hide();
        let outcome = self.controller.select_tool(&mut self.store, tool);
        self.after(&outcome);
        outcome
    }

    pub fn set_dialog_input(&mut self, text: impl Into<String>) {
        self.dialog.set_value_input(text);
    }

    pub fn set_dialog_unit(&mut self, unit: Unit) {
        self.dialog.set_unit(unit);
    }

    /// Apply the dialog's value as the new scale
    ///
    /// Rejected input keeps the dialog open with its error and leaves the
    /// store untouched.
    pub fn confirm_calibration(&mut self) -> Result<CalibrationResult, SessionError> {
        if !self.dialog.is_visible() {
            return Err(SessionError::NoCalibrationPending);
        }
        let result = self.dialog.confirm()?;
        self.store
            .apply_calibration(result.pixels_per_unit, result.unit)?;
        self.dialog.hide();
        self.controller.finish_calibration(&mut self.store);
        tracing::debug!(
            pixels_per_unit = result.pixels_per_unit,
            unit = %result.unit,
            "scale calibrated"
        );
        self.save();
        Ok(result)
    }

    /// Dismiss calibration without changing the scale
    pub fn cancel_calibration(&mut self) -> InteractionOutcome {
        self.dialog.hide();
        self.controller.cancel_calibration(&mut self.store)
    }

    /// Set the "100 px = N units" display scale and recompute from geometry
    pub fn set_display_scale(&mut self, scale: f64) -> Result<(), SessionError> {
        self.store.set_scale(scale)?;
        self.store.recompute_all();
        self.store.add_history_entry();
        self.save();
        Ok(())
    }

    /// Switch the display unit, converting stored values
    pub fn set_unit(&mut self, unit: Unit) {
        if unit == self.store.unit() {
            return;
        }
        self.store.update_measurements_unit(unit);
        self.store.add_history_entry();
        self.save();
    }

    pub fn reset_scale(&mut self) {
        self.store.reset_scale();
        self.save();
    }

    pub fn set_show_all(&mut self, show_all: bool) {
        self.store.set_show_all(show_all);
    }

    pub fn undo(&mut self) -> bool {
        let moved = self.store.undo();
        if moved {
            self.save();
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.store.redo();
        if moved {
            self.save();
        }
        moved
    }

    pub fn delete_measurement(&mut self, index: usize) -> bool {
        let removed = self.store.remove_measurement(index).is_some();
        if removed {
            self.save();
        }
        removed
    }

    /// Immutable view for the renderer
    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::capture(&self.store, &self.controller, &self.mapper)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain queued notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Apply one scripted command
    pub fn apply(&mut self, command: SessionCommand) -> Result<(), SessionError> {
        match command {
            SessionCommand::PointerDown { x, y } => {
                self.handle_event(&InputEvent::PointerDown { x, y });
            }
            SessionCommand::PointerMove { x, y } => {
                self.handle_event(&InputEvent::PointerMove { x, y });
            }
            SessionCommand::PointerUp { x, y } => {
                self.handle_event(&InputEvent::PointerUp { x, y });
            }
            SessionCommand::PointerLeave => {
                self.handle_event(&InputEvent::PointerLeave);
            }
            SessionCommand::DoubleClick { x, y } => {
                self.handle_event(&InputEvent::DoubleClick { x, y });
            }
            SessionCommand::Click { x, y } => {
                self.handle_event(&InputEvent::PointerDown { x, y });
                self.handle_event(&InputEvent::PointerUp { x, y });
            }
            SessionCommand::Key { key, modifiers } => {
                self.handle_event(&InputEvent::Key(KeyInput::with_modifiers(key, modifiers)));
            }
            SessionCommand::SelectTool { tool } => {
                self.select_tool(tool);
            }
            SessionCommand::DialogInput { text } => self.set_dialog_input(text),
            SessionCommand::DialogUnit { unit } => self.set_dialog_unit(unit),
            SessionCommand::ConfirmCalibration => {
                self.confirm_calibration()?;
            }
            SessionCommand::CancelCalibration => {
                self.cancel_calibration();
            }
            SessionCommand::SetDisplayScale { scale } => self.set_display_scale(scale)?,
            SessionCommand::SetUnit { unit } => self.set_unit(unit),
            SessionCommand::ResetScale => self.reset_scale(),
            SessionCommand::ShowAll { enabled } => self.set_show_all(enabled),
            SessionCommand::Undo => {
                self.undo();
            }
            SessionCommand::Redo => {
                self.redo();
            }
            SessionCommand::Delete { index } => {
                self.delete_measurement(index);
            }
            SessionCommand::SetTransform {
                scale,
                translate_x,
                translate_y,
            } => self.set_transform(PanZoom::new(scale, translate_x, translate_y)),
        }
        Ok(())
    }

    /// Tear the session down, handing back the repository
    pub fn close(self) -> R {
        tracing::debug!(file = %self.file.id, "session closed");
        self.repository
    }
}
