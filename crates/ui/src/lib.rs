//! Takeoff UI Library
//!
//! Interaction layer for the measurement engine: viewport mapping, input
//! events, the interaction state machine, scale calibration and the render
//! snapshot consumed by a presentation layer.

pub mod calibration;
pub mod calibration_dialog;
pub mod input;
pub mod interaction;
pub mod notice;
pub mod scene;
pub mod session;
pub mod viewport;

pub use calibration::{solve_area, solve_distance, CalibrationKind, CalibrationReference};
pub use calibration_dialog::{CalibrationDialog, CalibrationResult};
pub use input::{InputEvent, Key, KeyInput, Modifiers, PointerTracker, Shortcut};
pub use interaction::{InteractionController, InteractionMode, InteractionOutcome, ResumeMode, Tool};
pub use notice::{Notice, NoticeSeverity};
pub use scene::{MeasurementView, PreviewShape, RenderSnapshot};
pub use session::{CurrentFile, MeasureSession, SessionCommand, SessionError};
pub use viewport::{CoordinateMapper, PanZoom};
