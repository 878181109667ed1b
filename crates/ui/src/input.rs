//! Pointer and keyboard input events
//!
//! Positions are in screen space; the interaction layer maps them into
//! content space through the current [`crate::viewport::CoordinateMapper`].
//! Events are serde-friendly so recorded sessions can be replayed.

use takeoff_core::Point;

/// Keys the measurement engine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    Escape,
    Enter,
    Delete,
    Backspace,
    /// Printable character
    Char(char),
}

/// Modifier keys held during a key press
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    /// Command key on macOS
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn ctrl_shift() -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::NONE
        }
    }

    /// Ctrl on most platforms, Cmd on macOS
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A key press with its modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KeyInput {
    pub key: Key,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// History shortcut carried by this key press, if any
    ///
    /// Ctrl/Cmd+Z undoes; Ctrl/Cmd+Shift+Z and Ctrl/Cmd+Y redo.
    pub fn shortcut(&self) -> Option<Shortcut> {
        if !self.modifiers.command() {
            return None;
        }
        match self.key {
            Key::Char(c) if c.eq_ignore_ascii_case(&'z') => Some(if self.modifiers.shift {
                Shortcut::Redo
            } else {
                Shortcut::Undo
            }),
            Key::Char(c) if c.eq_ignore_ascii_case(&'y') => Some(Shortcut::Redo),
            _ => None,
        }
    }
}

/// Keyboard shortcuts handled outside the drawing flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
}

/// One input event as delivered by the host event loop
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    /// Pointer left the drawing surface
    PointerLeave,
    DoubleClick { x: f64, y: f64 },
    Key(KeyInput),
}

impl InputEvent {
    pub fn key(key: Key) -> Self {
        InputEvent::Key(KeyInput::new(key))
    }
}

/// Tracks one press/release cycle to tell clicks from drags
///
/// A release counts as a click only if the pointer never travelled further
/// than the slop (in screen pixels) from where it went down.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    pressed_at: Option<Point>,
    moved: bool,
}

impl PointerTracker {
    pub fn press(&mut self, screen: Point) {
        self.pressed_at = Some(screen);
        self.moved = false;
    }

    /// Record pointer travel; returns true once the press became a drag
    pub fn track(&mut self, screen: Point, slop: f64) -> bool {
        if let Some(start) = self.pressed_at {
            if start.distance_to(&screen) > slop {
                self.moved = true;
            }
        }
        self.moved
    }

    /// Finish the cycle; returns true if it was a click
    pub fn release(&mut self, screen: Point, slop: f64) -> bool {
        let was_click = match self.pressed_at.take() {
            Some(start) => !self.moved && start.distance_to(&screen) <= slop,
            None => false,
        };
        self.moved = false;
        was_click
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed_at.is_some()
    }

    pub fn cancel(&mut self) {
        self.pressed_at = None;
        self.moved = false;
    }
}
