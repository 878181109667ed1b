//! Transient user notices
//!
//! Failures that must be reported but never stop the session (persistence
//! unreachable, stored scale ignored) are queued here for the host to show
//! as toasts or a dialog and then drain.

/// Notice severity levels with different visual styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    /// An action failed; in-memory state is still authoritative
    Error,
    /// Operation partially failed but the session continues
    Warning,
}

impl NoticeSeverity {
    /// Get the display title for this severity level
    pub fn title(&self) -> &'static str {
        match self {
            NoticeSeverity::Error => "Error",
            NoticeSeverity::Warning => "Warning",
        }
    }
}

/// One queued notice
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Notice {
    pub severity: NoticeSeverity,
    pub message: String,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Warning,
            message: message.into(),
        }
    }

    /// Title line for display
    pub fn title(&self) -> &'static str {
        self.severity.title()
    }
}
