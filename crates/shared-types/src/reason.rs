//! Stop / no-stop justification state

use serde::{Deserialize, Serialize};

/// Whether the driver was stopped, and if not, why
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StopReason {
    #[default]
    Stopped,
    NotStopped { reason: NotStoppedReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum NotStoppedReason {
    NoDriver,
    NoStopSignal,
    /// User-authored justification, may be empty while typing
    Other(String),
}

impl StopReason {
    pub fn not_stopped(reason: NotStoppedReason) -> Self {
        StopReason::NotStopped { reason }
    }
}
