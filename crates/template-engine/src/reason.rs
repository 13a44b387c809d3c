//! Stop / no-stop clause appended below the rendered document

use shared_types::{NotStoppedReason, StopReason};

use crate::renderer::RenderedDocument;

/// Shown in place of an empty user-authored reason so the gap stands out
pub const REASON_PLACEHOLDER: &str = "[REDEN NIET STAANDE HOUDEN INVULLEN]";

pub const NO_DRIVER_CLAUSE: &str = "Ik heb de bestuurder niet staande kunnen houden, \
     omdat er geen bestuurder bij het voertuig aanwezig was.";

pub const NO_STOP_SIGNAL_CLAUSE: &str = "Ik heb de bestuurder niet staande kunnen houden, \
     omdat de bestuurder geen gevolg gaf aan het gegeven stopteken.";

/// The justification clause for the given state
pub fn compose_reason(reason: &StopReason, factcode: &str) -> String {
    match reason {
        StopReason::Stopped => format!(
            "Ik heb de bestuurder staande gehouden en medegedeeld dat proces-verbaal \
             wordt opgemaakt ter zake van feitcode {}.",
            factcode
        ),
        StopReason::NotStopped { reason } => match reason {
            NotStoppedReason::NoDriver => NO_DRIVER_CLAUSE.to_string(),
            NotStoppedReason::NoStopSignal => NO_STOP_SIGNAL_CLAUSE.to_string(),
            NotStoppedReason::Other(text) => {
                let text = text.trim();
                if text.is_empty() {
                    REASON_PLACEHOLDER.to_string()
                } else {
                    text.to_string()
                }
            }
        },
    }
}

/// Append the clause after a blank line. The clause never goes through
/// hidden-field removal.
pub fn append_reason(document: &mut RenderedDocument, reason: &StopReason, factcode: &str) {
    document.append_paragraph(&compose_reason(reason, factcode));
}
