pub mod entry;
pub mod reason;
pub mod types;

pub use entry::{EntryPatch, NewEntry, SavedEntry};
pub use reason::{NotStoppedReason, StopReason};
pub use types::{
    FieldError, FieldKind, FieldOption, FieldSpec, FormValues, RuleOperator, TemplateDefinition,
    VisibilityRule,
};
