//! Report template engine
//!
//! Turns a free-text template with `{name}` placeholders into a finished
//! report paragraph:
//! - Placeholder extraction in first-appearance order
//! - A field catalog that survives template edits
//! - Conditional visibility rules between fields
//! - Rendering with hidden-sentence removal and unfilled-field highlighting
//! - The stop / no-stop clause
//! - Recent-entry recommendations behind a pluggable record store

pub mod error;
pub mod fields;
pub mod placeholder;
pub mod reason;
pub mod recommender;
pub mod renderer;
pub mod session;
pub mod store;
pub mod visibility;

pub use error::{EngineError, RuleError, StoreError};
pub use fields::{derive_label, FieldCatalog, FieldStatus};
pub use placeholder::extract_fields;
pub use reason::compose_reason;
pub use recommender::{dedupe_by_location, Recommendations, Recommender, RecommenderConfig};
pub use renderer::{render, RenderedDocument, Segment, SegmentKind};
pub use session::{FieldInput, ReportSession};
pub use store::{MemoryStore, RecordStore, Upsert};
pub use visibility::{is_visible, resolve_visibility, RuleSet, Visibility};
