//! Document rendering
//!
//! The template is tokenized once, grouped into sentence spans, and every span
//! containing a hidden field's placeholder is dropped whole. Remaining
//! placeholders are substituted when their field has a value and otherwise
//! kept as `{name}` and marked unfilled for highlighting.

mod document;
mod spans;

pub use document::{RenderedDocument, Segment, SegmentKind};
pub use spans::{sentence_spans, Span};

use shared_types::{FormValues, VisibilityRule};
use tracing::{debug, warn};

use crate::fields::FieldCatalog;
use crate::placeholder::{extract_fields, placeholder, tokenize, Token};
use crate::visibility::{resolve_visibility, Visibility};

/// Render `template` against the current values.
///
/// Hidden fields never reach the output: not their value, not their
/// placeholder, and not the sentence around them. Rendering is pure and
/// cheap enough to run on every keystroke.
pub fn render(
    template: &str,
    values: &FormValues,
    fields: &FieldCatalog,
    rules: &[VisibilityRule],
) -> RenderedDocument {
    let ordered = extract_fields(template);
    let visibility = match resolve_visibility(ordered.iter().map(String::as_str), values, rules) {
        Ok(visibility) => visibility,
        Err(e) => {
            warn!("Falling back to single-level visibility: {}", e);
            Visibility::shallow(ordered.iter().map(String::as_str), values, rules)
        }
    };

    render_with(template, values, fields, &visibility)
}

/// Render with an already resolved visibility map
pub fn render_with(
    template: &str,
    values: &FormValues,
    fields: &FieldCatalog,
    visibility: &Visibility,
) -> RenderedDocument {
    let tokens = tokenize(template);
    let mut segments = Vec::with_capacity(tokens.len());
    let mut dropped = 0usize;

    for span in sentence_spans(&tokens) {
        if span.placeholders().any(|name| !visibility.is_visible(name)) {
            dropped += 1;
            continue;
        }
        for token in &span.tokens {
            match *token {
                Token::Literal(text) => segments.push(Segment::literal(text)),
                Token::Placeholder(name) => {
                    let value = values.get(name);
                    let (kind, content) = if value.is_empty() {
                        (SegmentKind::UnfilledField, placeholder(name))
                    } else {
                        (SegmentKind::FilledField, value.to_string())
                    };
                    segments.push(Segment::field(kind, content, name, fields.label_for(name)));
                }
            }
        }
    }

    if dropped > 0 {
        debug!("Removed {} sentence(s) with hidden fields", dropped);
    }

    RenderedDocument::from_segments(segments)
}
