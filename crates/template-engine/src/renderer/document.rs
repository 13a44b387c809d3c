//! Rendered output and whitespace normalization

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Literal,
    /// Visible field without a value; content is the raw `{name}` placeholder
    UnfilledField,
    /// Substituted field value
    FilledField,
}

/// A run of rendered text, used for highlighting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Tooltip for field segments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Segment {
    pub fn literal(content: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Literal,
            content: content.into(),
            field: None,
            label: None,
        }
    }

    pub fn field(
        kind: SegmentKind,
        content: impl Into<String>,
        field: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            content: content.into(),
            field: Some(field.into()),
            label: Some(label.into()),
        }
    }
}

/// Final document text plus its highlight segments. `text` is always the
/// concatenation of the segment contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub text: String,
    pub segments: Vec<Segment>,
}

impl RenderedDocument {
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let segments = normalize(segments);
        let text = segments.iter().map(|s| s.content.as_str()).collect();
        Self { text, segments }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Names of visible fields still waiting for a value, in document order
    pub fn unfilled_fields(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if segment.kind != SegmentKind::UnfilledField {
                continue;
            }
            if let Some(name) = segment.field.as_deref() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    pub fn is_complete(&self) -> bool {
        !self
            .segments
            .iter()
            .any(|s| s.kind == SegmentKind::UnfilledField)
    }

    /// Append a trailing paragraph separated by a blank line. The paragraph
    /// is literal text and is not normalized against the document.
    pub fn append_paragraph(&mut self, paragraph: &str) {
        if paragraph.is_empty() {
            return;
        }
        let content = if self.text.is_empty() {
            paragraph.to_string()
        } else {
            format!("\n\n{}", paragraph)
        };
        self.text.push_str(&content);
        match self.segments.last_mut() {
            Some(last) if last.kind == SegmentKind::Literal => last.content.push_str(&content),
            _ => self.segments.push(Segment::literal(content)),
        }
    }
}

/// Collapse runs of three or more newlines to two, trim the document edges,
/// drop empty segments and merge neighbouring literals.
fn normalize(segments: Vec<Segment>) -> Vec<Segment> {
    let mut newlines = 0usize;
    let mut segments: Vec<Segment> = segments
        .into_iter()
        .map(|mut segment| {
            segment.content = segment
                .content
                .chars()
                .filter(|&ch| {
                    if ch == '\n' {
                        newlines += 1;
                        newlines <= 2
                    } else {
                        newlines = 0;
                        true
                    }
                })
                .collect();
            segment
        })
        .collect();

    while let Some(first) = segments.first_mut() {
        let trimmed = first.content.trim_start();
        if trimmed.is_empty() {
            segments.remove(0);
        } else {
            first.content = trimmed.to_string();
            break;
        }
    }
    while let Some(last) = segments.last_mut() {
        let trimmed = last.content.trim_end();
        if trimmed.is_empty() {
            segments.pop();
        } else {
            last.content = trimmed.to_string();
            break;
        }
    }

    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
    for segment in segments {
        if segment.content.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(prev)
                if prev.kind == SegmentKind::Literal && segment.kind == SegmentKind::Literal =>
            {
                prev.content.push_str(&segment.content)
            }
            _ => merged.push(segment),
        }
    }
    merged
}
