//! Placeholder scanning
//!
//! Templates are free text with `{name}` slots. A name is any non-empty run of
//! characters other than `}`; `{}` is left alone as literal text.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([^}]*)\}").unwrap();
}

/// One lexical piece of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

/// Split a template into literal and placeholder tokens, in order.
/// Adjacent literal text is always merged into a single token.
pub fn tokenize(template: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut literal_start = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if name.as_str().is_empty() {
            continue;
        }
        if whole.start() > literal_start {
            tokens.push(Token::Literal(&template[literal_start..whole.start()]));
        }
        tokens.push(Token::Placeholder(name.as_str()));
        literal_start = whole.end();
    }

    if literal_start < template.len() {
        tokens.push(Token::Literal(&template[literal_start..]));
    }

    tokens
}

/// Distinct field names in order of first appearance
pub fn extract_fields(template: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(template)
        .into_iter()
        .filter_map(|token| match token {
            Token::Placeholder(name) if seen.insert(name) => Some(name.to_string()),
            _ => None,
        })
        .collect()
}

/// The literal `{name}` form of a placeholder
pub fn placeholder(name: &str) -> String {
    format!("{{{}}}", name)
}
