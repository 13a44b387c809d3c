//! Sentence spans
//!
//! A span runs from just after one period up to and including the next one.
//! Text after the last period forms a final, unterminated span. Boundaries are
//! taken from the template's literal text only, so substituted values can
//! never move them.

use crate::placeholder::Token;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Span<'a> {
    pub tokens: Vec<Token<'a>>,
}

impl<'a> Span<'a> {
    pub fn placeholders(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.tokens.iter().filter_map(|t| match t {
            Token::Placeholder(name) => Some(*name),
            Token::Literal(_) => None,
        })
    }
}

/// Group tokens into sentence spans
pub fn sentence_spans<'a>(tokens: &[Token<'a>]) -> Vec<Span<'a>> {
    let mut spans = Vec::new();
    let mut current = Span::default();

    for token in tokens {
        match *token {
            Token::Placeholder(_) => current.tokens.push(*token),
            Token::Literal(mut text) => {
                while let Some(idx) = text.find('.') {
                    let (head, tail) = text.split_at(idx + 1);
                    current.tokens.push(Token::Literal(head));
                    spans.push(std::mem::take(&mut current));
                    text = tail;
                }
                if !text.is_empty() {
                    current.tokens.push(Token::Literal(text));
                }
            }
        }
    }

    if !current.tokens.is_empty() {
        spans.push(current);
    }
    spans
}
