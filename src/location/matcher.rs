use smol_str::SmolStr;
use text_size::TextRange;
use tracing::trace;

use super::errors::LocationError;
use super::range::{LocationRange, normalize};
use super::root::{LocationRoot, NodeLocation};
use crate::core::{NodeKind, Token};

/// Finds a token sequence in a tree, ignoring trivia.
///
/// With a span kind, each match widens to the innermost node of that kind
/// that contains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanMatcher {
    pattern: Vec<SmolStr>,
    span_kind: Option<NodeKind>,
}

impl SpanMatcher {
    pub fn new(pattern: Vec<SmolStr>, span_kind: Option<NodeKind>) -> Result<Self, LocationError> {
        if pattern.is_empty() {
            return Err(LocationError::EmptyPattern);
        }
        Ok(Self { pattern, span_kind })
    }

    pub fn from_tokens(tokens: &[Token], span_kind: Option<NodeKind>) -> Result<Self, LocationError> {
        Self::new(
            tokens.iter().map(|t| SmolStr::new(t.text())).collect(),
            span_kind,
        )
    }

    pub fn pattern(&self) -> &[SmolStr] {
        &self.pattern
    }

    pub fn span_kind(&self) -> Option<NodeKind> {
        self.span_kind
    }

    /// Normalized matches whose tokens lie inside one of the scope pieces.
    pub fn find(&self, root: &LocationRoot, scope: &[TextRange]) -> Vec<LocationRange> {
        let leaves: Vec<NodeLocation> = root
            .leaves()
            .into_iter()
            .filter(|l| l.node().leaf_token().is_some_and(|t| !t.is_end_of_input()))
            .collect();
        let n = self.pattern.len();
        let mut matches = Vec::new();
        for piece in scope {
            let mut i = 0;
            while i + n <= leaves.len() {
                let window = &leaves[i..i + n];
                if self.matches_window(window, *piece) {
                    let range = LocationRange::new(window[0].clone(), window[n - 1].clone());
                    if let Some(range) = self.widen(range, *piece) {
                        trace!(position = range.position(), "span match");
                        matches.push(range);
                    }
                    i += n;
                } else {
                    i += 1;
                }
            }
        }
        normalize(matches)
    }

    fn matches_window(&self, window: &[NodeLocation], piece: TextRange) -> bool {
        window.iter().zip(&self.pattern).all(|(leaf, text)| {
            leaf.node().leaf_token().is_some_and(|t| t.text() == text.as_str())
                && piece.contains_range(leaf.token_range())
        })
    }

    fn widen(&self, range: LocationRange, piece: TextRange) -> Option<LocationRange> {
        let Some(kind) = self.span_kind else {
            return Some(range);
        };
        let end = range.end_position();
        let beg = range.beg;
        let node = std::iter::once(beg.clone())
            .chain(beg.ancestors())
            .find(|l| l.kind() == kind && l.end_position() >= end)?;
        piece
            .contains_range(node.token_range())
            .then(|| LocationRange::single(node))
    }
}
