//! Text-level editing of a parsed target.
//!
//! The editor owns the current text and its tree. Edits are byte-range
//! substitutions; after each batch the text is parsed again so that later
//! statements see a fresh tree. Scopes are stacks of byte ranges that are
//! carried through every edit.

use std::sync::Arc;

use text_size::{TextRange, TextSize};
use tracing::trace;

use crate::core::{InvariantError, Node, SourceCode};
use crate::languages::TransformLanguage;
use crate::location::LocationRoot;

/// Substitution of `range` by `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: TextRange,
    pub text: String,
}

impl TextEdit {
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::replace(offset, offset, text)
    }

    pub fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            range: TextRange::new(TextSize::new(start as u32), TextSize::new(end as u32)),
            text: text.into(),
        }
    }

    fn start(&self) -> usize {
        self.range.start().into()
    }

    fn end(&self) -> usize {
        self.range.end().into()
    }
}

pub struct SourceCodeEditor {
    language: Arc<dyn TransformLanguage>,
    dense_limit: usize,
    text: String,
    source: SourceCode,
    root: LocationRoot,
    scopes: Vec<Vec<TextRange>>,
}

impl SourceCodeEditor {
    pub fn new(
        language: Arc<dyn TransformLanguage>,
        text: &str,
        dense_limit: usize,
    ) -> Result<Self, InvariantError> {
        let source = language.analyze(text)?;
        let root = LocationRoot::new(source.root().clone(), dense_limit);
        let whole = TextRange::new(TextSize::new(0), TextSize::new(text.len() as u32));
        Ok(Self {
            language,
            dense_limit,
            text: text.to_string(),
            source,
            root,
            scopes: vec![vec![whole]],
        })
    }

    pub fn language(&self) -> &Arc<dyn TransformLanguage> {
        &self.language
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn source(&self) -> &SourceCode {
        &self.source
    }

    pub fn root(&self) -> &LocationRoot {
        &self.root
    }

    /// Pieces of the innermost scope.
    pub fn scope(&self) -> &[TextRange] {
        self.scopes.last().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn push_scope(&mut self, pieces: Vec<TextRange>) {
        self.scopes.push(pieces);
    }

    pub fn pop_scope(&mut self) -> Option<Vec<TextRange>> {
        // The whole-text frame stays.
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    /// Piece `index` of the scope `depth` frames below the innermost one.
    pub fn scope_piece(&self, depth: usize, index: usize) -> Option<TextRange> {
        let frame = self.scopes.len().checked_sub(depth + 1)?;
        self.scopes[frame].get(index).copied()
    }

    /// Apply non-overlapping edits and parse the result.
    ///
    /// Returns false when there was nothing to apply.
    pub fn apply_edits(&mut self, mut edits: Vec<TextEdit>) -> Result<bool, InvariantError> {
        edits.retain(|e| !(e.range.is_empty() && e.text.is_empty()));
        if edits.is_empty() {
            return Ok(false);
        }
        edits.sort_by(|a, b| b.range.start().cmp(&a.range.start()).then(b.range.end().cmp(&a.range.end())));
        edits.dedup();
        for edit in &edits {
            trace!(start = edit.start(), end = edit.end(), len = edit.text.len(), "edit");
            self.text.replace_range(edit.start()..edit.end(), &edit.text);
            for frame in &mut self.scopes {
                remap_frame(frame, edit);
            }
        }
        self.reparse()?;
        Ok(true)
    }

    /// Replace the whole tree. The text change is applied as a single edit
    /// covering what differs between the old and new text.
    pub fn set_root(&mut self, root: &Node) -> Result<bool, InvariantError> {
        let new_text = root.full_text();
        if new_text == self.text {
            return Ok(false);
        }
        let prefix = common_prefix(&self.text, &new_text);
        let suffix = common_suffix(&self.text[prefix..], &new_text[prefix..]);
        let edit = TextEdit::replace(
            prefix,
            self.text.len() - suffix,
            &new_text[prefix..new_text.len() - suffix],
        );
        self.apply_edits(vec![edit])
    }

    fn reparse(&mut self) -> Result<(), InvariantError> {
        self.source = self.language.analyze(&self.text)?;
        self.root = LocationRoot::new(self.source.root().clone(), self.dense_limit);
        Ok(())
    }
}

/// Carry the pieces of one scope frame through an edit. Text inserted where
/// one piece ends and the next starts belongs to the earlier piece.
fn remap_frame(frame: &mut [TextRange], edit: &TextEdit) {
    let at = edit.range.start();
    let shared: Vec<bool> = frame
        .iter()
        .enumerate()
        .map(|(i, piece)| {
            edit.range.is_empty()
                && piece.start() == at
                && frame.iter().enumerate().any(|(j, other)| j != i && other.end() == at)
        })
        .collect();
    for (piece, shared) in frame.iter_mut().zip(shared) {
        let mapped = remap(*piece, edit);
        *piece = if shared {
            let start = mapped.start() + TextSize::new(edit.text.len() as u32);
            TextRange::new(start, mapped.end().max(start))
        } else {
            mapped
        };
    }
}

/// Carry a range through an edit. Text inserted at either boundary ends up
/// inside the range.
fn remap(range: TextRange, edit: &TextEdit) -> TextRange {
    let (a, b) = (edit.start(), edit.end());
    let inserted = edit.text.len();
    let shift = |offset: usize| offset + inserted - (b - a);
    let start: usize = range.start().into();
    let end: usize = range.end().into();
    let new_start = if start <= a {
        start
    } else if start >= b {
        shift(start)
    } else {
        a
    };
    let new_end = if end < a || (end == a && a < b) {
        end
    } else if end >= b {
        shift(end)
    } else {
        a + inserted
    };
    TextRange::new(
        TextSize::new(new_start as u32),
        TextSize::new(new_end.max(new_start) as u32),
    )
}

fn common_prefix(a: &str, b: &str) -> usize {
    let mut len = 0;
    for ((i, x), y) in a.char_indices().zip(b.chars()) {
        if x != y {
            return i;
        }
        len = i + x.len_utf8();
    }
    len
}

fn common_suffix(a: &str, b: &str) -> usize {
    let mut len = 0;
    for (x, y) in a.chars().rev().zip(b.chars().rev()) {
        if x != y {
            break;
        }
        len += x.len_utf8();
    }
    len
}
