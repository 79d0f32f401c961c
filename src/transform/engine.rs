//! Execution of function bodies against one target.

use std::sync::Arc;

use text_size::{TextRange, TextSize};
use tracing::{debug, trace};

use super::ast::{
    AstNode, InScope, InjectAround, InjectInto, Location, Replace, Statement, StatementBlock,
};
use super::editor::{SourceCodeEditor, TextEdit};
use super::errors::TransformError;
use super::options::TransformOptions;
use crate::core::{Node, SourceCode, Trivia, tokenize};
use crate::languages::{LanguageRegistry, TransformLanguage};
use crate::location::{LocationCardinality, LocationRange, Selection, SpanMatcher};

/// Run `body` over `text` and return the edited text.
pub(crate) fn run(
    registry: &LanguageRegistry,
    options: &TransformOptions,
    origin: &str,
    target: &str,
    language: Arc<dyn TransformLanguage>,
    body: &StatementBlock,
    text: &str,
) -> Result<String, TransformError> {
    let editor = SourceCodeEditor::new(language, text, options.max_dense_cache)?;
    check_syntax(target, editor.source())?;
    let mut engine = Engine {
        registry,
        options,
        origin,
        editor,
    };
    engine.run_block(body)?;
    check_syntax(target, engine.editor.source())?;
    Ok(engine.editor.into_text())
}

/// The first syntax error of a parsed text, if any.
pub(crate) fn check_syntax(origin: &str, source: &SourceCode) -> Result<(), TransformError> {
    match source.located_errors().into_iter().next() {
        Some((span, error)) => Err(TransformError::Syntax {
            origin: origin.to_string(),
            span,
            message: error.message.to_string(),
        }),
        None => Ok(()),
    }
}

struct Engine<'a> {
    registry: &'a LanguageRegistry,
    options: &'a TransformOptions,
    origin: &'a str,
    editor: SourceCodeEditor,
}

/// Matches of a location before the cardinality is applied.
struct Resolved {
    label: String,
    cardinality: LocationCardinality,
    matches: Vec<LocationRange>,
}

impl Engine<'_> {
    fn run_block(&mut self, block: &StatementBlock) -> Result<(), TransformError> {
        for statement in block.statements() {
            trace!(statement = %statement.syntax().token_text(), "run");
            match &statement {
                Statement::InjectInto(s) => self.inject_into(s)?,
                Statement::InjectAround(s) => self.inject_around(s)?,
                Statement::Replace(s) => self.replace(s)?,
                Statement::InScope(s) => self.in_scope(s)?,
                Statement::Language(node) => self.language_statement(node)?,
            }
        }
        Ok(())
    }

    // ========================================================================
    // Locations
    // ========================================================================

    fn resolution(&self, location: &str, reason: impl Into<String>) -> TransformError {
        TransformError::Resolution {
            origin: self.origin.to_string(),
            location: location.to_string(),
            reason: reason.into(),
        }
    }

    fn incomplete(&self, statement: &Node) -> TransformError {
        self.resolution(&statement.token_text(), "incomplete statement")
    }

    fn resolve(&self, location: &Location) -> Result<Resolved, TransformError> {
        let label = location.syntax().token_text();
        let matcher = location
            .matcher()
            .ok_or_else(|| self.resolution(&label, "missing pattern"))?;
        let pattern = matcher
            .pattern()
            .ok_or_else(|| self.resolution(&label, "missing pattern"))?;
        let language = match matcher.language() {
            Some(name) => self
                .registry
                .get(name)
                .cloned()
                .ok_or_else(|| TransformError::UnknownLanguage(name.into()))?,
            None => self.editor.language().clone(),
        };
        let span_kind = match matcher.span_type() {
            Some(name) => Some(
                language
                    .span_type(name)
                    .ok_or_else(|| self.resolution(&label, format!("unknown span type '{name}'")))?,
            ),
            None => None,
        };
        let tokens = tokenize(language.analyzer().tokenizer(), &pattern);
        let span = SpanMatcher::from_tokens(&tokens, span_kind)
            .map_err(|e| self.resolution(&label, e.to_string()))?;
        let cardinality = match location.cardinality() {
            Some(node) => node
                .value()
                .ok_or_else(|| self.resolution(&label, "invalid cardinality"))?,
            None => LocationCardinality::default(),
        };
        cardinality
            .validate()
            .map_err(|e| self.resolution(&label, e.to_string()))?;
        let matches = span.find(self.editor.root(), self.editor.scope());
        debug!(location = %label, matches = matches.len(), "resolved");
        Ok(Resolved {
            label,
            cardinality,
            matches,
        })
    }

    fn select(&self, resolved: Resolved) -> Result<Selection, TransformError> {
        let Resolved {
            label,
            cardinality,
            matches,
        } = resolved;
        cardinality
            .select(matches)
            .map_err(|e| self.resolution(&label, format!("{cardinality}: {e}")))
    }

    /// The scope already holds `content` as a token sequence.
    fn scope_contains(&self, content: &str) -> bool {
        let tokens = tokenize(self.editor.language().analyzer().tokenizer(), content);
        match SpanMatcher::from_tokens(&tokens, None) {
            Ok(matcher) => !matcher.find(self.editor.root(), self.editor.scope()).is_empty(),
            Err(_) => true,
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn replace(&mut self, statement: &Replace) -> Result<(), TransformError> {
        let (Some(location), Some(content)) = (statement.location(), statement.content()) else {
            return Err(self.incomplete(statement.syntax()));
        };
        let resolved = self.resolve(&location)?;
        if resolved.matches.is_empty() && self.scope_contains(&content) {
            debug!(location = %resolved.label, "replacement already present");
            return Ok(());
        }
        let selection = self.select(resolved)?;
        let edits = selection
            .ranges
            .iter()
            .map(|range| TextEdit {
                range: range.token_range(),
                text: content.clone(),
            })
            .collect();
        self.editor.apply_edits(edits)?;
        Ok(())
    }

    fn inject_around(&mut self, statement: &InjectAround) -> Result<(), TransformError> {
        let (Some(location), Some(content)) = (statement.location(), statement.content()) else {
            return Err(self.incomplete(statement.syntax()));
        };
        let before = statement.is_before();
        let selection = self.select(self.resolve(&location)?)?;
        let sites: Vec<&LocationRange> = if selection.each {
            selection.ranges.iter().collect()
        } else if before {
            selection.ranges.first().into_iter().collect()
        } else {
            selection.ranges.last().into_iter().collect()
        };
        let text = self.editor.text();
        let newline = &self.options.newline;
        let mut edits = Vec::new();
        for site in sites {
            let range = site.token_range();
            let offset = usize::from(if before { range.start() } else { range.end() });
            if is_adjacent(text, offset, &content, before) {
                trace!(offset, "injection already present");
                continue;
            }
            edits.push(TextEdit::insert(
                offset,
                around_text(text, offset, &content, before, newline),
            ));
        }
        self.editor.apply_edits(edits)?;
        Ok(())
    }

    fn in_scope(&mut self, statement: &InScope) -> Result<(), TransformError> {
        let (Some(location), Some(body)) = (statement.location(), statement.body()) else {
            return Err(self.incomplete(statement.syntax()));
        };
        let selection = self.select(self.resolve(&location)?)?;
        let pieces: Vec<TextRange> = selection.ranges.iter().map(|r| r.token_range()).collect();
        if !selection.each {
            self.editor.push_scope(pieces);
            let result = self.run_block(&body);
            self.editor.pop_scope();
            return result;
        }
        let count = pieces.len();
        self.editor.push_scope(pieces);
        let mut result = Ok(());
        for index in 0..count {
            let Some(piece) = self.editor.scope_piece(0, index) else {
                break;
            };
            self.editor.push_scope(vec![piece]);
            result = self.run_block(&body);
            self.editor.pop_scope();
            if result.is_err() {
                break;
            }
        }
        self.editor.pop_scope();
        result
    }

    fn language_statement(&mut self, statement: &Node) -> Result<(), TransformError> {
        let language = self.editor.language().clone();
        let root = self.editor.root().node().clone();
        match language.apply_statement(statement, &root, &self.options.newline) {
            Some(result) => {
                self.editor.set_root(&result?)?;
                Ok(())
            }
            None => Err(TransformError::Unsupported {
                origin: self.origin.to_string(),
                statement: statement
                    .first_token()
                    .map(|t| t.text().to_string())
                    .unwrap_or_default(),
                language: language.name().into(),
            }),
        }
    }

    // ========================================================================
    // Injection points
    // ========================================================================

    fn inject_into(&mut self, statement: &InjectInto) -> Result<(), TransformError> {
        let (Some(point), Some(content)) = (statement.point(), statement.content()) else {
            return Err(self.incomplete(statement.syntax()));
        };
        let Some(name) = point.name() else {
            return Err(self.incomplete(statement.syntax()));
        };
        let markers = self.find_markers(name);
        let count = |role| markers.iter().filter(|m| m.role == role).count();
        let (points, opens, closes) = (
            count(MarkerRole::Point),
            count(MarkerRole::Open),
            count(MarkerRole::Close),
        );
        let marker_error = |reason: String| TransformError::Marker {
            origin: self.origin.to_string(),
            marker: name.into(),
            reason,
        };
        let text = self.editor.text();
        let newline = &self.options.newline;
        let edit = match (points, opens, closes) {
            (0, 0, 0) => return Err(marker_error("not found".to_string())),
            (1, 0, 0) => {
                let marker = &markers[0];
                Some(TextEdit::replace(
                    marker.start,
                    marker.end,
                    open_region(text, marker, name, &content, newline),
                ))
            }
            (n, 0, 0) => return Err(marker_error(format!("found {n} times"))),
            (0, 1, 1) => {
                let open = markers.iter().find(|m| m.role == MarkerRole::Open);
                let close = markers.iter().find(|m| m.role == MarkerRole::Close);
                match (open, close) {
                    (Some(open), Some(close)) if open.end <= close.start => {
                        append_to_region(text, open, close, &content, newline)
                    }
                    _ => return Err(marker_error("region is not balanced".to_string())),
                }
            }
            _ => return Err(marker_error("region is not balanced".to_string())),
        };
        if let Some(edit) = edit {
            self.editor.apply_edits(vec![edit])?;
        }
        Ok(())
    }

    /// Comments of the scope that are markers of `name`.
    fn find_markers(&self, name: &str) -> Vec<Marker> {
        let point = format!("<{name}/>");
        let open = format!("<{name}>");
        let close = format!("</{name}>");
        let scope = self.editor.scope();
        let mut markers = Vec::new();
        let mut offset = 0;
        let mut visit = |offset: usize, trivia: &Trivia| {
            if !trivia.is_comment() {
                return;
            }
            let range = TextRange::new(
                TextSize::new(offset as u32),
                TextSize::new((offset + trivia.len()) as u32),
            );
            if !scope.iter().any(|piece| piece.contains_range(range)) {
                return;
            }
            let content = trivia.comment_content().trim();
            let role = if content == point {
                MarkerRole::Point
            } else if content == open {
                MarkerRole::Open
            } else if content == close {
                MarkerRole::Close
            } else {
                return;
            };
            markers.push(Marker {
                role,
                start: offset,
                end: offset + trivia.len(),
                line: trivia.is_line_comment(),
                comment_open: trivia.comment_open().to_string(),
                comment_close: trivia.comment_close().to_string(),
            });
        };
        for leaf in self.editor.root().node().leaves() {
            let Some(token) = leaf.leaf_token() else {
                continue;
            };
            for trivia in token.leading_trivia() {
                visit(offset, trivia);
                offset += trivia.len();
            }
            offset += token.text().len();
            for trivia in token.trailing_trivia() {
                visit(offset, trivia);
                offset += trivia.len();
            }
        }
        markers
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerRole {
    Point,
    Open,
    Close,
}

#[derive(Debug)]
struct Marker {
    role: MarkerRole,
    start: usize,
    end: usize,
    line: bool,
    comment_open: String,
    comment_close: String,
}

/// `<M/>` becomes `<M>` content `</M>`.
fn open_region(text: &str, marker: &Marker, name: &str, content: &str, newline: &str) -> String {
    let (open, close) = (&marker.comment_open, &marker.comment_close);
    if !marker.line {
        return format!("{open}<{name}>{close}{content}{open}</{name}>{close}");
    }
    let indent = line_indent(text, marker.start);
    let body = indent_lines(content, newline, indent);
    format!("{open} <{name}>{newline}{indent}{body}{newline}{indent}{open} </{name}>")
}

/// Add `content` before the closing marker unless the region has it.
fn append_to_region(
    text: &str,
    open: &Marker,
    close: &Marker,
    content: &str,
    newline: &str,
) -> Option<TextEdit> {
    if squash(&text[open.end..close.start]).contains(&squash(content)) {
        return None;
    }
    let start = line_start(text, close.start);
    let prefix = &text[start..close.start];
    if close.line && prefix.trim().is_empty() {
        let body = indent_lines(content, newline, prefix);
        return Some(TextEdit::insert(close.start, format!("{body}{newline}{prefix}")));
    }
    Some(TextEdit::insert(close.start, content))
}

// ============================================================================
// Text helpers
// ============================================================================

/// Text with every whitespace character removed.
fn squash(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map_or(0, |i| i + 1)
}

fn line_end(text: &str, offset: usize) -> usize {
    text[offset..].find('\n').map_or(text.len(), |i| offset + i)
}

/// Leading whitespace of the line holding `offset`.
fn line_indent(text: &str, offset: usize) -> &str {
    let start = line_start(text, offset);
    let line = &text[start..line_end(text, offset)];
    &line[..line.len() - line.trim_start().len()]
}

/// Lines of `content` joined by `newline` and `indent`; blank lines stay empty.
fn indent_lines(content: &str, newline: &str, indent: &str) -> String {
    let mut out = String::new();
    for (i, line) in content.lines().enumerate() {
        if i > 0 {
            out.push_str(newline);
            if !line.trim().is_empty() {
                out.push_str(indent);
            }
        }
        out.push_str(line);
    }
    out
}

/// The non-whitespace text next to `offset` already is `content`.
fn is_adjacent(text: &str, offset: usize, content: &str, before: bool) -> bool {
    let needle = squash(content);
    if needle.is_empty() {
        return true;
    }
    let count = needle.chars().count();
    if before {
        text[..offset]
            .chars()
            .rev()
            .filter(|c| !c.is_whitespace())
            .take(count)
            .eq(needle.chars().rev())
    } else {
        text[offset..]
            .chars()
            .filter(|c| !c.is_whitespace())
            .take(count)
            .eq(needle.chars())
    }
}

/// Text inserted before or after a site. A site alone on its side of the line
/// gets the content on its own line(s) with the site's indentation.
fn around_text(text: &str, offset: usize, content: &str, before: bool, newline: &str) -> String {
    let indent = line_indent(text, offset);
    let body = indent_lines(content, newline, indent);
    if before && text[line_start(text, offset)..offset].trim().is_empty() {
        return format!("{body}{newline}{indent}");
    }
    if !before && text[offset..line_end(text, offset)].trim().is_empty() {
        return format!("{newline}{indent}{body}");
    }
    content.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_adjacent_ignores_whitespace() {
        let text = "a();\n  b ( ) ;\nc();";
        let offset = text.find('c').unwrap_or_default();
        assert!(is_adjacent(text, offset, "b();", true));
        assert!(!is_adjacent(text, offset, "x();", true));
        assert!(is_adjacent(text, 0, "a ( )", false));
    }

    #[test]
    fn test_around_text_is_line_aware() {
        let text = "{\n    a();\n}";
        let start = text.find('a').unwrap_or_default();
        assert_eq!(around_text(text, start, "x();", true, "\n"), "x();\n    ");
        let end = start + "a();".len();
        assert_eq!(around_text(text, end, "x();", false, "\n"), "\n    x();");
        assert_eq!(around_text("a b", 2, "x ", true, "\n"), "x ");
    }

    #[test]
    fn test_indent_lines() {
        assert_eq!(indent_lines("a\n\nb", "\n", "  "), "a\n\n  b");
        assert_eq!(line_indent("x\n\t  y", 5), "\t  ");
    }
}
