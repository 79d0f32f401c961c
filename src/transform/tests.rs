use std::sync::Arc;

use rstest::rstest;
use text_size::{TextRange, TextSize};

use super::ast::{AstNode, Statement};
use super::*;
use crate::base::ResourceLocator;
use crate::core::NodeKind;
use crate::languages::{GenericLanguage, LanguageRegistry, TransformLanguage};
use crate::location::LocationCardinality;

fn origin() -> ResourceLocator {
    ResourceLocator::new("test", "src/edit.t")
}

fn host() -> TransformHost {
    TransformHost::with_defaults()
}

fn transform(transformer: &str, target: &str, text: &str) -> Result<String, TransformError> {
    host().transform(&origin(), transformer, target, text)
}

fn function(body: &str) -> String {
    format!("create transformer\nbegin\n{body}\nend\n")
}

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(TextSize::new(start), TextSize::new(end))
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_function_header() {
    let text = "// two functions\ncreate less transformer Theme on \"theme.less\"\nbegin\nend\n\ncreate transformer begin end\n";
    let functions = host().parse_functions(&origin(), text).unwrap();
    assert_eq!(functions.len(), 2);
    assert_eq!(functions[0].language(), Some("less"));
    assert_eq!(functions[0].name(), Some("Theme"));
    assert_eq!(functions[0].target(), Some("theme.less"));
    assert_eq!(functions[0].display_name(), "Theme");
    assert_eq!(functions[1].language(), None);
    assert_eq!(functions[1].target(), None);
    assert_eq!(functions[1].display_name(), "test:src/edit.t#1");
    assert!(functions[0].index() < functions[1].index());
}

#[test]
fn test_parse_statements() {
    let text = function(
        "inject \"a\" into <Point/>;\n\
         inject 'b' before first +2 out of 3 {statement}.typescript \"x\";\n\
         replace each 2 \"y\" with \"z\";\n\
         in all {block} \"k\" begin inject \"c\" after \"d\"; end",
    );
    let functions = host().parse_functions(&origin(), &text).unwrap();
    let statements: Vec<Statement> = functions[0].body().statements().collect();
    assert_eq!(statements.len(), 4);

    let Statement::InjectInto(into) = &statements[0] else {
        panic!("expected inject into");
    };
    let point = into.point().unwrap();
    assert_eq!(point.name(), Some("Point"));
    assert!(point.is_self_closing());

    let Statement::InjectAround(around) = &statements[1] else {
        panic!("expected inject before");
    };
    assert!(around.is_before());
    assert_eq!(around.content().as_deref(), Some("b"));
    let location = around.location().unwrap();
    assert_eq!(
        location.cardinality().and_then(|c| c.value()),
        Some(LocationCardinality::First {
            offset: 2,
            out_of: Some(3)
        })
    );
    let matcher = location.matcher().unwrap();
    assert_eq!(matcher.span_type(), Some("statement"));
    assert_eq!(matcher.language(), Some("typescript"));
    assert_eq!(matcher.pattern().as_deref(), Some("x"));

    let Statement::Replace(replace) = &statements[2] else {
        panic!("expected replace");
    };
    assert_eq!(
        replace.location().and_then(|l| l.cardinality()).and_then(|c| c.value()),
        Some(LocationCardinality::Each { expected: Some(2) })
    );

    let Statement::InScope(scope) = &statements[3] else {
        panic!("expected in");
    };
    assert_eq!(scope.body().unwrap().statements().count(), 1);
    assert_eq!(scope.syntax().kind(), NodeKind::InScope);
}

#[test]
fn test_parse_error_is_reported_with_position() {
    let text = function("replace \"a\" \"b\";");
    let err = host().parse_functions(&origin(), &text).unwrap_err();
    let TransformError::Syntax { origin, span, message } = err else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert_eq!(origin, "test:src/edit.t");
    assert_eq!(message, "Missing 'with'");
    assert_eq!(span.start.line, 2);
}

#[test]
fn test_unknown_statement_is_a_syntax_error() {
    let err = host()
        .parse_functions(&origin(), &function("frobnicate \"x\";"))
        .unwrap_err();
    assert!(matches!(err, TransformError::Syntax { ref message, .. } if message == "Unexpected 'frobnicate'"));
}

#[test]
fn test_unknown_header_language() {
    let err = host()
        .parse_functions(&origin(), "create cobol transformer begin end")
        .unwrap_err();
    assert_eq!(err, TransformError::UnknownLanguage("cobol".into()));
}

#[test]
fn test_source_without_functions() {
    let functions = host().parse_functions(&origin(), "/* nothing */\n").unwrap();
    assert!(functions.is_empty());
}

// ============================================================================
// Replace
// ============================================================================

#[test]
fn test_replace_keeps_surrounding_text() {
    let out = transform(
        &function("replace \"1\" with \"42\";"),
        "a.ts",
        "const x = 1; // one\nconst y = 2;\n",
    )
    .unwrap();
    assert_eq!(out, "const x = 42; // one\nconst y = 2;\n");
}

#[test]
fn test_replace_pattern_ignores_trivia() {
    let out = transform(
        &function("replace \"f(a,b)\" with \"g(a, b)\";"),
        "a.ts",
        "x = f( a ,\n  b );\n",
    )
    .unwrap();
    assert_eq!(out, "x = g(a, b);\n");
}

#[rstest]
#[case::first("first", "y; x; x;")]
#[case::first_offset("first +2", "x; y; x;")]
#[case::first_out_of("first out of 3", "y; x; x;")]
#[case::last("last", "x; x; y;")]
#[case::last_offset("last -2", "x; y; x;")]
#[case::all("all 3", "y; y; y;")]
#[case::each("each", "y; y; y;")]
fn test_replace_cardinality(#[case] cardinality: &str, #[case] expected: &str) {
    let host = TransformHost::new(
        Arc::new(LanguageRegistry::with_defaults()),
        TransformOptions::default().with_verify_idempotence(false),
    );
    let transformer = function(&format!("replace {cardinality} \"x\" with \"y\";"));
    let out = host
        .transform(&origin(), &transformer, "a.ts", "x; x; x;")
        .unwrap();
    assert_eq!(out, expected);
}

#[rstest]
#[case::ambiguous("replace \"x\" with \"y\";")]
#[case::count("replace all 2 \"x\" with \"y\";")]
#[case::not_enough("replace first +4 \"x\" with \"y\";")]
#[case::out_of("replace last out of 4 \"x\" with \"y\";")]
#[case::no_match("replace \"q\" with \"y\";")]
#[case::span_type("replace {paragraph} \"x\" with \"y\";")]
fn test_resolution_errors(#[case] body: &str) {
    let err = transform(&function(body), "a.ts", "x; x; x;").unwrap_err();
    assert!(
        matches!(err, TransformError::Resolution { .. }),
        "unexpected {err:?}"
    );
    assert!(!err.is_invariant());
}

#[test]
fn test_applied_replacement_is_left_alone() {
    let transformer = function("replace \"color\" with \"colour\";");
    let once = transform(&transformer, "a.ts", "paint(color);").unwrap();
    assert_eq!(once, "paint(colour);");
    assert_eq!(transform(&transformer, "a.ts", &once).unwrap(), once);
}

#[test]
fn test_non_idempotent_function_is_rejected() {
    let err = transform(&function("replace first \"x\" with \"y\";"), "a.ts", "x; x;").unwrap_err();
    let TransformError::Idempotence { first, second, .. } = err else {
        panic!("expected an idempotence error, got {err:?}");
    };
    assert_eq!(first, "y; x;");
    assert_eq!(second, "y; y;");
}

// ============================================================================
// Injection
// ============================================================================

#[test]
fn test_inject_before_on_its_own_line() {
    let text = "function f() {\n    a();\n    b();\n}\n";
    let out = transform(&function("inject \"log();\" before \"b();\";"), "a.ts", text).unwrap();
    assert_eq!(out, "function f() {\n    a();\n    log();\n    b();\n}\n");
}

#[test]
fn test_inject_after_inline() {
    let out = transform(
        &function("inject \", 3\" after \"2\";"),
        "a.ts",
        "let v = [1, 2];\n",
    )
    .unwrap();
    assert_eq!(out, "let v = [1, 2, 3];\n");
}

#[test]
fn test_inject_after_end_of_line() {
    let out = transform(
        &function("inject \"b();\" after \"a();\";"),
        "a.ts",
        "  a();\n  c();\n",
    )
    .unwrap();
    assert_eq!(out, "  a();\n  b();\n  c();\n");
}

#[test]
fn test_inject_raw_string() {
    let transformer = "create transformer\nbegin\n    inject \"\"\"\n        a();\n        b();\n        \"\"\" before \"c();\";\nend\n";
    let out = transform(transformer, "a.ts", "{\n  c();\n}").unwrap();
    assert_eq!(out, "{\n  a();\n  b();\n  c();\n}");
}

#[test]
fn test_inject_into_line_comment_marker() {
    let text = "class A {\n    // <Members/>\n}\n";
    let first = transform(&function("inject \"x = 1;\" into <Members/>;"), "a.ts", text).unwrap();
    assert_eq!(
        first,
        "class A {\n    // <Members>\n    x = 1;\n    // </Members>\n}\n"
    );
    let second = transform(&function("inject \"y = 2;\" into <Members>;"), "a.ts", &first).unwrap();
    assert_eq!(
        second,
        "class A {\n    // <Members>\n    x = 1;\n    y = 2;\n    // </Members>\n}\n"
    );
    let again = transform(&function("inject \"x = 1;\" into <Members/>;"), "a.ts", &second).unwrap();
    assert_eq!(again, second);
}

#[test]
fn test_inject_into_block_comment_marker() {
    let out = transform(
        &function("inject \"a\" into <Args/>;"),
        "a.ts",
        "f(/*<Args/>*/);",
    )
    .unwrap();
    assert_eq!(out, "f(/*<Args>*/a/*</Args>*/);");
}

#[rstest]
#[case::missing("f();", "not found")]
#[case::duplicated("// <M/>\nf();\n// <M/>\n", "found 2 times")]
#[case::unbalanced("// <M>\nf();\n", "region is not balanced")]
#[case::reversed("// </M>\nf();\n// <M>\n", "region is not balanced")]
fn test_marker_errors(#[case] text: &str, #[case] expected: &str) {
    let err = transform(&function("inject \"x\" into <M/>;"), "a.ts", text).unwrap_err();
    let TransformError::Marker { marker, reason, .. } = err else {
        panic!("expected a marker error, got {err:?}");
    };
    assert_eq!(marker, "M");
    assert_eq!(reason, expected);
}

// ============================================================================
// Scopes
// ============================================================================

#[test]
fn test_in_each_block() {
    let text = "if (a) {\n    run();\n}\nif (b) {\n    run();\n}\n";
    let transformer = function(
        "in each {block} \"run();\" begin\n    inject \"check();\" before \"run();\";\nend",
    );
    let out = transform(&transformer, "a.ts", text).unwrap();
    assert_eq!(
        out,
        "if (a) {\n    check();\n    run();\n}\nif (b) {\n    check();\n    run();\n}\n"
    );
}

#[test]
fn test_in_statement_limits_matches() {
    let transformer = function("in {statement} \"b\" begin replace \"1\" with \"2\"; end");
    let out = transform(&transformer, "a.ts", "a(1);\nb(1);\n").unwrap();
    assert_eq!(out, "a(1);\nb(2);\n");
}

#[test]
fn test_marker_outside_scope_is_not_found() {
    let transformer = function("in {block} \"k\" begin inject \"x\" into <M/>; end");
    let err = transform(&transformer, "a.ts", "// <M/>\nif (c) { k(); }\n").unwrap_err();
    assert!(matches!(err, TransformError::Marker { .. }));
}

// ============================================================================
// Languages and chains
// ============================================================================

#[test]
fn test_less_ensure_import() {
    let transformer = "create less transformer\nbegin\n    ensure import (reference) 'mixins.less';\nend\n";
    let out = transform(transformer, "theme.less", ".a { color: red; }\n").unwrap();
    assert_eq!(
        out,
        "@import (reference) 'mixins.less';\n\n.a { color: red; }\n"
    );
}

#[test]
fn test_target_language_from_path() {
    let err = transform(&function("replace \"a\" with \"b\";"), "notes.txt", "a").unwrap_err();
    assert_eq!(err, TransformError::UnknownLanguage("txt".into()));
}

#[test]
fn test_language_from_secondary_extension() {
    let origin = ResourceLocator::new("test", "styles/theme.less.t");
    let out = host()
        .transform(
            &origin,
            &function("replace \"red\" with \"blue\";"),
            "theme.txt",
            ".a { color: red; }",
        )
        .unwrap();
    assert_eq!(out, ".a { color: blue; }");
}

#[test]
fn test_language_statements_from_secondary_extension() {
    let text = function("ensure import 'a.less';");
    let origin = ResourceLocator::new("test", "theme.less.t");
    let functions = host().parse_functions(&origin, &text).unwrap();
    let statements: Vec<Statement> = functions[0].body().statements().collect();
    assert!(matches!(statements[..], [Statement::Language(_)]));

    let err = host().parse_functions(&ResourceLocator::new("test", "theme.t"), &text).unwrap_err();
    assert!(matches!(err, TransformError::Syntax { ref message, .. } if message == "Unexpected 'ensure'"));
}

#[test]
fn test_target_with_syntax_errors_is_rejected() {
    let err = transform(&function("replace \"a\" with \"b\";"), "a.ts", "{ a;").unwrap_err();
    assert!(matches!(err, TransformError::Syntax { ref message, .. } if message == "Missing '}'"));
}

#[test]
fn test_functions_apply_in_order() {
    let transformer = format!(
        "{}{}",
        function("replace \"a\" with \"b\";"),
        function("replace \"b\" with \"c\";")
    );
    let out = transform(&transformer, "a.ts", "a;").unwrap();
    assert_eq!(out, "c;");
}

// ============================================================================
// Editor
// ============================================================================

#[test]
fn test_editor_scopes_follow_edits() {
    let mut editor = SourceCodeEditor::new(Arc::new(GenericLanguage::new()), "abc def", 16).unwrap();
    editor.push_scope(vec![range(4, 7)]);
    editor.apply_edits(vec![TextEdit::insert(4, "X")]).unwrap();
    assert_eq!(editor.scope(), &[range(4, 8)]);
    editor.apply_edits(vec![TextEdit::insert(8, "Y")]).unwrap();
    assert_eq!(editor.scope(), &[range(4, 9)]);
    editor
        .apply_edits(vec![TextEdit::insert(0, "1"), TextEdit::replace(1, 2, "")])
        .unwrap();
    assert_eq!(editor.text(), "1ac XdefY");
    assert_eq!(editor.scope(), &[range(4, 9)]);
    assert_eq!(editor.scope_piece(1, 0), Some(range(0, 9)));
    assert!(editor.pop_scope().is_some());
    assert!(editor.pop_scope().is_none());
}

#[test]
fn test_editor_shared_boundary_goes_to_earlier_piece() {
    let mut editor = SourceCodeEditor::new(Arc::new(GenericLanguage::new()), "abc def", 16).unwrap();
    editor.push_scope(vec![range(0, 3), range(3, 7)]);
    editor.apply_edits(vec![TextEdit::insert(3, "X")]).unwrap();
    assert_eq!(editor.text(), "abcX def");
    assert_eq!(editor.scope(), &[range(0, 4), range(4, 8)]);
}

#[test]
fn test_editor_set_root() {
    let language = Arc::new(GenericLanguage::new());
    let mut editor = SourceCodeEditor::new(language.clone(), "a; b;", 16).unwrap();
    let other = language.analyze("a; c; b;").unwrap();
    assert!(editor.set_root(other.root()).unwrap());
    assert_eq!(editor.text(), "a; c; b;");
    assert!(!editor.set_root(other.root()).unwrap());
    assert!(!editor.apply_edits(Vec::new()).unwrap());
}
