use super::*;
use crate::core::{NodeKind, TokenType, tokenize};

fn generic() -> GenericLanguage {
    GenericLanguage::new()
}

fn kinds(source: &SourceCode) -> Vec<NodeKind> {
    source.nodes().iter().map(Node::kind).collect()
}

#[test]
fn test_statements_and_blocks() {
    let source = generic()
        .analyze("a = 1;\nif (x) { b(); c(); }\nd;")
        .unwrap();
    assert_eq!(
        kinds(&source),
        vec![NodeKind::Statement, NodeKind::Statement, NodeKind::Statement]
    );
    let if_statement = &source.nodes()[1];
    let block = if_statement.items().unwrap().last().unwrap();
    assert_eq!(block.kind(), NodeKind::Block);
    let content = block.named_slot("content").unwrap();
    assert_eq!(content.items().unwrap().len(), 2);
}

#[test]
fn test_block_followed_by_continuation() {
    let source = generic().analyze("x = { a: 1 }; f(function() { }) ; y").unwrap();
    assert_eq!(source.nodes().len(), 3);
    assert_eq!(source.nodes()[0].full_text(), "x = { a: 1 }; ");
    assert_eq!(source.nodes()[2].full_text(), "y");
}

#[test]
fn test_bare_block_is_top_level() {
    let source = generic().analyze("{ a; }").unwrap();
    assert_eq!(kinds(&source), vec![NodeKind::Block]);
}

#[test]
fn test_missing_close_brace() {
    let text = "f() { a;";
    let source = generic().analyze(text).unwrap();
    assert_eq!(source.text(), text);
    let errors = source.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Missing '}'");
}

#[test]
fn test_stray_close_brace_is_unexpected() {
    let source = generic().analyze("a; } b;").unwrap();
    assert_eq!(source.errors()[0].message, "Unexpected '}'");
    assert_eq!(source.text(), "a; } b;");
}

#[test]
fn test_unrecognized_character_in_statement() {
    let source = generic().analyze("a ` b;").unwrap();
    assert_eq!(kinds(&source), vec![NodeKind::Statement]);
    assert_eq!(source.errors()[0].message, "Unexpected '`'");
}

#[test]
fn test_registry_lookup() {
    let registry = LanguageRegistry::with_defaults();
    assert_eq!(registry.get("LESS").map(|l| l.name()), Some("less"));
    assert_eq!(
        registry.for_path("app/main.component.ts").map(|l| l.name()),
        Some("typescript")
    );
    assert!(registry.for_path("README").is_none());
    assert!(registry.by_extension("md").is_none());
    assert_eq!(registry.names().count(), 3);
}

#[test]
fn test_span_types() {
    let registry = LanguageRegistry::with_defaults();
    let less = registry.get("less").unwrap();
    assert_eq!(less.span_type("Import"), Some(NodeKind::ImportStatement));
    assert_eq!(less.span_type("block"), Some(NodeKind::Block));
    assert_eq!(registry.get("typescript").unwrap().span_type("import"), None);
}

#[test]
fn test_typescript_regex_and_division() {
    let ts = TypeScriptLanguage::new();
    let tokens = tokenize(ts.analyzer().tokenizer(), "a = b / c; r = /a[/]b/gi.test(x);");
    let types: Vec<_> = tokens.iter().map(|t| t.token_type()).collect();
    assert!(types.contains(&TokenType::Slash));
    let regex = tokens
        .iter()
        .find(|t| t.token_type() == TokenType::RegularExpression)
        .unwrap();
    assert_eq!(regex.text(), "/a[/]b/gi");
}

#[test]
fn test_typescript_template_string() {
    let ts = TypeScriptLanguage::new();
    let tokens = tokenize(ts.analyzer().tokenizer(), "x = `a ${b} \\` c`;");
    assert_eq!(tokens[2].token_type(), TokenType::String);
    assert_eq!(tokens[2].text(), "`a ${b} \\` c`");
    let source = ts.analyze("x = `a ${b} \\` c`;").unwrap();
    assert!(!source.has_errors());
}
