use super::*;
use crate::core::token::{Token, TokenType};
use crate::core::trivia::Trivia;

fn tok(token_type: TokenType, text: &str) -> Node {
    Node::from_token(Token::bare(token_type, text))
}

fn spaced(token_type: TokenType, text: &str) -> Node {
    Node::from_token(Token::new(
        token_type,
        text,
        Vec::new(),
        vec![Trivia::whitespace(" ")],
    ))
}

fn eoi() -> Node {
    tok(TokenType::EndOfInput, "")
}

fn block(items: Vec<Node>) -> Node {
    let content = Node::collection(NodeKind::BlockContent, items).unwrap();
    Node::composite(
        NodeKind::Block,
        vec![
            Some(tok(TokenType::OpenBrace, "{")),
            Some(content),
            Some(tok(TokenType::CloseBrace, "}")),
        ],
    )
    .unwrap()
}

fn statement(words: &[&str]) -> Node {
    let items = words
        .iter()
        .map(|w| spaced(TokenType::Identifier, w))
        .chain(std::iter::once(tok(TokenType::SemiColon, ";")))
        .collect();
    Node::collection(NodeKind::Statement, items).unwrap()
}

#[test]
fn test_width_and_text() {
    let stmt = statement(&["a", "b"]);
    assert_eq!(stmt.width(), 3);
    assert_eq!(stmt.full_text(), "a b ;");
    assert_eq!(stmt.text_len(), 5);
    assert_eq!(stmt.token_text(), "a b ;");
    assert_eq!(stmt.first_token().map(Token::text), Some("a"));
    assert_eq!(stmt.last_token().map(Token::text), Some(";"));
}

#[test]
fn test_missing_token_has_zero_width() {
    let missing = Node::missing(TokenType::CloseBrace);
    assert_eq!(missing.width(), 0);
    assert_eq!(missing.full_text(), "");
    assert!(missing.is_error_tolerant());
}

#[test]
fn test_composite_requires_slots() {
    let err = Node::composite(
        NodeKind::Block,
        vec![Some(tok(TokenType::OpenBrace, "{")), None, None],
    )
    .unwrap_err();
    assert_eq!(
        err,
        InvariantError::MissingSlot {
            kind: NodeKind::Block,
            slot: "content"
        }
    );

    let err = Node::composite(NodeKind::Block, vec![None]).unwrap_err();
    assert!(matches!(err, InvariantError::SlotCount { expected: 3, .. }));
}

#[test]
fn test_composite_checks_slot_rules() {
    let content = Node::collection(NodeKind::BlockContent, Vec::new()).unwrap();
    let err = Node::composite(
        NodeKind::Block,
        vec![
            Some(tok(TokenType::OpenParen, "(")),
            Some(content),
            Some(tok(TokenType::CloseBrace, "}")),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, InvariantError::InvalidSlot { slot: "open", .. }));
}

#[test]
fn test_error_nodes_must_be_contained() {
    let err = Node::collection(
        NodeKind::Statement,
        vec![tok(TokenType::Identifier, "a"), Node::missing(TokenType::SemiColon)],
    )
    .unwrap_err();
    assert_eq!(
        err,
        InvariantError::UncontainedErrorNode {
            kind: NodeKind::Statement,
            found: NodeKind::MissingToken
        }
    );
}

#[test]
fn test_syntax_error_needs_error_child() {
    let err = Node::syntax_error("oops", vec![tok(TokenType::Identifier, "a")]).unwrap_err();
    assert_eq!(err, InvariantError::SyntaxErrorWithoutError);

    let ok = Node::syntax_error(
        "Missing '}'",
        vec![tok(TokenType::OpenBrace, "{"), Node::missing(TokenType::CloseBrace)],
    )
    .unwrap();
    assert!(ok.has_errors());
    assert_eq!(ok.width(), 1);
}

#[test]
fn test_syntax_error_is_accepted_in_any_slot() {
    let broken = Node::syntax_error("Missing '}'", vec![Node::missing(TokenType::CloseBrace)]).unwrap();
    let content = Node::collection(NodeKind::BlockContent, Vec::new()).unwrap();
    let node = Node::composite(
        NodeKind::Block,
        vec![Some(tok(TokenType::OpenBrace, "{")), Some(content), Some(broken)],
    )
    .unwrap();
    assert!(node.has_errors());
    let errors = node.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Missing '}'");
    assert_eq!(u32::from(errors[0].range.start()), 1);
}

#[test]
fn test_source_code_ends_with_end_of_input() {
    let err = Node::collection(NodeKind::SourceCode, vec![statement(&["a"])]).unwrap_err();
    assert_eq!(err, InvariantError::MissingEndOfInput);

    let err =
        Node::collection(NodeKind::SourceCode, vec![eoi(), statement(&["a"]), eoi()]).unwrap_err();
    assert!(matches!(err, InvariantError::InvalidItem { index: 0, .. }));

    let root = Node::collection(NodeKind::SourceCode, vec![statement(&["a"]), eoi()]).unwrap();
    assert_eq!(root.full_text(), "a ;");
}

#[test]
fn test_statement_rejects_end_of_input() {
    let err = Node::collection(NodeKind::Statement, vec![eoi()]).unwrap_err();
    assert!(matches!(err, InvariantError::InvalidItem { .. }));
}

#[test]
fn test_node_ids_are_unique() {
    let a = tok(TokenType::Identifier, "a");
    let b = tok(TokenType::Identifier, "a");
    assert_ne!(a.id(), b.id());
    assert!(a.ptr_eq(&a.clone()));
    assert!(!a.ptr_eq(&b));
}

#[test]
fn test_unchanged_mutation_returns_same_node() {
    let stmt = statement(&["a", "b"]);
    let mut mutator = stmt.create_mutator().unwrap();
    mutator.apply_mutation(|n| Some(n.clone()));
    let same = mutator.clone_node().unwrap();
    assert!(same.ptr_eq(&stmt));
}

#[test]
fn test_collection_mutation_removes_items() {
    let stmt = statement(&["a", "b", "c"]);
    let mut mutator = stmt.create_mutator().unwrap();
    mutator.apply_mutation(|n| (!n.is_text("b")).then(|| n.clone()));
    let edited = mutator.clone_node().unwrap();
    assert_eq!(edited.full_text(), "a c ;");
    assert_eq!(stmt.full_text(), "a b c ;");
}

#[test]
fn test_mutation_rechecks_invariants() {
    let stmt = statement(&["a"]);
    let mut mutator = CollectionMutator::new(&stmt).unwrap();
    mutator.raw_items().clear();
    assert_eq!(
        mutator.clone_node().unwrap_err(),
        InvariantError::EmptyCollection {
            kind: NodeKind::Statement
        }
    );
}

#[test]
fn test_statement_with_single_block_collapses() {
    let inner = block(vec![statement(&["x"])]);
    let stmt = Node::collection(
        NodeKind::Statement,
        vec![spaced(TokenType::Identifier, "if"), inner.clone()],
    )
    .unwrap();
    let mut mutator = CollectionMutator::new(&stmt).unwrap();
    mutator.raw_items().remove(0);
    let collapsed = mutator.clone_node().unwrap();
    assert_eq!(collapsed.kind(), NodeKind::Block);
    assert!(collapsed.ptr_eq(&inner));
}

#[test]
fn test_composite_set_slot() {
    let b = block(Vec::new());
    let mut mutator = CompositeMutator::new(&b).unwrap();
    let content = Node::collection(NodeKind::BlockContent, vec![statement(&["y"])]).unwrap();
    assert!(mutator.set_slot("content", Some(content)));
    assert!(!mutator.set_slot("nope", None));
    let edited = mutator.clone_node().unwrap();
    assert_eq!(edited.full_text(), "{y ;}");
    assert_eq!(edited.named_slot("open").map(Node::full_text).as_deref(), Some("{"));
}

#[test]
fn test_replace_descendant_rebuilds_ancestors() {
    let target = statement(&["old"]);
    let other = statement(&["keep"]);
    let root = Node::collection(
        NodeKind::SourceCode,
        vec![block(vec![target.clone()]), other.clone(), eoi()],
    )
    .unwrap();
    let replaced = replace_descendant(&root, target.id(), Some(statement(&["new"])))
        .unwrap()
        .unwrap();
    assert_eq!(replaced.full_text(), "{new ;}keep ;");
    assert!(replaced.items().unwrap()[1].ptr_eq(&other));

    let removed = replace_descendant(&root, target.id(), None).unwrap().unwrap();
    assert_eq!(removed.full_text(), "{}keep ;");
}

#[test]
fn test_trivia_editing() {
    let stmt = statement(&["a", "b"]);
    let edited = stmt
        .with_leading_trivia(vec![Trivia::whitespace("\n  ")])
        .unwrap()
        .with_trailing_trivia(vec![Trivia::whitespace("\n")])
        .unwrap();
    assert_eq!(edited.full_text(), "\n  a b ;\n");
    assert_eq!(edited.kind(), NodeKind::Statement);
}

#[test]
fn test_token_leaf_round_trip() {
    let token = Token::bare(TokenType::Number, "42");
    let leaf = Node::from_token(token.clone());
    assert_eq!(leaf.kind(), NodeKind::Token);
    assert_eq!(leaf.token(), Some(&token));
    assert_eq!(leaf.width(), 1);
    assert!(Node::missing(TokenType::Number).token().is_none());
}
