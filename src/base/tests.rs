use super::*;

#[test]
fn test_line_index_positions() {
    let index = LineIndex::new("ab\ncd\n\nxé");
    assert_eq!(index.line_count(), 4);
    assert_eq!(index.position(TextSize::new(0)), Position::new(0, 0));
    assert_eq!(index.position(TextSize::new(4)), Position::new(1, 1));
    assert_eq!(index.position(TextSize::new(6)), Position::new(2, 0));
    // 'é' is two bytes: the column counts characters.
    assert_eq!(index.position(TextSize::new(10)), Position::new(3, 2));
    // Past the end clamps.
    assert_eq!(index.position(TextSize::new(99)), Position::new(3, 2));
}

#[test]
fn test_span_display_is_one_based() {
    let index = LineIndex::new("abc\ndef");
    let span = index.span(TextRange::new(TextSize::new(1), TextSize::new(5)));
    assert_eq!(span.to_string(), "1:2-2:2");
    assert!(span.contains(Position::new(1, 0)));
    assert!(!span.contains(Position::new(1, 2)));
}

#[test]
fn test_normalize_path() {
    assert_eq!(normalize_path("./a/b.less"), "a/b.less");
    assert_eq!(normalize_path("a\\b\\..\\c.ts"), "a/c.ts");
    assert_eq!(normalize_path("a/../../x.ts"), "../x.ts");
    assert_eq!(normalize_path("../../x.ts"), "../../x.ts");
}

#[test]
fn test_locator_parts() {
    let locator = ResourceLocator::new("Pack", "styles/theme.less.t");
    assert_eq!(locator.folder(), "styles");
    assert_eq!(locator.file_name(), "theme.less.t");
    assert_eq!(locator.to_string(), "Pack:styles/theme.less.t");
    assert_eq!(ResourceLocator::detached("x.ts").to_string(), "x.ts");
}
