// tests/parser_tests.rs

use jsonsift::ast::{BinaryOperator, FilterExpr, NodeId, Selector, SelectorTree, Slice, UnaryOperator};
use jsonsift::lexer::Lexer;
use jsonsift::parser::{ParseError, Parser};
use jsonsift::value::Value;

fn parse(input: &str) -> SelectorTree {
    let mut parser = Parser::new(Lexer::new(input)).unwrap();
    parser.parse().unwrap()
}

fn parse_err(input: &str) -> ParseError {
    match Parser::new(Lexer::new(input)) {
        Ok(mut parser) => parser.parse().unwrap_err(),
        Err(e) => e,
    }
}

/// Selectors along the main chain, head first.
fn chain(tree: &SelectorTree) -> Vec<Selector> {
    let mut result = Vec::new();
    let mut cursor = tree.head();
    while let Some(id) = cursor {
        let node = tree.get(id).unwrap();
        result.push(node.selector.clone());
        cursor = node.tail;
    }
    result
}

/// The filter expression of the last selector of the main chain.
fn filter(tree: &SelectorTree) -> FilterExpr {
    match chain(tree).pop() {
        Some(Selector::Filter(expr)) => expr,
        other => panic!("expected a filter, got {:?}", other),
    }
}

fn query_chain(tree: &SelectorTree, head: NodeId) -> Vec<Selector> {
    let mut result = Vec::new();
    let mut cursor = Some(head);
    while let Some(id) = cursor {
        let node = tree.get(id).unwrap();
        result.push(node.selector.clone());
        cursor = node.tail;
    }
    result
}

// ============================================================================
// Segments
// ============================================================================

#[test]
fn test_root_only() {
    assert_eq!(chain(&parse("$")), vec![Selector::Root]);
}

#[test]
fn test_dot_and_bracket_names() {
    let expected = vec![
        Selector::Root,
        Selector::Name("store".to_string()),
        Selector::Name("book".to_string()),
    ];
    assert_eq!(chain(&parse("$.store.book")), expected);
    assert_eq!(chain(&parse("$['store'][\"book\"]")), expected);
}

#[test]
fn test_wildcards() {
    assert_eq!(
        chain(&parse("$.*[*]")),
        vec![Selector::Root, Selector::Wildcard, Selector::Wildcard]
    );
}

#[test]
fn test_indices_and_slices() {
    assert_eq!(
        chain(&parse("$[0][-1]")),
        vec![Selector::Root, Selector::Index(0), Selector::Index(-1)]
    );
    assert_eq!(
        chain(&parse("$[1:3]")),
        vec![
            Selector::Root,
            Selector::Slice(Slice { start: Some(1), stop: Some(3), step: 1 })
        ]
    );
    assert_eq!(
        chain(&parse("$[::-1]")),
        vec![
            Selector::Root,
            Selector::Slice(Slice { start: None, stop: None, step: -1 })
        ]
    );
    assert_eq!(
        chain(&parse("$[2:]")),
        vec![
            Selector::Root,
            Selector::Slice(Slice { start: Some(2), stop: None, step: 1 })
        ]
    );
}

#[test]
fn test_recursive_descent() {
    assert_eq!(
        chain(&parse("$..price")),
        vec![
            Selector::Root,
            Selector::RecursiveDescent,
            Selector::Name("price".to_string())
        ]
    );
    assert_eq!(
        chain(&parse("$..[0]")),
        vec![Selector::Root, Selector::RecursiveDescent, Selector::Index(0)]
    );
    assert_eq!(
        chain(&parse("$..*")),
        vec![Selector::Root, Selector::RecursiveDescent, Selector::Wildcard]
    );
}

#[test]
fn test_parent() {
    assert_eq!(
        chain(&parse("$.a.b^")),
        vec![
            Selector::Root,
            Selector::Name("a".to_string()),
            Selector::Name("b".to_string()),
            Selector::Parent
        ]
    );
}

#[test]
fn test_union_members_are_separate_chains() {
    let tree = parse("$['a', 0, 1:2].x");
    let selectors = chain(&tree);
    assert_eq!(selectors.len(), 3);
    let Selector::Union(members) = &selectors[1] else {
        panic!("expected a union, got {:?}", selectors[1]);
    };
    let member_selectors: Vec<Selector> = members
        .iter()
        .map(|id| tree.get(*id).unwrap().selector.clone())
        .collect();
    assert_eq!(
        member_selectors,
        vec![
            Selector::Name("a".to_string()),
            Selector::Index(0),
            Selector::Slice(Slice { start: Some(1), stop: Some(2), step: 1 }),
        ]
    );
    assert_eq!(selectors[2], Selector::Name("x".to_string()));
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn test_filter_comparison() {
    let tree = parse("$[?(@.price < 10)]");
    let FilterExpr::Binary { op, left, right } = filter(&tree) else {
        panic!("expected a binary expression");
    };
    assert_eq!(op, BinaryOperator::LessThan);
    assert_eq!(*right, FilterExpr::Literal(Value::Integer(10)));
    let FilterExpr::Query(head) = *left else {
        panic!("expected a query");
    };
    assert_eq!(
        query_chain(&tree, head),
        vec![Selector::Current, Selector::Name("price".to_string())]
    );
}

#[test]
fn test_filter_without_parens() {
    let tree = parse("$[?@.a]");
    assert!(matches!(filter(&tree), FilterExpr::Query(_)));
}

#[test]
fn test_and_binds_tighter_than_or() {
    let tree = parse("$[?(@.a || @.b && @.c)]");
    let FilterExpr::Binary { op, right, .. } = filter(&tree) else {
        panic!("expected a binary expression");
    };
    assert_eq!(op, BinaryOperator::Or);
    assert!(matches!(*right, FilterExpr::Binary { op: BinaryOperator::And, .. }));
}

#[test]
fn test_comparisons_are_left_associative() {
    let tree = parse("$[?(1 == 1 == true)]");
    let FilterExpr::Binary { op, left, right } = filter(&tree) else {
        panic!("expected a binary expression");
    };
    assert_eq!(op, BinaryOperator::Equal);
    assert_eq!(*right, FilterExpr::Literal(Value::Boolean(true)));
    assert!(matches!(*left, FilterExpr::Binary { op: BinaryOperator::Equal, .. }));
}

#[test]
fn test_not_binds_loosest() {
    let tree = parse("$[?(!@.a == 1)]");
    let FilterExpr::Unary { op, operand } = filter(&tree) else {
        panic!("expected a unary expression");
    };
    assert_eq!(op, UnaryOperator::Not);
    assert!(matches!(*operand, FilterExpr::Binary { op: BinaryOperator::Equal, .. }));
}

#[test]
fn test_not_is_right_associative() {
    let tree = parse("$[?(!!@.a)]");
    let FilterExpr::Unary { operand, .. } = filter(&tree) else {
        panic!("expected a unary expression");
    };
    assert!(matches!(*operand, FilterExpr::Unary { op: UnaryOperator::Not, .. }));
}

#[test]
fn test_regex_binds_tightest() {
    let tree = parse("$[?(@.name =~ /^h/i && @.ok)]");
    let FilterExpr::Binary { op, left, .. } = filter(&tree) else {
        panic!("expected a binary expression");
    };
    assert_eq!(op, BinaryOperator::And);
    let FilterExpr::Unary { op: UnaryOperator::Regex { regex: re, flags }, .. } = *left else {
        panic!("expected a regex match");
    };
    assert_eq!(flags, "i");
    assert!(re.is_match("Hello"));
    assert!(!re.is_match("world"));
}

#[test]
fn test_regex_flags_distinguish_filters() {
    let insensitive = filter(&parse("$[?(@ =~ /a/i)]"));
    let sensitive = filter(&parse("$[?(@ =~ /a/)]"));
    assert_ne!(insensitive, sensitive);
    assert_eq!(insensitive, filter(&parse("$[?(@ =~ /a/i)]")));
}

#[test]
fn test_parenthesized_grouping() {
    let tree = parse("$[?((@.a || @.b) && @.c)]");
    let FilterExpr::Binary { op, left, .. } = filter(&tree) else {
        panic!("expected a binary expression");
    };
    assert_eq!(op, BinaryOperator::And);
    assert!(matches!(*left, FilterExpr::Binary { op: BinaryOperator::Or, .. }));
}

#[test]
fn test_filter_literals() {
    let tree = parse("$[?(@.x != null && @.y == 'str' && @.z >= -1.5)]");
    let expr = filter(&tree);
    assert_eq!(expr.queries().len(), 3);
}

#[test]
fn test_absolute_query_in_filter() {
    let tree = parse("$.items[?(@.price < $.max)]");
    let queries = filter(&tree).queries();
    assert_eq!(query_chain(&tree, queries[1])[0], Selector::Root);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_errors() {
    let cases = [
        "",
        "store",
        "$.",
        "$[",
        "$[1",
        "$[?(@.a ==)]",
        "$[?(@.a =~ 'x')]",
        "$[?(@.a =~ /(/)]",
        "$.a b",
        "$[?(@.a < 1]",
    ];
    for input in cases {
        assert!(
            matches!(parse_err(input), ParseError::Syntax { .. } | ParseError::Lex(_)),
            "input: {}",
            input
        );
    }
}

#[test]
fn test_lex_errors_are_wrapped() {
    assert!(matches!(parse_err("$['abc"), ParseError::Lex(_)));
}

#[test]
fn test_error_reports_position() {
    let ParseError::Syntax { position, .. } = parse_err("$.a b") else {
        panic!("expected a syntax error");
    };
    assert!(position >= 4);
}
