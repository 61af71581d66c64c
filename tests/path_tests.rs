// tests/path_tests.rs

use jsonsift::path::{NormalizedPath, PathNode, try_select};
use jsonsift::value::Value;
use serde_json::json;

fn path(nodes: &[PathNode]) -> NormalizedPath {
    nodes.iter().cloned().collect()
}

fn name(n: &str) -> PathNode {
    PathNode::Name(n.to_string())
}

// ============================================================================
// try_select
// ============================================================================

#[test]
fn test_try_select_walks_names_and_indices() {
    let doc = json!({"a": [10, {"b": "x"}]});
    assert_eq!(try_select(&doc, &NormalizedPath::root()), Some(&doc));
    assert_eq!(try_select(&doc, &path(&[name("a"), PathNode::Index(0)])), Some(&json!(10)));
    assert_eq!(
        try_select(&doc, &path(&[name("a"), PathNode::Index(1), name("b")])),
        Some(&json!("x"))
    );
}

#[test]
fn test_try_select_structural_mismatch() {
    let doc = json!({"a": [10], "s": "str"});
    let cases = [
        path(&[name("missing")]),
        path(&[name("a"), PathNode::Index(1)]),
        path(&[name("a"), name("0")]),
        path(&[PathNode::Index(0)]),
        path(&[name("s"), PathNode::Index(0)]),
        path(&[name("a"), PathNode::Index(0), name("x")]),
    ];
    for p in cases {
        assert_eq!(try_select(&doc, &p), None, "path: {}", p);
    }
}

#[test]
fn test_try_select_agrees_across_document_types() {
    let doc = json!({"a": [1, {"b": [true, null]}], "c": {"d": "e"}});
    let owned = Value::from(doc.clone());
    let paths = [
        NormalizedPath::root(),
        path(&[name("a")]),
        path(&[name("a"), PathNode::Index(1), name("b"), PathNode::Index(0)]),
        path(&[name("a"), PathNode::Index(1), name("b"), PathNode::Index(1)]),
        path(&[name("c"), name("d")]),
        path(&[name("c"), name("x")]),
        path(&[name("a"), PathNode::Index(5)]),
    ];
    for p in &paths {
        let from_json = try_select(&doc, p).map(|v| Value::from(v.clone()));
        let from_owned = try_select(&owned, p).cloned();
        assert_eq!(from_json, from_owned, "path: {}", p);
    }
}

// ============================================================================
// NormalizedPath
// ============================================================================

#[test]
fn test_display() {
    assert_eq!(NormalizedPath::root().to_string(), "$");
    assert_eq!(path(&[name("a"), PathNode::Index(2), name("b")]).to_string(), "$['a'][2]['b']");
}

#[test]
fn test_ordering_puts_indices_before_names() {
    let mut paths = vec![
        path(&[name("b")]),
        path(&[PathNode::Index(10)]),
        path(&[name("a"), PathNode::Index(0)]),
        path(&[PathNode::Index(2)]),
        path(&[name("a")]),
    ];
    paths.sort();
    let rendered: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
    assert_eq!(rendered, ["$[2]", "$[10]", "$['a']", "$['a'][0]", "$['b']"]);
}

#[test]
fn test_prefix_sorts_first() {
    let parent = path(&[name("a")]);
    let child = parent.child_index(0);
    assert!(parent < child);
    assert!(child.starts_with(&parent));
    assert!(!parent.starts_with(&child));
}

#[test]
fn test_parent_and_last() {
    let p = NormalizedPath::root().child_name("a").child_index(3);
    assert_eq!(p.last(), Some(&PathNode::Index(3)));
    assert_eq!(p.len(), 2);
    assert_eq!(p.parent(), Some(NormalizedPath::root().child_name("a")));
    assert_eq!(NormalizedPath::root().parent(), None);
}

#[test]
fn test_path_node_accessors() {
    assert_eq!(PathNode::Index(4).index(), Some(4));
    assert_eq!(PathNode::Index(4).name(), None);
    assert_eq!(name("k").name(), Some("k"));
}
