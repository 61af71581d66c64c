use std::{fmt, rc::Rc};

use crate::value::{JsonValue, Kind};

/// One step of a normalized path.
///
/// Ordering puts every `Index` before every `Name`; indices compare
/// numerically and names by string order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathNode {
    /// Array element by position
    Index(usize),

    /// Object member by name
    Name(String),
}

impl PathNode {
    pub fn index(&self) -> Option<usize> {
        match self {
            PathNode::Index(i) => Some(*i),
            PathNode::Name(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            PathNode::Index(_) => None,
            PathNode::Name(n) => Some(n),
        }
    }
}

impl fmt::Display for PathNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathNode::Index(i) => write!(f, "[{}]", i),
            PathNode::Name(name) => {
                f.write_str("['")?;
                for ch in name.chars() {
                    match ch {
                        '\'' => f.write_str("\\'")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        '\u{8}' => f.write_str("\\b")?,
                        '\u{c}' => f.write_str("\\f")?,
                        c if c < '\u{20}' => write!(f, "\\u{:04x}", c as u32)?,
                        c => write!(f, "{}", c)?,
                    }
                }
                f.write_str("']")
            }
        }
    }
}

/// The location of exactly one value in a document, root to leaf.
///
/// Displayed in RFC 9535 normalized form:
///
/// ```
/// use jsonsift::path::NormalizedPath;
///
/// let path = NormalizedPath::root().child_name("a").child_index(2).child_name("b");
/// assert_eq!(path.to_string(), "$['a'][2]['b']");
/// ```
///
/// Paths order lexicographically over their nodes, so a path sorts before
/// any of its extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    nodes: Vec<PathNode>,
}

impl NormalizedPath {
    /// The empty path, selecting the root itself.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(nodes: Vec<PathNode>) -> Self {
        NormalizedPath { nodes }
    }

    pub fn child(&self, node: PathNode) -> Self {
        let mut nodes = self.nodes.clone();
        nodes.push(node);
        NormalizedPath { nodes }
    }

    pub fn child_index(&self, index: usize) -> Self {
        self.child(PathNode::Index(index))
    }

    pub fn child_name(&self, name: impl Into<String>) -> Self {
        self.child(PathNode::Name(name.into()))
    }

    /// The path without its last node. `None` for the root path.
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.nodes.split_last()?;
        Some(NormalizedPath {
            nodes: init.to_vec(),
        })
    }

    pub fn last(&self) -> Option<&PathNode> {
        self.nodes.last()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True when `prefix` is this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &NormalizedPath) -> bool {
        self.nodes.starts_with(&prefix.nodes)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathNode> {
        self.nodes.iter()
    }

    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for node in &self.nodes {
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a NormalizedPath {
    type Item = &'a PathNode;
    type IntoIter = std::slice::Iter<'a, PathNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl FromIterator<PathNode> for NormalizedPath {
    fn from_iter<T: IntoIterator<Item = PathNode>>(iter: T) -> Self {
        NormalizedPath {
            nodes: iter.into_iter().collect(),
        }
    }
}

/// Resolve `path` against `root`.
///
/// Returns `None` as soon as a step does not apply: an index on a non-array
/// or past the end, a name on a non-object or not present.
///
/// ```
/// use jsonsift::path::{NormalizedPath, try_select};
/// use serde_json::json;
///
/// let doc = json!({"a": [1, 2, {"b": 3}]});
/// let path = NormalizedPath::root().child_name("a").child_index(2).child_name("b");
/// assert_eq!(try_select(&doc, &path), Some(&json!(3)));
/// assert_eq!(try_select(&doc, &NormalizedPath::root().child_index(0)), None);
/// ```
pub fn try_select<'a, V>(root: &'a V, path: &NormalizedPath) -> Option<&'a V>
where
    V: JsonValue + ?Sized,
{
    let mut current = root;
    for node in path {
        current = match node {
            PathNode::Index(i) => {
                if current.kind() != Kind::Array {
                    return None;
                }
                current.get_index(*i)?
            }
            PathNode::Name(name) => {
                if current.kind() != Kind::Object {
                    return None;
                }
                current.get_member(name)?
            }
        };
    }
    Some(current)
}

struct Link {
    parent: Option<Rc<Link>>,
    node: PathNode,
}

/// Path under construction during a traversal.
///
/// A persistent list: extending a stem shares its ancestors, so each step of
/// the walk costs one allocation instead of a copy of the whole path. A
/// detached stem tracks nothing and extending it is free; it is used when
/// the caller did not ask for paths.
#[derive(Clone)]
pub(crate) struct PathStem {
    link: Option<Rc<Link>>,
    tracking: bool,
}

impl PathStem {
    pub(crate) fn new(tracking: bool) -> Self {
        PathStem {
            link: None,
            tracking,
        }
    }

    pub(crate) fn is_tracking(&self) -> bool {
        self.tracking
    }

    fn push(&self, node: PathNode) -> Self {
        PathStem {
            link: Some(Rc::new(Link {
                parent: self.link.clone(),
                node,
            })),
            tracking: true,
        }
    }

    pub(crate) fn child_index(&self, index: usize) -> Self {
        if !self.tracking {
            return self.clone();
        }
        self.push(PathNode::Index(index))
    }

    pub(crate) fn child_name(&self, name: &str) -> Self {
        if !self.tracking {
            return self.clone();
        }
        self.push(PathNode::Name(name.to_string()))
    }

    /// Extend this stem with every node of a relative path.
    pub(crate) fn join(&self, relative: &NormalizedPath) -> Self {
        if !self.tracking {
            return self.clone();
        }
        relative
            .iter()
            .fold(self.clone(), |stem, node| stem.push(node.clone()))
    }

    /// `None` at the root, and always for a detached stem.
    pub(crate) fn parent(&self) -> Option<Self> {
        if !self.tracking {
            return None;
        }
        let link = self.link.as_ref()?;
        Some(PathStem {
            link: link.parent.clone(),
            tracking: true,
        })
    }

    pub(crate) fn to_path(&self) -> NormalizedPath {
        let mut nodes = Vec::new();
        let mut cursor = self.link.as_deref();
        while let Some(link) = cursor {
            nodes.push(link.node.clone());
            cursor = link.parent.as_deref();
        }
        nodes.reverse();
        NormalizedPath { nodes }
    }
}

impl fmt::Debug for PathStem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tracking {
            write!(f, "PathStem({})", self.to_path())
        } else {
            f.write_str("PathStem(detached)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_builds_paths_in_order() {
        let stem = PathStem::new(true).child_name("a").child_index(2).child_name("b");
        assert_eq!(
            stem.to_path(),
            NormalizedPath::new(vec![
                PathNode::Name("a".into()),
                PathNode::Index(2),
                PathNode::Name("b".into()),
            ])
        );
        assert_eq!(stem.parent().map(|p| p.to_path().to_string()), Some("$['a'][2]".to_string()));
    }

    #[test]
    fn detached_stem_stays_empty() {
        let stem = PathStem::new(false).child_name("a").child_index(0);
        assert!(stem.to_path().is_empty());
        assert!(stem.parent().is_none());
    }

    #[test]
    fn join_prefixes_relative_path() {
        let stem = PathStem::new(true).child_name("c");
        let relative = NormalizedPath::root().child_index(1).child_name("b");
        assert_eq!(stem.join(&relative).to_path().to_string(), "$['c'][1]['b']");
    }

    #[test]
    fn names_are_escaped() {
        let path = NormalizedPath::root().child_name("it's\\");
        assert_eq!(path.to_string(), r"$['it\'s\\']");
    }

    #[test]
    fn control_characters_are_escaped() {
        let path = NormalizedPath::root().child_name("a\u{8}\u{c}\u{1}\u{1f}");
        assert_eq!(path.to_string(), r"$['a\b\f\u0001\u001f']");
    }
}
