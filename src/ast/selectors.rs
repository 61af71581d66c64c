use std::fmt;

use thiserror::Error;

use crate::ast::FilterExpr;

/// Identity of a node in a [`SelectorTree`].
///
/// Assigned once, when the node is pushed, and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Array slice bounds, `[start:stop:step]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: i64,
}

impl Default for Slice {
    fn default() -> Self {
        Slice {
            start: None,
            stop: None,
            step: 1,
        }
    }
}

impl Slice {
    /// Positions selected in an array of `len` elements, in selection order.
    ///
    /// Negative bounds count from the end, a negative step walks backwards and
    /// a zero step selects nothing.
    ///
    /// ```
    /// use jsonsift::ast::Slice;
    ///
    /// let reversed = Slice { start: None, stop: None, step: -1 };
    /// assert_eq!(reversed.indices(3), vec![2, 1, 0]);
    ///
    /// let tail = Slice { start: Some(-2), stop: None, step: 1 };
    /// assert_eq!(tail.indices(5), vec![3, 4]);
    /// ```
    pub fn indices(&self, len: usize) -> Vec<usize> {
        let len = len as i64;
        let normalize = |i: i64| if i >= 0 { i } else { len + i };
        let mut selected = Vec::new();

        if self.step > 0 {
            let lower = normalize(self.start.unwrap_or(0)).clamp(0, len);
            let upper = normalize(self.stop.unwrap_or(len)).clamp(0, len);
            let mut i = lower;
            while i < upper {
                selected.push(i as usize);
                match i.checked_add(self.step) {
                    Some(next) => i = next,
                    None => break,
                }
            }
        } else if self.step < 0 {
            let upper = normalize(self.start.unwrap_or(len - 1)).clamp(-1, len - 1);
            let lower = match self.stop {
                Some(stop) => normalize(stop).clamp(-1, len - 1),
                None => -1,
            };
            let mut i = upper;
            while lower < i {
                selected.push(i as usize);
                match i.checked_add(self.step) {
                    Some(next) => i = next,
                    None => break,
                }
            }
        }
        selected
    }
}

/// One step of a compiled query.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Root document (`$`)
    Root,

    /// Current value (`@`)
    ///
    /// The candidate inside a filter, or the value a union member starts from.
    Current,

    /// Object member by name
    ///
    /// # Examples
    /// ```text
    /// $.store
    /// $['store']
    /// ```
    Name(String),

    /// Array element by position, negative counts from the end
    ///
    /// # Examples
    /// ```text
    /// $[0]
    /// $[-1]
    /// ```
    Index(i64),

    /// Every element or member (`*`)
    Wildcard,

    /// Array slice (`[start:stop:step]`)
    Slice(Slice),

    /// Recursive descent (`..`)
    ///
    /// Applies the rest of the chain to the current value and to every
    /// descendant, depth first.
    RecursiveDescent,

    /// Filter (`[?(...)]`)
    ///
    /// Keeps the children of the current value for which the predicate is
    /// truthy.
    Filter(FilterExpr),

    /// Union (`[a, 'b', 1:3]`)
    ///
    /// Each member is the head of its own chain, evaluated against the
    /// current value in order.
    Union(Vec<NodeId>),

    /// Parent of the current value (`^`)
    ///
    /// Needs the path of the current value, so a query containing it always
    /// tracks paths.
    Parent,
}

/// A selector and the node that continues the chain after it.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorNode {
    pub selector: Selector,
    pub tail: Option<NodeId>,
}

/// Problems that make a selector tree impossible to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("selector tree has no head node")]
    MissingHead,

    #[error("node {from} refers to missing node {to}")]
    DanglingReference { from: NodeId, to: NodeId },

    #[error("selector tree contains a cycle through node {0}")]
    Cycle(NodeId),
}

/// Compiled form of a query: an arena of selector nodes.
///
/// Trees normally come from [`crate::parser::Parser`], but can be built by
/// hand:
///
/// ```
/// use jsonsift::ast::{Selector, SelectorTree};
///
/// // $..b
/// let mut tree = SelectorTree::new();
/// let head = tree.chain([
///     Selector::Root,
///     Selector::RecursiveDescent,
///     Selector::Name("b".to_string()),
/// ]);
/// tree.set_head(head.unwrap());
/// assert!(tree.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectorTree {
    nodes: Vec<SelectorNode>,
    head: Option<NodeId>,
}

impl SelectorTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with no tail and return its id.
    pub fn push(&mut self, selector: Selector) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SelectorNode {
            selector,
            tail: None,
        });
        id
    }

    /// Make `tail` continue the chain after `node`.
    ///
    /// Ignored when `node` does not exist; [`validate`](Self::validate)
    /// catches a missing `tail`.
    pub fn set_tail(&mut self, node: NodeId, tail: NodeId) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.tail = Some(tail);
        }
    }

    /// Push a linked chain of selectors and return its head.
    pub fn chain(&mut self, selectors: impl IntoIterator<Item = Selector>) -> Option<NodeId> {
        let mut head = None;
        let mut last: Option<NodeId> = None;
        for selector in selectors {
            let id = self.push(selector);
            match last {
                Some(prev) => self.set_tail(prev, id),
                None => head = Some(id),
            }
            last = Some(id);
        }
        head
    }

    pub fn set_head(&mut self, head: NodeId) {
        self.head = Some(head);
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    pub fn get(&self, id: NodeId) -> Option<&SelectorNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Indexing for trees that passed [`validate`](Self::validate).
    pub(crate) fn node(&self, id: NodeId) -> &SelectorNode {
        &self.nodes[id.0]
    }

    fn edges(&self, node: &SelectorNode) -> Vec<NodeId> {
        let mut edges = Vec::new();
        match &node.selector {
            Selector::Union(members) => edges.extend(members.iter().copied()),
            Selector::Filter(expr) => edges.extend(expr.queries()),
            _ => {}
        }
        edges.extend(node.tail);
        edges
    }

    /// Check that the tree has a head, that every reference points at an
    /// existing node and that no chain loops back on itself.
    pub fn validate(&self) -> Result<(), TreeError> {
        let head = self.head.ok_or(TreeError::MissingHead)?;
        if head.0 >= self.nodes.len() {
            return Err(TreeError::DanglingReference { from: head, to: head });
        }
        for (i, node) in self.nodes.iter().enumerate() {
            for to in self.edges(node) {
                if to.0 >= self.nodes.len() {
                    return Err(TreeError::DanglingReference { from: NodeId(i), to });
                }
            }
        }

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        fn visit(tree: &SelectorTree, id: NodeId, marks: &mut [Mark]) -> Result<(), TreeError> {
            match marks[id.0] {
                Mark::Done => return Ok(()),
                Mark::Active => return Err(TreeError::Cycle(id)),
                Mark::New => {}
            }
            marks[id.0] = Mark::Active;
            for next in tree.edges(tree.node(id)) {
                visit(tree, next, marks)?;
            }
            marks[id.0] = Mark::Done;
            Ok(())
        }

        let mut marks = vec![Mark::New; self.nodes.len()];
        for i in 0..self.nodes.len() {
            visit(self, NodeId(i), &mut marks)?;
        }
        Ok(())
    }

    /// Validate and work out which nodes may be cached and whether paths must
    /// always be tracked.
    pub(crate) fn analyze(&self) -> Result<TreeInfo, TreeError> {
        self.validate()?;
        let head = self.head.ok_or(TreeError::MissingHead)?;

        let mut parent_memo = vec![None; self.nodes.len()];
        let mut anchored_memo = vec![None; self.nodes.len()];
        let mut cacheable = vec![false; self.nodes.len()];

        for (i, node) in self.nodes.iter().enumerate() {
            let id = NodeId(i);
            match &node.selector {
                Selector::RecursiveDescent => {
                    cacheable[i] = !self.is_anchored(id, &mut anchored_memo, &mut parent_memo);
                }
                Selector::Filter(expr) => {
                    for query in expr.queries() {
                        if self.node(query).selector == Selector::Root
                            && !self.contains_parent(query, &mut parent_memo)
                        {
                            cacheable[query.0] = true;
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(TreeInfo {
            paths_required: self.contains_parent(head, &mut parent_memo),
            cacheable,
        })
    }

    fn contains_parent(&self, id: NodeId, memo: &mut Vec<Option<bool>>) -> bool {
        if let Some(known) = memo[id.0] {
            return known;
        }
        let node = self.node(id);
        let found = node.selector == Selector::Parent
            || self
                .edges(node)
                .into_iter()
                .any(|next| self.contains_parent(next, memo));
        memo[id.0] = Some(found);
        found
    }

    /// True when the results reachable from `id` depend on the absolute
    /// position of the value it is applied to. Such nodes cannot be recorded
    /// relative to their input.
    fn is_anchored(
        &self,
        id: NodeId,
        memo: &mut Vec<Option<bool>>,
        parent_memo: &mut Vec<Option<bool>>,
    ) -> bool {
        if let Some(known) = memo[id.0] {
            return known;
        }
        let node = self.node(id);
        let anchored = match &node.selector {
            Selector::Root | Selector::Parent => true,
            Selector::Filter(expr) => expr
                .queries()
                .into_iter()
                .any(|query| self.contains_parent(query, parent_memo)),
            Selector::Union(members) => members
                .iter()
                .any(|member| self.is_anchored(*member, memo, parent_memo)),
            _ => false,
        } || node
            .tail
            .is_some_and(|tail| self.is_anchored(tail, memo, parent_memo));
        memo[id.0] = Some(anchored);
        anchored
    }
}

/// Facts about a validated tree, computed once per compiled expression.
#[derive(Debug, Clone, Default)]
pub(crate) struct TreeInfo {
    pub(crate) paths_required: bool,
    cacheable: Vec<bool>,
}

impl TreeInfo {
    pub(crate) fn is_cacheable(&self, id: NodeId) -> bool {
        self.cacheable.get(id.0).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FilterExpr;

    #[test]
    fn slice_defaults_select_everything() {
        assert_eq!(Slice::default().indices(3), vec![0, 1, 2]);
    }

    #[test]
    fn slice_with_step_and_negative_bounds() {
        let s = Slice { start: Some(1), stop: Some(-1), step: 2 };
        assert_eq!(s.indices(6), vec![1, 3]);
        let back = Slice { start: Some(-1), stop: Some(0), step: -2 };
        assert_eq!(back.indices(5), vec![4, 2]);
        let zero = Slice { start: None, stop: None, step: 0 };
        assert!(zero.indices(5).is_empty());
    }

    #[test]
    fn slice_with_extreme_step_stops_at_first_element() {
        let forward = Slice { start: Some(1), stop: None, step: i64::MAX };
        assert_eq!(forward.indices(3), vec![1]);
        let backward = Slice { start: None, stop: None, step: i64::MIN };
        assert_eq!(backward.indices(3), vec![2]);
        let wide = Slice { start: Some(i64::MIN), stop: Some(i64::MAX), step: i64::MAX };
        assert_eq!(wide.indices(2), vec![0]);
    }

    #[test]
    fn missing_head_is_rejected() {
        let mut tree = SelectorTree::new();
        tree.push(Selector::Root);
        assert_eq!(tree.validate(), Err(TreeError::MissingHead));
    }

    #[test]
    fn dangling_tail_is_rejected() {
        let mut tree = SelectorTree::new();
        let root = tree.push(Selector::Root);
        tree.set_tail(root, NodeId(7));
        tree.set_head(root);
        assert_eq!(
            tree.validate(),
            Err(TreeError::DanglingReference { from: root, to: NodeId(7) })
        );
    }

    #[test]
    fn cycles_are_rejected() {
        let mut tree = SelectorTree::new();
        let a = tree.push(Selector::Root);
        let b = tree.push(Selector::Wildcard);
        tree.set_tail(a, b);
        tree.set_tail(b, a);
        tree.set_head(a);
        assert!(matches!(tree.validate(), Err(TreeError::Cycle(_))));
    }

    #[test]
    fn descent_is_cacheable_unless_anchored() {
        let mut tree = SelectorTree::new();
        let head = tree
            .chain([Selector::Root, Selector::RecursiveDescent, Selector::Name("b".into())])
            .unwrap();
        tree.set_head(head);
        let info = tree.analyze().unwrap();
        assert!(info.is_cacheable(NodeId(1)));
        assert!(!info.paths_required);

        let mut tree = SelectorTree::new();
        let head = tree
            .chain([Selector::Root, Selector::RecursiveDescent, Selector::Parent])
            .unwrap();
        tree.set_head(head);
        let info = tree.analyze().unwrap();
        assert!(!info.is_cacheable(NodeId(1)));
        assert!(info.paths_required);
    }

    #[test]
    fn root_queries_in_filters_are_cacheable() {
        let mut tree = SelectorTree::new();
        let limit = tree.chain([Selector::Root, Selector::Name("max".into())]).unwrap();
        let price = tree.chain([Selector::Current, Selector::Name("price".into())]).unwrap();
        let filter = FilterExpr::binary(
            crate::ast::BinaryOperator::LessThan,
            FilterExpr::Query(price),
            FilterExpr::Query(limit),
        );
        let head = tree.chain([Selector::Root, Selector::Filter(filter)]).unwrap();
        tree.set_head(head);
        let info = tree.analyze().unwrap();
        assert!(info.is_cacheable(limit));
        assert!(!info.is_cacheable(price));
    }
}
