//! Walks a selector tree against a document.
//!
//! Evaluation is depth first and synchronous. Every selector hands its
//! results either to the next node of its chain or, at the end of a chain, to
//! an [`Accumulate`] implementation: the result collector, a union's
//! temporary collector, or the cache recorder. The traversal code does not
//! know which.

use std::borrow::Cow;

use tracing::trace;

use crate::{
    ast::{BinaryOperator, FilterExpr, NodeId, Selector, SelectorNode, SelectorTree, TreeInfo, TypeError, UnaryOperator},
    cache::{CacheEntryAccumulator, CacheKey, DynamicResources},
    path::{PathStem, try_select},
    value::{JsonValue, Kind, Value},
};

/// Receives the results of a selector chain.
pub(crate) trait Accumulate<'r, V> {
    fn accumulate(&mut self, stem: PathStem, value: &'r V);
}

/// Collects results in the order they are produced.
pub(crate) struct Matches<'r, V> {
    pub(crate) items: Vec<(PathStem, &'r V)>,
}

impl<'r, V> Default for Matches<'r, V> {
    fn default() -> Self {
        Matches { items: Vec::new() }
    }
}

impl<'r, V> Accumulate<'r, V> for Matches<'r, V> {
    fn accumulate(&mut self, stem: PathStem, value: &'r V) {
        self.items.push((stem, value));
    }
}

/// Intermediate value of a filter expression: either a node of the document
/// or a value computed by an operator (or written as a literal).
enum Operand<'t, 'r, V> {
    Node(&'r V),
    Owned(Cow<'t, Value>),
}

impl<'t, 'r, V: JsonValue> Operand<'t, 'r, V> {
    fn is_false(&self) -> bool {
        match self {
            Operand::Node(v) => v.is_false(),
            Operand::Owned(v) => v.is_false(),
        }
    }

    fn apply_unary(&self, op: &UnaryOperator) -> Result<Value, TypeError> {
        match self {
            Operand::Node(v) => op.evaluate(*v),
            Operand::Owned(v) => op.evaluate(&**v),
        }
    }

    fn apply_binary(&self, op: BinaryOperator, right: &Self) -> Result<Value, TypeError> {
        match (self, right) {
            (Operand::Node(l), Operand::Node(r)) => op.evaluate(*l, *r),
            (Operand::Node(l), Operand::Owned(r)) => op.evaluate(*l, &**r),
            (Operand::Owned(l), Operand::Node(r)) => op.evaluate(&**l, *r),
            (Operand::Owned(l), Operand::Owned(r)) => op.evaluate(&**l, &**r),
        }
    }
}

/// One evaluation run of a validated tree against one root.
pub(crate) struct Evaluator<'t, 'c, 'r, V> {
    tree: &'t SelectorTree,
    info: &'t TreeInfo,
    root: &'r V,
    resources: &'c mut DynamicResources<'r, V>,
}

impl<'t, 'c, 'r, V: JsonValue> Evaluator<'t, 'c, 'r, V> {
    pub(crate) fn new(
        tree: &'t SelectorTree,
        info: &'t TreeInfo,
        root: &'r V,
        resources: &'c mut DynamicResources<'r, V>,
    ) -> Self {
        Evaluator {
            tree,
            info,
            root,
            resources,
        }
    }

    /// Evaluate the whole query, starting at the tree's head.
    pub(crate) fn run(&mut self, tracking: bool, accumulator: &mut dyn Accumulate<'r, V>) {
        if let Some(head) = self.tree.head() {
            let root = self.root;
            self.evaluate(head, &PathStem::new(tracking), root, accumulator);
        }
    }

    fn evaluate(
        &mut self,
        id: NodeId,
        stem: &PathStem,
        current: &'r V,
        accumulator: &mut dyn Accumulate<'r, V>,
    ) {
        if self.info.is_cacheable(id) {
            self.evaluate_cached(id, stem, current, accumulator);
        } else {
            self.evaluate_uncached(id, stem, current, accumulator);
        }
    }

    /// Serve from the cache, filling it first on a miss.
    ///
    /// Results are recorded relative to the input value and re-rooted at
    /// `stem` on replay, so a hit yields exactly what a fresh walk from this
    /// position would.
    fn evaluate_cached(
        &mut self,
        id: NodeId,
        stem: &PathStem,
        current: &'r V,
        accumulator: &mut dyn Accumulate<'r, V>,
    ) {
        let rooted = matches!(self.tree.node(id).selector, Selector::Root);
        let (input, base) = if rooted {
            (self.root, PathStem::new(stem.is_tracking()))
        } else {
            (current, stem.clone())
        };

        let key = CacheKey::new(id, input, stem.is_tracking());
        if self.resources.is_cached(&key) {
            trace!(node = %id, "selector cache hit");
        } else {
            let mut recorder = CacheEntryAccumulator::default();
            self.evaluate_uncached(id, &PathStem::new(stem.is_tracking()), input, &mut recorder);
            self.resources.add_to_cache(key, recorder);
        }
        self.resources.retrieve_from_cache(&key, &base, accumulator);
    }

    fn evaluate_uncached(
        &mut self,
        id: NodeId,
        stem: &PathStem,
        current: &'r V,
        accumulator: &mut dyn Accumulate<'r, V>,
    ) {
        let tree = self.tree;
        let node = tree.node(id);

        match &node.selector {
            Selector::Root => {
                let root = self.root;
                self.next(node, &PathStem::new(stem.is_tracking()), root, accumulator);
            }
            Selector::Current => self.next(node, stem, current, accumulator),
            Selector::Name(name) => {
                if let Some(child) = current.get_member(name) {
                    self.next(node, &stem.child_name(name), child, accumulator);
                }
            }
            Selector::Index(index) => {
                if current.kind() != Kind::Array {
                    return;
                }
                let len = current.len().unwrap_or(0);
                let position = if *index >= 0 {
                    usize::try_from(*index).ok()
                } else {
                    usize::try_from(index.unsigned_abs())
                        .ok()
                        .and_then(|back| len.checked_sub(back))
                };
                if let Some(position) = position
                    && let Some(element) = current.get_index(position)
                {
                    self.next(node, &stem.child_index(position), element, accumulator);
                }
            }
            Selector::Wildcard => match current.kind() {
                Kind::Array => {
                    for (i, element) in current.elements().enumerate() {
                        self.next(node, &stem.child_index(i), element, accumulator);
                    }
                }
                Kind::Object => {
                    for (name, member) in current.members() {
                        self.next(node, &stem.child_name(name), member, accumulator);
                    }
                }
                _ => {}
            },
            Selector::Slice(slice) => {
                if current.kind() != Kind::Array {
                    return;
                }
                for position in slice.indices(current.len().unwrap_or(0)) {
                    if let Some(element) = current.get_index(position) {
                        self.next(node, &stem.child_index(position), element, accumulator);
                    }
                }
            }
            Selector::RecursiveDescent => self.descend(node, stem, current, accumulator),
            Selector::Filter(expr) => match current.kind() {
                Kind::Array => {
                    for (i, element) in current.elements().enumerate() {
                        let child = stem.child_index(i);
                        if self.test(expr, &child, element) {
                            self.next(node, &child, element, accumulator);
                        }
                    }
                }
                Kind::Object => {
                    for (name, member) in current.members() {
                        let child = stem.child_name(name);
                        if self.test(expr, &child, member) {
                            self.next(node, &child, member, accumulator);
                        }
                    }
                }
                _ => {}
            },
            Selector::Union(members) => {
                let mut collected = Matches::default();
                for member in members {
                    self.evaluate(*member, stem, current, &mut collected);
                }
                for (member_stem, value) in collected.items {
                    self.next(node, &member_stem, value, accumulator);
                }
            }
            Selector::Parent => {
                if let Some(parent) = stem.parent()
                    && let Some(value) = try_select(self.root, &parent.to_path())
                {
                    self.next(node, &parent, value, accumulator);
                }
            }
        }
    }

    /// Continue the chain after `node`, or deliver at its end.
    fn next(
        &mut self,
        node: &'t SelectorNode,
        stem: &PathStem,
        value: &'r V,
        accumulator: &mut dyn Accumulate<'r, V>,
    ) {
        match node.tail {
            Some(tail) => self.evaluate(tail, stem, value, accumulator),
            None => accumulator.accumulate(stem.clone(), value),
        }
    }

    /// Pre-order walk applying the rest of the chain at every level.
    fn descend(
        &mut self,
        node: &'t SelectorNode,
        stem: &PathStem,
        current: &'r V,
        accumulator: &mut dyn Accumulate<'r, V>,
    ) {
        self.next(node, stem, current, accumulator);
        match current.kind() {
            Kind::Array => {
                for (i, element) in current.elements().enumerate() {
                    self.descend(node, &stem.child_index(i), element, accumulator);
                }
            }
            Kind::Object => {
                for (name, member) in current.members() {
                    self.descend(node, &stem.child_name(name), member, accumulator);
                }
            }
            _ => {}
        }
    }

    /// Does `candidate` pass the filter? Type errors mean no.
    fn test(&mut self, expr: &'t FilterExpr, stem: &PathStem, candidate: &'r V) -> bool {
        match self.eval_filter(expr, stem, candidate) {
            Ok(result) => !result.is_false(),
            Err(e) => {
                trace!(error = %e, "filter candidate excluded");
                false
            }
        }
    }

    fn eval_filter(
        &mut self,
        expr: &'t FilterExpr,
        stem: &PathStem,
        current: &'r V,
    ) -> Result<Operand<'t, 'r, V>, TypeError> {
        match expr {
            FilterExpr::Literal(value) => Ok(Operand::Owned(Cow::Borrowed(value))),
            FilterExpr::Query(head) => Ok(self.query_value(*head, stem, current)),
            FilterExpr::Unary { op, operand } => {
                let operand = self.eval_filter(operand, stem, current)?;
                operand.apply_unary(op).map(|v| Operand::Owned(Cow::Owned(v)))
            }
            FilterExpr::Binary { op, left, right } => {
                let left = self.eval_filter(left, stem, current)?;
                match op {
                    BinaryOperator::And if left.is_false() => return Ok(left),
                    BinaryOperator::Or if !left.is_false() => return Ok(left),
                    _ => {}
                }
                let right = self.eval_filter(right, stem, current)?;
                match op {
                    BinaryOperator::And | BinaryOperator::Or => Ok(right),
                    _ => left
                        .apply_binary(*op, &right)
                        .map(|v| Operand::Owned(Cow::Owned(v))),
                }
            }
        }
    }

    /// Value of a sub-query: `null` for no match, the match itself for one,
    /// an array for several.
    fn query_value(&mut self, head: NodeId, stem: &PathStem, current: &'r V) -> Operand<'t, 'r, V> {
        let mut matches = Matches::default();
        self.evaluate(head, stem, current, &mut matches);
        match matches.items.as_slice() {
            [] => Operand::Owned(Cow::Owned(Value::Null)),
            [(_, single)] => Operand::Node(*single),
            many => Operand::Owned(Cow::Owned(Value::Array(
                many.iter().map(|(_, v)| v.to_value()).collect(),
            ))),
        }
    }
}
