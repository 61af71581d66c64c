use crate::{
    ast::{BinaryOperator, NodeId, UnaryOperator},
    value::Value,
};

/// Predicate embedded in a filter selector (`[?(...)]`).
///
/// Sub-queries are not stored inline: they live in the same selector tree as
/// the filter and are referenced by the id of their head node, so that they
/// get a stable identity for caching.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// Literal value
    ///
    /// # Examples
    /// ```text
    /// 42
    /// "hello"
    /// null
    /// ```
    Literal(Value),

    /// Relative (`@...`) or absolute (`$...`) query
    ///
    /// No match evaluates to `null`, one match to the matched value, several
    /// to an array of them.
    Query(NodeId),

    /// Unary operator application
    ///
    /// # Examples
    /// ```text
    /// !@.deleted
    /// @.name =~ /^h/i
    /// ```
    Unary {
        op: UnaryOperator,
        operand: Box<FilterExpr>,
    },

    /// Binary operator application
    ///
    /// # Examples
    /// ```text
    /// @.price < $.limits.max
    /// @.a && @.b
    /// ```
    Binary {
        op: BinaryOperator,
        left: Box<FilterExpr>,
        right: Box<FilterExpr>,
    },
}

impl FilterExpr {
    pub fn unary(op: UnaryOperator, operand: FilterExpr) -> Self {
        FilterExpr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOperator, left: FilterExpr, right: FilterExpr) -> Self {
        FilterExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Head nodes of every sub-query in this expression, left to right.
    pub fn queries(&self) -> Vec<NodeId> {
        let mut heads = Vec::new();
        self.collect_queries(&mut heads);
        heads
    }

    fn collect_queries(&self, heads: &mut Vec<NodeId>) {
        match self {
            FilterExpr::Literal(_) => {}
            FilterExpr::Query(head) => heads.push(*head),
            FilterExpr::Unary { operand, .. } => operand.collect_queries(heads),
            FilterExpr::Binary { left, right, .. } => {
                left.collect_queries(heads);
                right.collect_queries(heads);
            }
        }
    }
}
