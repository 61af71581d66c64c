//! # Query Language - Abstract Syntax Tree
//!
//! A query is compiled into a [`SelectorTree`]: an arena of selector nodes,
//! each pointing at the node that continues its chain. Filters embed a
//! [`FilterExpr`] built from the JMESPath-style operators.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[selectors]** - Selector variants, slices and the selector arena
//! - **[filter]** - Filter predicate expressions
//! - **[operators]** - Unary and binary operators with precedence
//!
//! ## Quick Start
//!
//! ```text
//! $.store.book[?(@.price < 10 && @.title =~ /^s/i)].title
//! ```
//!
//! This query selects the titles of cheap books whose title starts with `s`.
//!
//! ## Selectors
//!
//! | syntax | selector |
//! |---|---|
//! | `$` | root |
//! | `@` | current value |
//! | `.name`, `['name']` | object member |
//! | `[0]`, `[-1]` | array element |
//! | `.*`, `[*]` | every child |
//! | `[1:5:2]` | array slice |
//! | `..` | recursive descent |
//! | `[?(expr)]` | filter |
//! | `[a, 'b', 0]` | union |
//! | `^` | parent |
//!
//! ## Operator precedence
//!
//! Higher binds tighter.
//!
//! | operator | precedence |
//! |---|---|
//! | `=~ /re/` | 7 |
//! | `<` `<=` `>` `>=` | 5 |
//! | `==` `!=` | 4 |
//! | `&&` | 3 |
//! | `\|\|` | 2 |
//! | `!` | 1 |
//!
//! `!` binds loosest, so `!@.a == 1` reads as `!(@.a == 1)`.
pub mod filter;
pub mod operators;
pub mod selectors;
pub mod tokens;

pub use filter::FilterExpr;
pub use operators::{BinaryOperator, TypeError, UnaryOperator};
pub use selectors::{NodeId, Selector, SelectorNode, SelectorTree, Slice, TreeError};
pub(crate) use selectors::TreeInfo;
pub use tokens::Token;
