pub mod ast;
mod cache;
mod evaluator;
pub mod expression;
pub mod lexer;
pub mod merge_patch;
pub mod parser;
pub mod path;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{BinaryOperator, FilterExpr, NodeId, Selector, SelectorTree, Token, TypeError, UnaryOperator};
pub use cache::CacheStats;
pub use expression::{BoundExpression, JsonPath, JsonPathError, JsonPathExpression, JsonPathQuery, ResultOptions};
pub use lexer::{LexError, Lexer, Position};
pub use merge_patch::apply_merge_patch;
pub use parser::{ParseError, Parser};
pub use path::{NormalizedPath, PathNode, try_select};
pub use value::{JsonValue, Kind, Value};
