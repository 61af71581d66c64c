//! Compiled JSONPath expressions and their result options.
//!
//! # Examples
//!
//! ```
//! use jsonsift::{JsonPath, ResultOptions};
//! use serde_json::json;
//!
//! let doc = json!({"a": [1, 2, {"b": 3}], "c": {"b": 3}});
//! let expr = JsonPath::compile("$..b").unwrap();
//!
//! let paths: Vec<String> = expr
//!     .select_paths(&doc, ResultOptions::NO_DUPS)
//!     .iter()
//!     .map(|p| p.to_string())
//!     .collect();
//! assert_eq!(paths, ["$['a'][2]['b']", "$['c']['b']"]);
//! ```

use std::{
    collections::HashSet,
    fmt,
    ops::{BitOr, BitOrAssign},
};

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    ast::{SelectorTree, TreeError, TreeInfo},
    cache::{CacheStats, DynamicResources},
    evaluator::{Evaluator, Matches},
    lexer::Lexer,
    parser::{ParseError, Parser},
    path::{self, NormalizedPath},
    value::JsonValue,
};

/// What a selection produces and how results are post-processed.
///
/// `NO_DUPS` and `SORT` both include `PATH`: deduplication and ordering work
/// on paths, so asking for either turns path tracking on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ResultOptions(u8);

impl ResultOptions {
    /// Values only.
    pub const NONE: ResultOptions = ResultOptions(0);
    /// Track the normalized path of every result.
    pub const PATH: ResultOptions = ResultOptions(1);
    /// Keep only the first result for each path.
    pub const NO_DUPS: ResultOptions = ResultOptions(1 | 2);
    /// Order results by path. The sort is stable.
    pub const SORT: ResultOptions = ResultOptions(1 | 4);

    pub fn bits(self) -> u8 {
        self.0
    }

    /// True when every flag of `other` is set in `self`.
    pub fn contains(self, other: ResultOptions) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ResultOptions {
    type Output = ResultOptions;

    fn bitor(self, rhs: ResultOptions) -> ResultOptions {
        ResultOptions(self.0 | rhs.0)
    }
}

impl BitOrAssign for ResultOptions {
    fn bitor_assign(&mut self, rhs: ResultOptions) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ResultOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (ResultOptions::PATH, "PATH"),
            (ResultOptions::NO_DUPS, "NO_DUPS"),
            (ResultOptions::SORT, "SORT"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect();

        if names.is_empty() {
            f.write_str("NONE")
        } else {
            f.write_str(&names.join(" | "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsonPathError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] ParseError),

    #[error("Invalid selector tree: {0}")]
    InvalidTree(#[from] TreeError),
}

/// A compiled query, reusable against any number of documents.
///
/// Every `select*` call runs with a fresh cache, so the expression itself is
/// never mutated and can be shared by reference. Use [`bind`](Self::bind) to
/// keep one cache across several calls against the same document.
#[derive(Debug)]
pub struct JsonPathExpression {
    tree: SelectorTree,
    info: TreeInfo,
    required: ResultOptions,
}

impl JsonPathExpression {
    /// Compile query text.
    pub fn compile(text: &str) -> Result<Self, JsonPathError> {
        let tree = Parser::new(Lexer::new(text))?.parse()?;
        Self::from_tree(tree)
    }

    /// Wrap a tree built by hand. Trees with a missing head, references to
    /// missing nodes or cycles are refused.
    pub fn from_tree(tree: SelectorTree) -> Result<Self, JsonPathError> {
        let info = tree.analyze()?;
        let required = if info.paths_required {
            ResultOptions::PATH
        } else {
            ResultOptions::NONE
        };
        debug!(nodes = tree.len(), required = %required, "compiled selector tree");
        Ok(JsonPathExpression { tree, info, required })
    }

    pub fn tree(&self) -> &SelectorTree {
        &self.tree
    }

    /// Options every evaluation runs with, whatever the caller asks for.
    /// `PATH` when the query uses the parent selector.
    pub fn required_options(&self) -> ResultOptions {
        self.required
    }

    pub fn select<'r, V: JsonValue>(&self, root: &'r V, options: ResultOptions) -> Vec<&'r V> {
        let mut resources = DynamicResources::default();
        self.run(root, options, &mut resources)
            .into_iter()
            .map(|(_, value)| value)
            .collect()
    }

    pub fn select_paths<V: JsonValue>(&self, root: &V, options: ResultOptions) -> Vec<NormalizedPath> {
        let mut resources = DynamicResources::default();
        self.run(root, options | ResultOptions::PATH, &mut resources)
            .into_iter()
            .map(|(path, _)| path)
            .collect()
    }

    pub fn select_nodes<'r, V: JsonValue>(
        &self,
        root: &'r V,
        options: ResultOptions,
    ) -> Vec<(NormalizedPath, &'r V)> {
        let mut resources = DynamicResources::default();
        self.run(root, options | ResultOptions::PATH, &mut resources)
    }

    /// Tie the expression to one document and keep the selector cache warm
    /// between calls.
    pub fn bind<'e, 'r, V: JsonValue>(&'e self, root: &'r V) -> BoundExpression<'e, 'r, V> {
        BoundExpression {
            expression: self,
            root,
            resources: DynamicResources::default(),
        }
    }

    /// Release the compiled tree. Dropping the expression does the same.
    pub fn release(self) {}

    fn run<'r, V: JsonValue>(
        &self,
        root: &'r V,
        options: ResultOptions,
        resources: &mut DynamicResources<'r, V>,
    ) -> Vec<(NormalizedPath, &'r V)> {
        let options = options | self.required;
        let mut matches = Matches::default();
        Evaluator::new(&self.tree, &self.info, root, resources)
            .run(options.contains(ResultOptions::PATH), &mut matches);

        let mut nodes: Vec<(NormalizedPath, &'r V)> = matches
            .items
            .into_iter()
            .map(|(stem, value)| (stem.to_path(), value))
            .collect();

        if options.contains(ResultOptions::NO_DUPS) {
            let mut seen = HashSet::new();
            nodes.retain(|(path, _)| seen.insert(path.clone()));
        }
        if options.contains(ResultOptions::SORT) {
            nodes.sort_by(|a, b| a.0.cmp(&b.0));
        }
        trace!(results = nodes.len(), options = %options, "selection finished");
        nodes
    }
}

impl Drop for JsonPathExpression {
    fn drop(&mut self) {
        trace!(nodes = self.tree.len(), "released compiled expression");
    }
}

/// A compiled expression bound to one document.
///
/// Cached selector results are only valid for the document they were
/// computed against; the borrow of `root` keeps the two together. Calls take
/// `&mut self` because they fill the cache.
pub struct BoundExpression<'e, 'r, V> {
    expression: &'e JsonPathExpression,
    root: &'r V,
    resources: DynamicResources<'r, V>,
}

impl<'e, 'r, V: JsonValue> BoundExpression<'e, 'r, V> {
    pub fn select(&mut self, options: ResultOptions) -> Vec<&'r V> {
        self.expression
            .run(self.root, options, &mut self.resources)
            .into_iter()
            .map(|(_, value)| value)
            .collect()
    }

    pub fn select_paths(&mut self, options: ResultOptions) -> Vec<NormalizedPath> {
        self.expression
            .run(self.root, options | ResultOptions::PATH, &mut self.resources)
            .into_iter()
            .map(|(path, _)| path)
            .collect()
    }

    pub fn select_nodes(&mut self, options: ResultOptions) -> Vec<(NormalizedPath, &'r V)> {
        self.expression
            .run(self.root, options | ResultOptions::PATH, &mut self.resources)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.resources.stats()
    }

    /// Drop the cache and end the binding.
    pub fn release(self) {}
}

impl<'e, 'r, V> Drop for BoundExpression<'e, 'r, V> {
    fn drop(&mut self) {
        let stats = self.resources.stats();
        debug!(
            entries = stats.entries,
            hits = stats.hits,
            misses = stats.misses,
            "released bound expression"
        );
    }
}

/// Entry points that compile and select in one step.
pub struct JsonPath;

impl JsonPath {
    pub fn compile(text: &str) -> Result<JsonPathExpression, JsonPathError> {
        JsonPathExpression::compile(text)
    }

    pub fn select<'r, V: JsonValue>(
        root: &'r V,
        text: &str,
        options: ResultOptions,
    ) -> Result<Vec<&'r V>, JsonPathError> {
        Ok(Self::compile(text)?.select(root, options))
    }

    pub fn select_paths<V: JsonValue>(
        root: &V,
        text: &str,
        options: ResultOptions,
    ) -> Result<Vec<NormalizedPath>, JsonPathError> {
        Ok(Self::compile(text)?.select_paths(root, options))
    }

    /// See [`path::try_select`].
    pub fn try_select<'r, V: JsonValue + ?Sized>(root: &'r V, path: &NormalizedPath) -> Option<&'r V> {
        path::try_select(root, path)
    }
}

/// Query a document directly.
///
/// ```
/// use jsonsift::JsonPathQuery;
/// use serde_json::json;
///
/// let doc = json!({"users": [{"name": "ann"}, {"name": "bob"}]});
/// let names = doc.query("$.users[*].name").unwrap();
/// assert_eq!(names, [&json!("ann"), &json!("bob")]);
/// ```
pub trait JsonPathQuery {
    fn query(&self, text: &str) -> Result<Vec<&Self>, JsonPathError>;

    fn query_paths(&self, text: &str) -> Result<Vec<NormalizedPath>, JsonPathError>;
}

impl<V: JsonValue> JsonPathQuery for V {
    fn query(&self, text: &str) -> Result<Vec<&Self>, JsonPathError> {
        JsonPath::select(self, text, ResultOptions::NONE)
    }

    fn query_paths(&self, text: &str) -> Result<Vec<NormalizedPath>, JsonPathError> {
        JsonPath::select_paths(self, text, ResultOptions::PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_and_sort_imply_path() {
        assert!(ResultOptions::NO_DUPS.contains(ResultOptions::PATH));
        assert!(ResultOptions::SORT.contains(ResultOptions::PATH));
        assert!(!ResultOptions::PATH.contains(ResultOptions::SORT));
        assert_eq!((ResultOptions::NO_DUPS | ResultOptions::SORT).bits(), 7);
    }

    #[test]
    fn options_display() {
        assert_eq!(ResultOptions::NONE.to_string(), "NONE");
        assert_eq!(ResultOptions::SORT.to_string(), "PATH | SORT");
        let mut all = ResultOptions::NO_DUPS;
        all |= ResultOptions::SORT;
        assert_eq!(all.to_string(), "PATH | NO_DUPS | SORT");
    }

    #[test]
    fn parent_selector_requires_paths() {
        let expr = JsonPathExpression::compile("$.a^").unwrap();
        assert_eq!(expr.required_options(), ResultOptions::PATH);
        let expr = JsonPathExpression::compile("$.a").unwrap();
        assert_eq!(expr.required_options(), ResultOptions::NONE);
    }
}
