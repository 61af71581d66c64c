//! Run JSONPath queries against JSON input

use serde_json::{Map, Value as JsonValue};

use super::CliError;
use crate::{JsonPathExpression, ResultOptions};

/// Options for the select command
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    /// The JSONPath query to run
    pub query: String,
    /// JSON input string
    pub input: Option<String>,
    /// Output normalized paths instead of values
    pub paths: bool,
    /// Output `{"path": ..., "value": ...}` pairs
    pub nodes: bool,
    /// Drop results whose path was already produced
    pub no_dups: bool,
    /// Order results by path
    pub sort: bool,
    /// Only validate syntax, don't execute
    pub syntax_only: bool,
}

impl SelectOptions {
    fn result_options(&self) -> ResultOptions {
        let mut options = ResultOptions::NONE;
        if self.paths || self.nodes {
            options |= ResultOptions::PATH;
        }
        if self.no_dups {
            options |= ResultOptions::NO_DUPS;
        }
        if self.sort {
            options |= ResultOptions::SORT;
        }
        options
    }
}

/// Result of a select operation
#[derive(Debug)]
pub enum SelectResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Query ran; the output is a JSON array
    Success(JsonValue),
}

/// Execute a select operation
pub fn execute_select(options: &SelectOptions) -> Result<SelectResult, CliError> {
    let expression = JsonPathExpression::compile(&options.query)?;
    if options.syntax_only {
        return Ok(SelectResult::SyntaxValid);
    }

    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let document: JsonValue = serde_json::from_str(json_str)?;
    let result_options = options.result_options();

    let output: Vec<JsonValue> = if options.nodes {
        expression
            .select_nodes(&document, result_options)
            .into_iter()
            .map(|(path, value)| {
                let mut node = Map::new();
                node.insert("path".to_string(), JsonValue::String(path.to_string()));
                node.insert("value".to_string(), value.clone());
                JsonValue::Object(node)
            })
            .collect()
    } else if options.paths {
        expression
            .select_paths(&document, result_options)
            .into_iter()
            .map(|path| JsonValue::String(path.to_string()))
            .collect()
    } else {
        expression
            .select(&document, result_options)
            .into_iter()
            .cloned()
            .collect()
    };

    Ok(SelectResult::Success(JsonValue::Array(output)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(query: &str, input: &str) -> SelectOptions {
        SelectOptions {
            query: query.to_string(),
            input: Some(input.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn selects_values() {
        let options = run("$.a[*]", r#"{"a": [1, 2]}"#);
        match execute_select(&options).unwrap() {
            SelectResult::Success(output) => assert_eq!(output, json!([1, 2])),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn selects_nodes_with_paths() {
        let options = SelectOptions {
            nodes: true,
            ..run("$..b", r#"{"a": {"b": 1}}"#)
        };
        match execute_select(&options).unwrap() {
            SelectResult::Success(output) => {
                assert_eq!(output, json!([{"path": "$['a']['b']", "value": 1}]))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn syntax_only_needs_no_input() {
        let options = SelectOptions {
            query: "$.a".to_string(),
            syntax_only: true,
            ..Default::default()
        };
        assert!(matches!(execute_select(&options), Ok(SelectResult::SyntaxValid)));
    }

    #[test]
    fn missing_input_is_reported() {
        let options = SelectOptions {
            query: "$.a".to_string(),
            ..Default::default()
        };
        assert!(matches!(execute_select(&options), Err(CliError::NoInput)));
    }
}
