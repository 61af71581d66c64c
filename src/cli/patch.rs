//! Apply a JSON Merge Patch

use serde_json::Value as JsonValue;

use super::CliError;
use crate::apply_merge_patch;

/// Options for the patch command
#[derive(Debug, Clone, Default)]
pub struct PatchOptions {
    /// Document to patch
    pub target: Option<String>,
    /// Merge patch to apply
    pub patch: String,
}

/// Execute a patch operation
pub fn execute_patch(options: &PatchOptions) -> Result<JsonValue, CliError> {
    let target_str = options.target.as_ref().ok_or(CliError::NoInput)?;
    let target: JsonValue = serde_json::from_str(target_str)?;
    let patch: JsonValue = serde_json::from_str(&options.patch)?;
    Ok(apply_merge_patch(&target, &patch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patches_target() {
        let options = PatchOptions {
            target: Some(r#"{"a": 1, "b": 2}"#.to_string()),
            patch: r#"{"b": null, "c": 3}"#.to_string(),
        };
        assert_eq!(execute_patch(&options).unwrap(), json!({"a": 1, "c": 3}));
    }

    #[test]
    fn invalid_patch_is_a_json_error() {
        let options = PatchOptions {
            target: Some("{}".to_string()),
            patch: "{".to_string(),
        };
        assert!(matches!(execute_patch(&options), Err(CliError::Json(_))));
    }
}
