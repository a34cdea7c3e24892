use crate::errors::ToolError;
use crate::utils::suggest::suggest;
use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tool_catalog.json"));
    serde_json::from_str(raw).expect("tool_catalog.json must be valid JSON")
});

static TOOL_MAP: Lazy<HashMap<String, ToolDef>> = Lazy::new(|| {
    TOOL_CATALOG
        .iter()
        .cloned()
        .map(|tool| (tool.name.clone(), tool))
        .collect()
});

static TOOL_VALIDATORS: Lazy<HashMap<String, JSONSchema>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for tool in TOOL_CATALOG.iter() {
        if let Ok(schema) = JSONSchema::compile(&tool.input_schema) {
            map.insert(tool.name.clone(), schema);
        }
    }
    map
});

pub fn tool_catalog() -> &'static Vec<ToolDef> {
    &TOOL_CATALOG
}

pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_MAP.get(name)
}

pub fn tool_names() -> Vec<&'static str> {
    TOOL_CATALOG.iter().map(|tool| tool.name.as_str()).collect()
}

/// Payload for `tools/list`.
pub fn list_tools() -> Value {
    serde_json::json!({ "tools": tool_catalog() })
}

pub fn unknown_tool_error(name: &str) -> ToolError {
    let known = tool_names();
    let did_you_mean = suggest(name, &known, 3);
    ToolError::not_found(format!("Unknown tool: {}", name)).with_details(serde_json::json!({
        "did_you_mean": did_you_mean,
        "known_tools": known,
    }))
}

/// Missing `arguments` is the same as `{}`; tools without parameters are
/// usually called that way.
pub fn normalize_args(args: Value) -> Value {
    if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    }
}

pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), ToolError> {
    if tool_by_name(tool_name).is_none() {
        return Err(unknown_tool_error(tool_name));
    }
    let Some(schema) = TOOL_VALIDATORS.get(tool_name) else {
        return Ok(());
    };
    if let Err(errors) = schema.validate(args) {
        let problems: Vec<String> = errors.take(10).map(|err| describe(&err)).collect();
        return Err(
            ToolError::invalid_params(format!("Invalid arguments for {}", tool_name))
                .with_details(serde_json::json!({ "problems": problems })),
        );
    }
    Ok(())
}

fn describe(err: &jsonschema::ValidationError<'_>) -> String {
    let path = err.instance_path.to_string();
    let at = if path.is_empty() {
        "(root)".to_string()
    } else {
        path
    };
    match &err.kind {
        ValidationErrorKind::Required { property } => {
            let prop = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            format!("{}: missing required field '{}'", at, prop)
        }
        ValidationErrorKind::Enum { options } => {
            let allowed: Vec<String> = options
                .as_array()
                .map(|arr| {
                    arr.iter()
                        .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                        .collect()
                })
                .unwrap_or_default();
            format!("{}: expected one of {}", at, allowed.join(", "))
        }
        ValidationErrorKind::Type { kind } => {
            format!("{}: expected {}", at, format_type_kind(kind))
        }
        _ => format!("{}: {}", at, err),
    }
}

fn format_type_kind(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Single(primitive) => primitive.to_string(),
        TypeKind::Multiple(types) => {
            let list: Vec<String> = (*types).into_iter().map(|t| t.to_string()).collect();
            if list.is_empty() {
                "unknown".to_string()
            } else {
                list.join(" | ")
            }
        }
    }
}
