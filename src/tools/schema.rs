//! 工具参数定义与 JSON Schema 生成（schemars）
//!
//! 每个工具的参数是一个 Deserialize + JsonSchema 结构体：同一份定义既生成发给模型的 schema，
//! 又负责解析模型给出的 arguments，避免两者漂移。

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::core::ToolError;
use crate::memory::DEFAULT_DOCUMENT_FILE;
use crate::tools::ToolKind;

/// read_file / save_file 参数
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FileArgs {
    /// Name of the JSON file (default: file.json). `.json` is appended when missing.
    #[serde(default = "default_filename")]
    pub filename: String,
}

fn default_filename() -> String {
    DEFAULT_DOCUMENT_FILE.to_string()
}

/// create_plan 参数
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PlanArgs {
    /// Description of the tasks or goals
    pub task_description: String,
    /// Size of chunks - "small", "medium", or "large" (default: "medium")
    #[serde(default = "default_chunk_size")]
    pub chunk_size: String,
}

fn default_chunk_size() -> String {
    "medium".to_string()
}

/// create_schedule 参数
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ScheduleArgs {
    /// Comma-separated list of tasks/items or a description of schedule items
    pub items: String,
    /// Time format - "12h" or "24h" (default: "24h")
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

fn default_time_format() -> String {
    "24h".to_string()
}

/// 无参数工具
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoArgs {}

/// 生成参数 schema，去掉 `$schema` / `title` 等对模型无用的元字段
pub fn parameters_schema<T: JsonSchema>() -> Value {
    let mut value = serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| {
        serde_json::json!({ "type": "object", "properties": {} })
    });
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    value
}

/// 解析 arguments；null 视为空对象，失败时返回 InvalidArguments
pub fn parse_args<T: DeserializeOwned>(tool: ToolKind, args: Value) -> Result<T, ToolError> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments {
        tool: tool.name().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_schema_lists_required_task() {
        let schema = parameters_schema::<PlanArgs>();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["chunk_size"].is_object());
        assert_eq!(schema["required"], json!(["task_description"]));
        assert!(schema.get("$schema").is_none());
    }

    #[test]
    fn test_parse_args_applies_defaults() {
        let args: FileArgs = parse_args(ToolKind::SaveFile, Value::Null).unwrap();
        assert_eq!(args.filename, "file.json");

        let args: ScheduleArgs = parse_args(ToolKind::CreateSchedule, json!({"items": "A,B"})).unwrap();
        assert_eq!(args.time_format, "24h");
    }

    #[test]
    fn test_parse_args_reports_malformed_arguments() {
        let err = parse_args::<PlanArgs>(ToolKind::CreatePlan, json!({"chunk_size": "small"}))
            .unwrap_err();
        match err {
            ToolError::InvalidArguments { tool, reason } => {
                assert_eq!(tool, "create_plan");
                assert!(reason.contains("task_description"));
            }
            other => panic!("expected InvalidArguments, got {other:?}"),
        }
        assert!(parse_args::<PlanArgs>(ToolKind::CreatePlan, json!("not an object")).is_err());
    }
}
