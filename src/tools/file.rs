//! read_file / save_file：在数据目录内读写 Document Log 快照
//!
//! read_file 把存储中的历史合并进当前 Document Log；save_file 始终写出完整日志，从不过滤。

use async_trait::async_trait;
use serde_json::Value;

use crate::core::ToolError;
use crate::memory::normalize_key;
use crate::tools::schema::{parameters_schema, parse_args, FileArgs};
use crate::tools::{Tool, ToolContext, ToolEffects, ToolKind};

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn kind(&self) -> ToolKind {
        ToolKind::ReadFile
    }

    fn description(&self) -> &str {
        "Read past conversation history from a JSON file (default: file.json) \
         and merge it into the current document."
    }

    fn parameters_schema(&self) -> Value {
        parameters_schema::<FileArgs>()
    }

    fn effects(&self) -> ToolEffects {
        ToolEffects {
            mutates_document: true,
            touches_storage: true,
        }
    }

    async fn execute(&self, args: Value, ctx: &mut ToolContext<'_>) -> Result<String, ToolError> {
        let args: FileArgs = parse_args(self.kind(), args)?;
        let key = normalize_key(&args.filename);
        tracing::info!(file = %key, "read_file tool execute");

        let loaded = ctx.store.read(&key)?;
        let total = loaded.len();
        let appended = ctx.document.merge(loaded);
        tracing::debug!(file = %key, total, appended, "history merged");
        Ok(format!(
            "Successfully read and loaded {} messages from {} into document_content.",
            total, key
        ))
    }
}

pub struct SaveFileTool;

#[async_trait]
impl Tool for SaveFileTool {
    fn kind(&self) -> ToolKind {
        ToolKind::SaveFile
    }

    fn description(&self) -> &str {
        "Save the full document (every message, no filtering) to a JSON file (default: file.json)."
    }

    fn parameters_schema(&self) -> Value {
        parameters_schema::<FileArgs>()
    }

    fn effects(&self) -> ToolEffects {
        ToolEffects {
            mutates_document: false,
            touches_storage: true,
        }
    }

    async fn execute(&self, args: Value, ctx: &mut ToolContext<'_>) -> Result<String, ToolError> {
        let args: FileArgs = parse_args(self.kind(), args)?;
        let key = normalize_key(&args.filename);
        tracing::info!(file = %key, "save_file tool execute");

        ctx.document.save(ctx.store, &key)?;
        Ok(format!("Saved {} messages to {}", ctx.document.len(), key))
    }
}
