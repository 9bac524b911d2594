//! create_plan：把任务拆成固定数量的占位块，作为 assistant 消息写入 Document Log

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::Value;

use crate::core::ToolError;
use crate::memory::Message;
use crate::tools::clock::TIMESTAMP_FORMAT;
use crate::tools::schema::{parameters_schema, parse_args, PlanArgs};
use crate::tools::{Tool, ToolContext, ToolEffects, ToolKind};

/// small=3 / medium=5 / large=7，其它值（含大小写不同的未知值）回落到 5
pub fn chunk_count(chunk_size: &str) -> usize {
    match chunk_size.to_lowercase().as_str() {
        "small" => 3,
        "medium" => 5,
        "large" => 7,
        _ => 5,
    }
}

pub fn render_plan(task_description: &str, chunks: usize, created: NaiveDateTime) -> String {
    let mut plan = format!("\nPLAN: {}\n\nTASK BREAKDOWN:\n", task_description);
    for i in 1..=chunks {
        plan.push_str(&format!(
            "\nChunk {}: [Task to be defined based on requirements]",
            i
        ));
    }
    plan.push_str(&format!("\n\nTotal Chunks: {}", chunks));
    plan.push_str(&format!("\nCreated: {}", created.format(TIMESTAMP_FORMAT)));
    plan
}

pub struct CreatePlanTool;

#[async_trait]
impl Tool for CreatePlanTool {
    fn kind(&self) -> ToolKind {
        ToolKind::CreatePlan
    }

    fn description(&self) -> &str {
        "Create a detailed plan and break down tasks into manageable chunks. \
         The generated plan is added to the document."
    }

    fn parameters_schema(&self) -> Value {
        parameters_schema::<PlanArgs>()
    }

    fn effects(&self) -> ToolEffects {
        ToolEffects {
            mutates_document: true,
            touches_storage: false,
        }
    }

    async fn execute(&self, args: Value, ctx: &mut ToolContext<'_>) -> Result<String, ToolError> {
        let args: PlanArgs = parse_args(self.kind(), args)?;
        let chunks = chunk_count(&args.chunk_size);
        tracing::info!(chunks, chunk_size = %args.chunk_size, "create_plan tool execute");

        let plan = render_plan(&args.task_description, chunks, ctx.clock.now());
        ctx.document.append(Message::assistant(plan));
        Ok(format!(
            "Plan created successfully with {} task chunks and added to document_content.",
            chunks
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{DocumentLog, DocumentStore, Role};
    use crate::tools::FixedClock;
    use chrono::NaiveDate;
    use serde_json::json;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_chunk_count_mapping() {
        assert_eq!(chunk_count("small"), 3);
        assert_eq!(chunk_count("medium"), 5);
        assert_eq!(chunk_count("large"), 7);
        assert_eq!(chunk_count("LARGE"), 7);
        assert_eq!(chunk_count("anything-else"), 5);
        assert_eq!(chunk_count(""), 5);
    }

    #[test]
    fn test_render_plan_layout() {
        let plan = render_plan("launch", 3, noon());
        assert_eq!(
            plan,
            "\nPLAN: launch\n\nTASK BREAKDOWN:\n\
             \nChunk 1: [Task to be defined based on requirements]\
             \nChunk 2: [Task to be defined based on requirements]\
             \nChunk 3: [Task to be defined based on requirements]\
             \n\nTotal Chunks: 3\
             \nCreated: 2026-10-19 12:00:00"
        );
    }

    #[tokio::test]
    async fn test_execute_appends_assistant_plan() {
        let clock = FixedClock(noon());
        let mut document = DocumentLog::new();
        let store = DocumentStore::new("unused");
        let mut ctx = ToolContext {
            document: &mut document,
            store: &store,
            clock: &clock,
        };

        let out = CreatePlanTool
            .execute(json!({"task_description": "move house", "chunk_size": "small"}), &mut ctx)
            .await
            .unwrap();
        assert_eq!(
            out,
            "Plan created successfully with 3 task chunks and added to document_content."
        );
        assert_eq!(document.len(), 1);
        let msg = &document.messages()[0];
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.content.contains("PLAN: move house"));
        assert_eq!(msg.content.matches("Chunk ").count(), 3);
    }
}
