//! 工具执行器
//!
//! 持有 ToolRegistry；dispatch(call) 解析名字并执行，总是返回一条与 call.id 关联的 tool 结果消息：
//! 未知工具、参数错误、存储错误都转为 "Error: ..." 文本，保证模型对每个调用都能收到结果。
//! 每次调用输出结构化审计日志（JSON）。

use std::time::Instant;

use serde_json::Value;

use crate::memory::{Message, ToolCall};
use crate::tools::{ToolContext, ToolDescriptor, ToolRegistry};

/// 审计日志中参数预览最大字符数
const ARGS_PREVIEW_CHARS: usize = 200;

pub struct ToolExecutor {
    registry: ToolRegistry,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.registry.descriptors()
    }

    /// 执行一个调用，返回对应的 tool 结果消息（永不失败）
    pub async fn dispatch(&self, call: &ToolCall, ctx: &mut ToolContext<'_>) -> Message {
        let start = Instant::now();
        let (effects, result) = match self.registry.resolve(&call.name) {
            Ok(tool) => (
                Some(tool.effects()),
                tool.execute(call.arguments.clone(), ctx).await,
            ),
            Err(e) => (None, Err(e)),
        };

        let (ok, outcome) = match &result {
            Ok(_) => (true, "ok".to_string()),
            Err(e) => (false, e.to_string()),
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": call.name,
            "call_id": call.id,
            "ok": ok,
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "effects": effects,
            "args_preview": args_preview(&call.arguments),
        });
        if ok {
            tracing::info!(audit = %audit, "tool");
        } else {
            tracing::warn!(audit = %audit, "tool");
        }

        let content = match result {
            Ok(text) => text,
            Err(e) => format!("Error: {}", e),
        };
        Message::tool_result(call.id.clone(), content)
    }
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.chars().count() > ARGS_PREVIEW_CHARS {
        format!("{}...", s.chars().take(ARGS_PREVIEW_CHARS).collect::<String>())
    } else {
        s
    }
}
