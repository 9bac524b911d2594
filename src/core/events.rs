//! 编排过程事件：供控制台渲染（也可序列化为 JSON）

use serde::Serialize;

use crate::core::AgentPhase;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    PhaseChanged { phase: AgentPhase },
    /// 最终回复
    AssistantReply { text: String },
    /// 调用工具
    ToolCall {
        tool: String,
        call_id: String,
        args: serde_json::Value,
    },
    /// 工具返回（预览）
    ToolResult {
        tool: String,
        call_id: String,
        preview: String,
    },
    DocumentSaved { path: String, messages: usize },
    Terminated,
}

pub(crate) fn send_event(
    tx: &Option<tokio::sync::mpsc::UnboundedSender<AgentEvent>>,
    ev: AgentEvent,
) {
    if let Some(t) = tx {
        let _ = t.send(ev);
    }
}
