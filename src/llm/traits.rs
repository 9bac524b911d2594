//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock / 脚本化测试替身）实现 LlmClient：
//! 输入 system 指令 + 消息序列 + 工具描述，输出最终回复或一组工具调用。

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::memory::{Message, ToolCall};
use crate::tools::ToolDescriptor;

/// 一次补全请求
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// 依次作为 system 消息放在最前
    pub system: Vec<String>,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDescriptor>,
}

impl CompletionRequest {
    /// system + messages 拼成完整消息列表
    pub fn full_messages(&self) -> Vec<Message> {
        self.system
            .iter()
            .map(|s| Message::system(s.clone()))
            .chain(self.messages.iter().cloned())
            .collect()
    }
}

/// 补全结果
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// 最终文本回复
    Reply(String),
    /// 请求调用工具（content 可为空）
    ToolCalls { content: String, calls: Vec<ToolCall> },
}

impl Completion {
    pub fn text(&self) -> &str {
        match self {
            Completion::Reply(text) => text,
            Completion::ToolCalls { content, .. } => content,
        }
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Completion::Reply(_) => &[],
            Completion::ToolCalls { calls, .. } => calls,
        }
    }

    /// 转为写入 Turn Buffer / Document Log 的 assistant 消息
    pub fn into_message(self) -> Message {
        match self {
            Completion::Reply(text) => Message::assistant(text),
            Completion::ToolCalls { content, calls } => Message::assistant_tool_calls(content, calls),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),
}

impl LlmError {
    /// 网络错误、超时、429 与 5xx 可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(_) | LlmError::Timeout(_) => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::InvalidResponse(_) => false,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError>;

    /// 模型名（日志用）
    fn model_name(&self) -> &str {
        "unknown"
    }
}
