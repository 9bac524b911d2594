//! 错误类型
//!
//! StorageError：文档日志读写；ToolError：工具分发与执行（一律转为 tool 结果文本回给模型）；
//! AgentError：编排器向调用方传播的错误。

use std::path::PathBuf;

use thiserror::Error;

use crate::llm::LlmError;

/// 文档存储错误
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File {} not found", path.display())]
    NotFound { path: PathBuf },

    /// JSON 非法，或顶层不是消息数组
    #[error("Could not decode JSON from {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// 存储 key 含路径分隔符或 `..`
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 工具错误：不会中断编排循环，由 ToolExecutor 转为 "Error: ..." 结果
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// 编排器错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 不自动重试（重试由 RetryingLlmClient 按配置负责）
    #[error("Completion failed: {0}")]
    Completion(#[from] LlmError),

    #[error("Document log save failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Tool result {0} does not answer any pending tool call")]
    UncorrelatedToolResult(String),

    #[error("Tool result message has no tool_call_id")]
    MissingToolCallId,

    #[error("Configuration error: {0}")]
    Config(String),
}
