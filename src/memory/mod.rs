//! 记忆层：消息模型、Turn Buffer（模型上下文）、Document Log（完整历史）与持久化

pub mod conversation;
pub mod document;
pub mod persistence;
pub mod turn;

pub use conversation::{Message, Role, ToolCall};
pub use document::{DocumentLog, LoadStatus};
pub use persistence::{normalize_key, DocumentStore, DEFAULT_DOCUMENT_FILE};
pub use turn::TurnBuffer;
