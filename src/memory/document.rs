//! Document Log：跨会话的完整对话记录
//!
//! 启动时从存储加载（缺失或损坏都退化为空日志，损坏仅记 warn），运行中只追加，
//! 保存时全量写回。与 TurnBuffer 不同，这里永不剪枝。

use std::path::PathBuf;

use crate::core::StorageError;
use crate::memory::{DocumentStore, Message};

/// 启动加载结果
#[derive(Debug)]
pub enum LoadStatus {
    /// 文件不存在，从空日志开始
    Missing,
    /// 成功恢复 n 条消息
    Restored(usize),
    /// 文件损坏或不可读，已按空日志继续
    Recovered(StorageError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentLog {
    messages: Vec<Message>,
}

impl DocumentLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// 加载永不失败：错误通过 LoadStatus 报告
    pub fn load(store: &DocumentStore, key: &str) -> (Self, LoadStatus) {
        match store.read(key) {
            Ok(messages) => {
                let n = messages.len();
                tracing::info!(key = %key, messages = n, "document log restored");
                (Self::from_messages(messages), LoadStatus::Restored(n))
            }
            Err(StorageError::NotFound { .. }) => {
                tracing::info!(key = %key, "no document log yet, starting empty");
                (Self::new(), LoadStatus::Missing)
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "document log unreadable, starting empty");
                (Self::new(), LoadStatus::Recovered(e))
            }
        }
    }

    pub fn append(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    /// 合并读取到的历史：若已是当前日志的前缀则不重复追加，否则按序追加到末尾。
    /// 返回实际追加的条数。
    pub fn merge(&mut self, loaded: Vec<Message>) -> usize {
        if self.messages.starts_with(&loaded) {
            return 0;
        }
        let n = loaded.len();
        self.messages.extend(loaded);
        n
    }

    pub fn save(&self, store: &DocumentStore, key: &str) -> Result<PathBuf, StorageError> {
        store.write(key, &self.messages)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
