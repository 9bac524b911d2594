//! Turn Buffer：发给模型的消息序列
//!
//! 维护未回答的 tool 调用 id；tool 结果必须关联其中一个，否则拒绝追加。
//! 默认单调增长；配置 window 后在 user 消息边界处剪枝，不会把调用与结果拆开。

use crate::core::AgentError;
use crate::memory::{Message, Role};

#[derive(Debug, Clone, Default)]
pub struct TurnBuffer {
    messages: Vec<Message>,
    /// 已请求、尚未回答的调用 id（按请求顺序）
    pending: Vec<String>,
    window: Option<usize>,
}

impl TurnBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 滑动窗口上限（条数）
    pub fn with_window(mut self, max_messages: usize) -> Self {
        self.window = Some(max_messages.max(1));
        self
    }

    /// 追加消息；tool 结果关联失败时返回错误且不做任何修改
    pub fn push(&mut self, msg: Message) -> Result<(), AgentError> {
        match msg.role {
            Role::Tool => {
                let id = msg
                    .tool_call_id
                    .as_deref()
                    .ok_or(AgentError::MissingToolCallId)?;
                let pos = self
                    .pending
                    .iter()
                    .position(|p| p == id)
                    .ok_or_else(|| AgentError::UncorrelatedToolResult(id.to_string()))?;
                self.pending.remove(pos);
            }
            Role::Assistant => {
                self.pending
                    .extend(msg.tool_calls.iter().map(|c| c.id.clone()));
            }
            Role::User | Role::System => {}
        }
        self.messages.push(msg);
        self.prune();
        Ok(())
    }

    pub fn last_is_tool_result(&self) -> bool {
        self.messages.last().is_some_and(Message::is_tool_result)
    }

    /// 最近一条 user 消息的文本
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    pub fn pending_calls(&self) -> &[String] {
        &self.pending
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

    fn prune(&mut self) {
        let Some(max) = self.window else {
            return;
        };
        if !self.pending.is_empty() {
            return;
        }
        while self.messages.len() > max {
            let cut = self
                .messages
                .iter()
                .skip(1)
                .position(|m| m.role == Role::User)
                .map(|i| i + 1);
            match cut {
                Some(i) => {
                    self.messages.drain(..i);
                }
                None => break,
            }
        }
    }
}
