//! 行式控制台：读取用户输入，渲染编排事件
//!
//! 事件经 mpsc 通道异步到达；每次提示输入前先把队列里的事件全部打印，
//! 保证 "🤖 AI: ..." 出现在下一个 "👤 USER:" 之前。

use std::collections::VecDeque;
use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::core::AgentEvent;
use crate::tools::ToolKind;

/// 用户输入来源；None 表示输入结束（EOF）
#[async_trait]
pub trait InputProvider: Send {
    async fn read_line(&mut self) -> Option<String>;
}

pub struct ConsoleInput {
    lines: Lines<BufReader<Stdin>>,
    events: Option<UnboundedReceiver<AgentEvent>>,
}

impl ConsoleInput {
    pub fn new(events: Option<UnboundedReceiver<AgentEvent>>) -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            events,
        }
    }

    /// 打印所有已到达的事件
    pub fn flush_events(&mut self) {
        let Some(rx) = self.events.as_mut() else {
            return;
        };
        while let Ok(ev) = rx.try_recv() {
            if let Some(text) = render_event(&ev) {
                println!("{}", text);
            }
        }
    }
}

#[async_trait]
impl InputProvider for ConsoleInput {
    async fn read_line(&mut self) -> Option<String> {
        self.flush_events();
        print!("\n👤 USER: ");
        let _ = std::io::stdout().flush();
        match self.lines.next_line().await {
            Ok(Some(line)) => Some(line.trim().to_string()),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed, treating as end of input");
                None
            }
        }
    }
}

/// 预置输入（测试与非交互运行）
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[async_trait]
impl InputProvider for ScriptedInput {
    async fn read_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}

/// 查询时间不提示
fn usage_notice(tool: &str) -> Option<String> {
    let label = match ToolKind::from_name(tool) {
        Some(ToolKind::ReadFile) => "reading file",
        Some(ToolKind::SaveFile) => "saving",
        Some(ToolKind::CreatePlan) => "creating plan",
        Some(ToolKind::CreateSchedule) => "creating schedule",
        Some(ToolKind::GetCurrentTime) => return None,
        None => tool,
    };
    Some(format!("agent is using {} tool", label))
}

/// 事件转为控制台文本；阶段变化等不需要显示的返回 None
pub fn render_event(ev: &AgentEvent) -> Option<String> {
    match ev {
        AgentEvent::AssistantReply { text } => Some(format!("\n🤖 AI: {}\n", text)),
        AgentEvent::ToolCall { tool, .. } => usage_notice(tool),
        AgentEvent::ToolResult { preview, .. } if preview.starts_with("Error:") => {
            Some(format!("⚠️  {}", preview))
        }
        AgentEvent::DocumentSaved { path, messages } => Some(format!(
            "\n💾 Document saved to {} ({} messages)",
            path, messages
        )),
        AgentEvent::PhaseChanged { .. }
        | AgentEvent::ToolResult { .. }
        | AgentEvent::Terminated => None,
    }
}
