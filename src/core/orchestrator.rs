//! 编排器：对话主循环
//!
//! 持有 Document Log 与 Turn Buffer，按阶段推进：
//! 等待输入 → 调用模型 →（工具调用则逐个分发、结果写回后立即再调模型）→ 最终回复后判断是否退出。
//! 退出（含 EOF）前强制保存 Document Log；保存失败作为错误返回。

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::config::AppConfig;
use crate::core::events::send_event;
use crate::core::termination::should_terminate;
use crate::core::{AgentError, AgentEvent, AgentPhase};
use crate::llm::{CompletionRequest, LlmClient, MockLlmClient, OpenAiClient, RetryingLlmClient};
use crate::memory::{
    normalize_key, DocumentLog, DocumentStore, LoadStatus, Message, ToolCall, TurnBuffer,
    DEFAULT_DOCUMENT_FILE,
};
use crate::tools::{default_registry, Clock, SystemClock, ToolContext, ToolExecutor};
use crate::ui::InputProvider;

/// 事件中工具结果预览的最大字符数
const RESULT_PREVIEW_CHARS: usize = 200;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a versatile assistant. Use the available tools \
(read_file, save_file, create_plan, create_schedule, get_current_time) to complete the user's tasks.";

/// run 结束时的统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub completions: usize,
    pub tool_calls: usize,
    /// Document Log 最终条数
    pub messages: usize,
    pub saved_to: Option<PathBuf>,
}

pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    executor: ToolExecutor,
    store: DocumentStore,
    clock: Arc<dyn Clock>,
    document: DocumentLog,
    turn: TurnBuffer,
    phase: AgentPhase,
    /// 已请求、待分发的调用
    queued: Vec<ToolCall>,
    system_prompt: String,
    document_key: String,
    max_steps: usize,
    steps_this_turn: usize,
    summary: RunSummary,
    event_tx: Option<UnboundedSender<AgentEvent>>,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, executor: ToolExecutor, store: DocumentStore) -> Self {
        Self {
            llm,
            executor,
            store,
            clock: Arc::new(SystemClock),
            document: DocumentLog::new(),
            turn: TurnBuffer::new(),
            phase: AgentPhase::AwaitingInput,
            queued: Vec::new(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            document_key: DEFAULT_DOCUMENT_FILE.to_string(),
            max_steps: 20,
            steps_this_turn: 0,
            summary: RunSummary::default(),
            event_tx: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_document_key(mut self, key: &str) -> Self {
        self.document_key = normalize_key(key);
        self
    }

    pub fn with_document(mut self, document: DocumentLog) -> Self {
        self.document = document;
        self
    }

    pub fn with_turn_window(mut self, window: Option<usize>) -> Self {
        self.turn = match window {
            Some(n) => TurnBuffer::new().with_window(n),
            None => TurnBuffer::new(),
        };
        self
    }

    /// 单轮连续补全步数上限，0 表示不限
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_event_tx(mut self, tx: UnboundedSender<AgentEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// 从存储加载 Document Log（替换当前内容）；缺失或损坏不会失败
    pub fn load_document(&mut self) -> LoadStatus {
        let (document, status) = DocumentLog::load(&self.store, &self.document_key);
        self.document = document;
        status
    }

    pub fn document(&self) -> &DocumentLog {
        &self.document
    }

    pub fn turn(&self) -> &TurnBuffer {
        &self.turn
    }

    pub fn phase(&self) -> AgentPhase {
        self.phase
    }

    pub fn document_key(&self) -> &str {
        &self.document_key
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// 运行至 Terminal。出错时尽量先保存 Document Log 再返回错误。
    pub async fn run(&mut self, input: &mut dyn InputProvider) -> Result<RunSummary, AgentError> {
        loop {
            match self.step(input).await {
                Ok(phase) if phase.is_terminal() => break,
                Ok(_) => {}
                Err(e) => {
                    if !matches!(e, AgentError::Storage(_)) {
                        self.save_on_error();
                    }
                    return Err(e);
                }
            }
        }
        self.summary.messages = self.document.len();
        Ok(self.summary.clone())
    }

    /// 推进一个阶段，返回新阶段
    pub async fn step(&mut self, input: &mut dyn InputProvider) -> Result<AgentPhase, AgentError> {
        match self.phase {
            AgentPhase::AwaitingInput => self.await_input(input).await?,
            AgentPhase::Completing => self.complete().await?,
            AgentPhase::Dispatching => self.dispatch().await?,
            AgentPhase::Terminal => {}
        }
        Ok(self.phase)
    }

    async fn await_input(&mut self, input: &mut dyn InputProvider) -> Result<(), AgentError> {
        // 上一条是工具结果时直接进入补全
        if self.turn.last_is_tool_result() {
            self.set_phase(AgentPhase::Completing);
            return Ok(());
        }
        match input.read_line().await {
            Some(text) => {
                tracing::debug!(chars = text.chars().count(), "user input");
                self.record(Message::user(text))?;
                self.steps_this_turn = 0;
                self.set_phase(AgentPhase::Completing);
                Ok(())
            }
            None => {
                tracing::info!("end of input, finishing");
                self.finish()
            }
        }
    }

    fn request(&self) -> CompletionRequest {
        CompletionRequest {
            system: vec![
                self.system_prompt.clone(),
                format!("Current document content: {} messages.", self.document.len()),
            ],
            messages: self.turn.messages().to_vec(),
            tools: self.executor.descriptors(),
        }
    }

    async fn complete(&mut self) -> Result<(), AgentError> {
        if self.max_steps > 0 && self.steps_this_turn >= self.max_steps {
            tracing::warn!(max_steps = self.max_steps, "step limit reached without a final reply");
            let notice = format!(
                "Step limit reached ({} steps) without a final reply. Please rephrase or continue.",
                self.max_steps
            );
            // 助手消息收尾，下一次 await_input 会读新输入而不是继续补全
            self.record(Message::assistant(notice.clone()))?;
            send_event(&self.event_tx, AgentEvent::AssistantReply { text: notice });
            self.steps_this_turn = 0;
            self.set_phase(AgentPhase::AwaitingInput);
            return Ok(());
        }

        let request = self.request();
        let completion = self.llm.complete(&request).await?;
        self.steps_this_turn += 1;
        self.summary.completions += 1;

        let text = completion.text().to_string();
        let calls = completion.tool_calls().to_vec();
        self.record(completion.into_message())?;

        if !calls.is_empty() {
            tracing::info!(calls = calls.len(), "completion requested tools");
            if !text.is_empty() {
                send_event(&self.event_tx, AgentEvent::AssistantReply { text });
            }
            self.queued = calls;
            self.set_phase(AgentPhase::Dispatching);
            return Ok(());
        }

        send_event(&self.event_tx, AgentEvent::AssistantReply { text });
        if should_terminate(&self.turn) {
            tracing::info!("exit requested by user");
            self.finish()
        } else {
            self.set_phase(AgentPhase::AwaitingInput);
            Ok(())
        }
    }

    /// 逐个执行全部调用；每个调用恰好产生一条关联结果
    async fn dispatch(&mut self) -> Result<(), AgentError> {
        let calls = std::mem::take(&mut self.queued);
        for call in &calls {
            send_event(
                &self.event_tx,
                AgentEvent::ToolCall {
                    tool: call.name.clone(),
                    call_id: call.id.clone(),
                    args: call.arguments.clone(),
                },
            );

            let mut ctx = ToolContext {
                document: &mut self.document,
                store: &self.store,
                clock: self.clock.as_ref(),
            };
            let result = self.executor.dispatch(call, &mut ctx).await;

            send_event(
                &self.event_tx,
                AgentEvent::ToolResult {
                    tool: call.name.clone(),
                    call_id: call.id.clone(),
                    preview: preview(&result.content),
                },
            );
            self.record(result)?;
            self.summary.tool_calls += 1;
        }
        self.set_phase(AgentPhase::Completing);
        Ok(())
    }

    /// 先写 Turn Buffer（可能因关联失败被拒），成功后再写 Document Log
    fn record(&mut self, msg: Message) -> Result<(), AgentError> {
        self.turn.push(msg.clone())?;
        self.document.append(msg);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), AgentError> {
        let path = self.document.save(&self.store, &self.document_key)?;
        tracing::info!(
            path = %path.display(),
            messages = self.document.len(),
            "document log saved"
        );
        send_event(
            &self.event_tx,
            AgentEvent::DocumentSaved {
                path: self.document_key.clone(),
                messages: self.document.len(),
            },
        );
        self.summary.saved_to = Some(path);
        self.set_phase(AgentPhase::Terminal);
        send_event(&self.event_tx, AgentEvent::Terminated);
        Ok(())
    }

    fn save_on_error(&mut self) {
        match self.document.save(&self.store, &self.document_key) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "document log saved after error");
                self.summary.saved_to = Some(path);
            }
            Err(e) => tracing::error!(error = %e, "document log save after error failed"),
        }
    }

    fn set_phase(&mut self, next: AgentPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.phase,
            next
        );
        tracing::debug!(from = ?self.phase, to = ?next, "phase");
        self.phase = next;
        send_event(&self.event_tx, AgentEvent::PhaseChanged { phase: next });
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > RESULT_PREVIEW_CHARS {
        format!("{}...", text.chars().take(RESULT_PREVIEW_CHARS).collect::<String>())
    } else {
        text.to_string()
    }
}

/// 根据配置与环境变量选择 LLM 后端（OpenAI 兼容 / Mock）
pub(crate) fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let api_key = std::env::var(&cfg.llm.api_key_env)
        .ok()
        .filter(|k| !k.trim().is_empty());

    match (provider.as_str(), api_key) {
        ("mock", _) => {
            tracing::info!("Using Mock LLM");
            Arc::new(MockLlmClient)
        }
        (_, Some(key)) => {
            tracing::info!("Using OpenAI-compatible LLM ({} at {})", cfg.llm.model, cfg.llm.base_url());
            let client = cfg.llm.headers.iter().fold(
                OpenAiClient::new(Some(cfg.llm.base_url()), &cfg.llm.model, Some(key.as_str()))
                    .with_temperature(cfg.llm.temperature),
                |client, h| client.with_header(&h.name, &h.value),
            );
            Arc::new(RetryingLlmClient::new(Arc::new(client), cfg.llm.retry_config()))
        }
        (_, None) => {
            tracing::warn!("{} not set, using Mock LLM", cfg.llm.api_key_env);
            Arc::new(MockLlmClient)
        }
    }
}

fn load_system_prompt(cfg: &AppConfig) -> String {
    if let Some(path) = &cfg.app.system_prompt_path {
        match std::fs::read_to_string(path) {
            Ok(prompt) => return prompt,
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "system prompt unreadable"),
        }
    }
    ["config/prompts/system.txt", "../config/prompts/system.txt"]
        .into_iter()
        .find_map(|p| std::fs::read_to_string(p).ok())
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
}

/// 按配置组装编排器并加载 Document Log
pub fn create_orchestrator(cfg: &AppConfig) -> Result<(Orchestrator, LoadStatus), AgentError> {
    cfg.validate()?;

    let store = DocumentStore::new(&cfg.app.data_dir);
    let key = normalize_key(&cfg.app.document_file);
    store.resolve(&key)?;

    tracing::info!(
        data_dir = %store.root().display(),
        document = %key,
        "document store ready"
    );

    let mut orchestrator = Orchestrator::new(
        create_llm_from_config(cfg),
        ToolExecutor::new(default_registry()),
        store,
    )
    .with_system_prompt(load_system_prompt(cfg))
    .with_document_key(&key)
    .with_turn_window(cfg.app.turn_window)
    .with_max_steps(cfg.app.max_steps_per_turn);

    let status = orchestrator.load_document();
    Ok((orchestrator, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Completion, ScriptedLlmClient};
    use crate::memory::Role;
    use crate::ui::ScriptedInput;
    use serde_json::json;
    use tempfile::TempDir;

    fn orchestrator(dir: &TempDir, script: Vec<Completion>) -> (Orchestrator, Arc<ScriptedLlmClient>) {
        let llm = Arc::new(ScriptedLlmClient::new(script));
        let o = Orchestrator::new(
            llm.clone(),
            ToolExecutor::new(default_registry()),
            DocumentStore::new(dir.path()),
        );
        (o, llm)
    }

    #[tokio::test]
    async fn test_phases_follow_reply_path() {
        let dir = TempDir::new().unwrap();
        let (mut o, _) = orchestrator(&dir, vec![Completion::Reply("hello".into())]);
        let mut input = ScriptedInput::new(["hi"]);
        assert_eq!(o.model_name(), "scripted");

        assert_eq!(o.step(&mut input).await.unwrap(), AgentPhase::Completing);
        assert_eq!(o.step(&mut input).await.unwrap(), AgentPhase::AwaitingInput);
        assert_eq!(o.step(&mut input).await.unwrap(), AgentPhase::Terminal);
        assert_eq!(o.step(&mut input).await.unwrap(), AgentPhase::Terminal);
        assert_eq!(o.document().len(), 2);
    }

    #[tokio::test]
    async fn test_request_carries_document_summary_and_tools() {
        let dir = TempDir::new().unwrap();
        let (o, llm) = orchestrator(&dir, vec![Completion::Reply("ok".into())]);
        let mut o = o
            .with_system_prompt("rules")
            .with_document(DocumentLog::from_messages(vec![Message::user("old")]));
        let mut input = ScriptedInput::new(["new"]);
        o.step(&mut input).await.unwrap();
        o.step(&mut input).await.unwrap();

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].system,
            vec!["rules".to_string(), "Current document content: 2 messages.".to_string()]
        );
        // Turn Buffer 只含本次会话消息
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[0].tools.len(), 5);
    }

    #[tokio::test]
    async fn test_step_limit_hands_turn_back_to_user() {
        let dir = TempDir::new().unwrap();
        let mut script: Vec<Completion> = (0..3)
            .map(|i| Completion::ToolCalls {
                content: String::new(),
                calls: vec![ToolCall::new(format!("c{}", i), "get_current_time", json!({}))],
            })
            .collect();
        script.push(Completion::Reply("Here is a plan.".into()));
        let (o, llm) = orchestrator(&dir, script);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut o = o.with_max_steps(3).with_event_tx(tx);
        let mut input = ScriptedInput::new(["what time is it", "and a plan please"]);

        let summary = o.run(&mut input).await.unwrap();
        assert_eq!(input.remaining(), 0);
        assert_eq!(summary.completions, 4);
        assert_eq!(summary.tool_calls, 3);
        assert_eq!(o.phase(), AgentPhase::Terminal);

        let doc = o.document().messages();
        let notice = doc
            .iter()
            .position(|m| m.role == Role::Assistant && m.content.starts_with("Step limit reached (3 steps)"))
            .unwrap();
        assert_eq!(doc[notice + 1].role, Role::User);
        assert_eq!(doc[notice + 1].content, "and a plan please");
        assert_eq!(doc.last().unwrap().content, "Here is a plan.");

        // 第二轮请求以新的用户输入结尾
        let last = llm.requests().pop().unwrap();
        assert_eq!(last.messages.last().unwrap().content, "and a plan please");

        let mut replies = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if let AgentEvent::AssistantReply { text } = ev {
                replies.push(text);
            }
        }
        assert!(replies[0].starts_with("Step limit reached"));
    }

    #[tokio::test]
    async fn test_completion_error_propagates() {
        let dir = TempDir::new().unwrap();
        let (mut o, _) = orchestrator(&dir, Vec::new());
        let mut input = ScriptedInput::new(["hi"]);
        let err = o.run(&mut input).await.unwrap_err();
        assert!(matches!(err, AgentError::Completion(_)));
    }

    #[test]
    fn test_preview_truncates() {
        let long = "x".repeat(RESULT_PREVIEW_CHARS + 10);
        assert!(preview(&long).ends_with("..."));
        assert_eq!(preview("short"), "short");
    }
}
