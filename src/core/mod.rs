//! 核心编排层：错误、阶段、事件、退出检测、主控循环

pub mod error;
pub mod events;
pub mod orchestrator;
pub mod state;
pub mod termination;

pub use error::{AgentError, StorageError, ToolError};
pub use events::AgentEvent;
pub use orchestrator::{create_orchestrator, Orchestrator, RunSummary, DEFAULT_SYSTEM_PROMPT};
pub use state::AgentPhase;
pub use termination::{is_exit_request, should_terminate, EXIT_KEYWORDS};
