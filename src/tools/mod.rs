//! 工具箱：注册表、执行器、参数 schema 与五个内置工具

pub mod clock;
pub mod executor;
pub mod file;
pub mod plan;
pub mod registry;
pub mod schedule;
pub mod schema;

pub use clock::{Clock, FixedClock, GetCurrentTimeTool, SystemClock};
pub use executor::ToolExecutor;
pub use file::{ReadFileTool, SaveFileTool};
pub use plan::CreatePlanTool;
pub use registry::{Tool, ToolContext, ToolDescriptor, ToolEffects, ToolKind, ToolRegistry};
pub use schedule::CreateScheduleTool;

/// 注册全部内置工具
pub fn default_registry() -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    tools.register(ReadFileTool);
    tools.register(SaveFileTool);
    tools.register(CreatePlanTool);
    tools.register(CreateScheduleTool);
    tools.register(GetCurrentTimeTool);
    tools
}
