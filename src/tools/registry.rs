//! 工具注册表
//!
//! 工具集合是闭集 ToolKind；模型给出的名字先解析为 ToolKind 再查找实现，
//! 未知名字是运行时错误（UnknownTool），不会被静默忽略。
//! 工具通过 ToolContext 借用编排器持有的 Document Log，没有全局可变状态。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::core::ToolError;
use crate::memory::{DocumentLog, DocumentStore};
use crate::tools::Clock;

/// 可用工具标识
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolKind {
    ReadFile,
    SaveFile,
    CreatePlan,
    CreateSchedule,
    GetCurrentTime,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::ReadFile,
        ToolKind::SaveFile,
        ToolKind::CreatePlan,
        ToolKind::CreateSchedule,
        ToolKind::GetCurrentTime,
    ];

    /// 模型侧看到的名字
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::ReadFile => "read_file",
            ToolKind::SaveFile => "save_file",
            ToolKind::CreatePlan => "create_plan",
            ToolKind::CreateSchedule => "create_schedule",
            ToolKind::GetCurrentTime => "get_current_time",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 工具声明的副作用
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ToolEffects {
    /// 会向 Document Log 追加消息
    pub mutates_document: bool,
    /// 会读写持久化存储
    pub touches_storage: bool,
}

/// 发给模型的工具描述
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// 单次执行借用的编排器状态
pub struct ToolContext<'a> {
    pub document: &'a mut DocumentLog,
    pub store: &'a DocumentStore,
    pub clock: &'a dyn Clock,
}

/// 工具 trait：类型、描述、参数 schema、副作用声明、异步执行（args 为 JSON）
#[async_trait]
pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;

    /// 工具描述（供 LLM 理解功能）
    fn description(&self) -> &str;

    /// 参数 JSON Schema，默认无参数
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    fn effects(&self) -> ToolEffects {
        ToolEffects::default()
    }

    async fn execute(&self, args: Value, ctx: &mut ToolContext<'_>) -> Result<String, ToolError>;
}

/// 按 ToolKind 存储实现，天然保证名字唯一
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<ToolKind, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册工具；同一 ToolKind 重复注册时后者覆盖前者
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let kind = tool.kind();
        if self.tools.insert(kind, Arc::new(tool)).is_some() {
            tracing::warn!(tool = %kind, "tool registered twice, keeping the latest");
        }
    }

    pub fn get(&self, kind: ToolKind) -> Option<Arc<dyn Tool>> {
        self.tools.get(&kind).cloned()
    }

    /// 名字 -> 实现；未知名字或未注册都返回 UnknownTool
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        ToolKind::from_name(name)
            .and_then(|kind| self.get(kind))
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    /// 已注册工具名，按 ToolKind::ALL 顺序
    pub fn tool_names(&self) -> Vec<&'static str> {
        ToolKind::ALL
            .into_iter()
            .filter(|k| self.tools.contains_key(k))
            .map(ToolKind::name)
            .collect()
    }

    /// 生成发给模型的工具描述列表（顺序稳定）
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        ToolKind::ALL
            .into_iter()
            .filter_map(|kind| self.tools.get(&kind))
            .map(|tool| ToolDescriptor {
                name: tool.kind().name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{default_registry, GetCurrentTimeTool};

    #[test]
    fn test_tool_kind_names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("search_information"), None);
    }

    #[test]
    fn test_default_registry_has_all_tools() {
        let registry = default_registry();
        assert_eq!(
            registry.tool_names(),
            vec!["read_file", "save_file", "create_plan", "create_schedule", "get_current_time"]
        );
        let descriptors = registry.descriptors();
        assert_eq!(descriptors.len(), 5);
        assert!(descriptors.iter().all(|d| d.parameters["type"] == "object"));
    }

    #[test]
    fn test_resolve_unknown_or_unregistered() {
        let mut registry = ToolRegistry::new();
        registry.register(GetCurrentTimeTool);
        assert!(registry.resolve("get_current_time").is_ok());
        assert!(matches!(
            registry.resolve("create_plan"),
            Err(ToolError::UnknownTool(name)) if name == "create_plan"
        ));
        assert!(matches!(registry.resolve("rm_rf"), Err(ToolError::UnknownTool(_))));
    }

    #[test]
    fn test_register_twice_keeps_single_entry() {
        let mut registry = ToolRegistry::new();
        registry.register(GetCurrentTimeTool);
        registry.register(GetCurrentTimeTool);
        assert_eq!(registry.len(), 1);
    }
}
