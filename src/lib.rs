//! Aether - 带持久化文档日志的工具型对话助手
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、阶段状态机、退出检测、编排器
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / 重试 / Mock）
//! - **memory**: 消息模型、Document Log、Turn Buffer 与 JSON 持久化
//! - **tools**: 工具注册表、执行器与内置工具（文件、计划、日程、时间）
//! - **ui**: 行式控制台

pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod tools;
pub mod ui;
