//! 时钟抽象与 get_current_time 工具
//!
//! 计划 / 日程文本里的时间戳都取自注入的 Clock，测试用 FixedClock 固定时间。

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use serde_json::Value;

use crate::core::ToolError;
use crate::tools::schema::{parameters_schema, parse_args, NoArgs};
use crate::tools::{Tool, ToolContext, ToolKind};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 墙钟时间来源（本地时区）
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// 固定时间，测试用
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub struct GetCurrentTimeTool;

#[async_trait]
impl Tool for GetCurrentTimeTool {
    fn kind(&self) -> ToolKind {
        ToolKind::GetCurrentTime
    }

    fn description(&self) -> &str {
        "Get the current date and time in a formatted string."
    }

    fn parameters_schema(&self) -> Value {
        parameters_schema::<NoArgs>()
    }

    async fn execute(&self, args: Value, ctx: &mut ToolContext<'_>) -> Result<String, ToolError> {
        let _: NoArgs = parse_args(self.kind(), args)?;
        Ok(format!(
            "Current Date and Time: {}",
            ctx.clock.now().format(TIMESTAMP_FORMAT)
        ))
    }
}
