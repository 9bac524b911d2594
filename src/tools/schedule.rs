//! create_schedule：从 09:00 起每项占一个整点时段，写入 Document Log
//!
//! 12h 格式沿用一个简化规则：hour <= 12 原样显示，> 12 显示 hour-12；hour < 12 为 AM，否则 PM。
//! 因此 0 点显示为 "0:00 AM"，12 点为 "12:00 PM"。这是既定输出格式，不做日历意义上的修正。

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::Value;

use crate::core::ToolError;
use crate::memory::Message;
use crate::tools::clock::{DATE_FORMAT, TIMESTAMP_FORMAT};
use crate::tools::schema::{parameters_schema, parse_args, ScheduleArgs};
use crate::tools::{Tool, ToolContext, ToolEffects, ToolKind};

pub const START_HOUR: usize = 9;
const PLACEHOLDER_ITEMS: usize = 5;
const SEPARATOR: char = ',';

/// 含逗号则按逗号切分并 trim（空项保留）；否则生成 Task 1..Task 5 占位
pub fn schedule_items(items: &str) -> Vec<String> {
    if items.contains(SEPARATOR) {
        items
            .split(SEPARATOR)
            .map(|item| item.trim().to_string())
            .collect()
    } else {
        (1..=PLACEHOLDER_ITEMS).map(|i| format!("Task {}", i)).collect()
    }
}

/// 第 index 项的整点（24 小时取模）
pub fn slot_hour(index: usize) -> u32 {
    ((START_HOUR + index) % 24) as u32
}

/// 只有 "12h" 走 12 小时制，其它一律 24 小时制
pub fn format_slot(hour: u32, time_format: &str) -> String {
    if time_format == "12h" {
        let shown = if hour <= 12 { hour } else { hour - 12 };
        let suffix = if hour < 12 { "AM" } else { "PM" };
        format!("{}:00 {}", shown, suffix)
    } else {
        format!("{:02}:00", hour)
    }
}

pub fn render_schedule(items: &[String], time_format: &str, now: NaiveDateTime) -> String {
    let mut schedule = format!(
        "\nSCHEDULE BOARD\nGenerated: {}\nTime Format: {}\n\n",
        now.format(DATE_FORMAT),
        time_format
    );
    for (i, item) in items.iter().enumerate() {
        schedule.push_str(&format!("{} - {}\n", format_slot(slot_hour(i), time_format), item));
    }
    schedule.push_str(&format!("\nTotal Items: {}", items.len()));
    schedule.push_str(&format!("\nLast Updated: {}", now.format(TIMESTAMP_FORMAT)));
    schedule
}

pub struct CreateScheduleTool;

#[async_trait]
impl Tool for CreateScheduleTool {
    fn kind(&self) -> ToolKind {
        ToolKind::CreateSchedule
    }

    fn description(&self) -> &str {
        "Create a schedule or task board with hourly time slots starting at 09:00. \
         The generated schedule is added to the document."
    }

    fn parameters_schema(&self) -> Value {
        parameters_schema::<ScheduleArgs>()
    }

    fn effects(&self) -> ToolEffects {
        ToolEffects {
            mutates_document: true,
            touches_storage: false,
        }
    }

    async fn execute(&self, args: Value, ctx: &mut ToolContext<'_>) -> Result<String, ToolError> {
        let args: ScheduleArgs = parse_args(self.kind(), args)?;
        let items = schedule_items(&args.items);
        tracing::info!(items = items.len(), time_format = %args.time_format, "create_schedule tool execute");

        let schedule = render_schedule(&items, &args.time_format, ctx.clock.now());
        ctx.document.append(Message::assistant(schedule));
        Ok("Schedule created successfully and added to document_content.".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{DocumentLog, DocumentStore};
    use crate::tools::FixedClock;
    use chrono::NaiveDate;
    use serde_json::json;

    fn morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_items_split_and_trimmed() {
        assert_eq!(schedule_items(" A, B ,C"), vec!["A", "B", "C"]);
        assert_eq!(schedule_items("A,,B"), vec!["A", "", "B"]);
    }

    #[test]
    fn test_items_without_separator_use_placeholders() {
        assert_eq!(
            schedule_items("my busy day"),
            vec!["Task 1", "Task 2", "Task 3", "Task 4", "Task 5"]
        );
    }

    #[test]
    fn test_slots_start_at_nine_and_wrap() {
        assert_eq!(slot_hour(0), 9);
        assert_eq!(slot_hour(14), 23);
        assert_eq!(slot_hour(15), 0);
        assert_eq!(format_slot(slot_hour(15), "24h"), "00:00");
    }

    #[test]
    fn test_twelve_hour_boundaries() {
        assert_eq!(format_slot(13, "12h"), "1:00 PM");
        assert_eq!(format_slot(12, "12h"), "12:00 PM");
        assert_eq!(format_slot(0, "12h"), "0:00 AM");
        assert_eq!(format_slot(9, "12h"), "9:00 AM");
        assert_eq!(format_slot(23, "12h"), "11:00 PM");
    }

    #[test]
    fn test_unknown_format_falls_back_to_24h() {
        assert_eq!(format_slot(9, "12H"), "09:00");
        assert_eq!(format_slot(17, "military"), "17:00");
    }

    #[test]
    fn test_render_three_items_24h() {
        let items = schedule_items("A,B,C");
        let text = render_schedule(&items, "24h", morning());
        assert_eq!(
            text,
            "\nSCHEDULE BOARD\nGenerated: 2026-10-19\nTime Format: 24h\n\n\
             09:00 - A\n10:00 - B\n11:00 - C\n\
             \nTotal Items: 3\nLast Updated: 2026-10-19 08:30:00"
        );
    }

    #[test]
    fn test_render_wraps_past_midnight() {
        let items: Vec<String> = (0..16).map(|i| format!("item{}", i)).collect();
        let text = render_schedule(&items, "24h", morning());
        assert!(text.contains("23:00 - item14\n00:00 - item15\n"));
    }

    #[tokio::test]
    async fn test_execute_appends_schedule() {
        let clock = FixedClock(morning());
        let mut document = DocumentLog::new();
        let store = DocumentStore::new("unused");
        let mut ctx = ToolContext {
            document: &mut document,
            store: &store,
            clock: &clock,
        };

        let out = CreateScheduleTool
            .execute(json!({"items": "gym, email", "time_format": "12h"}), &mut ctx)
            .await
            .unwrap();
        assert_eq!(out, "Schedule created successfully and added to document_content.");
        let content = &document.messages()[0].content;
        assert!(content.contains("9:00 AM - gym\n10:00 AM - email\n"));
        assert!(content.contains("Time Format: 12h"));
    }
}
