//! 退出意图检测
//!
//! 取 Turn Buffer 中最近一条 user 消息，小写后做子串匹配。
//! 子串语义是刻意保留的："I am not done yet" 与 "nonstop" 都会触发退出。

use crate::memory::TurnBuffer;

pub const EXIT_KEYWORDS: [&str; 8] = [
    "done", "exit", "quit", "stop", "end", "bye", "goodbye", "no more",
];

pub fn is_exit_request(text: &str) -> bool {
    let lowered = text.to_lowercase();
    EXIT_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// 没有 user 消息时不终止
pub fn should_terminate(turn: &TurnBuffer) -> bool {
    turn.last_user_text().is_some_and(is_exit_request)
}
