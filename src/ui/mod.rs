//! 控制台层：行式输入（InputProvider）与事件渲染

pub mod console;

pub use console::{render_event, ConsoleInput, InputProvider, ScriptedInput};
