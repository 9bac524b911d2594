//! Aether - 带持久化文档日志的对话助手
//!
//! 入口：初始化日志、加载配置、创建编排器，并在控制台上运行对话循环。
//! 用法：`aether [config.toml]`

use std::path::PathBuf;

use aether::config::{load_config, AppConfig};
use aether::core::create_orchestrator;
use aether::memory::LoadStatus;
use aether::ui::ConsoleInput;
use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn banner(line: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{}", line);
    println!("{}", "=".repeat(60));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖；写到 stderr，避免和对话输出混在一起
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
    let (orchestrator, status) =
        create_orchestrator(&cfg).context("Failed to create orchestrator")?;
    let mut orchestrator = orchestrator.with_event_tx(event_tx);
    tracing::info!(model = %orchestrator.model_name(), "orchestrator ready");

    match status {
        LoadStatus::Restored(n) => println!(
            "📖 Loaded existing document from {} ({} messages)",
            orchestrator.document_key(),
            n
        ),
        LoadStatus::Missing => println!("📝 Starting with empty document list"),
        LoadStatus::Recovered(e) => println!(
            "Error loading or parsing {}: {}. Starting with empty document list.",
            orchestrator.document_key(),
            e
        ),
    }
    banner(&format!(
        "📖 Current document: {} messages loaded from {}",
        orchestrator.document().len(),
        orchestrator.document_key()
    ));

    let mut input = ConsoleInput::new(Some(event_rx));
    let result = orchestrator.run(&mut input).await;
    input.flush_events();
    let summary = result.context("Agent run failed")?;

    tracing::info!(
        completions = summary.completions,
        tool_calls = summary.tool_calls,
        messages = summary.messages,
        "run finished"
    );
    banner("✅ AGENT FINISHED");
    Ok(())
}
