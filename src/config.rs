//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `AETHER__*` 覆盖（双下划线表示嵌套，如 `AETHER__LLM__MODEL=openai/gpt-4o`）。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::core::AgentError;
use crate::llm::{RetryConfig, OPENROUTER_BASE_URL};
use crate::memory::DEFAULT_DOCUMENT_FILE;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
}

/// [app] 段：数据目录、文档文件、Turn Buffer 窗口、单轮步数上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    /// 文档日志所在目录（存储 key 在此目录内解析）
    pub data_dir: PathBuf,
    /// 启动加载与退出保存使用的文件
    pub document_file: String,
    /// Turn Buffer 最大条数；不设则单调增长
    pub turn_window: Option<usize>,
    /// 单轮连续补全步数上限，0 表示不限
    pub max_steps_per_turn: usize,
    pub system_prompt_path: Option<PathBuf>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            document_file: DEFAULT_DOCUMENT_FILE.to_string(),
            turn_window: None,
            max_steps_per_turn: 20,
            system_prompt_path: None,
        }
    }
}

/// [llm] 段：OpenAI 兼容端点、模型、温度、Key 所在环境变量、额外请求头、超时与重试
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// openai（OpenAI 兼容端点）/ mock
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub temperature: f32,
    /// 读取 API Key 的环境变量名
    pub api_key_env: String,
    /// 附加请求头（OpenRouter 的 HTTP-Referer / X-Title）
    pub headers: Vec<HeaderEntry>,
    pub timeouts: LlmTimeoutsSection,
    pub retry: LlmRetrySection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "openai/gpt-4o-mini".to_string(),
            base_url: None,
            temperature: 0.7,
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            headers: Vec::new(),
            timeouts: LlmTimeoutsSection::default(),
            retry: LlmRetrySection::default(),
        }
    }
}

impl LlmSection {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(OPENROUTER_BASE_URL)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.retry.max_retries,
            initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
            request_timeout: (self.timeouts.request > 0)
                .then(|| Duration::from_secs(self.timeouts.request)),
        }
    }
}

/// 列表形式保存，避免配置层把键名转成小写
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    /// 单次请求超时（秒），0 表示不限
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 120 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmRetrySection {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for LlmRetrySection {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff_ms: 500,
            max_backoff_ms: 8000,
        }
    }
}

impl AppConfig {
    /// 检查取值范围
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.app.document_file.trim().is_empty() {
            return Err(AgentError::Config("app.document_file is empty".to_string()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(AgentError::Config("llm.model is empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(AgentError::Config(format!(
                "llm.temperature {} is outside 0.0..=2.0",
                self.llm.temperature
            )));
        }
        Ok(())
    }
}

/// 从 config 目录加载配置，环境变量 AETHER__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 AETHER__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        } else {
            tracing::warn!(path = %path.display(), "config file not found, ignoring");
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("AETHER")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.app.document_file, "file.json");
        assert_eq!(cfg.app.max_steps_per_turn, 20);
        assert!(cfg.app.turn_window.is_none());
        assert_eq!(cfg.llm.base_url(), OPENROUTER_BASE_URL);
        assert_eq!(cfg.llm.temperature, 0.7);

        let retry = cfg.llm.retry_config();
        assert_eq!(retry.max_retries, 0);
        assert_eq!(retry.request_timeout, Some(Duration::from_secs(120)));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[app]
document_file = "notes.json"
turn_window = 40

[llm]
model = "anthropic/claude-3.5-haiku"
temperature = 0.2

[[llm.headers]]
name = "X-Title"
value = "Project Aether"

[llm.timeouts]
request = 0
"#
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.app.document_file, "notes.json");
        assert_eq!(cfg.app.turn_window, Some(40));
        assert_eq!(cfg.llm.model, "anthropic/claude-3.5-haiku");
        assert!(cfg.llm.headers.contains(&HeaderEntry {
            name: "X-Title".to_string(),
            value: "Project Aether".to_string(),
        }));
        assert!(cfg.llm.retry_config().request_timeout.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut cfg = AppConfig::default();
        cfg.llm.temperature = 3.5;
        assert!(matches!(cfg.validate(), Err(AgentError::Config(_))));
    }
}
