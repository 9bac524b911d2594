//! 带超时与指数退避的 LLM 包装
//!
//! 每次尝试受 request_timeout 限制；可重试错误（网络、超时、429、5xx）按 initial_backoff * 2^n
//! 退避，封顶 max_backoff。max_retries = 0 时只尝试一次，失败直接上抛。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm::{Completion, CompletionRequest, LlmClient, LlmError};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 重试次数（不含首次）
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// None 表示不限时
    pub request_timeout: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            request_timeout: Some(Duration::from_secs(120)),
        }
    }
}

impl RetryConfig {
    fn backoff(&self, retries_used: u32) -> Duration {
        let base_ms = self.initial_backoff.as_millis();
        if base_ms == 0 {
            return Duration::ZERO;
        }
        let max_ms = self.max_backoff.as_millis().max(base_ms);
        let multiplier = 1u128 << retries_used.min(20);
        let millis = base_ms.saturating_mul(multiplier).min(max_ms);
        Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
    }
}

pub struct RetryingLlmClient {
    inner: Arc<dyn LlmClient>,
    config: RetryConfig,
}

impl RetryingLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    async fn attempt(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, self.inner.complete(request))
                .await
                .map_err(|_| LlmError::Timeout(limit.as_secs()))?,
            None => self.inner.complete(request).await,
        }
    }
}

#[async_trait]
impl LlmClient for RetryingLlmClient {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let mut retries_used = 0u32;
        loop {
            match self.attempt(request).await {
                Ok(completion) => return Ok(completion),
                Err(e) if e.is_retryable() && retries_used < self.config.max_retries => {
                    let delay = self.config.backoff(retries_used);
                    retries_used += 1;
                    tracing::warn!(
                        model = %self.inner.model_name(),
                        error = %e,
                        retry_attempt = retries_used,
                        retry_in_ms = delay.as_millis() as u64,
                        "retrying completion after retryable error"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
