use super::traits::ReasoningService;
use crate::config::ReasoningConfig;
use crate::core::session::BoxFuture;
use std::time::Duration;

/// Check if an error is non-retryable (client errors that won't resolve with retries).
fn is_non_retryable(err: &anyhow::Error) -> bool {
    let msg = err.to_string();
    if is_quota_exhausted(&msg) || msg.contains("API key not set") {
        return true;
    }

    if let Some(reqwest_err) = err.downcast_ref::<reqwest::Error>()
        && let Some(status) = reqwest_err.status()
    {
        let code = status.as_u16();
        return status.is_client_error() && code != 429 && code != 408;
    }
    for word in msg.split(|c: char| !c.is_ascii_digit()) {
        if let Ok(code) = word.parse::<u16>()
            && (400..500).contains(&code)
        {
            return code != 429 && code != 408;
        }
    }
    false
}

fn is_quota_exhausted(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("insufficient_quota")
        || lower.contains("exceeded your current quota")
        || lower.contains("billing")
}

/// Reasoning wrapper that retries transient failures with exponential backoff.
pub struct ReliableReasoner {
    inner: Box<dyn ReasoningService>,
    max_retries: u32,
    base_backoff_ms: u64,
}

impl ReliableReasoner {
    pub fn new(inner: Box<dyn ReasoningService>, max_retries: u32, base_backoff_ms: u64) -> Self {
        Self {
            inner,
            max_retries,
            base_backoff_ms: base_backoff_ms.max(10),
        }
    }

    pub fn from_config(inner: Box<dyn ReasoningService>, config: &ReasoningConfig) -> Self {
        Self::new(inner, config.max_retries, config.base_backoff_ms)
    }
}

impl ReasoningService for ReliableReasoner {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn complete<'a>(
        &'a self,
        system_prompt: &'a str,
        prompt: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(async move {
            let mut backoff_ms = self.base_backoff_ms;
            let mut attempt = 0;

            loop {
                match self.inner.complete(system_prompt, prompt).await {
                    Ok(text) => {
                        if attempt > 0 {
                            tracing::info!(
                                service = self.inner.name(),
                                attempt,
                                "reasoning service recovered after retries"
                            );
                        }
                        return Ok(text);
                    }
                    Err(e) => {
                        if is_non_retryable(&e) || attempt >= self.max_retries {
                            return Err(e.context(format!(
                                "{} failed after {} attempt(s)",
                                self.inner.name(),
                                attempt + 1
                            )));
                        }

                        attempt += 1;
                        tracing::warn!(
                            service = self.inner.name(),
                            attempt,
                            max_retries = self.max_retries,
                            error = %e,
                            "reasoning call failed, retrying"
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                        backoff_ms = backoff_ms.saturating_mul(2).min(10_000);
                    }
                }
            }
        })
    }
}
