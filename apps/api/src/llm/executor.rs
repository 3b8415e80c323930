//! Ordered-fallback execution over the configured providers.

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::errors::AppError;
use crate::llm::{ChatMessage, CompletionProvider};
use crate::usage::{estimate_tokens, UsageEvent, UsageSink};

/// A successful completion, tagged with the provider that produced it.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub text: String,
    pub provider: String,
    pub model: String,
}

/// Walks an ordered provider list and returns the first non-empty response.
///
/// One pass, no per-provider retry, no backoff. A provider "misses" when it
/// errors or returns whitespace-only text; each attempt is recorded through
/// the usage sink either way.
pub struct FallbackExecutor {
    providers: Vec<Arc<dyn CompletionProvider>>,
    usage: Arc<dyn UsageSink>,
}

impl FallbackExecutor {
    pub fn new(providers: Vec<Arc<dyn CompletionProvider>>, usage: Arc<dyn UsageSink>) -> Self {
        Self { providers, usage }
    }

    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn execute(
        &self,
        messages: &[ChatMessage],
        context: &str,
        user_id: Option<Uuid>,
    ) -> Result<CompletionOutcome, AppError> {
        if self.providers.is_empty() {
            return Err(AppError::Config(
                "no AI provider configured; set ANTHROPIC_API_KEY or OPENAI_API_KEY".to_string(),
            ));
        }

        let prompt_tokens: i64 = messages.iter().map(|m| estimate_tokens(&m.content)).sum();

        let mut last_provider = "";
        let mut last_error = String::new();

        for provider in &self.providers {
            let started = Instant::now();
            let attempt = provider.complete(messages).await;
            let elapsed_ms = started.elapsed().as_millis() as i64;

            match attempt {
                Ok(text) if !text.trim().is_empty() => {
                    self.usage
                        .record(UsageEvent {
                            user_id,
                            provider: provider.name().to_string(),
                            model: provider.model().to_string(),
                            tokens_used: prompt_tokens + estimate_tokens(&text),
                            context: context.to_string(),
                            success: true,
                            error_message: None,
                            response_time_ms: Some(elapsed_ms),
                        })
                        .await;
                    tracing::info!(
                        provider = provider.name(),
                        context,
                        elapsed_ms,
                        "completion succeeded"
                    );
                    return Ok(CompletionOutcome {
                        text,
                        provider: provider.name().to_string(),
                        model: provider.model().to_string(),
                    });
                }
                Ok(_) => {
                    last_provider = provider.name();
                    last_error = "returned an empty response".to_string();
                }
                Err(e) => {
                    last_provider = provider.name();
                    last_error = e.to_string();
                }
            }

            tracing::warn!(
                provider = provider.name(),
                context,
                error = %last_error,
                "provider attempt failed, trying next"
            );
            self.usage
                .record(UsageEvent {
                    user_id,
                    provider: provider.name().to_string(),
                    model: provider.model().to_string(),
                    tokens_used: prompt_tokens,
                    context: context.to_string(),
                    success: false,
                    error_message: Some(last_error.clone()),
                    response_time_ms: Some(elapsed_ms),
                })
                .await;
        }

        Err(AppError::AiProvider(format!(
            "all AI providers failed; last error from {last_provider}: {last_error}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    enum StubOutcome {
        Reply(&'static str),
        Empty,
        Fail(&'static str),
    }

    struct StubProvider {
        id: &'static str,
        outcome: StubOutcome,
    }

    #[async_trait]
    impl CompletionProvider for StubProvider {
        fn name(&self) -> &'static str {
            self.id
        }

        fn model(&self) -> &str {
            "stub-model"
        }

        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, AppError> {
            match &self.outcome {
                StubOutcome::Reply(text) => Ok(text.to_string()),
                StubOutcome::Empty => Ok("   \n".to_string()),
                StubOutcome::Fail(reason) => Err(AppError::AiProvider(reason.to_string())),
            }
        }
    }

    #[derive(Default)]
    struct CaptureSink {
        events: Mutex<Vec<UsageEvent>>,
    }

    #[async_trait]
    impl UsageSink for CaptureSink {
        async fn record(&self, event: UsageEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn executor(
        outcomes: Vec<(&'static str, StubOutcome)>,
    ) -> (FallbackExecutor, Arc<CaptureSink>) {
        let sink = Arc::new(CaptureSink::default());
        let providers: Vec<Arc<dyn CompletionProvider>> = outcomes
            .into_iter()
            .map(|(id, outcome)| {
                Arc::new(StubProvider { id, outcome }) as Arc<dyn CompletionProvider>
            })
            .collect();
        (FallbackExecutor::new(providers, sink.clone()), sink)
    }

    #[tokio::test]
    async fn test_first_provider_wins() {
        let (exec, sink) = executor(vec![
            ("primary", StubOutcome::Reply("from primary")),
            ("backup", StubOutcome::Reply("from backup")),
        ]);
        let outcome = exec
            .execute(&[ChatMessage::user("q")], "chat", None)
            .await
            .unwrap();
        assert_eq!(outcome.provider, "primary");
        assert_eq!(outcome.text, "from primary");

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].success);
        assert_eq!(events[0].provider, "primary");
    }

    #[tokio::test]
    async fn test_falls_back_past_failing_provider() {
        let (exec, sink) = executor(vec![
            ("primary", StubOutcome::Fail("boom")),
            ("backup", StubOutcome::Reply("rescued")),
        ]);
        let outcome = exec
            .execute(&[ChatMessage::user("q")], "chat", None)
            .await
            .unwrap();
        assert_eq!(outcome.provider, "backup");
        assert_eq!(outcome.text, "rescued");

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(!events[0].success);
        assert_eq!(events[0].error_message.as_deref(), Some("boom"));
        assert!(events[1].success);
    }

    #[tokio::test]
    async fn test_empty_response_counts_as_miss() {
        let (exec, _sink) = executor(vec![
            ("primary", StubOutcome::Empty),
            ("backup", StubOutcome::Reply("real text")),
        ]);
        let outcome = exec
            .execute(&[ChatMessage::user("q")], "chat", None)
            .await
            .unwrap();
        assert_eq!(outcome.provider, "backup");
    }

    #[tokio::test]
    async fn test_all_failing_reports_last_provider() {
        let (exec, sink) = executor(vec![
            ("primary", StubOutcome::Fail("first down")),
            ("backup", StubOutcome::Fail("second down")),
        ]);
        let err = exec
            .execute(&[ChatMessage::user("q")], "job_match", None)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("backup"), "got: {message}");
        assert!(message.contains("second down"), "got: {message}");

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| !e.success));
    }

    #[tokio::test]
    async fn test_no_providers_is_config_error() {
        let (exec, sink) = executor(vec![]);
        let err = exec
            .execute(&[ChatMessage::user("q")], "chat", None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONFIG_MISSING");
        assert!(sink.events.lock().unwrap().is_empty());
    }
}
