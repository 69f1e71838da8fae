//! AI module for optional text-generation guidance.
//!
//! # Feature Flag
//!
//! The [`AIProvider`] trait is always available so callers can supply their
//! own backend. The bundled Gemini implementation requires the `ai` feature.
//!
//! ```toml
//! # Enable AI support (default)
//! lex_insight = { version = "0.1", features = ["ai"] }
//!
//! # Disable AI support for smaller binary
//! lex_insight = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use lex_insight::ai::GeminiProvider;
//! use lex_insight::Pipeline;
//! use std::sync::Arc;
//!
//! let provider = Arc::new(GeminiProvider::new("your-api-key")?);
//!
//! let output = Pipeline::builder()
//!     .ai_provider(provider)
//!     .build()?
//!     .process(&bytes, "csv", Some("show revenue by region"))?;
//! ```

// Provider trait is always available (for custom implementations)
mod provider;
pub use provider::AIProvider;

// Concrete providers require the "ai" feature
#[cfg(feature = "ai")]
mod gemini;

#[cfg(feature = "ai")]
pub use gemini::{GeminiConfig, GeminiConfigBuilder, GeminiProvider};

use crate::error::{InsightError, Result};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Call `provider` on a worker thread and wait at most `timeout` for the reply.
///
/// A call that times out keeps running on its detached thread until the
/// provider itself gives up; its answer is discarded. Providers should bound
/// their own requests (see `GeminiConfig::for_pipeline`) so the thread ends.
/// Every failure comes back as [`InsightError::AiServiceFailure`].
pub fn generate_with_timeout(
    provider: &Arc<dyn AIProvider>,
    prompt: String,
    timeout: Duration,
) -> Result<String> {
    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(provider);

    thread::Builder::new()
        .name("lex-insight-ai".to_string())
        .spawn(move || {
            // receiver is gone once the caller timed out
            let _ = tx.send(worker.generate(&prompt));
        })
        .map_err(|e| InsightError::Internal(format!("Failed to spawn AI worker: {}", e)))?;

    debug!(
        "Waiting up to {}s for {} ({})",
        timeout.as_secs(),
        provider.name(),
        provider.model().unwrap_or("default model")
    );

    match rx.recv_timeout(timeout) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(InsightError::AiServiceFailure(format!(
            "{} request failed: {}",
            provider.name(),
            e
        ))),
        Err(RecvTimeoutError::Timeout) => Err(InsightError::AiServiceFailure(format!(
            "{} did not answer within {}s",
            provider.name(),
            timeout.as_secs()
        ))),
        Err(RecvTimeoutError::Disconnected) => Err(InsightError::AiServiceFailure(format!(
            "{} worker exited without an answer",
            provider.name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slow;

    impl AIProvider for Slow {
        fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            thread::sleep(Duration::from_millis(500));
            Ok("late".to_string())
        }

        fn name(&self) -> &str {
            "Slow"
        }
    }

    struct Failing;

    impl AIProvider for Failing {
        fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("quota exceeded"))
        }

        fn name(&self) -> &str {
            "Failing"
        }
    }

    struct Echo;

    impl AIProvider for Echo {
        fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            Ok(prompt.to_uppercase())
        }

        fn name(&self) -> &str {
            "Echo"
        }
    }

    #[test]
    fn test_reply_is_returned() {
        let provider: Arc<dyn AIProvider> = Arc::new(Echo);
        let reply = generate_with_timeout(&provider, "hi".to_string(), Duration::from_secs(5));
        assert_eq!(reply.unwrap(), "HI");
    }

    #[test]
    fn test_timeout_is_a_service_failure() {
        let provider: Arc<dyn AIProvider> = Arc::new(Slow);
        let err = generate_with_timeout(&provider, "hi".to_string(), Duration::from_millis(20))
            .unwrap_err();
        assert_eq!(err.error_code(), "AI_SERVICE_FAILURE");
        assert!(err.to_string().contains("did not answer"));
    }

    #[test]
    fn test_provider_error_is_a_service_failure() {
        let provider: Arc<dyn AIProvider> = Arc::new(Failing);
        let err = generate_with_timeout(&provider, "hi".to_string(), Duration::from_secs(5))
            .unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("quota exceeded"));
    }
}
