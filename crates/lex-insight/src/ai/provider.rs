//! AI provider trait for abstracting text-generation services.
//!
//! The chart engine and the insight summary only ever need one thing from a
//! language model: a prompt in, text out. Keeping the seam that narrow lets
//! tests substitute a canned provider and lets callers plug in any backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use lex_insight::ai::AIProvider;
//!
//! struct Canned;
//!
//! impl AIProvider for Canned {
//!     fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
//!         Ok(r#"{"charts": []}"#.to_string())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Canned"
//!     }
//! }
//! ```

use anyhow::Result;

/// Trait for text-generation providers.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: the chart engine runs each call on
/// a worker thread so it can enforce a timeout.
///
/// # Error Handling
///
/// Implementations return meaningful errors via `anyhow::Result`. Callers
/// treat every error as "no answer" and fall back to deterministic output.
pub trait AIProvider: Send + Sync {
    /// Send a prompt and return the model's text reply.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The API call fails
    /// - The response carries no text (empty or blocked)
    fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the provider name for logging and debugging.
    fn name(&self) -> &str;

    /// Get the model being used by this provider.
    ///
    /// Returns `None` if the provider doesn't expose model information.
    fn model(&self) -> Option<&str> {
        None
    }
}
