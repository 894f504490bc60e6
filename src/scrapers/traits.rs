use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Browser session the source adapters read listing pages through.
/// Kept behind a trait so adapters and the orchestrator can run against a
/// scripted page in tests.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Load `url` in the session's page
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Evaluate a script expression on the loaded page and return its value.
    /// `undefined` comes back as `Value::Null`.
    async fn evaluate(&self, expression: &str) -> Result<Value>;

    /// Text content of the first element matching `selector`
    async fn select_text(&self, selector: &str) -> Result<String>;

    /// Release the browser
    async fn quit(&self) -> Result<()>;
}
