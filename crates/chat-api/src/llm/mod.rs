pub mod ollama;

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends one rendered prompt and returns the model's raw completion text.
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}
