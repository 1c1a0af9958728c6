#[derive(Debug, Clone)]
pub struct Settings {
    pub ollama_host: Option<String>,
    pub ollama_model: Option<String>,
    pub sentry_dsn: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            ollama_host: std::env::var("OLLAMA_HOST").ok(),
            ollama_model: std::env::var("OLLAMA_MODEL").ok(),
            sentry_dsn: std::env::var("SENTRY_DSN").ok(),
        })
    }
}
