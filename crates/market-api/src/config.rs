#[derive(Debug, Clone)]
pub struct Settings {
    pub krx_base_url: Option<String>,
    pub cors_allow_origin: Option<String>,
    pub sentry_dsn: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            krx_base_url: std::env::var("KRX_BASE_URL").ok(),
            cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN").ok(),
            sentry_dsn: std::env::var("SENTRY_DSN").ok(),
        })
    }
}
