/// Service configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | HTTP_PORT | 3000 | Webhook HTTP port |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | MEGAMARKET_BASE_URL | https://api.megamarket.ru | Marketplace API base |
/// | REQUEST_TIMEOUT_MS | 30000 | HTTP client timeout (milliseconds) |
/// | INTAKE_INTERVAL_SECS | 60 | New-order poll interval |
/// | INTAKE_WINDOW_HOURS | 24 | Trailing search window for new orders |
/// | RETRY_DELAY_SECS | 60 | Delay before command redelivery |
///
/// Acknowledgement requests (packing/close) execute against the real
/// backend only when `ENVIRONMENT=production`; elsewhere they are logged
/// and treated as successful so the downstream workflow keeps flowing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Webhook HTTP port
    pub http_port: u16,
    /// Running environment: development | staging | production
    pub environment: String,
    /// Marketplace API base URL
    pub market_base_url: String,
    /// HTTP client timeout (milliseconds)
    pub request_timeout_ms: u64,
    /// New-order poll interval (seconds)
    pub intake_interval_secs: u64,
    /// Trailing search window for new orders (hours)
    pub intake_window_hours: u64,
    /// Delay before command redelivery (seconds)
    pub retry_delay_secs: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            http_port: env_parsed("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            market_base_url: std::env::var("MEGAMARKET_BASE_URL")
                .unwrap_or_else(|_| "https://api.megamarket.ru".into()),
            request_timeout_ms: env_parsed("REQUEST_TIMEOUT_MS", 30000),
            intake_interval_secs: env_parsed("INTAKE_INTERVAL_SECS", 60),
            intake_window_hours: env_parsed("INTAKE_WINDOW_HOURS", 24),
            retry_delay_secs: env_parsed("RETRY_DELAY_SECS", 60),
        }
    }

    /// Whether remote acknowledgements may actually execute
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
