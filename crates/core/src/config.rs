use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `ADSERVE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cron: CronConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub attribution: AttributionConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CronConfig {
    /// Shared secret checked against the `x-cron-secret` header on
    /// every cron trigger endpoint.
    #[serde(default = "default_cron_secret")]
    pub secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Width of the unbilled-impression window per hourly pass.
    #[serde(default = "default_billing_window_hours")]
    pub window_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QualityConfig {
    /// Trailing window the recalc pass counts events over.
    #[serde(default = "default_quality_window_days")]
    pub window_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributionConfig {
    /// Click-to-conversion attribution window.
    #[serde(default = "default_attribution_window_hours")]
    pub window_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_cron_secret() -> String {
    // Development default. Production: set ADSERVE__CRON__SECRET.
    "adserve-dev-secret".to_string()
}

fn default_billing_window_hours() -> i64 {
    1
}

fn default_quality_window_days() -> i64 {
    30
}

fn default_attribution_window_hours() -> i64 {
    24
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            secret: default_cron_secret(),
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            window_hours: default_billing_window_hours(),
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            window_days: default_quality_window_days(),
        }
    }
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            window_hours: default_attribution_window_hours(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            cron: CronConfig::default(),
            billing: BillingConfig::default(),
            quality: QualityConfig::default(),
            attribution: AttributionConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("ADSERVE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
