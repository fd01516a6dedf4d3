use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where log lines go: always the console, optionally a Loki push target.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: String,
    pub loki: Option<LokiTarget>,
}

#[derive(Debug, Clone)]
pub struct LokiTarget {
    pub url: String,
    pub service: String,
    pub environment: String,
}

impl LoggingConfig {
    /// `RUST_LOG` drives the filter. Loki shipping turns on only when both
    /// `LOKI_ENABLED=true` and `LOKI_URL` are set.
    pub fn from_env() -> Self {
        let loki_enabled = std::env::var("LOKI_ENABLED")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let loki = match (loki_enabled, std::env::var("LOKI_URL").ok()) {
            (true, Some(url)) => Some(LokiTarget {
                url,
                service: std::env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "energydash-backend".to_string()),
                environment: std::env::var("ENVIRONMENT")
                    .unwrap_or_else(|_| "development".to_string()),
            }),
            (true, None) => {
                // No subscriber exists yet, so this cannot go through tracing.
                eprintln!("LOKI_ENABLED is set but LOKI_URL is missing, staying console-only");
                None
            }
            _ => None,
        };

        Self {
            filter: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            loki,
        }
    }
}

pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::new(&config.filter))
        .with(tracing_subscriber::fmt::layer());

    #[cfg(feature = "loki")]
    if let Some(target) = &config.loki {
        let (loki_layer, task) = tracing_loki::builder()
            .label("service", &target.service)?
            .label("environment", &target.environment)?
            .build_url(url::Url::parse(&target.url)?)?;

        // The layer only buffers; this task does the actual shipping.
        tokio::spawn(task);

        registry.with(loki_layer).init();
        tracing::info!("📊 Logging to console and Loki at {}", target.url);
        return Ok(());
    }

    registry.init();
    tracing::info!("📊 Console logging initialized");
    Ok(())
}
