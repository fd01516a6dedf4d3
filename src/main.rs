use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use energydash_backend::app;
use energydash_backend::external::market_data::MarketDataProvider;
use energydash_backend::external::mock::MockProvider;
use energydash_backend::external::yahoo::YahooProvider;
use energydash_backend::logging::{init_logging, LoggingConfig};
use energydash_backend::services::auth_service::AuthConfig;
use energydash_backend::services::history_service;
use energydash_backend::services::quote_service::QuoteCache;
use energydash_backend::services::rate_limiter::RateLimiter;
use energydash_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    init_logging(LoggingConfig::from_env())?;

    // Select market data provider based on MARKET_DATA_PROVIDER env var (defaults to yahoo)
    let provider_name =
        std::env::var("MARKET_DATA_PROVIDER").unwrap_or_else(|_| "yahoo".to_string());

    let provider: Arc<dyn MarketDataProvider> = match provider_name.to_lowercase().as_str() {
        "yahoo" => {
            tracing::info!("📊 Using market data provider: Yahoo Finance");
            Arc::new(YahooProvider::new())
        }
        "mock" => {
            tracing::info!("📊 Using market data provider: seeded mock walks");
            Arc::new(MockProvider)
        }
        _ => {
            panic!(
                "Invalid MARKET_DATA_PROVIDER: {}. Must be 'yahoo' or 'mock'",
                provider_name
            );
        }
    };

    let state = AppState {
        provider,
        limiter: Arc::new(RateLimiter::new(4, 120)),
        quotes: QuoteCache::new(),
        cache_path: Arc::new(history_service::cache_path_from_env()),
        auth: Arc::new(AuthConfig::from_env()),
    };
    let app = app::create_app(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 EnergyDash backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
