use std::path::PathBuf;
use std::sync::Arc;

use crate::external::market_data::MarketDataProvider;
use crate::services::auth_service::AuthConfig;
use crate::services::quote_service::QuoteCache;
use crate::services::rate_limiter::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MarketDataProvider>,
    pub limiter: Arc<RateLimiter>,
    pub quotes: QuoteCache,
    pub cache_path: Arc<PathBuf>,
    pub auth: Arc<AuthConfig>,
}
