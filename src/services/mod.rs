pub mod analytics_service;
pub mod auth_service;
pub mod forecast_service;
pub mod fundamentals_service;
pub mod history_service;
pub mod indicators;
pub mod kpi_service;
pub mod peer_service;
pub mod preprocessing;
pub mod quote_service;
pub mod rate_limiter;
