pub(crate) mod auth;
pub(crate) mod fundamentals;
pub(crate) mod health;
pub(crate) mod quotes;
pub(crate) mod securities;
