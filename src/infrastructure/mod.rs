pub mod adapters;
pub mod circuit_breaker;
pub mod http_client_factory;
pub mod market_data;
pub mod observability;
pub mod persistence;
pub mod vault;
