pub mod crypto_source;
pub mod equity_source;
pub mod forex_source;
pub mod synthetic;

pub use crypto_source::CryptoSource;
pub use equity_source::EquitySource;
pub use forex_source::ForexSource;
pub use synthetic::SyntheticSource;
