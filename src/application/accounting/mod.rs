//! Portfolio Accounting (spec §4.7): per-user authoritative balance/position
//! state with a single writer per owner, journaled mutations, and a
//! monotonic sequence number for audit reconstruction.

mod portfolio_service;

pub use portfolio_service::PortfolioService;
