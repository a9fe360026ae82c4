pub mod accounting;
pub mod ai;
pub mod alerts;
pub mod bootstrap;
pub mod risk;
pub mod router;
pub mod streaming;
