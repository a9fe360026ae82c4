//! Streaming Fan-out (spec §4.9): `prices:<symbol>`, `trades:<user>`,
//! `notifications:<user>`, `system` channels for WebSocket subscribers.

mod fanout;
mod ticker;

pub use fanout::{Fanout, SystemEvent};
pub use ticker::PriceTicker;
