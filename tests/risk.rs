//! See `tests/scenarios.rs` for why these `#[path]` declarations exist:
//! Cargo does not auto-discover files nested under `tests/<dir>/`.

#[path = "support/mod.rs"]
mod support;

mod daily_drawdown_kill_switch;
