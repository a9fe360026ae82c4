//! Cargo only auto-discovers direct children of `tests/`; these `#[path]`
//! declarations pull the scenario files in `tests/scenarios/` and the shared
//! fakes in `tests/support/` into this binary so they actually compile and
//! run under `cargo test`.

#[path = "support/mod.rs"]
mod support;

mod paper_fallback;
mod assisted_approval_ttl;
