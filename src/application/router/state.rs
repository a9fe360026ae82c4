//! Explicit submission state machine (spec §4.6): `Idle → Proposing →
//! RiskChecking → BreakerChecking → Submitting → Recording → Idle`, any
//! non-`Idle`/`Recording` state may fall to `Rejected → Idle`. Purely a
//! tracing aid — nothing persists this enum, it exists so each gated step
//! logs the state it is leaving rather than a free-text message.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Proposing,
    RiskChecking,
    BreakerChecking,
    Submitting,
    Recording,
    Rejected,
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Proposing => "proposing",
            Self::RiskChecking => "risk_checking",
            Self::BreakerChecking => "breaker_checking",
            Self::Submitting => "submitting",
            Self::Recording => "recording",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}
