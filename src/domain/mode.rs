use serde::{Deserialize, Serialize};

/// Per-user operating mode governing whether and how automated trades reach
/// an adapter (spec §4.6 / Glossary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Orders are recorded and scored but never submitted.
    LearningOnly,
    /// Automated orders require explicit user approval with a TTL.
    Assisted,
    /// Orders proceed directly through the gated pipeline.
    Autopilot,
}

impl Default for OperatingMode {
    fn default() -> Self {
        OperatingMode::LearningOnly
    }
}
