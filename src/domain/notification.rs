use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TradeExecuted,
    AlertTriggered,
    System,
    Recommendation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

const MAX_BODY_LEN: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub owner_id: String,
    pub kind: NotificationKind,
    pub body: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn new(
        owner_id: impl Into<String>,
        kind: NotificationKind,
        body: impl Into<String>,
        priority: Priority,
    ) -> Self {
        let mut body = body.into();
        body.truncate(MAX_BODY_LEN);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            kind,
            body,
            priority,
            created_at: Utc::now(),
            read_at: None,
        }
    }
}
