//! Assisted-mode approval queue (spec §4.6 step 1): an automated order
//! submitted while the user is in `Assisted` mode is held here rather than
//! reaching the gated pipeline until the user explicitly approves it, or
//! its TTL (default 5 minutes) lapses and it is cancelled.

use crate::domain::order::TradeOrder;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use std::time::Duration;

pub const DEFAULT_APPROVAL_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct PendingApproval {
    pub id: String,
    pub owner_id: String,
    pub order: TradeOrder,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PendingApproval {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub struct ApprovalQueue {
    pending: DashMap<String, PendingApproval>,
    ttl: Duration,
}

impl ApprovalQueue {
    pub fn new(ttl: Duration) -> Self {
        Self { pending: DashMap::new(), ttl }
    }

    pub fn enqueue(&self, owner_id: &str, order: TradeOrder) -> PendingApproval {
        let now = Utc::now();
        let approval = PendingApproval {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            order,
            created_at: now,
            expires_at: now + ChronoDuration::from_std(self.ttl).unwrap_or(ChronoDuration::seconds(300)),
        };
        self.pending.insert(approval.id.clone(), approval.clone());
        approval
    }

    /// Remove and return the approval if it belongs to `owner_id`, exists,
    /// and has not yet expired. Expired-but-present entries are dropped as
    /// a side effect (lazily swept) rather than returned.
    pub fn take(&self, owner_id: &str, approval_id: &str) -> Option<PendingApproval> {
        let (_, approval) = self.pending.remove(approval_id)?;
        if approval.owner_id != owner_id {
            self.pending.insert(approval.id.clone(), approval);
            return None;
        }
        if approval.is_expired(Utc::now()) {
            return None;
        }
        Some(approval)
    }

    pub fn list_for_owner(&self, owner_id: &str) -> Vec<PendingApproval> {
        self.pending.iter().filter(|e| e.value().owner_id == owner_id).map(|e| e.value().clone()).collect()
    }

    /// Sweep and return every entry whose TTL has lapsed. Called on a
    /// schedule by the bootstrap background loop; callers are expected to
    /// emit a cancellation notification per returned entry.
    pub fn expire_stale(&self) -> Vec<PendingApproval> {
        let now = Utc::now();
        let expired: Vec<String> =
            self.pending.iter().filter(|e| e.value().is_expired(now)).map(|e| e.key().clone()).collect();
        expired.into_iter().filter_map(|id| self.pending.remove(&id).map(|(_, v)| v)).collect()
    }
}

impl Default for ApprovalQueue {
    fn default() -> Self {
        Self::new(DEFAULT_APPROVAL_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderSide, OrderType};
    use rust_decimal_macros::dec;

    fn order() -> TradeOrder {
        TradeOrder {
            owner_id: "u1".into(),
            symbol: "BTCUSDT".into(),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            quantity: dec!(0.01),
            limit_price: None,
            stop_price: None,
            platform_id: None,
            idempotency_key: None,
        }
    }

    #[test]
    fn enqueued_approval_is_retrievable_by_owner() {
        let queue = ApprovalQueue::new(Duration::from_secs(300));
        let approval = queue.enqueue("u1", order());
        assert!(queue.take("u1", &approval.id).is_some());
        // consumed; a second take fails.
        assert!(queue.take("u1", &approval.id).is_none());
    }

    #[test]
    fn another_owner_cannot_take_it() {
        let queue = ApprovalQueue::new(Duration::from_secs(300));
        let approval = queue.enqueue("u1", order());
        assert!(queue.take("u2", &approval.id).is_none());
        assert!(queue.take("u1", &approval.id).is_some());
    }

    #[test]
    fn expired_entries_are_swept() {
        let queue = ApprovalQueue::new(Duration::from_millis(1));
        let approval = queue.enqueue("u1", order());
        std::thread::sleep(Duration::from_millis(5));
        let expired = queue.expire_stale();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, approval.id);
        assert!(queue.take("u1", &approval.id).is_none());
    }
}
