use crate::domain::notification::Notification;
use crate::domain::quote::Quote;
use crate::domain::trade::Trade;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

const PRICE_CHANNEL_CAPACITY: usize = 64;
const SYSTEM_CHANNEL_CAPACITY: usize = 64;
/// Trade/notification channels must never silently drop (spec §4.9); a full
/// buffer disconnects the subscriber instead.
const USER_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
pub struct SystemEvent {
    pub kind: String,
    pub detail: serde_json::Value,
}

/// Process-wide pub/sub hub. Price channels are `broadcast` (last-value-wins
/// under load: a lagging receiver gets `Lagged` and resubscribes to the
/// latest tick rather than replaying history). Per-user trade/notification
/// channels are bounded `mpsc`; a subscriber slow enough to fill its buffer
/// is disconnected by dropping its sender, per spec §4.9 — the client must
/// reconnect and resynchronize via REST.
pub struct Fanout {
    prices: DashMap<String, broadcast::Sender<Quote>>,
    trades: DashMap<String, mpsc::Sender<Trade>>,
    notifications: DashMap<String, mpsc::Sender<Notification>>,
    system: broadcast::Sender<SystemEvent>,
}

impl Default for Fanout {
    fn default() -> Self {
        let (system, _) = broadcast::channel(SYSTEM_CHANNEL_CAPACITY);
        Self { prices: DashMap::new(), trades: DashMap::new(), notifications: DashMap::new(), system }
    }
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the latest tick for a symbol. No-op if nobody is subscribed.
    pub fn publish_price(&self, quote: Quote) {
        if let Some(sender) = self.prices.get(&quote.symbol) {
            let _ = sender.send(quote);
        }
    }

    pub fn subscribe_price(&self, symbol: &str) -> broadcast::Receiver<Quote> {
        self.prices
            .entry(symbol.to_string())
            .or_insert_with(|| broadcast::channel(PRICE_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    pub fn subscribe_system(&self) -> broadcast::Receiver<SystemEvent> {
        self.system.subscribe()
    }

    pub fn publish_system(&self, event: SystemEvent) {
        let _ = self.system.send(event);
    }

    /// Register a fresh subscription for `owner_id`'s trade events,
    /// replacing any previous one (a reconnect supersedes the stale channel).
    pub fn subscribe_trades(&self, owner_id: &str) -> mpsc::Receiver<Trade> {
        let (tx, rx) = mpsc::channel(USER_CHANNEL_CAPACITY);
        self.trades.insert(owner_id.to_string(), tx);
        rx
    }

    pub fn subscribe_notifications(&self, owner_id: &str) -> mpsc::Receiver<Notification> {
        let (tx, rx) = mpsc::channel(USER_CHANNEL_CAPACITY);
        self.notifications.insert(owner_id.to_string(), tx);
        rx
    }

    /// Best-effort delivery. Returns `false` (and disconnects the
    /// subscriber) if the buffer was full; the caller does not need to act
    /// on this, delivery is inherently best-effort for streaming.
    pub fn publish_trade(&self, owner_id: &str, trade: Trade) -> bool {
        self.try_send_or_disconnect(&self.trades, owner_id, trade)
    }

    pub fn publish_notification(&self, owner_id: &str, notification: Notification) -> bool {
        self.try_send_or_disconnect(&self.notifications, owner_id, notification)
    }

    fn try_send_or_disconnect<T>(&self, channels: &DashMap<String, mpsc::Sender<T>>, owner_id: &str, item: T) -> bool {
        let Some(sender) = channels.get(owner_id) else { return false };
        match sender.try_send(item) {
            Ok(()) => true,
            Err(_) => {
                drop(sender);
                channels.remove(owner_id);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::{NotificationKind, Priority};
    use crate::domain::quote::AssetClass;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn quote(symbol: &str, price: Decimal) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            price,
            change_24h_pct: Decimal::ZERO,
            volume_24h: Decimal::ZERO,
            high_24h: price,
            low_24h: price,
            asset_class: AssetClass::Crypto,
            source_tag: "test".into(),
            fetched_at: Utc::now(),
            fetched_monotonic: None,
        }
    }

    #[tokio::test]
    async fn price_subscribers_receive_published_ticks() {
        let fanout = Fanout::new();
        let mut rx = fanout.subscribe_price("BTCUSDT");
        fanout.publish_price(quote("BTCUSDT", Decimal::from(60000)));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.symbol, "BTCUSDT");
    }

    #[tokio::test]
    async fn publish_without_subscriber_is_a_noop() {
        let fanout = Fanout::new();
        fanout.publish_price(quote("ETHUSDT", Decimal::from(3000)));
    }

    #[tokio::test]
    async fn notification_channel_disconnects_when_full() {
        let fanout = Fanout::new();
        let _rx = fanout.subscribe_notifications("u1");
        for _ in 0..(USER_CHANNEL_CAPACITY + 1) {
            fanout.publish_notification("u1", Notification::new("u1", NotificationKind::System, "x", Priority::Low));
        }
        // The overflow disconnected the subscriber; further publishes are a no-op.
        assert!(!fanout.publish_notification("u1", Notification::new("u1", NotificationKind::System, "y", Priority::Low)));
    }
}
