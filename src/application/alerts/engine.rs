use crate::application::streaming::{Fanout, SystemEvent};
use crate::domain::alert::{AlertCondition, AlertState, SmartAlert, alert_fingerprint};
use crate::domain::errors::AppError;
use crate::domain::notification::{Notification, NotificationKind, Priority};
use crate::domain::ports::{AlertRepository, NotificationRepository};
use crate::domain::quote::Quote;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::Arc;

/// Rolling window used for the RSI heuristic backing `rsi_above`/`rsi_below`
/// conditions. 14 is the conventional Wilder period.
const RSI_PERIOD: usize = 14;

/// Maintains the armed-alert set keyed by fingerprint and evaluates it
/// against every published quote (spec §4.8). No teacher analogue exists
/// (the teacher is single-tenant with no user-facing alerting); built in
/// the style of a background service that reacts to a stream of ticks.
pub struct AlertEngine {
    repo: Arc<dyn AlertRepository>,
    notifications: Arc<dyn NotificationRepository>,
    fanout: Arc<Fanout>,
    /// fingerprint -> alert, the armed set invariant 6 is enforced against.
    armed: DashMap<String, SmartAlert>,
    /// symbol -> recent closing prices, newest last, capped at RSI_PERIOD+1.
    price_history: DashMap<String, VecDeque<Decimal>>,
}

impl AlertEngine {
    pub fn new(repo: Arc<dyn AlertRepository>, notifications: Arc<dyn NotificationRepository>, fanout: Arc<Fanout>) -> Self {
        Self { repo, notifications, fanout, armed: DashMap::new(), price_history: DashMap::new() }
    }

    /// Populate the in-memory armed set from storage. Call once at startup.
    pub async fn load_armed(&self) -> Result<(), AppError> {
        for alert in self.repo.list_armed().await? {
            self.armed.insert(alert.fingerprint.clone(), alert);
        }
        Ok(())
    }

    /// Arm a new alert. Rejects with `Conflict` if an alert with the same
    /// fingerprint is already armed for this owner (invariant 6).
    pub async fn arm(
        &self,
        owner_id: &str,
        symbol: &str,
        condition: AlertCondition,
        threshold: Decimal,
    ) -> Result<SmartAlert, AppError> {
        let fingerprint = alert_fingerprint(owner_id, symbol, condition, threshold);
        if self.armed.contains_key(&fingerprint) {
            return Err(AppError::conflict("an equivalent alert is already armed"));
        }
        let alert = SmartAlert {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            symbol: symbol.to_string(),
            condition,
            threshold,
            fingerprint: fingerprint.clone(),
            state: AlertState::Armed,
        };
        self.repo.insert(&alert).await?;
        self.armed.insert(fingerprint, alert.clone());
        Ok(alert)
    }

    /// Dismiss (delete) an armed or already-triggered alert.
    pub async fn dismiss(&self, owner_id: &str, alert_id: &str) -> Result<(), AppError> {
        let fingerprint = self
            .armed
            .iter()
            .find(|entry| entry.value().id == alert_id && entry.value().owner_id == owner_id)
            .map(|entry| entry.key().clone());
        if let Some(fingerprint) = fingerprint {
            self.armed.remove(&fingerprint);
        }
        self.repo.delete(alert_id).await
    }

    pub async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<SmartAlert>, AppError> {
        self.repo.list_for_owner(owner_id).await
    }

    /// Evaluate every armed alert against a freshly published quote. A
    /// matching alert transitions armed -> triggered exactly once and emits
    /// a notification; it is then removed from the armed set.
    pub async fn on_quote(&self, quote: &Quote) -> Result<(), AppError> {
        self.record_price(quote);

        let rsi = self.rsi(&quote.symbol);
        let matches: Vec<SmartAlert> = self
            .armed
            .iter()
            .filter(|entry| entry.value().symbol == quote.symbol)
            .filter(|entry| condition_met(entry.value(), quote, rsi))
            .map(|entry| entry.value().clone())
            .collect();

        for mut alert in matches {
            self.armed.remove(&alert.fingerprint);
            alert.state = AlertState::Triggered;
            self.repo.update(&alert).await?;

            let body = format!(
                "{} {:?} {} (current: {})",
                alert.symbol, alert.condition, alert.threshold, quote.price
            );
            let notification = Notification::new(&alert.owner_id, NotificationKind::AlertTriggered, body, Priority::High);
            self.notifications.insert(&notification).await?;
            self.fanout.publish_notification(&alert.owner_id, notification);
        }
        Ok(())
    }

    fn record_price(&self, quote: &Quote) {
        let mut history = self.price_history.entry(quote.symbol.clone()).or_default();
        history.push_back(quote.price);
        while history.len() > RSI_PERIOD + 1 {
            history.pop_front();
        }
    }

    /// Wilder's RSI over the recorded window. `None` until enough samples
    /// have accumulated.
    fn rsi(&self, symbol: &str) -> Option<Decimal> {
        let history = self.price_history.get(symbol)?;
        if history.len() <= RSI_PERIOD {
            return None;
        }
        let mut gains = Decimal::ZERO;
        let mut losses = Decimal::ZERO;
        for window in history.iter().collect::<Vec<_>>().windows(2) {
            let delta = *window[1] - *window[0];
            if delta > Decimal::ZERO {
                gains += delta;
            } else {
                losses -= delta;
            }
        }
        let period = Decimal::from(RSI_PERIOD as u64);
        let avg_gain = gains / period;
        let avg_loss = losses / period;
        if avg_loss == Decimal::ZERO {
            return Some(Decimal::from(100));
        }
        let rs = avg_gain / avg_loss;
        Some(Decimal::from(100) - (Decimal::from(100) / (Decimal::ONE + rs)))
    }

    pub fn publish_opportunity(&self, owner_id: &str, summary: String) {
        self.fanout.publish_system(SystemEvent {
            kind: "opportunity".to_string(),
            detail: serde_json::json!({"owner_id": owner_id, "summary": summary}),
        });
    }
}

fn condition_met(alert: &SmartAlert, quote: &Quote, rsi: Option<Decimal>) -> bool {
    match alert.condition {
        AlertCondition::PriceAbove => quote.price > alert.threshold,
        AlertCondition::PriceBelow => quote.price < alert.threshold,
        AlertCondition::RsiAbove => rsi.is_some_and(|rsi| rsi > alert.threshold),
        AlertCondition::RsiBelow => rsi.is_some_and(|rsi| rsi < alert.threshold),
        AlertCondition::VolumeSpike => quote.volume_24h > alert.threshold,
    }
}
