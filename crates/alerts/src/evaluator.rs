//! Fixed-interval alert evaluation.
//!
//! One tick fetches the price once and checks every chat against it.
//! A threshold is disarmed only after its notification was delivered;
//! on delivery failure it stays armed and fires again next tick.

use crate::message::{format_alert_message, PriceDisplay};
use crate::notifier::Notifier;
use crate::store::AlertStore;
use pricebot_core::Price;
use pricebot_feeds::PriceSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Default evaluation interval.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Outcome of one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Price used for evaluation; `None` if the tick was skipped.
    pub price: Option<Price>,
    /// Notifications delivered (thresholds disarmed).
    pub fired: usize,
    /// Notifications that failed (thresholds left armed).
    pub failed: usize,
}

pub struct AlertEvaluator {
    store: Arc<AlertStore>,
    prices: Arc<dyn PriceSource>,
    notifier: Arc<dyn Notifier>,
    display: PriceDisplay,
}

impl AlertEvaluator {
    pub fn new(
        store: Arc<AlertStore>,
        prices: Arc<dyn PriceSource>,
        notifier: Arc<dyn Notifier>,
        display: PriceDisplay,
    ) -> Self {
        Self {
            store,
            prices,
            notifier,
            display,
        }
    }

    /// Run one evaluation pass.
    pub async fn tick(&self) -> TickReport {
        let Some(price) = self.prices.get_price().await else {
            debug!("No price this tick, skipping evaluation");
            return TickReport::default();
        };

        let symbol = self.prices.token().symbol.clone();
        let price_text = self.display.describe(price).await;
        let mut report = TickReport {
            price: Some(price),
            ..Default::default()
        };

        let armed: Vec<_> = self
            .store
            .snapshot()
            .into_iter()
            .filter(|(_, alert)| alert.is_armed())
            .collect();
        debug!(armed = armed.len(), price = price.to_f64(), "Evaluating alerts");

        for (chat, alert) in armed {
            for crossing in alert.crossings(price) {
                let message = format_alert_message(&symbol, &crossing, &price_text);

                match self.notifier.notify(chat, &message).await {
                    Ok(()) => {
                        self.store.disarm(chat, crossing.threshold, crossing.level);
                        report.fired += 1;
                        info!(
                            chat_id = %chat,
                            threshold = crossing.threshold.as_str(),
                            level = crossing.level.to_f64(),
                            price = price.to_f64(),
                            "Alert sent"
                        );
                    }
                    Err(e) => {
                        report.failed += 1;
                        error!(
                            chat_id = %chat,
                            threshold = crossing.threshold.as_str(),
                            error = %e,
                            "Failed to send alert, keeping threshold armed"
                        );
                    }
                }
            }
        }

        report
    }

    /// Tick every `period` until `shutdown` flips or its sender is dropped.
    /// The first tick runs immediately.
    pub async fn run(&self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        info!("Starting alert evaluator (every {:?})", period);

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let report = self.tick().await;
                    if report.fired > 0 || report.failed > 0 {
                        info!(
                            fired = report.fired,
                            failed = report.failed,
                            "Alert tick finished"
                        );
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        info!("Alert evaluator stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::NotifyError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use pricebot_core::{Alert, ChatId, Token};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Price source whose answer can be changed between ticks.
    struct FakePrices {
        token: Token,
        price: Mutex<Option<f64>>,
        calls: AtomicUsize,
    }

    impl FakePrices {
        fn new(price: Option<f64>) -> Arc<Self> {
            Arc::new(Self {
                token: Token::new("PEPE"),
                price: Mutex::new(price),
                calls: AtomicUsize::new(0),
            })
        }

        fn set(&self, price: Option<f64>) {
            *self.price.lock().unwrap() = price;
        }
    }

    #[async_trait]
    impl PriceSource for FakePrices {
        async fn get_price(&self) -> Option<Price> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.price.lock().unwrap().and_then(Price::new)
        }

        fn token(&self) -> &Token {
            &self.token
        }
    }

    /// Records messages; can be switched to fail.
    #[derive(Default)]
    struct FakeNotifier {
        sent: Mutex<Vec<(ChatId, String)>>,
        failing: AtomicBool,
    }

    impl FakeNotifier {
        fn sent(&self) -> Vec<(ChatId, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for FakeNotifier {
        async fn notify(&self, chat: ChatId, text: &str) -> Result<(), NotifyError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(NotifyError::Http("connection reset".into()));
            }
            self.sent.lock().unwrap().push((chat, text.to_string()));
            Ok(())
        }
    }

    fn p(value: f64) -> Price {
        Price::new(value).unwrap()
    }

    fn setup(price: Option<f64>) -> (AlertEvaluator, Arc<AlertStore>, Arc<FakePrices>, Arc<FakeNotifier>) {
        let store = Arc::new(AlertStore::new());
        let prices = FakePrices::new(price);
        let notifier = Arc::new(FakeNotifier::default());
        let evaluator = AlertEvaluator::new(
            Arc::clone(&store),
            prices.clone(),
            notifier.clone(),
            PriceDisplay::usd(),
        );
        (evaluator, store, prices, notifier)
    }

    #[tokio::test]
    async fn test_low_fires_once_and_clears() {
        let (evaluator, store, _, notifier) = setup(Some(0.03));
        store.set_low(ChatId(1), p(0.035));

        let report = evaluator.tick().await;
        assert_eq!(report.fired, 1);
        assert_eq!(store.get(ChatId(1)).unwrap().low, None);
        assert_eq!(notifier.sent().len(), 1);
        assert!(notifier.sent()[0].1.contains("dropped to $0.03"));

        // Still below: nothing armed, nothing sent
        let report = evaluator.tick().await;
        assert_eq!(report.fired, 0);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_high_fires_once_and_clears() {
        let (evaluator, store, _, notifier) = setup(Some(2.0));
        store.set_high(ChatId(1), p(2.0));
        store.set_low(ChatId(1), p(1.0));

        let report = evaluator.tick().await;
        assert_eq!(report.fired, 1);
        assert_eq!(
            store.get(ChatId(1)).unwrap(),
            Alert {
                low: Some(p(1.0)),
                high: None
            }
        );
        assert!(notifier.sent()[0].1.contains("rose to $2.00"));

        evaluator.tick().await;
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_rearm_fires_again() {
        let (evaluator, store, _, notifier) = setup(Some(0.5));
        store.set_low(ChatId(1), p(1.0));
        evaluator.tick().await;

        store.set_low(ChatId(1), p(0.6));
        evaluator.tick().await;
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_no_crossing_no_message() {
        let (evaluator, store, _, notifier) = setup(Some(1.0));
        store.set_low(ChatId(1), p(0.5));
        store.set_high(ChatId(1), p(1.5));

        let report = evaluator.tick().await;
        assert_eq!(
            report,
            TickReport {
                price: Some(p(1.0)),
                fired: 0,
                failed: 0
            }
        );
        assert!(notifier.sent().is_empty());
        assert!(store.get(ChatId(1)).unwrap().is_armed());
    }

    #[tokio::test]
    async fn test_no_price_skips_tick() {
        let (evaluator, store, prices, notifier) = setup(None);
        store.set_low(ChatId(1), p(100.0));
        store.set_high(ChatId(2), p(0.0001));

        let report = evaluator.tick().await;
        assert_eq!(report, TickReport::default());
        assert!(notifier.sent().is_empty());
        assert_eq!(store.get(ChatId(1)).unwrap().low, Some(p(100.0)));
        assert_eq!(store.get(ChatId(2)).unwrap().high, Some(p(0.0001)));
        assert_eq!(prices.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_send_keeps_threshold_armed() {
        let (evaluator, store, _, notifier) = setup(Some(0.01));
        store.set_low(ChatId(1), p(0.035));
        notifier.failing.store(true, Ordering::SeqCst);

        let report = evaluator.tick().await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.fired, 0);
        assert_eq!(store.get(ChatId(1)).unwrap().low, Some(p(0.035)));

        // Delivery recovers: the alert re-fires and is cleared
        notifier.failing.store(false, Ordering::SeqCst);
        let report = evaluator.tick().await;
        assert_eq!(report.fired, 1);
        assert_eq!(store.get(ChatId(1)).unwrap().low, None);
    }

    #[tokio::test]
    async fn test_price_fetched_once_for_all_chats() {
        let (evaluator, store, prices, notifier) = setup(Some(5.0));
        for chat in 1..=5 {
            store.set_high(ChatId(chat), p(4.0));
        }

        let report = evaluator.tick().await;
        assert_eq!(report.fired, 5);
        assert_eq!(prices.calls.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.sent().len(), 5);
    }

    #[tokio::test]
    async fn test_chats_evaluated_independently() {
        let (evaluator, store, prices, notifier) = setup(Some(1.0));
        store.set_low(ChatId(1), p(1.2));
        store.set_low(ChatId(2), p(0.8));
        store.set_high(ChatId(3), p(0.9));

        evaluator.tick().await;
        let chats: Vec<ChatId> = notifier.sent().into_iter().map(|(c, _)| c).collect();
        assert_eq!(chats, vec![ChatId(1), ChatId(3)]);
        assert_eq!(store.get(ChatId(2)).unwrap().low, Some(p(0.8)));

        prices.set(Some(0.7));
        evaluator.tick().await;
        assert_eq!(notifier.sent().len(), 3);
        assert_eq!(store.get(ChatId(2)).unwrap().low, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_until_shutdown() {
        let (evaluator, _, prices, _) = setup(Some(1.0));
        let evaluator = Arc::new(evaluator);
        let (tx, rx) = watch::channel(false);

        let task = {
            let evaluator = Arc::clone(&evaluator);
            tokio::spawn(async move { evaluator.run(Duration::from_secs(60), rx).await })
        };

        // First tick is immediate, then one per period
        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(prices.calls.load(Ordering::SeqCst), 3);

        tx.send(true).unwrap();
        task.await.unwrap();
    }
}
