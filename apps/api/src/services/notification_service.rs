//! Session result notifications.
//!
//! ```text
//! end session
//!      │
//!      ▼
//! SessionSummary::from_entries ──► NotificationContent
//!      │
//!      ▼
//! active subscriptions for the session
//!      │  PushSender::send (one at a time)
//!      ├── Delivered ──► counted
//!      ├── Gone      ──► subscription deactivated
//!      └── Failed    ──► logged, kept for next time
//! ```

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use pokernight_core::notification::{NotificationContent, SessionSummary};
use pokernight_core::{PushSubscription, Session};
use pokernight_db::{Database, DbResult};

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered,
    /// The push service no longer knows the endpoint (HTTP 404/410).
    Gone,
    Failed(String),
}

/// Delivers a notification to one browser endpoint.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, subscription: &PushSubscription, content: &NotificationContent)
        -> PushOutcome;
}

/// Sender that records deliveries in the log and reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPushSender;

#[async_trait]
impl PushSender for LogPushSender {
    async fn send(
        &self,
        subscription: &PushSubscription,
        content: &NotificationContent,
    ) -> PushOutcome {
        info!(
            subscription_id = subscription.id,
            player_id = %subscription.player_id,
            session_id = %subscription.session_id,
            title = %content.title,
            body = %content.body,
            "Push notification"
        );
        PushOutcome::Delivered
    }
}

/// Counts from one dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub delivered: usize,
    pub deactivated: usize,
    pub failed: usize,
}

/// Sends session results to subscribers.
pub struct NotificationService<'a> {
    db: &'a Database,
    sender: &'a dyn PushSender,
}

impl<'a> NotificationService<'a> {
    pub fn new(db: &'a Database, sender: &'a dyn PushSender) -> Self {
        NotificationService { db, sender }
    }

    /// Builds the summary for `session` and pushes it to every active
    /// subscription of that session.
    pub async fn send_session_results(&self, session: &Session) -> DbResult<DispatchReport> {
        let entries = self.db.entries().list_for_session(&session.id).await?;
        let summary = SessionSummary::from_entries(session, &entries);
        let content = NotificationContent::for_summary(&summary);

        let subscriptions = self.db.subscriptions().active_for_session(&session.id).await?;
        if subscriptions.is_empty() {
            debug!(session_id = %session.id, "No subscribers for session results");
            return Ok(DispatchReport::default());
        }

        let mut report = DispatchReport::default();
        for subscription in &subscriptions {
            match self.sender.send(subscription, &content).await {
                PushOutcome::Delivered => report.delivered += 1,
                PushOutcome::Gone => {
                    self.db.subscriptions().deactivate(subscription.id).await?;
                    report.deactivated += 1;
                }
                PushOutcome::Failed(reason) => {
                    warn!(
                        subscription_id = subscription.id,
                        reason = %reason,
                        "Push delivery failed"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            session_id = %session.id,
            delivered = report.delivered,
            deactivated = report.deactivated,
            failed = report.failed,
            "Session results dispatched"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pokernight_core::{compute_chip_distribution, Money};
    use pokernight_db::{DbConfig, NewSubscription};
    use std::sync::Mutex;

    /// Reports `Gone` for one endpoint and records everything it sees.
    struct ScriptedSender {
        gone_endpoint: String,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PushSender for ScriptedSender {
        async fn send(
            &self,
            subscription: &PushSubscription,
            content: &NotificationContent,
        ) -> PushOutcome {
            self.seen.lock().unwrap().push(content.body.clone());
            if subscription.endpoint == self.gone_endpoint {
                PushOutcome::Gone
            } else {
                PushOutcome::Delivered
            }
        }
    }

    #[tokio::test]
    async fn test_dispatch_deactivates_gone_endpoints() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let buy_in = Money::from_cents(2000);
        let session = db
            .sessions()
            .create(
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                buy_in,
                &compute_chip_distribution(buy_in).unwrap(),
            )
            .await
            .unwrap();

        let (alice, _) = db.players().find_or_create("Alice").await.unwrap();
        let (bob, _) = db.players().find_or_create("Bob").await.unwrap();
        db.entries().add_buy_ins(&session.id, &alice.id, 1, buy_in).await.unwrap();
        db.entries().add_buy_ins(&session.id, &bob.id, 1, buy_in).await.unwrap();
        db.entries()
            .set_payout(&session.id, &alice.id, Money::from_cents(4000))
            .await
            .unwrap();

        for (player, endpoint) in [(&alice, "https://push.test/a"), (&bob, "https://push.test/b")] {
            db.subscriptions()
                .subscribe(&NewSubscription {
                    player_id: player.id.clone(),
                    session_id: session.id.clone(),
                    endpoint: endpoint.to_string(),
                    auth: "auth".to_string(),
                    p256dh: "key".to_string(),
                })
                .await
                .unwrap();
        }

        let sender = ScriptedSender {
            gone_endpoint: "https://push.test/b".to_string(),
            seen: Mutex::new(Vec::new()),
        };
        let report = NotificationService::new(&db, &sender)
            .send_session_results(&session)
            .await
            .unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(report.deactivated, 1);
        assert_eq!(report.failed, 0);

        let seen = sender.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].starts_with("Alice won with $20.00 profit!"));
        drop(seen);

        let remaining = db.subscriptions().active_for_session(&session.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].player_id, alice.id);
    }

    #[tokio::test]
    async fn test_dispatch_without_subscribers() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let buy_in = Money::from_cents(2000);
        let session = db
            .sessions()
            .create(
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                buy_in,
                &compute_chip_distribution(buy_in).unwrap(),
            )
            .await
            .unwrap();

        let report = NotificationService::new(&db, &LogPushSender)
            .send_session_results(&session)
            .await
            .unwrap();
        assert_eq!(report, DispatchReport::default());
    }
}
