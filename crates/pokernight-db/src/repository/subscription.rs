//! # Push Subscription Repository
//!
//! Browser push endpoints registered per player and session. One row per
//! (player, session); re-subscribing replaces the keys and reactivates it.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use pokernight_core::PushSubscription;

#[derive(Debug, Clone, sqlx::FromRow)]
struct SubscriptionRecord {
    id: i64,
    player_id: String,
    session_id: String,
    endpoint: String,
    auth: String,
    p256dh: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<SubscriptionRecord> for PushSubscription {
    fn from(r: SubscriptionRecord) -> Self {
        PushSubscription {
            id: r.id,
            player_id: r.player_id,
            session_id: r.session_id,
            endpoint: r.endpoint,
            auth: r.auth,
            p256dh: r.p256dh,
            is_active: r.is_active,
            created_at: r.created_at,
        }
    }
}

const SUBSCRIPTION_COLUMNS: &str =
    "id, player_id, session_id, endpoint, auth, p256dh, is_active, created_at";

/// Validated subscription request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub player_id: String,
    pub session_id: String,
    pub endpoint: String,
    pub auth: String,
    pub p256dh: String,
}

#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: SqlitePool,
}

impl SubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SubscriptionRepository { pool }
    }

    /// Creates the subscription or refreshes the existing one.
    pub async fn subscribe(&self, sub: &NewSubscription) -> DbResult<PushSubscription> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, SubscriptionRecord>(&format!(
            r#"
            INSERT INTO push_subscriptions
                (player_id, session_id, endpoint, auth, p256dh, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
            ON CONFLICT (player_id, session_id) DO UPDATE SET
                endpoint = excluded.endpoint,
                auth = excluded.auth,
                p256dh = excluded.p256dh,
                is_active = 1,
                updated_at = excluded.updated_at
            RETURNING {}
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(&sub.player_id)
        .bind(&sub.session_id)
        .bind(&sub.endpoint)
        .bind(&sub.auth)
        .bind(&sub.p256dh)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!(
            player_id = %sub.player_id,
            session_id = %sub.session_id,
            subscription_id = record.id,
            "Push subscription saved"
        );
        Ok(record.into())
    }

    /// Deactivates the player's subscription for a session.
    ///
    /// Fails with `NotFound` when there is no active subscription.
    pub async fn unsubscribe(&self, player_id: &str, session_id: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE push_subscriptions SET is_active = 0, updated_at = ?1
            WHERE player_id = ?2 AND session_id = ?3 AND is_active = 1
            "#,
        )
        .bind(Utc::now())
        .bind(player_id)
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "Subscription",
                format!("{}/{}", player_id, session_id),
            ));
        }

        info!(player_id = %player_id, session_id = %session_id, "Push subscription deactivated");
        Ok(())
    }

    /// Active subscriptions of a player.
    pub async fn list_for_player(&self, player_id: &str) -> DbResult<Vec<PushSubscription>> {
        let records = sqlx::query_as::<_, SubscriptionRecord>(&format!(
            "SELECT {} FROM push_subscriptions WHERE player_id = ?1 AND is_active = 1 ORDER BY id",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(PushSubscription::from).collect())
    }

    /// Active subscriptions to notify when a session ends.
    pub async fn active_for_session(&self, session_id: &str) -> DbResult<Vec<PushSubscription>> {
        let records = sqlx::query_as::<_, SubscriptionRecord>(&format!(
            "SELECT {} FROM push_subscriptions WHERE session_id = ?1 AND is_active = 1 ORDER BY id",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(PushSubscription::from).collect())
    }

    /// Marks an endpoint dead after the push service rejected it.
    pub async fn deactivate(&self, id: i64) -> DbResult<()> {
        sqlx::query("UPDATE push_subscriptions SET is_active = 0, updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(subscription_id = id, "Push subscription deactivated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use pokernight_core::{compute_chip_distribution, Money};

    async fn setup() -> (Database, String, String) {
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
        (db, alice.id, session.id)
    }

    fn request(player_id: &str, session_id: &str, endpoint: &str) -> NewSubscription {
        NewSubscription {
            player_id: player_id.to_string(),
            session_id: session_id.to_string(),
            endpoint: endpoint.to_string(),
            auth: "auth-key".to_string(),
            p256dh: "p256dh-key".to_string(),
        }
    }

    #[tokio::test]
    async fn test_subscribe_is_upsert() {
        let (db, player, session) = setup().await;
        let repo = db.subscriptions();

        let first = repo
            .subscribe(&request(&player, &session, "https://push.example/a"))
            .await
            .unwrap();
        let second = repo
            .subscribe(&request(&player, &session, "https://push.example/b"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.endpoint, "https://push.example/b");
        assert_eq!(repo.list_for_player(&player).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_and_resubscribe() {
        let (db, player, session) = setup().await;
        let repo = db.subscriptions();
        repo.subscribe(&request(&player, &session, "https://push.example/a"))
            .await
            .unwrap();

        repo.unsubscribe(&player, &session).await.unwrap();
        assert!(repo.active_for_session(&session).await.unwrap().is_empty());
        assert!(matches!(
            repo.unsubscribe(&player, &session).await,
            Err(DbError::NotFound { .. })
        ));

        let again = repo
            .subscribe(&request(&player, &session, "https://push.example/a"))
            .await
            .unwrap();
        assert!(again.is_active);
    }

    #[tokio::test]
    async fn test_deactivate() {
        let (db, player, session) = setup().await;
        let repo = db.subscriptions();
        let sub = repo
            .subscribe(&request(&player, &session, "https://push.example/a"))
            .await
            .unwrap();

        repo.deactivate(sub.id).await.unwrap();
        assert!(repo.list_for_player(&player).await.unwrap().is_empty());
    }
}
