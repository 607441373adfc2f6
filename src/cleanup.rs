//! Scheduled cleanup of expired refresh tokens.

use crate::db::Database;
use crate::jwt::now_secs;
use std::time::Duration;
use tracing::{error, info};

/// Interval between cleanup runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60); // 1 hour

/// Run all cleanup tasks once.
pub async fn run_cleanup(db: &Database) {
    let now = match now_secs() {
        Ok(now) => now,
        Err(e) => {
            error!("Failed to read clock for cleanup: {}", e);
            return;
        }
    };

    match db.users().clear_expired_refresh_tokens(now).await {
        Ok(count) if count > 0 => info!("Cleared {} expired refresh tokens", count),
        Ok(_) => {}
        Err(e) => error!("Failed to clear expired refresh tokens: {}", e),
    }
}

/// Spawn a background task that runs cleanup periodically.
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_scheduler(db: Database) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            interval.tick().await;
            run_cleanup(&db).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{IdentityProvider, Registration, UserDirectory};

    #[tokio::test]
    async fn test_cleanup_clears_only_expired() {
        let db = Database::open(":memory:").await.unwrap();
        let users = db.users();
        let now = now_secs().unwrap();

        let mut ids = Vec::new();
        for email in ["old@example.com", "live@example.com"] {
            let identity = users
                .register(Registration {
                    display_name: "User".to_string(),
                    email: email.to_string(),
                    phone_number: "5550100".to_string(),
                    password: "hunter22".to_string(),
                })
                .await
                .unwrap();
            ids.push(identity.user_id);
        }
        users
            .store_refresh_token(&ids[0], "old", now - 10)
            .await
            .unwrap();
        users
            .store_refresh_token(&ids[1], "live", now + 3600)
            .await
            .unwrap();

        run_cleanup(&db).await;

        let old = users.get_by_uuid(&ids[0]).await.unwrap().unwrap();
        let live = users.get_by_uuid(&ids[1]).await.unwrap().unwrap();
        assert_eq!(old.refresh_token, None);
        assert_eq!(live.refresh_token.as_deref(), Some("live"));
    }
}
