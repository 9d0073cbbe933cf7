use moka::future::Cache;
use std::time::Duration;

/// `jti`s of sessions ended by logout. Entries outlive the token they
/// revoke, after which the token's own expiry rejects it.
#[derive(Clone)]
pub struct SessionRevocations {
    revoked: Cache<String, ()>,
}

impl SessionRevocations {
    pub fn new(session_ttl: Duration) -> Self {
        Self {
            // No size bound: an evicted entry would make its token valid
            // again. Entries leave only through the TTL.
            revoked: Cache::builder()
                .time_to_live(session_ttl)
                .build(),
        }
    }

    pub async fn revoke(&self, jti: &str) {
        self.revoked.insert(jti.to_string(), ()).await;
    }

    pub async fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.get(jti).await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn revoked_ids_are_remembered() {
        let revocations = SessionRevocations::new(Duration::from_secs(60));
        assert!(!revocations.is_revoked("a").await);

        revocations.revoke("a").await;
        assert!(revocations.is_revoked("a").await);
        assert!(!revocations.is_revoked("b").await);
    }

    #[actix_web::test]
    async fn revocations_survive_cache_maintenance() {
        let revocations = SessionRevocations::new(Duration::from_secs(60));
        for i in 0..5_000 {
            revocations.revoke(&format!("jti-{i}")).await;
        }
        revocations.revoked.run_pending_tasks().await;

        assert!(revocations.is_revoked("jti-0").await);
        assert!(revocations.is_revoked("jti-4999").await);
        assert_eq!(revocations.revoked.entry_count(), 5_000);
    }
}
