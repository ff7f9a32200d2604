//! Process-local session records.
//!
//! Records are keyed by a digest of the cookie token, never the token itself.
//! A record caches the role seen at login; role changes made afterwards are
//! picked up on the next login.

use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use tracing::debug;

use super::utils::{generate_session_token, hash_session_token};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: i64,
    pub email: String,
    /// Role snapshot captured at login.
    pub role: String,
    issued_at: Instant,
}

impl SessionRecord {
    #[must_use]
    pub fn age(&self) -> Duration {
        self.issued_at.elapsed()
    }
}

pub struct SessionStore {
    secret: SecretString,
    ttl: Duration,
    sessions: RwLock<HashMap<Vec<u8>, SessionRecord>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(secret: SecretString, ttl: Duration) -> Self {
        Self {
            secret,
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key(&self, token: &str) -> Vec<u8> {
        hash_session_token(self.secret.expose_secret().as_bytes(), token)
    }

    fn expired(&self, record: &SessionRecord) -> bool {
        record.age() >= self.ttl
    }

    /// Issue a new session and return the raw token for the cookie.
    ///
    /// # Errors
    /// Returns an error if the system RNG fails.
    pub async fn create(&self, user_id: i64, email: String, role: String) -> Result<String> {
        let token = generate_session_token()?;
        let record = SessionRecord {
            user_id,
            email,
            role,
            issued_at: Instant::now(),
        };

        let key = self.key(&token);
        let mut sessions = self.sessions.write().await;
        let ttl = self.ttl;
        sessions.retain(|_, existing| existing.age() < ttl);
        sessions.insert(key, record);
        debug!(user_id, active_sessions = sessions.len(), "session created");
        drop(sessions);

        Ok(token)
    }

    /// Look up a live session. Expired records are dropped on sight.
    pub async fn get(&self, token: &str) -> Option<SessionRecord> {
        let key = self.key(token);
        {
            let sessions = self.sessions.read().await;
            match sessions.get(&key) {
                None => return None,
                Some(record) if !self.expired(record) => return Some(record.clone()),
                Some(_) => {}
            }
        }

        self.sessions.write().await.remove(&key);
        None
    }

    /// Destroy a session; returns whether one existed.
    pub async fn remove(&self, token: &str) -> bool {
        let key = self.key(token);
        self.sessions.write().await.remove(&key).is_some()
    }

    /// Drop every expired record and return how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let ttl = self.ttl;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| record.age() < ttl);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
