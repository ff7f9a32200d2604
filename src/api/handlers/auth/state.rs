//! Auth configuration and shared state.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use super::{password::PasswordHasher, store::SessionStore};

const DEFAULT_SESSION_TTL_SECONDS: u64 = 24 * 60 * 60;
pub const DEFAULT_SECRET_KEY: &str = "dev-key-change-in-production";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    secret_key: SecretString,
    session_ttl_seconds: u64,
    session_cookie_secure: bool,
    password_hasher: PasswordHasher,
}

impl AuthConfig {
    #[must_use]
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            secret_key,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            session_cookie_secure: true,
            password_hasher: PasswordHasher::default(),
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: u64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    /// Secure cookies are sent as `SameSite=None; Secure` so a frontend on
    /// another origin can use them; insecure ones fall back to `SameSite=Lax`.
    #[must_use]
    pub fn with_session_cookie_secure(mut self, secure: bool) -> Self {
        self.session_cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn with_password_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.password_hasher = hasher;
        self
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.session_cookie_secure
    }

    #[must_use]
    pub fn password_hasher(&self) -> &PasswordHasher {
        &self.password_hasher
    }

    /// `true` when the built-in development key is in use.
    #[must_use]
    pub fn uses_default_secret(&self) -> bool {
        self.secret_key.expose_secret() == DEFAULT_SECRET_KEY
    }
}

pub struct AuthState {
    config: AuthConfig,
    sessions: SessionStore,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        let sessions = SessionStore::new(
            config.secret_key.clone(),
            Duration::from_secs(config.session_ttl_seconds),
        );
        Self { config, sessions }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AuthConfig::new(SecretString::from(DEFAULT_SECRET_KEY.to_string()));
        assert_eq!(config.session_ttl_seconds(), DEFAULT_SESSION_TTL_SECONDS);
        assert!(config.session_cookie_secure());
        assert!(config.uses_default_secret());
    }

    #[test]
    fn builder_overrides() {
        let config = AuthConfig::new(SecretString::from("s3cret".to_string()))
            .with_session_ttl_seconds(60)
            .with_session_cookie_secure(false);
        assert_eq!(config.session_ttl_seconds(), 60);
        assert!(!config.session_cookie_secure());
        assert!(!config.uses_default_secret());

        let state = AuthState::new(config);
        assert_eq!(state.sessions().ttl(), Duration::from_secs(60));
    }
}
