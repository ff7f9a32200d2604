//! Argon2id password hashing.

use anyhow::{Result, anyhow};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
};
use rand::{RngCore, rngs::OsRng};
use std::sync::OnceLock;

const DUMMY_PASSWORD: &str = "alumna-unknown-account";

/// Hashes new passwords with fixed Argon2id parameters.
///
/// Verification reads the parameters embedded in the stored PHC string, so
/// hashes made with other parameters still verify.
#[derive(Clone, Debug)]
pub struct PasswordHasher {
    params: Params,
    // Hash made with `params`, verified against when no account matched.
    dummy: OnceLock<String>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
            dummy: OnceLock::new(),
        }
    }
}

impl PasswordHasher {
    /// # Errors
    /// Returns an error if the parameters are outside Argon2's accepted ranges.
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| anyhow!("invalid argon2 parameters: {e}"))?;
        Ok(Self {
            params,
            dummy: OnceLock::new(),
        })
    }

    /// Hash a plaintext password into a PHC string.
    ///
    /// # Errors
    /// Returns an error if salt generation or hashing fails.
    pub fn hash(&self, password: &str) -> Result<String> {
        let mut salt_bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|e| anyhow!("failed to generate password salt: {e}"))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let phc = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("failed to hash password: {e}"))?
            .to_string();
        Ok(phc)
    }

    /// Spend the cost of one verification without an account to check.
    ///
    /// Used when a login names no account, so the response takes as long as
    /// a wrong password would.
    pub fn verify_unknown(&self, password: &str) {
        let dummy = self
            .dummy
            .get_or_init(|| self.hash(DUMMY_PASSWORD).unwrap_or_default());
        let _ = verify_password(dummy, password);
    }

    #[cfg(test)]
    pub(crate) fn has_unknown_account_hash(&self) -> bool {
        self.dummy.get().is_some_and(|hash| !hash.is_empty())
    }
}

/// Check a plaintext password against a stored PHC string.
///
/// Unparseable hashes never verify.
#[must_use]
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    PasswordHash::new(stored_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}
