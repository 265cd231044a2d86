//! Admin gate: a password-checked edit mode.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::{info, warn};

use crate::error::AuthError;

/// The single static admin credential.
#[derive(Clone)]
pub enum AdminCredential {
    Plain(String),
    /// Argon2 PHC string, e.g. `$argon2id$v=19$...`
    Argon2(String),
    /// No credential configured; every attempt fails.
    Disabled,
}

impl std::fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminCredential::Plain(_) => f.write_str("Plain(***)"),
            AdminCredential::Argon2(_) => f.write_str("Argon2(***)"),
            AdminCredential::Disabled => f.write_str("Disabled"),
        }
    }
}

impl AdminCredential {
    /// Values starting with `$argon2` are treated as hashes, anything else as plain text.
    pub fn from_setting(value: Option<&str>) -> Self {
        match value {
            None | Some("") => AdminCredential::Disabled,
            Some(v) if v.starts_with("$argon2") => AdminCredential::Argon2(v.to_string()),
            Some(v) => AdminCredential::Plain(v.to_string()),
        }
    }

    pub fn verify(&self, input: &str) -> Result<(), AuthError> {
        match self {
            AdminCredential::Plain(expected) if expected == input => Ok(()),
            AdminCredential::Plain(_) => Err(AuthError::InvalidCredential),
            AdminCredential::Argon2(hash) => {
                let parsed = PasswordHash::new(hash).map_err(|e| {
                    warn!("Configured admin hash is unusable: {}", e);
                    AuthError::HashError(e.to_string())
                })?;
                Argon2::default()
                    .verify_password(input.as_bytes(), &parsed)
                    .map_err(|_| AuthError::InvalidCredential)
            }
            AdminCredential::Disabled => Err(AuthError::Disabled),
        }
    }

    /// PHC string for a password, suitable for the `admin.password` setting.
    pub fn hash(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::HashError(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Locked,
    Unlocked,
}

/// Locked by default. No attempt counter, no lockout, no timeout.
#[derive(Debug)]
pub struct AdminGate {
    credential: AdminCredential,
    state: GateState,
}

impl AdminGate {
    pub fn new(credential: AdminCredential) -> Self {
        Self {
            credential,
            state: GateState::Locked,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == GateState::Unlocked
    }

    /// Checks the typed password. On success the gate unlocks and `input` is
    /// cleared; on failure nothing changes.
    pub fn attempt_login(&mut self, input: &mut String) -> Result<(), AuthError> {
        match self.credential.verify(input) {
            Ok(()) => {
                self.state = GateState::Unlocked;
                input.clear();
                info!("Admin session unlocked");
                Ok(())
            }
            Err(e) => {
                warn!("Admin login rejected: {}", e);
                Err(e)
            }
        }
    }

    pub fn lock(&mut self) {
        if self.state == GateState::Unlocked {
            info!("Admin session locked");
        }
        self.state = GateState::Locked;
    }
}
