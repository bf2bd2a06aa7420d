//! Account service: username/password bookkeeping.
//!
//! spec.md treats account management as an external service the
//! exchange merely calls into; this module is that service's in-memory
//! stand-in, kept as a trait so a real deployment can swap it out
//! without touching `server`.

use dashmap::DashMap;
use std::fmt;

#[derive(Debug)]
#[non_exhaustive]
pub enum AccountError {
    UsernameTaken { username: String },
    UnknownUser { username: String },
    WrongPassword,
}

impl fmt::Display for AccountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountError::UsernameTaken { username } => write!(f, "username already registered: {username}"),
            AccountError::UnknownUser { username } => write!(f, "unknown user: {username}"),
            AccountError::WrongPassword => write!(f, "incorrect password"),
        }
    }
}

impl std::error::Error for AccountError {}

impl AccountError {
    /// Wire response code this error maps to (spec.md §6-§7).
    pub fn response_code(&self) -> u32 {
        match self {
            AccountError::UnknownUser { .. } => 102,
            AccountError::UsernameTaken { .. } => 102,
            AccountError::WrongPassword => 101,
        }
    }
}

pub trait AccountService: Send + Sync {
    fn register(&self, username: &str, password: &str) -> Result<(), AccountError>;
    fn authenticate(&self, username: &str, password: &str) -> Result<(), AccountError>;
    fn update_password(&self, username: &str, old_password: &str, new_password: &str) -> Result<(), AccountError>;
}

/// Plaintext in-memory credential store. Fine for this exchange's
/// scope, which never specifies a hashing scheme; swap in a real
/// implementation before exposing this outside a trusted network.
#[derive(Default)]
pub struct InMemoryAccountService {
    credentials: DashMap<String, String>,
}

impl InMemoryAccountService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountService for InMemoryAccountService {
    fn register(&self, username: &str, password: &str) -> Result<(), AccountError> {
        if self.credentials.contains_key(username) {
            return Err(AccountError::UsernameTaken {
                username: username.to_string(),
            });
        }
        self.credentials.insert(username.to_string(), password.to_string());
        Ok(())
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<(), AccountError> {
        let stored = self.credentials.get(username).ok_or_else(|| AccountError::UnknownUser {
            username: username.to_string(),
        })?;
        if stored.value() == password {
            Ok(())
        } else {
            Err(AccountError::WrongPassword)
        }
    }

    fn update_password(&self, username: &str, old_password: &str, new_password: &str) -> Result<(), AccountError> {
        self.authenticate(username, old_password)?;
        self.credentials.insert(username.to_string(), new_password.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_authenticate() {
        let service = InMemoryAccountService::new();
        service.register("alice", "hunter2").unwrap();
        assert!(service.authenticate("alice", "hunter2").is_ok());
        assert!(matches!(service.authenticate("alice", "wrong"), Err(AccountError::WrongPassword)));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let service = InMemoryAccountService::new();
        service.register("alice", "hunter2").unwrap();
        assert!(matches!(
            service.register("alice", "other"),
            Err(AccountError::UsernameTaken { .. })
        ));
    }

    #[test]
    fn update_password_requires_old_password() {
        let service = InMemoryAccountService::new();
        service.register("alice", "hunter2").unwrap();
        assert!(service.update_password("alice", "wrong", "new").is_err());
        service.update_password("alice", "hunter2", "new").unwrap();
        assert!(service.authenticate("alice", "new").is_ok());
    }
}
