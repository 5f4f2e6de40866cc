use std::collections::HashMap;
use uuid::Uuid;

use crate::error::AuthError;
use crate::store::{Account, Store};
use crate::util::hash::{hash_password, verify_password};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub email: String,
}

/// Email/password sign-in against the accounts table, gated by an admin
/// allow-list. Sessions live in memory and end with the process.
#[derive(Debug, Default)]
pub struct Auth {
    allow_list: Vec<String>,
    sessions: HashMap<String, Session>,
}

impl Auth {
    pub fn new(allow_list: Vec<String>) -> Self {
        Self {
            allow_list,
            sessions: HashMap::new(),
        }
    }

    /// An empty allow-list admits every account.
    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return false;
        }
        self.allow_list.is_empty() || self.allow_list.contains(&email)
    }

    /// Returns a session token. A valid login for a non-admin account is
    /// signed straight back out and reported as `AccessDenied`. The email is
    /// trimmed; the password is compared exactly as typed.
    pub fn sign_in(&mut self, store: &Store, email: &str, password: &str) -> Result<String, AuthError> {
        let email = email.trim();
        let account = store
            .find_account(email)?
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(password, &account.password_hash) {
            tracing::warn!(email = %account.email, "sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        }
        if !self.is_admin(&account.email) {
            tracing::warn!(email = %account.email, "access denied for non-admin account");
            return Err(AuthError::AccessDenied);
        }

        let token = Uuid::new_v4().to_string();
        self.sessions.insert(
            token.clone(),
            Session {
                email: account.email.clone(),
            },
        );
        tracing::info!(email = %account.email, "admin signed in");
        Ok(token)
    }

    pub fn sign_out(&mut self, token: &str) {
        if let Some(session) = self.sessions.remove(token) {
            tracing::info!(email = %session.email, "admin signed out");
        }
    }

    pub fn session(&self, token: &str) -> Result<&Session, AuthError> {
        self.sessions.get(token).ok_or(AuthError::UnknownSession)
    }
}

/// Creates or resets the password of an account.
pub fn register_account(store: &mut Store, email: &str, password: &str) -> Result<(), AuthError> {
    let password_hash = hash_password(password).map_err(|err| AuthError::Hash(err.to_string()))?;
    let account = Account {
        email: email.trim().to_lowercase(),
        password_hash,
    };
    store.put_account(&account)?;
    tracing::info!(email = %account.email, "account saved");
    Ok(())
}
