//! Signup and token-exchange flow.
//!
//! Accounts are created without a password: signup stores the hash of a
//! single-use confirmation code and mails the plaintext; the token exchange
//! trades a valid code for a bearer token and activates the account.

use std::sync::Arc;

use thiserror::Error;
use tokio::task;
use tracing::warn;

use crate::config::SecurityConfig;
use crate::constants;
use crate::db::repositories::user::{
    generate_access_token, generate_confirmation_code, hash_code, verify_code,
};
use crate::db::{NewUser, Store, is_unique_violation};
use crate::domain::Role;
use crate::services::Mailer;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Email is already taken")]
    EmailTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid confirmation code")]
    InvalidCode,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

pub struct AuthService {
    store: Store,
    mailer: Arc<dyn Mailer>,
    security: SecurityConfig,
}

impl AuthService {
    #[must_use]
    pub fn new(store: Store, mailer: Arc<dyn Mailer>, security: SecurityConfig) -> Self {
        Self {
            store,
            mailer,
            security,
        }
    }

    /// Register an account (or re-request a code for an existing one).
    ///
    /// Retrying with the exact (username, email) pair of an existing account
    /// is idempotent: a fresh code replaces the outstanding one. A collision
    /// on only one of the two fields is a conflict.
    pub async fn signup(&self, username: &str, email: &str) -> Result<(), AuthError> {
        let code = generate_confirmation_code();
        let code_hash = self.hash_in_background(code.clone()).await?;

        if let Some(user) = self
            .store
            .get_user_by_username_and_email(username, email)
            .await?
        {
            self.store
                .set_confirmation_code(&user.username, &code_hash)
                .await?;
            self.send_code(&user.username, &user.email, &code).await;
            return Ok(());
        }

        let created = self
            .store
            .create_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                role: Role::User,
                confirmation_code_hash: Some(code_hash),
                is_active: false,
                ..Default::default()
            })
            .await;

        match created {
            Ok(user) => {
                self.send_code(&user.username, &user.email, &code).await;
                Ok(())
            }
            // The unique constraint decided; figure out which field lost.
            Err(err) if is_unique_violation(&err) => {
                if self.store.email_exists(email).await? {
                    Err(AuthError::EmailTaken)
                } else {
                    Err(AuthError::UsernameTaken)
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Exchange a confirmation code for a bearer token, activating the
    /// account. The code is single-use: it is cleared on success.
    pub async fn exchange_token(
        &self,
        username: &str,
        confirmation_code: &str,
    ) -> Result<String, AuthError> {
        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let Some(code_hash) = user.confirmation_code_hash else {
            return Err(AuthError::InvalidCode);
        };

        if !verify_code(&code_hash, confirmation_code).await? {
            return Err(AuthError::InvalidCode);
        }

        let token = generate_access_token();
        self.store
            .activate_user_with_token(&user.username, &token)
            .await?;

        Ok(token)
    }

    async fn hash_in_background(&self, code: String) -> Result<String, AuthError> {
        let security = self.security.clone();
        task::spawn_blocking(move || hash_code(&code, Some(&security)))
            .await
            .map_err(|e| AuthError::Internal(format!("Code hashing task panicked: {e}")))?
            .map_err(Into::into)
    }

    /// Mail failure must not undo the account effect; log and move on.
    async fn send_code(&self, username: &str, email: &str, code: &str) {
        let body = format!("Hello, {username}.\nYour confirmation code: {code}");
        if let Err(e) = self
            .mailer
            .send(email, constants::mail::SIGNUP_SUBJECT, &body)
            .await
        {
            warn!("Failed to send confirmation code to {email}: {e}");
        }
    }
}
