use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::domain::Role;
use crate::entities::users;

/// Fields for a new account row. Signup creates inactive accounts with an
/// outstanding confirmation code; admin-created accounts start active.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub bio: String,
    pub first_name: String,
    pub last_name: String,
    pub confirmation_code_hash: Option<String>,
    pub is_active: bool,
}

/// Partial update for an account; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<Role>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")
    }

    pub async fn get_by_username_and_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by username and email")
    }

    /// Resolve a bearer token to the account it was issued to.
    pub async fn get_by_access_token(&self, token: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::AccessToken.eq(token))
            .filter(users::Column::IsActive.eq(true))
            .one(&self.conn)
            .await
            .context("Failed to query user by access token")
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("Failed to count users by email")?;
        Ok(count > 0)
    }

    pub async fn create(&self, new_user: NewUser) -> Result<users::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            role: Set(new_user.role.as_str().to_string()),
            bio: Set(new_user.bio),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            confirmation_code_hash: Set(new_user.confirmation_code_hash),
            access_token: Set(None),
            is_active: Set(new_user.is_active),
            is_superuser: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active.insert(&self.conn).await.context("Failed to insert user")
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<users::Model>, u64)> {
        let mut query = users::Entity::find();
        if let Some(prefix) = search {
            query = query.filter(users::Column::Username.starts_with(prefix));
        }

        let count = query
            .clone()
            .count(&self.conn)
            .await
            .context("Failed to count users")?;

        let rows = query
            .order_by_asc(users::Column::Username)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok((rows, count))
    }

    pub async fn update(
        &self,
        username: &str,
        update: UserUpdate,
    ) -> Result<Option<users::Model>> {
        let Some(user) = self.get_by_username(username).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        if let Some(new_username) = update.username {
            active.username = Set(new_username);
        }
        if let Some(email) = update.email {
            active.email = Set(email);
        }
        if let Some(first_name) = update.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = update.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(bio) = update.bio {
            active.bio = Set(bio);
        }
        if let Some(role) = update.role {
            active.role = Set(role.as_str().to_string());
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update user")?;
        Ok(Some(updated))
    }

    pub async fn delete(&self, username: &str) -> Result<bool> {
        let result = users::Entity::delete_many()
            .filter(users::Column::Username.eq(username))
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;
        Ok(result.rows_affected > 0)
    }

    /// Store a freshly generated confirmation-code hash, replacing any
    /// outstanding one.
    pub async fn set_confirmation_code(&self, username: &str, code_hash: &str) -> Result<()> {
        let user = self
            .get_by_username(username)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found: {username}"))?;

        let mut active: users::ActiveModel = user.into();
        active.confirmation_code_hash = Set(Some(code_hash.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Activate the account, clear the single-use confirmation code and
    /// persist the issued bearer token.
    pub async fn activate_with_token(&self, username: &str, token: &str) -> Result<()> {
        let user = self
            .get_by_username(username)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found: {username}"))?;

        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(true);
        active.confirmation_code_hash = Set(None);
        active.access_token = Set(Some(token.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }
}

/// Hash a confirmation code using Argon2id with optional custom params.
pub fn hash_code(code: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(code.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash confirmation code: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a confirmation code against its stored hash.
/// Note: this uses `spawn_blocking` because Argon2 is CPU-intensive and
/// would block the async runtime if run directly.
pub async fn verify_code(code_hash: &str, code: &str) -> Result<bool> {
    let code_hash = code_hash.to_string();
    let code = code.to_string();

    let is_valid = task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&code_hash)
            .map_err(|e| anyhow::anyhow!("Invalid confirmation code hash format: {e}"))?;

        let argon2 = Argon2::default();
        Ok::<bool, anyhow::Error>(argon2.verify_password(code.as_bytes(), &parsed_hash).is_ok())
    })
    .await
    .context("Confirmation code verification task panicked")??;

    Ok(is_valid)
}

/// Generate a random confirmation code (12 character hex string).
#[must_use]
pub fn generate_confirmation_code() -> String {
    random_hex::<6>()
}

/// Generate a random bearer token (64 character hex string).
#[must_use]
pub fn generate_access_token() -> String {
    random_hex::<32>()
}

fn random_hex<const N: usize>() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; N] = rng.random();

    bytes.iter().fold(String::with_capacity(N * 2), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
