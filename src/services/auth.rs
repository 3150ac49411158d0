//! Authentication and account service

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rand::rngs::OsRng;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{RegisterUser, Role, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a reader account
    pub async fn register(&self, request: RegisterUser) -> AppResult<User> {
        request.validate()?;

        if self
            .repository
            .users
            .username_or_email_exists(&request.username, &request.email)
            .await?
        {
            return Err(AppError::BadRequest(
                "Username or email already taken".to_string(),
            ));
        }

        let hashed = hash_password(&request.password)?;
        let user = self
            .repository
            .users
            .create(&request.username, &request.email, &hashed, Role::Reader)
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check credentials and issue a JWT
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let invalid = || AppError::Authentication("Invalid username or password".to_string());

        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&user.hashed_password, password)? {
            tracing::debug!(username, "Login refused: bad password");
            return Err(invalid());
        }

        let token = self.create_token(&user)?;
        Ok((token, user))
    }

    pub fn create_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            role: user.role,
            exp: now + self.config.jwt_expiration_hours as i64 * 3600,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Create the configured admin account unless the username is taken
    pub async fn ensure_admin(&self) -> AppResult<()> {
        let Some((username, email, password)) = self.config.bootstrap_admin() else {
            return Ok(());
        };

        if self.repository.users.get_by_username(username).await?.is_some() {
            tracing::debug!(username, "Admin account already present");
            return Ok(());
        }

        let hashed = hash_password(password)?;
        let admin = self
            .repository
            .users
            .create(username, email, &hashed, Role::Admin)
            .await?;
        tracing::info!(user_id = admin.id, username, "Admin account created");
        Ok(())
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
