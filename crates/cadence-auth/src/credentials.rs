//! Account credential service.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use cadence_core::{
    AuthMethod, AuthPrincipal, Authenticator, Error, NewUser, Result, User, UserRepository,
};

use crate::api_key::{generate_api_key, hash_api_key, looks_like_api_key};
use crate::error::AuthError;
use crate::password::{hash_password, verify_password};
use crate::tokens::{TokenIssuer, TokenKind};

/// Registration payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Tokens returned by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub username: String,
    pub user_id: Uuid,
}

/// A fresh access token minted from a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

/// Registration, login and bearer resolution over a [`UserRepository`].
#[derive(Clone)]
pub struct Credentials {
    users: Arc<dyn UserRepository>,
    tokens: TokenIssuer,
}

impl Credentials {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenIssuer) -> Self {
        Self { users, tokens }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Create an account. Username clashes are reported before email clashes.
    #[instrument(skip(self, request), fields(subsystem = "auth", op = "register"))]
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        let username = request.username.trim();
        let email = request.email.trim();
        if username.is_empty() {
            return Err(Error::InvalidInput("Username must not be empty".into()));
        }
        if !email.contains('@') {
            return Err(Error::InvalidInput("Invalid email address".into()));
        }
        if request.password.is_empty() {
            return Err(Error::InvalidInput("Password must not be empty".into()));
        }

        if self.users.find_by_username(username).await?.is_some() {
            warn!(username, "Attempt to register with an existing username");
            return Err(AuthError::UsernameTaken.into());
        }
        if self.users.find_by_email(email).await?.is_some() {
            warn!("Attempt to register with an existing email");
            return Err(AuthError::EmailTaken.into());
        }

        let password_hash = hash_password(&request.password)?;
        let user = self
            .users
            .create(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "New user registered");
        Ok(user)
    }

    /// Exchange email and password for an access/refresh token pair.
    #[instrument(skip(self, email, password), fields(subsystem = "auth", op = "login"))]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let user = match self.users.find_by_email(email.trim()).await? {
            Some(user) if verify_password(password, &user.password_hash) => user,
            _ => {
                warn!("Failed login attempt");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        info!(user_id = %user.id, "User logged in");
        Ok(TokenPair {
            access_token: self.tokens.issue_access(user.id),
            refresh_token: self.tokens.issue_refresh(user.id),
            token_type: "bearer".to_string(),
            username: user.username,
            user_id: user.id,
        })
    }

    /// Mint a new access token from a refresh token.
    #[instrument(skip(self, refresh_token), fields(subsystem = "auth", op = "refresh"))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessToken> {
        let claims = self.tokens.verify(refresh_token, TokenKind::Refresh)?;
        if self.users.get(claims.sub).await?.is_none() {
            return Err(AuthError::UnknownUser.into());
        }
        Ok(AccessToken {
            access_token: self.tokens.issue_access(claims.sub),
            token_type: "bearer".to_string(),
        })
    }

    /// Issue a new API key, replacing any previous one. Returns the plaintext key.
    #[instrument(skip(self), fields(subsystem = "auth", op = "regenerate_api_key"))]
    pub async fn regenerate_api_key(&self, user_id: Uuid) -> Result<String> {
        let key = generate_api_key();
        self.users
            .set_api_key_hash(user_id, Some(&hash_api_key(&key)))
            .await?;
        info!(%user_id, "API key regenerated");
        Ok(key)
    }

    #[instrument(skip(self), fields(subsystem = "auth", op = "revoke_api_key"))]
    pub async fn revoke_api_key(&self, user_id: Uuid) -> Result<()> {
        self.users.set_api_key_hash(user_id, None).await?;
        info!(%user_id, "API key revoked");
        Ok(())
    }

    /// Resolve a user id to its current account.
    pub async fn user(&self, user_id: Uuid) -> Result<User> {
        self.users
            .get(user_id)
            .await?
            .ok_or_else(|| AuthError::UnknownUser.into())
    }
}

#[async_trait]
impl Authenticator for Credentials {
    async fn authenticate(&self, bearer: &str) -> Result<AuthPrincipal> {
        let (user, method) = if looks_like_api_key(bearer) {
            let user = self
                .users
                .find_by_api_key_hash(&hash_api_key(bearer))
                .await?
                .ok_or(AuthError::InvalidToken)?;
            (user, AuthMethod::ApiKey)
        } else {
            let claims = self.tokens.verify(bearer, TokenKind::Access)?;
            let user = self
                .users
                .get(claims.sub)
                .await?
                .ok_or(AuthError::UnknownUser)?;
            (user, AuthMethod::AccessToken)
        };

        Ok(AuthPrincipal::User {
            user_id: user.id,
            username: user.username,
            method,
        })
    }
}
