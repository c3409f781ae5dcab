//! HMAC-signed access and refresh tokens.
//!
//! A token is `<base64url claims>.<base64url mac>`, where the MAC is
//! HMAC-SHA256 over the encoded claims segment.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `AUTH_TOKEN_SECRET`: Signing secret, required, at least 32 characters
//! - `ACCESS_TOKEN_TTL_MINUTES`: Access token lifetime (default: 60)
//! - `REFRESH_TOKEN_TTL_DAYS`: Refresh token lifetime (default: 7)

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use cadence_core::defaults;

use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

/// Which flow a token is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Signed token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user id.
    pub sub: Uuid,
    pub kind: TokenKind,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
}

/// Signing secret and token lifetimes.
#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenConfig {
    /// Create a config with default lifetimes.
    pub fn new(secret: impl Into<String>) -> AuthResult<Self> {
        let secret = secret.into();
        if secret.len() < defaults::TOKEN_SECRET_MIN_LEN {
            return Err(AuthError::SecretTooShort(defaults::TOKEN_SECRET_MIN_LEN));
        }
        Ok(Self {
            secret: secret.into_bytes(),
            access_ttl: Duration::minutes(defaults::ACCESS_TOKEN_TTL_MINUTES),
            refresh_ttl: Duration::days(defaults::REFRESH_TOKEN_TTL_DAYS),
        })
    }

    /// Load from environment variables. Fails without `AUTH_TOKEN_SECRET`.
    pub fn from_env() -> AuthResult<Self> {
        let secret = std::env::var("AUTH_TOKEN_SECRET").map_err(|_| AuthError::MissingSecret)?;
        let mut config = Self::new(secret)?;
        if let Some(minutes) = std::env::var("ACCESS_TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.access_ttl = Duration::minutes(minutes);
        }
        if let Some(days) = std::env::var("REFRESH_TOKEN_TTL_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.refresh_ttl = Duration::days(days);
        }
        Ok(config)
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }
}

/// Issues and verifies signed tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    config: TokenConfig,
    /// MAC keyed with the secret, cloned per operation.
    keyed: HmacSha256,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(config: TokenConfig) -> AuthResult<Self> {
        let keyed = HmacSha256::new_from_slice(&config.secret)
            .map_err(|_| AuthError::SecretTooShort(defaults::TOKEN_SECRET_MIN_LEN))?;
        Ok(Self { config, keyed })
    }

    /// Load the config from the environment and build an issuer.
    pub fn from_env() -> AuthResult<Self> {
        Self::new(TokenConfig::from_env()?)
    }

    pub fn issue_access(&self, user_id: Uuid) -> String {
        self.issue_at(user_id, TokenKind::Access, Utc::now())
    }

    pub fn issue_refresh(&self, user_id: Uuid) -> String {
        self.issue_at(user_id, TokenKind::Refresh, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, user_id: Uuid, kind: TokenKind, now: DateTime<Utc>) -> String {
        let ttl = match kind {
            TokenKind::Access => self.config.access_ttl,
            TokenKind::Refresh => self.config.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id,
            kind,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        // Claims hold only a uuid, an enum and two integers.
        let payload = serde_json::to_vec(&claims).unwrap_or_default();
        let encoded = URL_SAFE_NO_PAD.encode(payload);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(encoded.as_bytes()));
        format!("{}.{}", encoded, signature)
    }

    /// Verify signature, kind and expiry.
    pub fn verify(&self, token: &str, expected: TokenKind) -> AuthResult<Claims> {
        self.verify_at(token, expected, Utc::now())
    }

    pub fn verify_at(
        &self,
        token: &str,
        expected: TokenKind,
        now: DateTime<Utc>,
    ) -> AuthResult<Claims> {
        let (encoded, signature) = token.split_once('.').ok_or(AuthError::InvalidToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let mut mac = self.keyed.clone();
        mac.update(encoded.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let payload = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| AuthError::InvalidToken)?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::InvalidToken)?;

        if claims.kind != expected {
            return Err(AuthError::WrongTokenKind {
                expected: expected.as_str(),
            });
        }
        if claims.exp <= now.timestamp() {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = self.keyed.clone();
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(TokenConfig::new(SECRET).unwrap()).unwrap()
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(matches!(
            TokenConfig::new("short"),
            Err(AuthError::SecretTooShort(32))
        ));
    }

    #[test]
    fn test_access_token_round_trip() {
        let user = Uuid::now_v7();
        let token = issuer().issue_access(user);
        let claims = issuer().verify(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_kind_is_enforced() {
        let token = issuer().issue_refresh(Uuid::now_v7());
        assert!(matches!(
            issuer().verify(&token, TokenKind::Access),
            Err(AuthError::WrongTokenKind { expected: "access" })
        ));
        assert!(issuer().verify(&token, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn test_expired_token_rejected() {
        let issued = Utc::now() - Duration::hours(2);
        let token = issuer().issue_at(Uuid::now_v7(), TokenKind::Access, issued);
        assert!(matches!(
            issuer().verify(&token, TokenKind::Access),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let token = issuer().issue_access(Uuid::now_v7());
        let (_, signature) = token.split_once('.').unwrap();
        let forged_claims = Claims {
            sub: Uuid::now_v7(),
            kind: TokenKind::Access,
            exp: i64::MAX,
            iat: 0,
        };
        let forged = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap()),
            signature
        );
        assert!(matches!(
            issuer().verify(&forged, TokenKind::Access),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_other_secret_rejected() {
        let other =
            TokenIssuer::new(TokenConfig::new("ffffffffffffffffffffffffffffffff").unwrap())
                .unwrap();
        let token = other.issue_access(Uuid::now_v7());
        assert!(issuer().verify(&token, TokenKind::Access).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        for token in ["", "abc", "a.b", "!!!.???"] {
            assert!(matches!(
                issuer().verify(token, TokenKind::Access),
                Err(AuthError::InvalidToken)
            ));
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", TokenConfig::new(SECRET).unwrap());
        assert!(!debug.contains(SECRET));
    }
}
