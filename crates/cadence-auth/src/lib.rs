//! # cadence-auth
//!
//! Credential capability for cadence.
//!
//! ## Features
//!
//! - **Passwords**: Argon2id PHC strings
//! - **Tokens**: HMAC-SHA256 signed access and refresh tokens
//! - **API keys**: `ck_`-prefixed keys stored as SHA-256 digests
//!
//! [`Credentials`] ties these to a user repository and implements
//! [`Authenticator`](cadence_core::Authenticator) for the HTTP layer.

pub mod api_key;
pub mod credentials;
pub mod error;
pub mod password;
pub mod tokens;

pub use api_key::{generate_api_key, hash_api_key};
pub use credentials::{AccessToken, Credentials, RegisterRequest, TokenPair};
pub use error::{AuthError, AuthResult};
pub use password::{hash_password, verify_password};
pub use tokens::{Claims, TokenConfig, TokenIssuer, TokenKind};
