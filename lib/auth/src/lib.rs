//! Authentication for the listkeeper platform.
//!
//! This crate provides:
//! - User records and the `CredentialStore` abstraction (users, password
//!   verification, named per-user token slots)
//! - Access/refresh token issuance and rotation (`TokenIssuer`)
//! - Bearer token validation with structured rejection codes (`TokenValidator`)
//! - The explicit `AuthenticatedSession` context handed to authorization checks
//!
//! # Token lifecycle
//!
//! A successful login writes two slots for the user: the signed access token
//! (`JwtToken`) and a JSON refresh payload (`JwtRefreshToken`). Every
//! successful refresh overwrites both, so a refresh token is only ever usable
//! once. Logout removes the access slot only.
//!
//! # Example
//!
//! ```
//! use listkeeper_auth::{InMemoryCredentialStore, JwtConfig, LoginRequest, TokenIssuer, TokenValidator};
//! use std::sync::Arc;
//!
//! # tokio_test_block(async {
//! let store = Arc::new(InMemoryCredentialStore::new());
//! store.insert_user("alice", "correct horse", "Alice", "Liddell").unwrap();
//!
//! let config = JwtConfig::new(
//!     "listkeeper".to_string(),
//!     "listkeeper-api".to_string(),
//!     "a-very-long-development-signing-secret-value".to_string(),
//! );
//! let issuer = TokenIssuer::new(store, config.clone());
//! let pair = issuer
//!     .login(&LoginRequest::new("alice", "correct horse"))
//!     .await
//!     .unwrap()
//!     .expect("valid credentials");
//!
//! let validator = TokenValidator::new(&config);
//! let session = validator.authenticate(&pair.access_token).unwrap();
//! assert_eq!(session.username(), "alice");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod config;
pub mod error;
pub mod issuer;
pub mod password;
pub mod session;
pub mod store;
pub mod token;
pub mod user;
pub mod validator;

// Re-export main types at crate root
pub use config::JwtConfig;
pub use error::{AuthError, JwtConfigError, StoreError};
pub use issuer::{LoginRequest, TokenIssuer};
pub use session::AuthenticatedSession;
pub use store::{CredentialStore, InMemoryCredentialStore, TokenSlot};
pub use token::{AccessClaims, RefreshTokenPayload, TokenPair, TokenSigner, read_expiry_unverified};
pub use user::User;
pub use validator::{ChallengeBody, TokenRejection, TokenValidator};
