//! Authentication for the listkeeper API.
//!
//! This module provides:
//! - The bearer-token gate placed in front of every authenticated route
//! - The `RequireAuth` extractor that hands the verified session to handlers
//! - Register, login, refresh, and logout endpoints
//!
//! # Authorization Model
//!
//! The gate only answers "who is calling". Whether that caller may touch a
//! given list or task is decided per request by the [`Authorizer`], which
//! reads ownership and role assignments from the same database.

pub mod middleware;
pub mod routes;

use crate::db::{ListRepository, PgCredentialStore};
use listkeeper_auth::{JwtConfig, TokenIssuer, TokenValidator};
use listkeeper_authz::Authorizer;
use sqlx::PgPool;
use std::sync::Arc;

pub use middleware::{AuthRejection, RequireAuth, require_bearer};

/// Shared application state.
pub struct AppState {
    /// Database connection pool.
    pub db_pool: PgPool,
    /// Issues and rotates tokens.
    pub issuer: TokenIssuer<PgCredentialStore>,
    /// Validates bearer tokens.
    pub validator: TokenValidator,
    /// Resolves list and task roles.
    pub authorizer: Authorizer<ListRepository>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(db_pool: PgPool, jwt: JwtConfig) -> Self {
        let store = Arc::new(PgCredentialStore::new(db_pool.clone()));
        Self {
            issuer: TokenIssuer::new(store, jwt.clone()),
            validator: TokenValidator::new(&jwt),
            authorizer: Authorizer::new(ListRepository::new(db_pool.clone())),
            db_pool,
        }
    }
}
