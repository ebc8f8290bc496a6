//! HTTP client for the listkeeper API.
//!
//! Requests made on behalf of a signed-in user go through a
//! [`TokenRefresher`], which attaches the user's stored access token and
//! silently renews it through a [`RefreshBackend`] once it has expired.

mod api;
mod backend;
mod error;
mod refresher;

pub use api::ApiClient;
pub use backend::{HttpRefreshBackend, RefreshBackend};
pub use error::ClientError;
pub use refresher::{RefresherConfig, TokenRefresher, needs_refresh};
