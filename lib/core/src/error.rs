//! Shared result alias.
//!
//! Crates define their own error enums and wrap them in a rootcause
//! [`Report`], adding context with `.context()` as a failure crosses a layer.

use rootcause::Report;

/// Result carrying a [`Report`] with context type `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
