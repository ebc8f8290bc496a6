//! List and task authorization for listkeeper.
//!
//! Every list has exactly one owner (its `owner_id`); other users reach a list
//! only through an explicit Editor or Viewer assignment. Tasks inherit the
//! role resolved on their parent list. A caller with no role is told the
//! resource does not exist rather than that access was refused.

mod error;
mod resolver;
mod types;

pub use error::AuthzError;
pub use resolver::{Authorizer, RoleSource};
pub use types::{Capability, ListRole, Role};
