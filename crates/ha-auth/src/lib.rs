//! Authentication accounts for the Home Assistant host
//!
//! Integrations never own accounts; they read them through the [`AuthStore`]
//! trait. [`MemoryAuthStore`] is the in-process implementation the host uses.

mod error;
mod store;
mod user;

pub use error::{AuthError, AuthResult};
pub use store::{AuthStore, MemoryAuthStore};
pub use user::{Credential, Group, User, GROUP_ID_ADMIN, GROUP_ID_USER};
