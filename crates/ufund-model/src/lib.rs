//! uFund Model - wire and domain types
//!
//! Shared by the HTTP client, the basket engines and the CLI:
//! - Needs and their capacity arithmetic
//! - Basket entries as the backend serializes them
//! - Users, sessions and roles
//! - Chat personalities and transcript lines
//!
//! Field names follow the backend's JSON contract (`userName`, `type`, ...).

#![warn(unreachable_pub)]

pub mod basket;
pub mod chat;
pub mod error;
pub mod need;
pub mod session;
pub mod user;

pub use basket::BasketNeed;
pub use chat::{ChatLine, ChatPersonality};
pub use error::ModelError;
pub use need::{Need, NeedId};
pub use session::{Credentials, Session, SESSION_TTL_MS};
pub use user::{Role, User, UserId, ADMIN_USER_NAME, GUEST_USER_NAME};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
