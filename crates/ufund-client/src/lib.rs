//! uFund Client - remote service contracts
//!
//! The backend owns persistence, authentication and capacity validation.
//! This crate exposes it as four async traits:
//! - [`CupboardApi`]: need catalog CRUD and name search
//! - [`UserApi`]: user records and their baskets
//! - [`SessionApi`]: login, session validation and logout
//! - [`ChatApi`]: assistant personalities and chat sessions
//!
//! [`HttpBackend`] implements all of them over `reqwest`. Callers that must
//! never fail on a collaborator error degrade through [`LogFailure`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ufund_client::{ClientConfig, CupboardApi, HttpBackend};
//!
//! # async fn example() -> Result<(), ufund_client::ClientError> {
//! let backend = HttpBackend::new(&ClientConfig::default())?;
//! for need in backend.list_needs().await? {
//!     println!("{need}");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod api;
pub mod config;
pub mod error;
pub mod fallback;
pub mod http;

pub use api::{Backend, ChatApi, CupboardApi, SessionApi, UserApi};
pub use config::ClientConfig;
pub use error::ClientError;
pub use fallback::LogFailure;
pub use http::HttpBackend;
