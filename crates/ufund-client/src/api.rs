//! Remote service contracts
//!
//! "Absent" answers (404 on lookups, 409 on creates, 401 on logins) are
//! `Ok(None)` / empty collections. Anything else the backend refuses is a
//! [`ClientError`].

use crate::error::ClientError;
use async_trait::async_trait;
use ufund_model::{
    BasketNeed, ChatPersonality, Credentials, Need, NeedId, Session, User, UserId,
};

/// Need catalog service
#[async_trait]
pub trait CupboardApi: Send + Sync {
    /// All needs in catalog order
    async fn list_needs(&self) -> Result<Vec<Need>, ClientError>;

    /// Need by id
    async fn get_need(&self, id: NeedId) -> Result<Option<Need>, ClientError>;

    /// Needs whose name contains `name`
    async fn search_needs(&self, name: &str) -> Result<Vec<Need>, ClientError>;

    /// Store a new need; `None` if one with that name exists
    async fn create_need(&self, need: &Need) -> Result<Option<Need>, ClientError>;

    /// Overwrite a stored need
    async fn update_need(&self, need: &Need) -> Result<Need, ClientError>;

    /// Delete a need
    async fn delete_need(&self, id: NeedId) -> Result<(), ClientError>;
}

/// User and basket service
#[async_trait]
pub trait UserApi: Send + Sync {
    /// Register a user; `None` if the name is taken
    async fn create_user(&self, user: &User) -> Result<Option<User>, ClientError>;

    /// User by login name
    async fn get_user_by_name(&self, user_name: &str) -> Result<Option<User>, ClientError>;

    /// User by id
    async fn get_user(&self, id: UserId) -> Result<Option<User>, ClientError>;

    /// Every user
    async fn list_users(&self) -> Result<Vec<User>, ClientError>;

    /// Overwrite a user record
    async fn update_user(&self, user: &User) -> Result<User, ClientError>;

    /// A user's basket
    async fn get_basket(&self, id: UserId) -> Result<Vec<BasketNeed>, ClientError>;

    /// Add a need to a user's basket
    async fn add_to_basket(&self, id: UserId, need: &Need) -> Result<User, ClientError>;

    /// Remove a need from a user's basket
    async fn remove_from_basket(&self, id: UserId, need: &Need) -> Result<User, ClientError>;

    /// Set the requested count of a basket entry
    async fn set_basket_count(
        &self,
        id: UserId,
        need: &Need,
        count: i32,
    ) -> Result<User, ClientError>;
}

/// Session service
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Log in with a plain password; `None` on unknown user or wrong password
    async fn login(&self, credentials: &Credentials) -> Result<Option<Session>, ClientError>;

    /// Log in with the stored password hash
    async fn login_hash(&self, credentials: &Credentials)
        -> Result<Option<Session>, ClientError>;

    /// Whether the user's session exists and has not expired
    async fn is_valid_session(&self, user_name: &str) -> Result<bool, ClientError>;

    /// Refresh the user's session timer
    async fn validate_session(&self, user_name: &str) -> Result<Option<Session>, ClientError>;

    /// Log out
    async fn delete_session(&self, user_name: &str) -> Result<Option<Session>, ClientError>;
}

/// Chat assistant service
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Personalities on offer
    async fn personalities(&self) -> Result<Vec<ChatPersonality>, ClientError>;

    /// Open a chat for user `id`; `None` if one is already open
    async fn register_chat(
        &self,
        id: UserId,
        personality: &ChatPersonality,
    ) -> Result<Option<i32>, ClientError>;

    /// Whether user `id` has an open chat
    async fn chat_exists(&self, id: UserId) -> Result<bool, ClientError>;

    /// Send a message and wait for the reply
    async fn send_chat(&self, id: UserId, message: &str) -> Result<String, ClientError>;

    /// Close the chat; `false` if none was open
    async fn delete_chat(&self, id: UserId) -> Result<bool, ClientError>;
}

/// The full backend surface
pub trait Backend: CupboardApi + UserApi + SessionApi + ChatApi {}

impl<T> Backend for T where T: CupboardApi + UserApi + SessionApi + ChatApi + ?Sized {}
