//! Session flow
//!
//! Login, logout, session resume and account upkeep. Every outcome a user
//! can cause is a variant, not an error; backend failures are logged and
//! folded into the matching refusal.

use std::sync::Arc;
use ufund_client::{Backend, LogFailure};
use ufund_model::{Credentials, User, UserId, GUEST_USER_NAME};

/// Who is using the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// User id, `UserId::GUEST` when logged out
    pub id: UserId,
    /// User name
    pub user_name: String,
}

impl CurrentUser {
    /// Logged-out user
    #[must_use]
    pub fn guest() -> Self {
        Self {
            id: UserId::GUEST,
            user_name: GUEST_USER_NAME.to_string(),
        }
    }

    /// Whether nobody is logged in
    #[inline]
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.id == UserId::GUEST
    }
}

impl Default for CurrentUser {
    fn default() -> Self {
        Self::guest()
    }
}

/// Result of a login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Logged in
    LoggedIn(CurrentUser),
    /// User name or password left empty
    MissingFields,
    /// Backend refused the credentials
    InvalidCredentials,
    /// Account is restricted; its session was closed again
    Restricted,
}

/// Result of creating an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountOutcome {
    /// Account stored
    Created(User),
    /// A required field was empty
    MissingFields,
    /// Another account already has the name
    UsernameTaken,
    /// Backend unreachable
    Failed,
}

/// Result of a password recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Password replaced
    Recovered,
    /// A required field was empty
    MissingFields,
    /// Unknown user or wrong security answers
    AnswersRejected,
    /// New password and its confirmation differ
    PasswordMismatch,
    /// Backend refused the update
    Failed,
}

/// Result of editing the profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileOutcome {
    /// Nothing to change
    Unchanged,
    /// Record updated; the user should log in again
    Updated(User),
    /// Backend refused the update
    Failed,
}

/// Login and account operations
#[derive(Clone)]
pub struct SessionFlow {
    backend: Arc<dyn Backend>,
}

impl std::fmt::Debug for SessionFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFlow").finish_non_exhaustive()
    }
}

impl SessionFlow {
    /// Create flow over a backend
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Log in, refusing restricted accounts
    pub async fn login(&self, user_name: &str, password: &str) -> LoginOutcome {
        if user_name.is_empty() || password.is_empty() {
            return LoginOutcome::MissingFields;
        }

        let credentials = Credentials::new(user_name, password);
        let Some(session) = self.backend.login(&credentials).await.or_log("login").flatten() else {
            tracing::info!(user_name, "login refused");
            return LoginOutcome::InvalidCredentials;
        };

        let record = self
            .backend
            .get_user_by_name(user_name)
            .await
            .or_log("get_user_by_name")
            .flatten();
        match record {
            Some(user) if user.restricted => {
                self.close_session(user_name).await;
                tracing::info!(user_name, "restricted user refused");
                LoginOutcome::Restricted
            }
            Some(_) => {
                tracing::info!(user_name, id = session.id, "logged in");
                LoginOutcome::LoggedIn(CurrentUser {
                    id: UserId(session.id),
                    user_name: session.user_name,
                })
            }
            None => {
                self.close_session(user_name).await;
                LoginOutcome::InvalidCredentials
            }
        }
    }

    /// Close the session; the client reverts to the guest user
    pub async fn logout(&self, user: &CurrentUser) -> CurrentUser {
        if !user.is_guest() {
            self.close_session(&user.user_name).await;
            tracing::info!(user_name = %user.user_name, "logged out");
        }
        CurrentUser::guest()
    }

    /// Pick up the session of a previously logged-in user
    pub async fn resume(&self, id: UserId) -> Option<CurrentUser> {
        let user = self.backend.get_user(id).await.or_log("get_user").flatten()?;
        let session = self
            .backend
            .validate_session(&user.user_name)
            .await
            .or_log("validate_session")
            .flatten()?;
        tracing::debug!(user_name = %session.user_name, "session resumed");
        Some(CurrentUser {
            id: user.id,
            user_name: user.user_name,
        })
    }

    /// Whether `user_name` has a live session
    pub async fn is_session_valid(&self, user_name: &str) -> bool {
        self.backend
            .is_valid_session(user_name)
            .await
            .or_log_default("is_valid_session")
    }

    /// Register a new account with two security answers
    pub async fn create_account(
        &self,
        user_name: &str,
        password: &str,
        answer1: &str,
        answer2: &str,
    ) -> AccountOutcome {
        if [user_name, password, answer1, answer2].iter().any(|f| f.is_empty()) {
            return AccountOutcome::MissingFields;
        }

        let user = User::new(user_name, password)
            .with_security(vec![answer1.to_string(), answer2.to_string()]);
        match self.backend.create_user(&user).await.or_log("create_user") {
            Some(Some(created)) => {
                tracing::info!(user_name, id = %created.id, "account created");
                AccountOutcome::Created(created)
            }
            Some(None) => AccountOutcome::UsernameTaken,
            None => AccountOutcome::Failed,
        }
    }

    /// Stored user record if both security answers match
    pub async fn verify_security(&self, user_name: &str, answer1: &str, answer2: &str) -> Option<User> {
        if user_name.is_empty() || answer1.is_empty() || answer2.is_empty() {
            return None;
        }
        self.backend
            .get_user_by_name(user_name)
            .await
            .or_log("get_user_by_name")
            .flatten()
            .filter(|u| u.security_matches(0, answer1) && u.security_matches(1, answer2))
    }

    /// Replace a forgotten password after answering the security questions
    pub async fn recover_password(
        &self,
        user_name: &str,
        answer1: &str,
        answer2: &str,
        new_password: &str,
        verify_password: &str,
    ) -> RecoveryOutcome {
        if user_name.is_empty() || answer1.is_empty() || answer2.is_empty() {
            return RecoveryOutcome::MissingFields;
        }
        let Some(mut user) = self.verify_security(user_name, answer1, answer2).await else {
            return RecoveryOutcome::AnswersRejected;
        };
        if new_password.is_empty() && verify_password.is_empty() {
            return RecoveryOutcome::MissingFields;
        }
        if new_password != verify_password {
            return RecoveryOutcome::PasswordMismatch;
        }

        let credentials = Credentials::new(&user.user_name, &user.password);
        if self
            .backend
            .login_hash(&credentials)
            .await
            .or_log("login_hash")
            .flatten()
            .is_none()
        {
            return RecoveryOutcome::Failed;
        }

        user.password = new_password.to_string();
        if self.backend.update_user(&user).await.or_log("update_user").is_none() {
            return RecoveryOutcome::Failed;
        }
        self.close_session(&user.user_name).await;
        tracing::info!(user_name, "password recovered");
        RecoveryOutcome::Recovered
    }

    /// Rename the account and set a new password
    ///
    /// The stored basket, security answers and restriction are carried
    /// over. An empty password or name changes nothing.
    pub async fn edit_profile(
        &self,
        current: &CurrentUser,
        new_user_name: &str,
        new_password: &str,
    ) -> ProfileOutcome {
        if new_password.is_empty() || new_user_name.is_empty() || current.is_guest() {
            return ProfileOutcome::Unchanged;
        }
        let Some(mut user) = self.backend.get_user(current.id).await.or_log("get_user").flatten() else {
            return ProfileOutcome::Failed;
        };

        user.user_name = new_user_name.to_string();
        user.password = new_password.to_string();
        match self.backend.update_user(&user).await.or_log("update_user") {
            Some(updated) => {
                tracing::info!(id = %current.id, user_name = new_user_name, "profile updated");
                ProfileOutcome::Updated(updated)
            }
            None => ProfileOutcome::Failed,
        }
    }

    async fn close_session(&self, user_name: &str) {
        let _ = self.backend.delete_session(user_name).await.or_log("delete_session");
    }
}
