//! Manager console
//!
//! Need maintenance and account restriction. Only the configured admin
//! account can open one.

use crate::cupboard::Cupboard;
use crate::error::CoreError;
use crate::session::CurrentUser;
use std::sync::Arc;
use ufund_client::{Backend, LogFailure};
use ufund_model::{Need, NeedId, User};

/// Whether `user_name` is the manager account
#[inline]
#[must_use]
pub fn is_admin(user_name: &str, admin_user_name: &str) -> bool {
    user_name == admin_user_name
}

/// Manager-only operations
pub struct AdminConsole {
    backend: Arc<dyn Backend>,
    cupboard: Arc<Cupboard>,
    admin_user_name: String,
}

impl std::fmt::Debug for AdminConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConsole")
            .field("admin_user_name", &self.admin_user_name)
            .finish_non_exhaustive()
    }
}

impl AdminConsole {
    /// Open the console for `current`
    ///
    /// # Errors
    /// - `CoreError::NotLoggedIn` for the guest user
    /// - `CoreError::Forbidden` for anyone but the manager
    pub fn for_user(
        backend: Arc<dyn Backend>,
        cupboard: Arc<Cupboard>,
        current: &CurrentUser,
        admin_user_name: &str,
    ) -> Result<Self, CoreError> {
        if current.is_guest() {
            return Err(CoreError::NotLoggedIn);
        }
        if !is_admin(&current.user_name, admin_user_name) {
            return Err(CoreError::Forbidden(format!(
                "{} is not the cupboard manager",
                current.user_name
            )));
        }
        Ok(Self {
            backend,
            cupboard,
            admin_user_name: admin_user_name.to_string(),
        })
    }

    /// Store a new need; the backend assigns its id
    ///
    /// Returns `None` when a need with that name exists or the backend is
    /// unreachable.
    ///
    /// # Errors
    /// `CoreError::Model` if the need is invalid
    pub async fn create_need(&self, need: &Need) -> Result<Option<Need>, CoreError> {
        need.validate()?;
        let created = self
            .backend
            .create_need(need)
            .await
            .or_log("create_need")
            .flatten();
        match &created {
            Some(stored) => {
                tracing::info!(need_id = %stored.id, name = %stored.name, "need created");
                self.cupboard.upsert_need(stored.clone()).await;
            }
            None => tracing::warn!(name = %need.name, "need not created"),
        }
        Ok(created)
    }

    /// Overwrite a need locally and queue the remote update
    ///
    /// # Errors
    /// `CoreError::Model` if the need is invalid
    pub async fn edit_need(&self, need: Need) -> Result<(), CoreError> {
        need.validate()?;
        tracing::info!(need_id = %need.id, "need edited");
        self.cupboard.persist_need(need).await;
        Ok(())
    }

    /// Remove a need locally, then remotely
    pub async fn delete_need(&self, id: NeedId) -> bool {
        self.cupboard.forget_need(id).await;
        let removed = self.backend.delete_need(id).await.or_log("delete_need").is_some();
        tracing::info!(need_id = %id, removed, "need deleted");
        removed
    }

    /// Every account except the manager
    pub async fn restrictable_users(&self) -> Vec<User> {
        self.backend
            .list_users()
            .await
            .or_log_default("list_users")
            .into_iter()
            .filter(|u| !is_admin(&u.user_name, &self.admin_user_name))
            .collect()
    }

    /// Flip an account's restriction
    ///
    /// Returns the new state, or `None` if the account cannot be changed.
    pub async fn toggle_restriction(&self, user_name: &str) -> Option<bool> {
        if user_name.is_empty() || is_admin(user_name, &self.admin_user_name) {
            tracing::warn!(user_name, "restriction request refused");
            return None;
        }
        let mut user = self
            .backend
            .get_user_by_name(user_name)
            .await
            .or_log("get_user_by_name")
            .flatten()?;

        user.restricted = !user.restricted;
        let updated = self.backend.update_user(&user).await.or_log("update_user")?;
        tracing::info!(user_name, restricted = updated.restricted, "restriction toggled");
        Some(updated.restricted)
    }
}
