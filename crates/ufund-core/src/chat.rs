//! Chat assistant box
//!
//! One chat per user. Picking a personality replaces any open chat and
//! starts a fresh transcript with the assistant's greeting.

use crate::session::CurrentUser;
use std::sync::Arc;
use ufund_client::{Backend, LogFailure};
use ufund_model::{ChatLine, ChatPersonality};

/// Speaker name for the user's own lines
pub const USER_SPEAKER: &str = "You";

/// Chat with an assistant personality
pub struct ChatBox {
    backend: Arc<dyn Backend>,
    user: CurrentUser,
    personality: Option<ChatPersonality>,
    transcript: Vec<ChatLine>,
}

impl std::fmt::Debug for ChatBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatBox")
            .field("user", &self.user)
            .field("personality", &self.personality)
            .field("lines", &self.transcript.len())
            .finish_non_exhaustive()
    }
}

impl ChatBox {
    /// Create chat box for `user` with nothing selected
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, user: CurrentUser) -> Self {
        Self {
            backend,
            user,
            personality: None,
            transcript: Vec::new(),
        }
    }

    /// Personalities on offer
    pub async fn personalities(&self) -> Vec<ChatPersonality> {
        self.backend
            .personalities()
            .await
            .or_log_default("personalities")
    }

    /// Start a chat with `personality`, closing any open one
    pub async fn select(&mut self, personality: ChatPersonality) -> bool {
        if self
            .backend
            .chat_exists(self.user.id)
            .await
            .or_log_default("chat_exists")
        {
            let _ = self.backend.delete_chat(self.user.id).await.or_log("delete_chat");
        }
        self.personality = None;

        let registered = self
            .backend
            .register_chat(self.user.id, &personality)
            .await
            .or_log("register_chat")
            .is_some();
        if registered {
            let greeting = format!("Hello, {}! What can I help you with?", self.user.user_name);
            self.transcript.push(ChatLine::new(&personality.name, greeting));
            tracing::debug!(user = %self.user.id, personality = %personality.name, "chat opened");
            self.personality = Some(personality);
        }
        registered
    }

    /// Send a message and record the reply
    ///
    /// Ignored when the message is empty or no personality is selected.
    pub async fn send(&mut self, message: &str) -> Option<String> {
        if message.is_empty() {
            return None;
        }
        let speaker = self.personality.as_ref()?.name.clone();

        self.transcript.push(ChatLine::new(USER_SPEAKER, message));
        let reply = self
            .backend
            .send_chat(self.user.id, message)
            .await
            .or_log("send_chat")?;
        self.transcript.push(ChatLine::new(speaker, reply.clone()));
        Some(reply)
    }

    /// Selected personality
    #[must_use]
    pub fn personality(&self) -> Option<&ChatPersonality> {
        self.personality.as_ref()
    }

    /// Lines so far, oldest first
    #[must_use]
    pub fn transcript(&self) -> &[ChatLine] {
        &self.transcript
    }

    /// End the chat and clear the transcript
    pub async fn close(&mut self) {
        let _ = self.backend.delete_chat(self.user.id).await.or_log("delete_chat");
        self.transcript.clear();
        self.personality = None;
    }
}
