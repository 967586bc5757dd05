//! `reqwest` implementation of the service contracts

use crate::api::{ChatApi, CupboardApi, SessionApi, UserApi};
use crate::config::ClientConfig;
use crate::error::ClientError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use ufund_model::{
    BasketNeed, ChatPersonality, Credentials, Need, NeedId, Session, User, UserId,
};

/// HTTP/JSON backend client
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base: Url,
    client: Client,
}

impl HttpBackend {
    /// Build a client for `config.base_url`
    ///
    /// # Errors
    /// - `ClientError::InvalidBaseUrl` if the URL does not parse or cannot
    ///   carry a path
    /// - `ClientError::Transport` if the HTTP client cannot be built
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{}: {e}", config.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(config.base_url.clone()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| ClientError::Transport {
                operation: "build_client",
                source,
            })?;
        Ok(Self { base, client })
    }

    /// Backend root
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Join percent-encoded path segments onto the base URL
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ClientError::InvalidBaseUrl(self.base.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Transport { operation, source })?;
        tracing::debug!(operation, status = response.status().as_u16(), "backend responded");
        Ok(response)
    }
}

fn ensure_success(operation: &'static str, response: &Response) -> Result<(), ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(ClientError::Status {
            operation,
            status: status.as_u16(),
        })
    }
}

async fn read_body(operation: &'static str, response: Response) -> Result<Vec<u8>, ClientError> {
    ensure_success(operation, &response)?;
    let body = response
        .bytes()
        .await
        .map_err(|source| ClientError::Transport { operation, source })?;
    Ok(body.to_vec())
}

async fn read_json<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, ClientError> {
    let body = read_body(operation, response).await?;
    serde_json::from_slice(&body).map_err(|source| ClientError::Decode { operation, source })
}

/// Statuses in `absent` mean "no such resource" rather than failure
async fn read_optional<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
    absent: &[StatusCode],
) -> Result<Option<T>, ClientError> {
    if absent.contains(&response.status()) {
        return Ok(None);
    }
    read_json(operation, response).await.map(Some)
}

async fn read_list<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
    absent: &[StatusCode],
) -> Result<Vec<T>, ClientError> {
    if response.status() == StatusCode::NO_CONTENT {
        return Ok(Vec::new());
    }
    Ok(read_optional(operation, response, absent)
        .await?
        .unwrap_or_default())
}

#[async_trait]
impl CupboardApi for HttpBackend {
    async fn list_needs(&self) -> Result<Vec<Need>, ClientError> {
        const OP: &str = "list_needs";
        let url = self.url(&["cupboard"])?;
        let response = self.execute(OP, self.client.get(url)).await?;
        read_list(OP, response, &[]).await
    }

    async fn get_need(&self, id: NeedId) -> Result<Option<Need>, ClientError> {
        const OP: &str = "get_need";
        let url = self.url(&["cupboard", id.to_string().as_str()])?;
        let response = self.execute(OP, self.client.get(url)).await?;
        read_optional(OP, response, &[StatusCode::NOT_FOUND]).await
    }

    async fn search_needs(&self, name: &str) -> Result<Vec<Need>, ClientError> {
        const OP: &str = "search_needs";
        let url = self.url(&["cupboard", "name", name])?;
        let response = self.execute(OP, self.client.get(url)).await?;
        read_list(OP, response, &[StatusCode::NOT_FOUND]).await
    }

    async fn create_need(&self, need: &Need) -> Result<Option<Need>, ClientError> {
        const OP: &str = "create_need";
        let url = self.url(&["cupboard"])?;
        let response = self.execute(OP, self.client.post(url).json(need)).await?;
        read_optional(OP, response, &[StatusCode::CONFLICT]).await
    }

    async fn update_need(&self, need: &Need) -> Result<Need, ClientError> {
        const OP: &str = "update_need";
        let url = self.url(&["cupboard", need.id.to_string().as_str()])?;
        let response = self.execute(OP, self.client.put(url).json(need)).await?;
        let updated = read_json(OP, response).await?;
        tracing::info!(need_id = %need.id, "updated need");
        Ok(updated)
    }

    async fn delete_need(&self, id: NeedId) -> Result<(), ClientError> {
        const OP: &str = "delete_need";
        let url = self.url(&["cupboard", id.to_string().as_str()])?;
        let response = self.execute(OP, self.client.delete(url)).await?;
        ensure_success(OP, &response)
    }
}

#[async_trait]
impl UserApi for HttpBackend {
    async fn create_user(&self, user: &User) -> Result<Option<User>, ClientError> {
        const OP: &str = "create_user";
        let url = self.url(&["users"])?;
        let response = self.execute(OP, self.client.post(url).json(user)).await?;
        read_optional(OP, response, &[StatusCode::CONFLICT]).await
    }

    async fn get_user_by_name(&self, user_name: &str) -> Result<Option<User>, ClientError> {
        const OP: &str = "get_user_by_name";
        let url = self.url(&["users", "username", user_name])?;
        let response = self.execute(OP, self.client.get(url)).await?;
        read_optional(OP, response, &[StatusCode::NOT_FOUND]).await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, ClientError> {
        const OP: &str = "get_user";
        let url = self.url(&["users", id.to_string().as_str()])?;
        let response = self.execute(OP, self.client.get(url)).await?;
        read_optional(OP, response, &[StatusCode::NOT_FOUND]).await
    }

    async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        const OP: &str = "list_users";
        let url = self.url(&["users"])?;
        let response = self.execute(OP, self.client.get(url)).await?;
        read_list(OP, response, &[]).await
    }

    async fn update_user(&self, user: &User) -> Result<User, ClientError> {
        const OP: &str = "update_user";
        let url = self.url(&["users", user.id.to_string().as_str()])?;
        let response = self.execute(OP, self.client.put(url).json(user)).await?;
        read_json(OP, response).await
    }

    async fn get_basket(&self, id: UserId) -> Result<Vec<BasketNeed>, ClientError> {
        const OP: &str = "get_basket";
        let url = self.url(&["users", id.to_string().as_str(), "basket"])?;
        let response = self.execute(OP, self.client.get(url)).await?;
        read_list(OP, response, &[]).await
    }

    async fn add_to_basket(&self, id: UserId, need: &Need) -> Result<User, ClientError> {
        const OP: &str = "add_to_basket";
        let url = self.url(&["users", id.to_string().as_str(), "basket"])?;
        let response = self.execute(OP, self.client.put(url).json(need)).await?;
        read_json(OP, response).await
    }

    async fn remove_from_basket(&self, id: UserId, need: &Need) -> Result<User, ClientError> {
        const OP: &str = "remove_from_basket";
        let url = self.url(&["users", id.to_string().as_str(), "basket"])?;
        let response = self.execute(OP, self.client.delete(url).json(need)).await?;
        read_json(OP, response).await
    }

    async fn set_basket_count(
        &self,
        id: UserId,
        need: &Need,
        count: i32,
    ) -> Result<User, ClientError> {
        const OP: &str = "set_basket_count";
        let url = self.url(&["users", id.to_string().as_str(), "basket", count.to_string().as_str()])?;
        let response = self.execute(OP, self.client.put(url).json(need)).await?;
        read_json(OP, response).await
    }
}

#[async_trait]
impl SessionApi for HttpBackend {
    async fn login(&self, credentials: &Credentials) -> Result<Option<Session>, ClientError> {
        const OP: &str = "login";
        let url = self.url(&["auth", "login"])?;
        let response = self.execute(OP, self.client.post(url).json(credentials)).await?;
        read_optional(
            OP,
            response,
            &[StatusCode::NOT_FOUND, StatusCode::UNAUTHORIZED],
        )
        .await
    }

    async fn login_hash(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Session>, ClientError> {
        const OP: &str = "login_hash";
        let url = self.url(&["auth", "login", "hash"])?;
        let response = self.execute(OP, self.client.post(url).json(credentials)).await?;
        read_optional(
            OP,
            response,
            &[StatusCode::NOT_FOUND, StatusCode::UNAUTHORIZED],
        )
        .await
    }

    async fn is_valid_session(&self, user_name: &str) -> Result<bool, ClientError> {
        const OP: &str = "is_valid_session";
        let url = self.url(&["auth", user_name])?;
        let response = self.execute(OP, self.client.get(url)).await?;
        Ok(read_optional(OP, response, &[StatusCode::NOT_FOUND])
            .await?
            .unwrap_or(false))
    }

    async fn validate_session(&self, user_name: &str) -> Result<Option<Session>, ClientError> {
        const OP: &str = "validate_session";
        let url = self.url(&["auth", user_name])?;
        let response = self.execute(OP, self.client.put(url)).await?;
        read_optional(OP, response, &[StatusCode::NOT_FOUND]).await
    }

    async fn delete_session(&self, user_name: &str) -> Result<Option<Session>, ClientError> {
        const OP: &str = "delete_session";
        let url = self.url(&["auth", user_name])?;
        let response = self.execute(OP, self.client.delete(url)).await?;
        read_optional(OP, response, &[StatusCode::NOT_FOUND]).await
    }
}

#[derive(serde::Serialize)]
struct ChatMessage<'a> {
    message: &'a str,
}

#[async_trait]
impl ChatApi for HttpBackend {
    async fn personalities(&self) -> Result<Vec<ChatPersonality>, ClientError> {
        const OP: &str = "personalities";
        let url = self.url(&["chat", "personalities"])?;
        let response = self.execute(OP, self.client.get(url)).await?;
        read_list(OP, response, &[]).await
    }

    async fn register_chat(
        &self,
        id: UserId,
        personality: &ChatPersonality,
    ) -> Result<Option<i32>, ClientError> {
        const OP: &str = "register_chat";
        let url = self.url(&["chat", id.to_string().as_str()])?;
        let response = self.execute(OP, self.client.post(url).json(personality)).await?;
        read_optional(OP, response, &[StatusCode::CONFLICT]).await
    }

    async fn chat_exists(&self, id: UserId) -> Result<bool, ClientError> {
        const OP: &str = "chat_exists";
        let url = self.url(&["chat", id.to_string().as_str()])?;
        let response = self.execute(OP, self.client.get(url)).await?;
        read_json(OP, response).await
    }

    async fn send_chat(&self, id: UserId, message: &str) -> Result<String, ClientError> {
        const OP: &str = "send_chat";
        let url = self.url(&["chat", id.to_string().as_str()])?;
        let request = self.client.put(url).json(&ChatMessage { message });
        let response = self.execute(OP, request).await?;
        let body = read_body(OP, response).await?;
        // Replies arrive either as a JSON string or as plain text
        Ok(serde_json::from_slice::<String>(&body)
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned()))
    }

    async fn delete_chat(&self, id: UserId) -> Result<bool, ClientError> {
        const OP: &str = "delete_chat";
        let url = self.url(&["chat", id.to_string().as_str()])?;
        let response = self.execute(OP, self.client.delete(url)).await?;
        Ok(read_optional(OP, response, &[StatusCode::NOT_FOUND])
            .await?
            .unwrap_or(false))
    }
}
