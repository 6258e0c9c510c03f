//! # HTTP transport
//!
//! [`HttpApi`] implements [`BlogApi`] on top of a shared `reqwest::Client`.
//! Every response body is read as text first so that failed responses can be
//! mined for the server's `message` field, and so that endpoints returning an
//! empty body (deletes, like toggles) are not treated as decode errors.

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

use store::config::ApiConfig;

use crate::error::{ApiError, FALLBACK_MESSAGE};
use crate::models::{
    AuthResponse, Credentials, ErrorBody, NewComment, PostDraft, Registration,
};
use crate::{BlogApi, Comment, Post};

/// `reqwest`-backed blog API client. Cheap to clone.
#[derive(Clone, Debug)]
pub struct HttpApi {
    base_url: String,
    client: Client,
}

impl HttpApi {
    /// Client without a request timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    /// Client configured from the `[api]` section of `blog.toml`.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        #[allow(unused_mut)]
        let mut builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        {
            if config.timeout_secs > 0 {
                builder = builder.timeout(std::time::Duration::from_secs(config.timeout_secs));
            }
        }
        Ok(Self {
            base_url: config.base_url.clone(),
            client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and return its JSON body (`Null` for an empty body).
    async fn send(&self, builder: RequestBuilder) -> Result<Value, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body);
            tracing::debug!("API responded {}: {}", status, message);
            return Err(ApiError::status(status.as_u16(), message));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let value = self.send(builder).await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Pull the server's `message` out of an error body, or fall back to a generic one.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

impl BlogApi for HttpApi {
    async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        self.fetch(self.request(Method::POST, "/auth/register", None).json(registration))
            .await
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        self.fetch(self.request(Method::POST, "/auth/login", None).json(credentials))
            .await
    }

    async fn list_posts(&self, token: Option<&str>) -> Result<Vec<Post>, ApiError> {
        self.fetch(self.request(Method::GET, "/posts", token)).await
    }

    async fn get_post(&self, token: Option<&str>, post_id: &str) -> Result<Post, ApiError> {
        self.fetch(self.request(Method::GET, &format!("/posts/{post_id}"), token))
            .await
    }

    async fn create_post(&self, token: Option<&str>, draft: &PostDraft) -> Result<Post, ApiError> {
        self.fetch(self.request(Method::POST, "/posts", token).json(draft))
            .await
    }

    async fn update_post(
        &self,
        token: Option<&str>,
        post_id: &str,
        draft: &PostDraft,
    ) -> Result<Post, ApiError> {
        self.fetch(
            self.request(Method::PUT, &format!("/posts/{post_id}"), token)
                .json(draft),
        )
        .await
    }

    async fn delete_post(&self, token: Option<&str>, post_id: &str) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, &format!("/posts/{post_id}"), token))
            .await?;
        Ok(())
    }

    async fn toggle_like(&self, token: Option<&str>, post_id: &str) -> Result<(), ApiError> {
        self.send(self.request(Method::POST, &format!("/posts/{post_id}/like"), token))
            .await?;
        Ok(())
    }

    async fn add_comment(
        &self,
        token: Option<&str>,
        post_id: &str,
        content: &str,
    ) -> Result<Comment, ApiError> {
        self.fetch(
            self.request(Method::POST, &format!("/posts/{post_id}/comments"), token)
                .json(&NewComment { content }),
        )
        .await
    }

    async fn delete_comment(
        &self,
        token: Option<&str>,
        post_id: &str,
        comment_id: &str,
    ) -> Result<(), ApiError> {
        self.send(self.request(
            Method::DELETE,
            &format!("/posts/{post_id}/comments/{comment_id}"),
            token,
        ))
        .await?;
        Ok(())
    }
}
