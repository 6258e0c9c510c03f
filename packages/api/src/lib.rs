//! # API crate: transport to the blog REST API
//!
//! Everything the client core needs to talk to the remote blog API lives here:
//! the [`BlogApi`] trait the core is written against, the `reqwest`-backed
//! [`HttpApi`] implementation, the request/response payloads and the form
//! validation rules shared by every front-end.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`error`] | [`ApiError`]: network failures, non-success responses, undecodable bodies |
//! | [`http`] | [`HttpApi`]: bearer header injection, JSON (de)serialisation, error-message extraction |
//! | [`models`] | Request/response payloads (`Credentials`, `Registration`, `PostDraft`, `AuthResponse`) and re-exported domain models |
//! | [`validation`] | Email, password, username, post and comment input checks |
//!
//! ## Endpoints
//!
//! | Method | Path | Trait method |
//! |--------|------|--------------|
//! | `POST` | `/auth/register` | [`register`](BlogApi::register) |
//! | `POST` | `/auth/login` | [`login`](BlogApi::login) |
//! | `GET` | `/posts` | [`list_posts`](BlogApi::list_posts) |
//! | `GET` | `/posts/{id}` | [`get_post`](BlogApi::get_post) |
//! | `POST` | `/posts` | [`create_post`](BlogApi::create_post) |
//! | `PUT` | `/posts/{id}` | [`update_post`](BlogApi::update_post) |
//! | `DELETE` | `/posts/{id}` | [`delete_post`](BlogApi::delete_post) |
//! | `POST` | `/posts/{id}/like` | [`toggle_like`](BlogApi::toggle_like) |
//! | `POST` | `/posts/{id}/comments` | [`add_comment`](BlogApi::add_comment) |
//! | `DELETE` | `/posts/{id}/comments/{commentId}` | [`delete_comment`](BlogApi::delete_comment) |
//!
//! Calls that take a `token` send it as `Authorization: Bearer <token>`; `None`
//! makes the request anonymous.

use std::future::Future;

pub mod error;
pub mod http;
pub mod models;
pub mod validation;

pub use error::ApiError;
pub use http::HttpApi;
pub use models::{AuthResponse, Credentials, PostDraft, Registration};
pub use store::{AuthorSummary, Comment, Identity, Post};

/// Async interface to the remote blog API.
pub trait BlogApi {
    fn register(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>>;

    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>>;

    fn list_posts(&self, token: Option<&str>) -> impl Future<Output = Result<Vec<Post>, ApiError>>;

    fn get_post(
        &self,
        token: Option<&str>,
        post_id: &str,
    ) -> impl Future<Output = Result<Post, ApiError>>;

    fn create_post(
        &self,
        token: Option<&str>,
        draft: &PostDraft,
    ) -> impl Future<Output = Result<Post, ApiError>>;

    fn update_post(
        &self,
        token: Option<&str>,
        post_id: &str,
        draft: &PostDraft,
    ) -> impl Future<Output = Result<Post, ApiError>>;

    fn delete_post(
        &self,
        token: Option<&str>,
        post_id: &str,
    ) -> impl Future<Output = Result<(), ApiError>>;

    /// Toggle the caller's membership in the post's like set.
    fn toggle_like(
        &self,
        token: Option<&str>,
        post_id: &str,
    ) -> impl Future<Output = Result<(), ApiError>>;

    /// Returns the created comment with its server-assigned id.
    fn add_comment(
        &self,
        token: Option<&str>,
        post_id: &str,
        content: &str,
    ) -> impl Future<Output = Result<Comment, ApiError>>;

    fn delete_comment(
        &self,
        token: Option<&str>,
        post_id: &str,
        comment_id: &str,
    ) -> impl Future<Output = Result<(), ApiError>>;
}
