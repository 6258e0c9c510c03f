//! Fixtures and a scripted in-memory [`BlogApi`] for unit tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use api::{ApiError, AuthResponse, BlogApi, Credentials, PostDraft, Registration};
use store::{AuthorSummary, Comment, Identity, MemoryStore, Post};

use crate::session::SessionStore;

pub fn user(id: &str) -> AuthorSummary {
    AuthorSummary {
        id: id.to_string(),
        username: format!("user-{id}"),
    }
}

pub fn identity(id: &str) -> Identity {
    Identity {
        id: id.to_string(),
        username: format!("user-{id}"),
        email: format!("{id}@example.com"),
    }
}

pub fn post(id: &str, author_id: &str) -> Post {
    Post {
        id: id.to_string(),
        title: format!("Title {id}"),
        content: format!("Content {id}"),
        author: user(author_id),
        created_at: "2024-01-01T00:00:00.000Z".to_string(),
        likes: Vec::new(),
        comments: Vec::new(),
    }
}

pub fn comment(id: &str, author_id: &str) -> Comment {
    Comment {
        id: id.to_string(),
        author: user(author_id),
        content: format!("Comment {id}"),
        created_at: "2024-01-02T00:00:00.000Z".to_string(),
    }
}

/// Session store already logged in as `id` with token `tok-<id>`.
pub async fn signed_in(id: &str) -> SessionStore<MemoryStore> {
    let session = SessionStore::new(MemoryStore::new());
    session.initialize().await;
    session.login(identity(id), format!("tok-{id}")).await;
    session
}

pub async fn anonymous() -> SessionStore<MemoryStore> {
    let session = SessionStore::new(MemoryStore::new());
    session.initialize().await;
    session
}

#[derive(Debug, Default)]
struct FakeState {
    /// Server-side truth.
    posts: Vec<Post>,
    calls: Vec<String>,
    failing: HashSet<&'static str>,
    next_id: u32,
    /// Replaces the normal login/register response.
    auth_response: Option<AuthResponse>,
}

/// Records every call as `"<op> <args> token=<token>"` and serves `posts`.
/// The acting user is derived from the `tok-<id>` token.
#[derive(Clone, Debug, Default)]
pub struct FakeApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    pub fn with_posts(posts: Vec<Post>) -> Self {
        let api = Self::default();
        api.lock().posts = posts;
        api
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Make every later call of `op` fail with a 500.
    pub fn fail(&self, op: &'static str) {
        self.lock().failing.insert(op);
    }

    /// Answer every later login and register with `response`.
    pub fn respond_to_auth(&self, response: AuthResponse) {
        self.lock().auth_response = Some(response);
    }

    fn scripted_auth(&self) -> Option<AuthResponse> {
        self.lock().auth_response.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn server_post(&self, id: &str) -> Option<Post> {
        self.lock().posts.iter().find(|p| p.id == id).cloned()
    }

    /// Change server-side state without going through the client.
    pub fn edit_server_post(&self, id: &str, f: impl FnOnce(&mut Post)) {
        if let Some(p) = self.lock().posts.iter_mut().find(|p| p.id == id) {
            f(p);
        }
    }

    fn record(&self, op: &'static str, args: &str, token: Option<&str>) -> Result<(), ApiError> {
        let mut state = self.lock();
        state
            .calls
            .push(format!("{op} {args} token={}", token.unwrap_or("-")));
        if state.failing.contains(op) {
            return Err(ApiError::status(500, format!("{op} failed")));
        }
        Ok(())
    }

    fn acting_user(token: Option<&str>) -> Result<AuthorSummary, ApiError> {
        token
            .and_then(|t| t.strip_prefix("tok-"))
            .map(user)
            .ok_or_else(|| ApiError::status(401, "Not authorized"))
    }

    fn not_found() -> ApiError {
        ApiError::status(404, "Post not found")
    }
}

impl BlogApi for FakeApi {
    async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        self.record("register", &registration.email, None)?;
        if let Some(response) = self.scripted_auth() {
            return Ok(response);
        }
        Ok(AuthResponse {
            user: Identity {
                id: "u-new".to_string(),
                username: registration.username.clone(),
                email: registration.email.clone(),
            },
            token: "tok-u-new".to_string(),
        })
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        self.record("login", &credentials.email, None)?;
        if credentials.password != "secret" {
            return Err(ApiError::status(400, "Invalid credentials"));
        }
        if let Some(response) = self.scripted_auth() {
            return Ok(response);
        }
        Ok(AuthResponse {
            user: identity("u1"),
            token: "tok-u1".to_string(),
        })
    }

    async fn list_posts(&self, token: Option<&str>) -> Result<Vec<Post>, ApiError> {
        self.record("list_posts", "", token)?;
        Ok(self.lock().posts.clone())
    }

    async fn get_post(&self, token: Option<&str>, post_id: &str) -> Result<Post, ApiError> {
        self.record("get_post", post_id, token)?;
        self.server_post(post_id).ok_or_else(Self::not_found)
    }

    async fn create_post(&self, token: Option<&str>, draft: &PostDraft) -> Result<Post, ApiError> {
        self.record("create_post", &draft.title, token)?;
        let author = Self::acting_user(token)?;
        let mut state = self.lock();
        state.next_id += 1;
        let created = Post {
            id: format!("p-new-{}", state.next_id),
            title: draft.title.clone(),
            content: draft.content.clone(),
            author,
            created_at: "2024-02-01T00:00:00.000Z".to_string(),
            likes: Vec::new(),
            comments: Vec::new(),
        };
        state.posts.insert(0, created.clone());
        Ok(created)
    }

    async fn update_post(
        &self,
        token: Option<&str>,
        post_id: &str,
        draft: &PostDraft,
    ) -> Result<Post, ApiError> {
        self.record("update_post", post_id, token)?;
        let mut state = self.lock();
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(Self::not_found)?;
        post.title = draft.title.clone();
        post.content = draft.content.clone();
        Ok(post.clone())
    }

    async fn delete_post(&self, token: Option<&str>, post_id: &str) -> Result<(), ApiError> {
        self.record("delete_post", post_id, token)?;
        self.lock().posts.retain(|p| p.id != post_id);
        Ok(())
    }

    async fn toggle_like(&self, token: Option<&str>, post_id: &str) -> Result<(), ApiError> {
        self.record("toggle_like", post_id, token)?;
        let liker = Self::acting_user(token)?;
        let mut state = self.lock();
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(Self::not_found)?;
        if post.is_liked_by(&liker.id) {
            post.likes.retain(|l| l.id != liker.id);
        } else {
            post.likes.push(liker);
        }
        Ok(())
    }

    async fn add_comment(
        &self,
        token: Option<&str>,
        post_id: &str,
        content: &str,
    ) -> Result<Comment, ApiError> {
        self.record("add_comment", post_id, token)?;
        let author = Self::acting_user(token)?;
        let mut state = self.lock();
        state.next_id += 1;
        let created = Comment {
            id: format!("c-new-{}", state.next_id),
            author,
            content: content.to_string(),
            created_at: "2024-02-01T00:00:00.000Z".to_string(),
        };
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(Self::not_found)?;
        post.comments.push(created.clone());
        Ok(created)
    }

    async fn delete_comment(
        &self,
        token: Option<&str>,
        post_id: &str,
        comment_id: &str,
    ) -> Result<(), ApiError> {
        self.record("delete_comment", &format!("{post_id}/{comment_id}"), token)?;
        if let Some(post) = self.lock().posts.iter_mut().find(|p| p.id == post_id) {
            post.comments.retain(|c| c.id != comment_id);
        }
        Ok(())
    }
}
