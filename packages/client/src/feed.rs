//! Post feed: the list of all posts, paged for display.

use api::{validation, ApiError, BlogApi, PostDraft};
use store::config::FeedConfig;
use store::Post;

use crate::error::ClientError;
use crate::mutation::{LikeToggle, OptimisticMutator, PostRemoval};
use crate::notify::Notifier;
use crate::session::SessionHandle;

/// Shown when an anonymous caller tries to like.
pub const LOGIN_TO_LIKE: &str = "Please login to like posts";

/// The server's message for a status error, `fallback` otherwise.
pub(crate) fn failure_message(error: &ApiError, fallback: &str) -> String {
    match error {
        ApiError::Status { message, .. } => message.clone(),
        _ => fallback.to_string(),
    }
}

pub struct PostFeed<A: BlogApi> {
    api: A,
    session: SessionHandle,
    posts: OptimisticMutator<Vec<Post>>,
    notifier: Notifier,
    per_page: usize,
}

impl<A: BlogApi> PostFeed<A> {
    pub fn new(api: A, session: SessionHandle, notifier: Notifier) -> Self {
        Self {
            api,
            session,
            posts: OptimisticMutator::new(Vec::new(), notifier.clone()),
            notifier,
            per_page: FeedConfig::default().posts_per_page,
        }
    }

    pub fn with_config(mut self, config: &FeedConfig) -> Self {
        self.per_page = config.posts_per_page.max(1);
        self
    }

    /// Replace local posts with the server's list.
    pub async fn load(&self) -> Result<(), ClientError> {
        let token = self.session.token();
        let posts = self.api.list_posts(token.as_deref()).await.map_err(|e| {
            tracing::error!("Failed to load posts: {}", e);
            e
        })?;
        tracing::debug!("Loaded {} posts", posts.len());
        self.posts.replace(posts);
        Ok(())
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.read(|posts| posts.clone())
    }

    pub fn post(&self, post_id: &str) -> Option<Post> {
        self.posts
            .read(|posts| posts.iter().find(|p| p.id == post_id).cloned())
    }

    /// Posts on a 1-based page. Page 0 is treated as page 1.
    pub fn page(&self, page: usize) -> Vec<Post> {
        let start = page.max(1).saturating_sub(1).saturating_mul(self.per_page);
        self.posts.read(|posts| {
            posts
                .iter()
                .skip(start)
                .take(self.per_page)
                .cloned()
                .collect()
        })
    }

    pub fn page_count(&self) -> usize {
        self.posts.read(|posts| posts.len().div_ceil(self.per_page))
    }

    /// Like or unlike a post as the current user.
    ///
    /// Anonymous callers are told to log in and no request is sent. A failed
    /// request restores the previous like set and then re-fetches the list.
    pub async fn toggle_like(&self, post_id: &str) -> Result<(), ClientError> {
        let identity = match self.session.require_identity() {
            Ok(identity) => identity,
            Err(e) => {
                self.notifier.info(LOGIN_TO_LIKE);
                return Err(e);
            }
        };
        let token = self.session.token();
        let result = self
            .posts
            .run(LikeToggle::new(post_id, identity.summary()), || {
                self.api.toggle_like(token.as_deref(), post_id)
            })
            .await;

        if let Err(ClientError::Api(_)) = &result {
            if let Err(e) = self.load().await {
                tracing::warn!("Keeping local posts after failed re-fetch: {}", e);
            }
        }
        result
    }

    /// Remove a post authored by the current user.
    ///
    /// The post disappears immediately and comes back at the same position if
    /// the server refuses.
    pub async fn delete_post(&self, post_id: &str) -> Result<(), ClientError> {
        let identity = self.session.require_identity()?;
        if let Some(post) = self.post(post_id) {
            if !post.is_authored_by(&identity.id) {
                return Err(ClientError::Forbidden(format!("post {post_id}")));
            }
        }
        let token = self.session.token();
        self.posts
            .run(PostRemoval::new(post_id), || {
                self.api.delete_post(token.as_deref(), post_id)
            })
            .await
    }

    /// Create a post. Not optimistic: the post is added once the server has
    /// assigned its id.
    pub async fn create_post(&self, draft: &PostDraft) -> Result<Post, ClientError> {
        self.session.require_identity()?;
        if let Err(message) = validation::check_post_draft(draft) {
            self.notifier.error(&message);
            return Err(ClientError::Validation(message));
        }
        let token = self.session.token();
        match self.api.create_post(token.as_deref(), draft).await {
            Ok(created) => {
                self.posts.update(|posts| {
                    if !posts.iter().any(|p| p.id == created.id) {
                        posts.insert(0, created.clone());
                    }
                });
                self.notifier.success("Post created successfully!");
                Ok(created)
            }
            Err(e) => {
                self.notifier
                    .error(&failure_message(&e, "Failed to create post"));
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::LIKE_FAILED;
    use crate::notify::NotificationLevel;
    use crate::testing::{anonymous, post, signed_in, user, FakeApi};

    fn feed_of(api: &FakeApi, session: SessionHandle, notifier: &Notifier) -> PostFeed<FakeApi> {
        PostFeed::new(api.clone(), session, notifier.clone())
    }

    #[tokio::test]
    async fn test_load_and_paginate() {
        let posts: Vec<Post> = (1..=13).map(|i| post(&format!("p{i}"), "u1")).collect();
        let api = FakeApi::with_posts(posts);
        let session = anonymous().await;
        let feed = feed_of(&api, session.handle(), &Notifier::default());

        feed.load().await.unwrap();
        assert_eq!(feed.posts().len(), 13);
        assert_eq!(feed.page_count(), 3);
        assert_eq!(feed.page(1).len(), 6);
        assert_eq!(feed.page(1)[0].id, "p1");
        assert_eq!(feed.page(0), feed.page(1));
        assert_eq!(feed.page(3).len(), 1);
        assert_eq!(feed.page(3)[0].id, "p13");
        assert!(feed.page(4).is_empty());
        assert_eq!(api.calls(), ["list_posts  token=-"]);
    }

    #[tokio::test]
    async fn test_custom_page_size() {
        let posts: Vec<Post> = (1..=4).map(|i| post(&format!("p{i}"), "u1")).collect();
        let api = FakeApi::with_posts(posts);
        let session = anonymous().await;
        let feed = feed_of(&api, session.handle(), &Notifier::default())
            .with_config(&FeedConfig { posts_per_page: 0 });

        feed.load().await.unwrap();
        assert_eq!(feed.page_count(), 4);
    }

    #[tokio::test]
    async fn test_like_forwards_token_and_commits() {
        let api = FakeApi::with_posts(vec![post("p1", "u9")]);
        let session = signed_in("u1").await;
        let notifier = Notifier::default();
        let feed = feed_of(&api, session.handle(), &notifier);
        feed.load().await.unwrap();

        feed.toggle_like("p1").await.unwrap();
        assert!(feed.post("p1").unwrap().is_liked_by("u1"));
        assert!(api.server_post("p1").unwrap().is_liked_by("u1"));
        assert!(api.calls().contains(&"toggle_like p1 token=tok-u1".to_string()));
        assert_eq!(notifier.drain().last().unwrap().message, "Post liked");

        feed.toggle_like("p1").await.unwrap();
        assert!(feed.post("p1").unwrap().likes.is_empty());
        assert_eq!(notifier.drain().last().unwrap().message, "Post unliked");
    }

    #[tokio::test]
    async fn test_failed_like_rolls_back() {
        let mut p1 = post("p1", "u9");
        p1.likes = vec![user("u2")];
        let api = FakeApi::with_posts(vec![p1]);
        let session = signed_in("u1").await;
        let notifier = Notifier::default();
        let feed = feed_of(&api, session.handle(), &notifier);
        feed.load().await.unwrap();
        let before = feed.post("p1").unwrap().likes;

        api.fail("toggle_like");
        let err = feed.toggle_like("p1").await.unwrap_err();
        assert!(matches!(err, ClientError::Api(_)));
        assert_eq!(feed.post("p1").unwrap().likes, before);

        let notes = notifier.drain();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert_eq!(notes[0].message, LIKE_FAILED);
    }

    #[tokio::test]
    async fn test_failed_like_takes_server_state_on_refetch() {
        let api = FakeApi::with_posts(vec![post("p1", "u9")]);
        let session = signed_in("u1").await;
        let feed = feed_of(&api, session.handle(), &Notifier::default());
        feed.load().await.unwrap();

        // Someone else liked the post in the meantime.
        api.edit_server_post("p1", |p| p.likes.push(user("u7")));
        api.fail("toggle_like");
        assert!(feed.toggle_like("p1").await.is_err());

        assert_eq!(feed.post("p1").unwrap().likes, vec![user("u7")]);
        assert_eq!(
            api.calls(),
            [
                "list_posts  token=tok-u1",
                "toggle_like p1 token=tok-u1",
                "list_posts  token=tok-u1",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_like_keeps_inverse_when_refetch_fails() {
        let mut p1 = post("p1", "u9");
        p1.likes = vec![user("u2"), user("u1")];
        let api = FakeApi::with_posts(vec![p1]);
        let session = signed_in("u1").await;
        let feed = feed_of(&api, session.handle(), &Notifier::default());
        feed.load().await.unwrap();
        let before = feed.post("p1").unwrap().likes;

        api.fail("toggle_like");
        api.fail("list_posts");
        assert!(feed.toggle_like("p1").await.is_err());
        assert_eq!(feed.post("p1").unwrap().likes, before);
    }

    #[tokio::test]
    async fn test_anonymous_like_is_rejected_without_request() {
        let api = FakeApi::with_posts(vec![post("p1", "u9")]);
        let session = anonymous().await;
        let notifier = Notifier::default();
        let feed = feed_of(&api, session.handle(), &notifier);
        feed.load().await.unwrap();
        let calls_before = api.calls().len();

        let err = feed.toggle_like("p1").await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
        assert_eq!(api.calls().len(), calls_before);
        assert!(feed.post("p1").unwrap().likes.is_empty());
        assert_eq!(notifier.drain()[0].message, LOGIN_TO_LIKE);
    }

    #[tokio::test]
    async fn test_delete_post_rolls_back_on_failure() {
        let api = FakeApi::with_posts(vec![post("p1", "u1"), post("p2", "u1"), post("p3", "u1")]);
        let session = signed_in("u1").await;
        let notifier = Notifier::default();
        let feed = feed_of(&api, session.handle(), &notifier);
        feed.load().await.unwrap();

        api.fail("delete_post");
        assert!(feed.delete_post("p2").await.is_err());
        let ids: Vec<_> = feed.posts().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, ["p1", "p2", "p3"]);
        assert_eq!(notifier.drain()[0].message, "Failed to delete post");
    }

    #[tokio::test]
    async fn test_delete_post_success() {
        let api = FakeApi::with_posts(vec![post("p1", "u1"), post("p2", "u1")]);
        let session = signed_in("u1").await;
        let notifier = Notifier::default();
        let feed = feed_of(&api, session.handle(), &notifier);
        feed.load().await.unwrap();

        feed.delete_post("p1").await.unwrap();
        assert!(feed.post("p1").is_none());
        assert!(api.server_post("p1").is_none());
        assert_eq!(notifier.drain()[0].message, "Post deleted successfully");
    }

    #[tokio::test]
    async fn test_delete_someone_elses_post_is_forbidden() {
        let api = FakeApi::with_posts(vec![post("p1", "u9")]);
        let session = signed_in("u1").await;
        let feed = feed_of(&api, session.handle(), &Notifier::default());
        feed.load().await.unwrap();

        let err = feed.delete_post("p1").await.unwrap_err();
        assert!(matches!(err, ClientError::Forbidden(_)));
        assert!(feed.post("p1").is_some());
        assert!(!api.calls().iter().any(|c| c.starts_with("delete_post")));
    }

    #[tokio::test]
    async fn test_create_post_inserts_server_copy() {
        let api = FakeApi::with_posts(vec![post("p1", "u9")]);
        let session = signed_in("u1").await;
        let notifier = Notifier::default();
        let feed = feed_of(&api, session.handle(), &notifier);
        feed.load().await.unwrap();

        let created = feed
            .create_post(&PostDraft::new("Hello", "World"))
            .await
            .unwrap();
        assert!(created.id.starts_with("p-new-"));
        assert_eq!(feed.posts()[0].id, created.id);
        assert!(created.is_authored_by("u1"));
        assert_eq!(notifier.drain()[0].message, "Post created successfully!");
    }

    #[tokio::test]
    async fn test_create_post_failures() {
        let api = FakeApi::default();
        let session = signed_in("u1").await;
        let notifier = Notifier::default();
        let feed = feed_of(&api, session.handle(), &notifier);

        let err = feed.create_post(&PostDraft::new("", "x")).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(api.calls().is_empty());
        assert_eq!(notifier.drain()[0].message, "Please fill in all fields");

        api.fail("create_post");
        assert!(feed.create_post(&PostDraft::new("a", "b")).await.is_err());
        assert!(feed.posts().is_empty());
        assert_eq!(notifier.drain()[0].message, "create_post failed");
    }
}
