//! Single-post view: the post, its likes and its comments.
//!
//! Same protocol as the feed: after a failed like toggle the inverse is applied
//! and the post is re-fetched from the server.

use api::{validation, BlogApi, Comment, PostDraft};
use store::Post;

use crate::error::ClientError;
use crate::feed::{failure_message, LOGIN_TO_LIKE};
use crate::mutation::{CommentRemoval, LikeToggle, OptimisticMutator, PostRemoval};
use crate::notify::Notifier;
use crate::session::SessionHandle;

pub const NOT_AUTHOR: &str = "You are not authorized to edit this post";

pub struct PostDetail<A: BlogApi> {
    api: A,
    session: SessionHandle,
    post_id: String,
    post: OptimisticMutator<Option<Post>>,
    notifier: Notifier,
}

impl<A: BlogApi> PostDetail<A> {
    pub fn new(api: A, session: SessionHandle, notifier: Notifier, post_id: impl Into<String>) -> Self {
        Self {
            api,
            session,
            post_id: post_id.into(),
            post: OptimisticMutator::new(None, notifier.clone()),
            notifier,
        }
    }

    pub async fn load(&self) -> Result<(), ClientError> {
        let token = self.session.token();
        match self.api.get_post(token.as_deref(), &self.post_id).await {
            Ok(post) => {
                self.post.replace(Some(post));
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load post {}: {}", self.post_id, e);
                self.notifier.error("Failed to load post");
                Err(e.into())
            }
        }
    }

    /// `None` before `load` and after the post has been deleted.
    pub fn post(&self) -> Option<Post> {
        self.post.read(|p| p.clone())
    }

    pub fn is_liked(&self) -> bool {
        match self.session.current_identity() {
            Some(identity) => self
                .post
                .read(|p| p.as_ref().is_some_and(|p| p.is_liked_by(&identity.id))),
            None => false,
        }
    }

    /// Current user wrote the post.
    pub fn can_edit(&self) -> bool {
        match self.session.current_identity() {
            Some(identity) => self
                .post
                .read(|p| p.as_ref().is_some_and(|p| p.is_authored_by(&identity.id))),
            None => false,
        }
    }

    /// Current user wrote the comment.
    pub fn can_delete_comment(&self, comment_id: &str) -> bool {
        let Some(identity) = self.session.current_identity() else {
            return false;
        };
        self.post.read(|p| {
            p.as_ref()
                .and_then(|p| p.comment(comment_id))
                .is_some_and(|c| c.is_authored_by(&identity.id))
        })
    }

    /// Like or unlike the post. On failure the inverse is applied and the
    /// post is re-fetched.
    pub async fn toggle_like(&self) -> Result<(), ClientError> {
        let identity = match self.session.require_identity() {
            Ok(identity) => identity,
            Err(e) => {
                self.notifier.info(LOGIN_TO_LIKE);
                return Err(e);
            }
        };
        let token = self.session.token();
        let result = self
            .post
            .run(LikeToggle::new(&self.post_id, identity.summary()), || {
                self.api.toggle_like(token.as_deref(), &self.post_id)
            })
            .await;

        if let Err(ClientError::Api(_)) = &result {
            self.refetch().await;
        }
        result
    }

    /// Replace local state with the server copy, keeping local state if that
    /// fails too.
    async fn refetch(&self) {
        let token = self.session.token();
        match self.api.get_post(token.as_deref(), &self.post_id).await {
            Ok(post) => self.post.replace(Some(post)),
            Err(e) => tracing::warn!("Re-fetch of post {} failed: {}", self.post_id, e),
        }
    }

    /// Add a comment. Nothing is inserted locally until the server returns the
    /// comment with its id. Blank input is rejected; anything else is sent as
    /// typed.
    pub async fn add_comment(&self, content: &str) -> Result<Comment, ClientError> {
        self.session.require_identity()?;
        if content.trim().is_empty() {
            return Err(ClientError::Validation("Comment cannot be empty".to_string()));
        }
        let token = self.session.token();
        match self
            .api
            .add_comment(token.as_deref(), &self.post_id, content)
            .await
        {
            Ok(created) => {
                self.post.update(|p| {
                    if let Some(post) = p.as_mut() {
                        if post.comment(&created.id).is_none() {
                            post.comments.push(created.clone());
                        }
                    }
                });
                self.notifier.success("Comment added");
                Ok(created)
            }
            Err(e) => {
                tracing::warn!("Failed to add comment on {}: {}", self.post_id, e);
                self.notifier.error("Failed to add comment");
                Err(e.into())
            }
        }
    }

    /// Remove one of the current user's comments; restored in place on failure.
    pub async fn delete_comment(&self, comment_id: &str) -> Result<(), ClientError> {
        let identity = self.session.require_identity()?;
        let author = self.post.read(|p| {
            p.as_ref()
                .and_then(|p| p.comment(comment_id))
                .map(|c| c.author.id.clone())
        });
        if author.is_some_and(|id| id != identity.id) {
            return Err(ClientError::Forbidden(format!("comment {comment_id}")));
        }
        let token = self.session.token();
        self.post
            .run(CommentRemoval::new(&self.post_id, comment_id), || {
                self.api
                    .delete_comment(token.as_deref(), &self.post_id, comment_id)
            })
            .await
    }

    /// Delete the post; local state becomes `None` and is restored on failure.
    pub async fn delete_post(&self) -> Result<(), ClientError> {
        self.session.require_identity()?;
        if self.post.read(|p| p.is_some()) && !self.can_edit() {
            return Err(ClientError::Forbidden(format!("post {}", self.post_id)));
        }
        let token = self.session.token();
        self.post
            .run(PostRemoval::new(&self.post_id), || {
                self.api.delete_post(token.as_deref(), &self.post_id)
            })
            .await
    }

    /// Save edits to the post. Not optimistic: local state takes the server's
    /// copy once the update succeeds.
    pub async fn update_post(&self, draft: &PostDraft) -> Result<Post, ClientError> {
        self.session.require_identity()?;
        if self.post.read(|p| p.is_some()) && !self.can_edit() {
            self.notifier.error(NOT_AUTHOR);
            return Err(ClientError::Forbidden(format!("post {}", self.post_id)));
        }
        if let Err(message) = validation::check_post_draft(draft) {
            self.notifier.error(&message);
            return Err(ClientError::Validation(message));
        }
        let token = self.session.token();
        match self
            .api
            .update_post(token.as_deref(), &self.post_id, draft)
            .await
        {
            Ok(updated) => {
                self.post.replace(Some(updated.clone()));
                self.notifier.success("Post updated successfully!");
                Ok(updated)
            }
            Err(e) => {
                self.notifier
                    .error(&failure_message(&e, "Failed to update post"));
                Err(e.into())
            }
        }
    }
}
