//! # Optimistic mutations
//!
//! Every user action that changes shared post state goes through the same
//! protocol:
//!
//! 1. **Apply**: a [`Mutation`] changes local state synchronously and hands
//!    back the [`Inverse`] that undoes exactly that change. The pair becomes a
//!    [`PendingMutation`].
//! 2. **Remote**: the matching API call is issued.
//! 3. **Commit** on success: the optimistic state is final; the pending
//!    mutation is dropped and a success notice is queued.
//! 4. **Rollback** on failure: the inverse is applied and an error notice is
//!    queued.
//!
//! [`OptimisticMutator::run`] drives all four steps. The lock on local state is
//! never held across the remote call, so a read issued while the call is in
//! flight already sees the optimistic value.
//!
//! Remote resolutions are not serialised. Two quick toggles on the same post
//! apply locally in call order but may resolve in either order; the last one to
//! resolve decides what the server holds.
//!
//! ## Mutations
//!
//! | Mutation | Apply | Inverse |
//! |----------|-------|---------|
//! | [`LikeToggle`] | add or remove the liker in `likes` | remove the added like, or re-insert the removed one at its old position |
//! | [`CommentRemoval`] | remove one comment by id | re-insert it at its old position |
//! | [`PostRemoval`] | remove the post from the collection | re-insert it at its old position |
//!
//! All three work on any [`PostCollection`]: the feed's `Vec<Post>` and the
//! detail view's `Option<Post>`.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use api::ApiError;
use store::{AuthorSummary, Comment, Post};

use crate::error::ClientError;
use crate::notify::Notifier;

/// Generic message for a failed like toggle.
pub const LIKE_FAILED: &str = "Something went wrong";

/// Local state that holds posts by id.
pub trait PostCollection {
    fn find_mut(&mut self, post_id: &str) -> Option<&mut Post>;
    /// Remove a post, returning its position.
    fn take(&mut self, post_id: &str) -> Option<(usize, Post)>;
    /// Put a post back at `index` (clamped). No-op if a post with its id is present.
    fn restore(&mut self, index: usize, post: Post);
}

impl PostCollection for Vec<Post> {
    fn find_mut(&mut self, post_id: &str) -> Option<&mut Post> {
        self.iter_mut().find(|p| p.id == post_id)
    }

    fn take(&mut self, post_id: &str) -> Option<(usize, Post)> {
        let index = self.iter().position(|p| p.id == post_id)?;
        Some((index, self.remove(index)))
    }

    fn restore(&mut self, index: usize, post: Post) {
        if self.iter().any(|p| p.id == post.id) {
            return;
        }
        let index = index.min(self.len());
        self.insert(index, post);
    }
}

impl PostCollection for Option<Post> {
    fn find_mut(&mut self, post_id: &str) -> Option<&mut Post> {
        self.as_mut().filter(|p| p.id == post_id)
    }

    fn take(&mut self, post_id: &str) -> Option<(usize, Post)> {
        if self.as_ref().is_some_and(|p| p.id == post_id) {
            self.take().map(|p| (0, p))
        } else {
            None
        }
    }

    fn restore(&mut self, _index: usize, post: Post) {
        if self.is_none() {
            *self = Some(post);
        }
    }
}

/// A local state transition that can be undone.
pub trait Mutation<S> {
    type Inverse: Inverse<S>;

    /// Id of the entity being changed.
    fn target(&self) -> &str;

    /// Change `state` and return what undoes the change. On error `state` is
    /// left untouched.
    fn apply(self, state: &mut S) -> Result<Self::Inverse, ClientError>;
}

/// The undo half of a [`Mutation`].
pub trait Inverse<S> {
    fn rollback(self, state: &mut S);
    fn success_notice(&self) -> &'static str;
    fn failure_notice(&self) -> &'static str;
}

/// A mutation that has been applied locally and awaits its remote outcome.
#[derive(Debug)]
pub struct PendingMutation<I> {
    target: String,
    inverse: I,
}

/// Toggle one identity's membership in a post's like set.
#[derive(Clone, Debug)]
pub struct LikeToggle {
    post_id: String,
    liker: AuthorSummary,
}

impl LikeToggle {
    pub fn new(post_id: impl Into<String>, liker: AuthorSummary) -> Self {
        Self {
            post_id: post_id.into(),
            liker,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LikeInverse {
    /// The toggle added a like; undo removes it.
    Unlike { post_id: String, liker_id: String },
    /// The toggle removed a like; undo puts it back where it was.
    Relike {
        post_id: String,
        index: usize,
        like: AuthorSummary,
    },
}

impl LikeInverse {
    /// Whether the optimistic state has the post liked.
    pub fn liked(&self) -> bool {
        matches!(self, Self::Unlike { .. })
    }
}

impl<S: PostCollection> Mutation<S> for LikeToggle {
    type Inverse = LikeInverse;

    fn target(&self) -> &str {
        &self.post_id
    }

    fn apply(self, state: &mut S) -> Result<LikeInverse, ClientError> {
        let post = state
            .find_mut(&self.post_id)
            .ok_or_else(|| ClientError::NotFound(format!("post {}", self.post_id)))?;

        match post.likes.iter().position(|l| l.id == self.liker.id) {
            Some(index) => {
                let like = post.likes.remove(index);
                Ok(LikeInverse::Relike {
                    post_id: self.post_id,
                    index,
                    like,
                })
            }
            None => {
                let liker_id = self.liker.id.clone();
                post.likes.push(self.liker);
                Ok(LikeInverse::Unlike {
                    post_id: self.post_id,
                    liker_id,
                })
            }
        }
    }
}

impl<S: PostCollection> Inverse<S> for LikeInverse {
    fn rollback(self, state: &mut S) {
        match self {
            Self::Unlike { post_id, liker_id } => {
                if let Some(post) = state.find_mut(&post_id) {
                    post.likes.retain(|l| l.id != liker_id);
                }
            }
            Self::Relike {
                post_id,
                index,
                like,
            } => {
                if let Some(post) = state.find_mut(&post_id) {
                    if !post.is_liked_by(&like.id) {
                        let index = index.min(post.likes.len());
                        post.likes.insert(index, like);
                    }
                }
            }
        }
    }

    fn success_notice(&self) -> &'static str {
        if self.liked() {
            "Post liked"
        } else {
            "Post unliked"
        }
    }

    fn failure_notice(&self) -> &'static str {
        LIKE_FAILED
    }
}

/// Remove one comment from a post.
#[derive(Clone, Debug)]
pub struct CommentRemoval {
    post_id: String,
    comment_id: String,
}

impl CommentRemoval {
    pub fn new(post_id: impl Into<String>, comment_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            comment_id: comment_id.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommentRestore {
    post_id: String,
    index: usize,
    comment: Comment,
}

impl<S: PostCollection> Mutation<S> for CommentRemoval {
    type Inverse = CommentRestore;

    fn target(&self) -> &str {
        &self.comment_id
    }

    fn apply(self, state: &mut S) -> Result<CommentRestore, ClientError> {
        let post = state
            .find_mut(&self.post_id)
            .ok_or_else(|| ClientError::NotFound(format!("post {}", self.post_id)))?;
        let index = post
            .comments
            .iter()
            .position(|c| c.id == self.comment_id)
            .ok_or_else(|| ClientError::NotFound(format!("comment {}", self.comment_id)))?;
        let comment = post.comments.remove(index);
        Ok(CommentRestore {
            post_id: self.post_id,
            index,
            comment,
        })
    }
}

impl<S: PostCollection> Inverse<S> for CommentRestore {
    fn rollback(self, state: &mut S) {
        let Some(post) = state.find_mut(&self.post_id) else {
            return;
        };
        if post.comment(&self.comment.id).is_none() {
            let index = self.index.min(post.comments.len());
            post.comments.insert(index, self.comment);
        }
    }

    fn success_notice(&self) -> &'static str {
        "Comment deleted"
    }

    fn failure_notice(&self) -> &'static str {
        "Failed to delete comment"
    }
}

/// Remove a whole post.
#[derive(Clone, Debug)]
pub struct PostRemoval {
    post_id: String,
}

impl PostRemoval {
    pub fn new(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PostRestore {
    index: usize,
    post: Post,
}

impl<S: PostCollection> Mutation<S> for PostRemoval {
    type Inverse = PostRestore;

    fn target(&self) -> &str {
        &self.post_id
    }

    fn apply(self, state: &mut S) -> Result<PostRestore, ClientError> {
        let (index, post) = state
            .take(&self.post_id)
            .ok_or_else(|| ClientError::NotFound(format!("post {}", self.post_id)))?;
        Ok(PostRestore { index, post })
    }
}

impl<S: PostCollection> Inverse<S> for PostRestore {
    fn rollback(self, state: &mut S) {
        state.restore(self.index, self.post);
    }

    fn success_notice(&self) -> &'static str {
        "Post deleted successfully"
    }

    fn failure_notice(&self) -> &'static str {
        "Failed to delete post"
    }
}

/// Shared local state plus the apply/commit/rollback protocol over it.
#[derive(Debug)]
pub struct OptimisticMutator<S> {
    state: Arc<Mutex<S>>,
    notifier: Notifier,
}

impl<S> Clone for OptimisticMutator<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            notifier: self.notifier.clone(),
        }
    }
}

impl<S> OptimisticMutator<S> {
    pub fn new(state: S, notifier: Notifier) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            notifier,
        }
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.lock())
    }

    /// Replace local state with authoritative server data.
    pub fn replace(&self, state: S) {
        *self.lock() = state;
    }

    /// Direct write for reconciling non-optimistic creations.
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.lock())
    }

    /// Apply a mutation locally.
    pub fn begin<M: Mutation<S>>(&self, mutation: M) -> Result<PendingMutation<M::Inverse>, ClientError> {
        let target = mutation.target().to_string();
        let inverse = mutation.apply(&mut *self.lock())?;
        tracing::debug!("Applied optimistic mutation on {target}");
        Ok(PendingMutation { target, inverse })
    }

    /// The remote call succeeded: keep the optimistic state.
    pub fn commit<I: Inverse<S>>(&self, pending: PendingMutation<I>) {
        tracing::debug!("Committed mutation on {}", pending.target);
        self.notifier.success(pending.inverse.success_notice());
    }

    /// The remote call failed: undo the optimistic change.
    pub fn rollback<I: Inverse<S>>(&self, pending: PendingMutation<I>, error: &ApiError) {
        tracing::warn!("Rolling back mutation on {}: {}", pending.target, error);
        let notice = pending.inverse.failure_notice();
        pending.inverse.rollback(&mut *self.lock());
        self.notifier.error(notice);
    }

    /// Apply `mutation`, then run `remote` and reconcile with its outcome.
    ///
    /// A mutation that cannot be applied (e.g. unknown target) fails before
    /// `remote` is called.
    pub async fn run<M, T, F, Fut>(&self, mutation: M, remote: F) -> Result<T, ClientError>
    where
        M: Mutation<S>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let pending = self.begin(mutation)?;
        match remote().await {
            Ok(value) => {
                self.commit(pending);
                Ok(value)
            }
            Err(e) => {
                self.rollback(pending, &e);
                Err(e.into())
            }
        }
    }
}
