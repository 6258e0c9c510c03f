//! # Client core: session lifecycle and optimistic mutations
//!
//! The part of the blog client that front-ends call into. Views read the
//! session and post state from here and route every like/comment/post action
//! through the optimistic mutation protocol.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`session`] | [`SessionStore`]: initialize/login/logout, the sole writer of the session; [`SessionHandle`] read-only snapshots |
//! | [`navigation`] | [`LoginRedirect`] observer and the route guard, kept out of the store |
//! | [`notify`] | Transient user-facing notifications |
//! | [`mutation`] | The generic apply → remote → commit/rollback protocol and the like/comment/post mutations |
//! | [`feed`] | [`PostFeed`]: the post list with pagination |
//! | [`detail`] | [`PostDetail`]: a single post with its comments |
//! | [`auth`] | Login and registration flows that end in [`SessionStore::login`] |

pub mod auth;
pub mod detail;
pub mod error;
pub mod feed;
pub mod mutation;
pub mod navigation;
pub mod notify;
pub mod session;

#[cfg(test)]
mod testing;

pub use detail::PostDetail;
pub use error::ClientError;
pub use feed::PostFeed;
pub use mutation::{OptimisticMutator, PendingMutation};
pub use navigation::{protect, LoginRedirect, Navigation, RouteAccess};
pub use notify::{Notification, NotificationLevel, Notifier};
pub use session::{Session, SessionHandle, SessionState, SessionStore};
