use api::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// A gated action was attempted without a session. No request was sent.
    #[error("requires authentication")]
    NotAuthenticated,

    /// Local input check failed. No request was sent.
    #[error("{0}")]
    Validation(String),

    /// The targeted entity is not in local state.
    #[error("{0} not found")]
    NotFound(String),

    /// The acting identity is not the author of the entity.
    #[error("not the author of {0}")]
    Forbidden(String),

    /// The server accepted the credentials but returned a blank identity id or
    /// token. Nothing was stored.
    #[error("server returned an incomplete session")]
    IncompleteSession,

    #[error(transparent)]
    Api(#[from] ApiError),
}
