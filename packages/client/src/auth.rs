//! Login and registration. Both validate locally, call the API, and hand the
//! returned identity and token to [`SessionStore::login`].

use api::{validation, AuthResponse, BlogApi, Credentials, Registration};
use store::{Identity, SessionPersistence};

use crate::error::ClientError;
use crate::feed::failure_message;
use crate::notify::Notifier;
use crate::session::SessionStore;

pub async fn login<A, P>(
    api: &A,
    session: &SessionStore<P>,
    notifier: &Notifier,
    credentials: &Credentials,
) -> Result<Identity, ClientError>
where
    A: BlogApi,
    P: SessionPersistence,
{
    if let Err(message) = validation::check_credentials(credentials) {
        notifier.error(&message);
        return Err(ClientError::Validation(message));
    }
    let response = api.login(credentials).await.map_err(|e| {
        tracing::warn!("Login failed for {}: {}", credentials.email, e);
        notifier.error(&failure_message(&e, "Login failed"));
        e
    })?;
    let identity = establish(session, notifier, response).await?;
    notifier.success("Login successful!");
    Ok(identity)
}

pub async fn register<A, P>(
    api: &A,
    session: &SessionStore<P>,
    notifier: &Notifier,
    registration: &Registration,
    confirm_password: &str,
) -> Result<Identity, ClientError>
where
    A: BlogApi,
    P: SessionPersistence,
{
    if let Err(message) = validation::check_registration(registration, confirm_password) {
        notifier.error(&message);
        return Err(ClientError::Validation(message));
    }
    let response = api.register(registration).await.map_err(|e| {
        tracing::warn!("Registration failed for {}: {}", registration.email, e);
        notifier.error(&failure_message(&e, "Registration failed"));
        e
    })?;
    let identity = establish(session, notifier, response).await?;
    notifier.success("Registration successful!");
    Ok(identity)
}

/// Hand a server-issued session to the store. A session that `initialize`
/// would discard on the next start is refused instead.
async fn establish<P: SessionPersistence>(
    session: &SessionStore<P>,
    notifier: &Notifier,
    response: AuthResponse,
) -> Result<Identity, ClientError> {
    if !response.user.is_valid() || response.token.trim().is_empty() {
        tracing::error!("Auth response is missing the user id or token");
        notifier.error(api::error::FALLBACK_MESSAGE);
        return Err(ClientError::IncompleteSession);
    }
    let identity = response.user.clone();
    session.login(response.user, response.token).await;
    Ok(identity)
}
