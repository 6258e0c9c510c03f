//! Input checks run before any request is sent.
//!
//! Each function returns the user-facing message for the first problem found.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Credentials, PostDraft, Registration};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_USERNAME_LEN: usize = 3;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static EMAIL: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN));

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn validate_email(email: &str) -> bool {
    EMAIL.as_ref().is_ok_and(|re| re.is_match(email))
}

pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

pub fn validate_username(username: &str) -> bool {
    username.chars().count() >= MIN_USERNAME_LEN
}

pub fn check_credentials(credentials: &Credentials) -> Result<(), String> {
    if !validate_email(&credentials.email) {
        return Err("Please enter a valid email".to_string());
    }
    if !validate_password(&credentials.password) {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    Ok(())
}

/// Checks a signup form. `confirm_password` is the repeated password, which is
/// never sent to the server.
pub fn check_registration(registration: &Registration, confirm_password: &str) -> Result<(), String> {
    if !validate_username(&registration.username) {
        return Err(format!(
            "Username must be at least {MIN_USERNAME_LEN} characters"
        ));
    }
    check_credentials(&Credentials {
        email: registration.email.clone(),
        password: registration.password.clone(),
    })?;
    if registration.password != confirm_password {
        return Err("Passwords do not match".to_string());
    }
    Ok(())
}

pub fn check_post_draft(draft: &PostDraft) -> Result<(), String> {
    if draft.title.trim().is_empty() || draft.content.trim().is_empty() {
        return Err("Please fill in all fields".to_string());
    }
    Ok(())
}
