use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::tokens::TokenService;
use crate::db::models::{NewUser, PublicUser};
use crate::error::{AppError, AppResult, INVALID_CREDENTIALS};
use crate::store::UserRepository;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

static EMAIL_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"));

/// Loose shape check: one `@`, something before it, and a dotted domain.
fn looks_like_email(email: &str) -> bool {
    EMAIL_RE.as_ref().is_ok_and(|re| re.is_match(email))
}

/// Create an account. Uniqueness of username and email is left to the store,
/// so two concurrent registrations cannot both win.
pub async fn register(
    users: &dyn UserRepository,
    bcrypt_cost: u32,
    req: RegisterUser,
) -> AppResult<PublicUser> {
    let username = req.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::BadRequest("Username is required".into()));
    }
    let email = req.email.trim().to_string();
    if !looks_like_email(&email) {
        return Err(AppError::BadRequest("Email address is not valid".into()));
    }
    if req.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".into()));
    }

    let password_hash = hash_password(&req.password, bcrypt_cost)?;
    let user = users
        .insert(NewUser {
            username,
            email,
            password_hash,
        })
        .await?;

    tracing::info!("Registered user {} ({})", user.username, user.id);
    Ok(user.into())
}

pub async fn get_user(users: &dyn UserRepository, id: i64) -> AppResult<PublicUser> {
    users
        .get(id)
        .await?
        .map(PublicUser::from)
        .ok_or(AppError::NotFound("User not found"))
}

/// Exchange credentials for an access token. Unknown usernames and wrong
/// passwords fail identically. The username is trimmed as on registration.
pub async fn login(
    users: &dyn UserRepository,
    tokens: &TokenService,
    req: LoginRequest,
) -> AppResult<AccessToken> {
    let user = users
        .find_by_username(req.username.trim())
        .await?
        .ok_or(AppError::Unauthenticated(INVALID_CREDENTIALS))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(AppError::Unauthenticated(INVALID_CREDENTIALS));
    }

    let access_token = tokens
        .issue(user.id, tokens.ttl())
        .map_err(|e| AppError::Internal(format!("Failed to issue token: {e}")))?;

    tracing::info!("User {} logged in", user.id);
    Ok(AccessToken {
        access_token,
        token_type: "bearer".to_string(),
    })
}
