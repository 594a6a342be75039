use axum::{extract::FromRef, http::HeaderMap};
use time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, UpdateProfileRequest},
        extractors::{bearer_token, cookie_value},
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_password_blocking},
        repo_types::{NewUser, User, UserChanges},
        session::Session,
    },
    config::AuthStrategy,
    db::RepoError,
    error::AppError,
    state::AppState,
};

/// Bearer credential minted for a verified user, shaped by the configured strategy.
#[derive(Debug, Clone)]
pub enum IssuedCredential {
    Token(String),
    Session(Session),
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn email_conflict(e: RepoError) -> AppError {
    match e {
        RepoError::DuplicateEmail => AppError::Conflict("Email already registered".into()),
        RepoError::Other(e) => AppError::Internal(e),
    }
}

pub async fn register(
    state: &AppState,
    payload: RegisterRequest,
) -> Result<(User, IssuedCredential), AppError> {
    let email = normalize_email(&payload.email);

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password_blocking(payload.password).await?;
    let user = state
        .users
        .create(NewUser {
            name: payload.name.trim().to_string(),
            email,
            password_hash,
        })
        .await
        .map_err(email_conflict)?;

    let credential = issue_credential(state, user.id).await?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((user, credential))
}

pub async fn login(
    state: &AppState,
    payload: LoginRequest,
) -> Result<(User, IssuedCredential), AppError> {
    let email = normalize_email(&payload.email);

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password_blocking(payload.password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let credential = issue_credential(state, user.id).await?;
    info!(user_id = %user.id, "user logged in");
    Ok((user, credential))
}

pub async fn issue_credential(state: &AppState, user_id: Uuid) -> Result<IssuedCredential, AppError> {
    let auth = &state.config.auth;
    match auth.strategy {
        AuthStrategy::Jwt => {
            let token = JwtKeys::from_ref(state).sign(user_id).map_err(|e| {
                error!(error = %e, "jwt sign failed");
                AppError::Internal(e)
            })?;
            Ok(IssuedCredential::Token(token))
        }
        AuthStrategy::Session => {
            let session = Session::new(user_id, Duration::minutes(auth.session.ttl_minutes));
            state.sessions.create(&session).await?;
            Ok(IssuedCredential::Session(session))
        }
    }
}

/// Resolves the request's bearer credential to a user id.
///
/// Only the configured strategy is consulted: a JWT deployment never looks at
/// cookies and a session deployment never looks at the `Authorization` header.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Uuid, AppError> {
    let auth = &state.config.auth;
    match auth.strategy {
        AuthStrategy::Jwt => {
            let token = bearer_token(headers)
                .ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))?;
            let claims = JwtKeys::from_ref(state).verify(token).map_err(|e| {
                warn!(error = %e, "invalid or expired token");
                AppError::Unauthorized("Invalid or expired token".into())
            })?;
            Ok(claims.sub)
        }
        AuthStrategy::Session => {
            let sid = cookie_value(headers, &auth.session.cookie_name)
                .ok_or_else(|| AppError::Unauthorized("Missing session".into()))?;
            let session = state
                .sessions
                .find(sid)
                .await?
                .ok_or_else(|| AppError::Unauthorized("Invalid or expired session".into()))?;
            if session.is_expired() {
                state.sessions.delete(&session.id).await?;
                warn!(user_id = %session.user_id, "session expired");
                return Err(AppError::Unauthorized("Invalid or expired session".into()));
            }
            Ok(session.user_id)
        }
    }
}

/// Destroys the server-side session, if any. Tokens are stateless and simply expire.
pub async fn logout(state: &AppState, user_id: Uuid, headers: &HeaderMap) -> Result<(), AppError> {
    let auth = &state.config.auth;
    if auth.strategy == AuthStrategy::Session {
        if let Some(sid) = cookie_value(headers, &auth.session.cookie_name) {
            state.sessions.delete(sid).await?;
        }
    }
    info!(%user_id, "user logged out");
    Ok(())
}

pub async fn profile(state: &AppState, user_id: Uuid) -> Result<User, AppError> {
    state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Applies the supplied profile fields. Issued credentials stay valid, even after a
/// password change.
pub async fn update_profile(
    state: &AppState,
    user_id: Uuid,
    payload: UpdateProfileRequest,
) -> Result<User, AppError> {
    let password_hash = match payload.password {
        Some(plain) => Some(hash_password_blocking(plain).await?),
        None => None,
    };
    let changes = UserChanges {
        name: payload.name.map(|n| n.trim().to_string()),
        email: payload.email.as_deref().map(normalize_email),
        password_hash,
    };

    if changes.is_empty() {
        return profile(state, user_id).await;
    }

    let user = state
        .users
        .update(user_id, changes)
        .await
        .map_err(email_conflict)?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    info!(%user_id, "profile updated");
    Ok(user)
}
