use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, ProfileResponse, ProfileUpdatedResponse, PublicUser,
            RegisterRequest, UpdateProfileRequest,
        },
        extractors::AuthUser,
        services::{self, IssuedCredential},
    },
    config::{AuthStrategy, SessionConfig},
    error::AppError,
    responses::MessageResponse,
    state::AppState,
    validation::ValidatedJson,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/users/profile", get(get_profile).put(update_profile))
}

fn session_cookie(cfg: &SessionConfig, value: &str, max_age_secs: i64) -> Result<HeaderValue, AppError> {
    let secure = if cfg.secure_cookie { "; Secure" } else { "" };
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        cfg.cookie_name, value, max_age_secs, secure
    );
    HeaderValue::from_str(&cookie).map_err(|e| AppError::Internal(e.into()))
}

/// Splits an issued credential into the JSON token and the `Set-Cookie` header.
fn credential_parts(
    state: &AppState,
    credential: IssuedCredential,
) -> Result<(Option<String>, HeaderMap), AppError> {
    let mut headers = HeaderMap::new();
    match credential {
        IssuedCredential::Token(token) => Ok((Some(token), headers)),
        IssuedCredential::Session(session) => {
            let cfg = &state.config.auth.session;
            let max_age = cfg.ttl_minutes * 60;
            headers.insert(header::SET_COOKIE, session_cookie(cfg, &session.id, max_age)?);
            Ok((None, headers))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (user, credential) = services::register(&state, payload).await?;
    let (token, headers) = credential_parts(&state, credential)?;
    Ok((
        StatusCode::CREATED,
        headers,
        Json(AuthResponse {
            message: "User registered successfully",
            token,
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (user, credential) = services::login(&state, payload).await?;
    let (token, headers) = credential_parts(&state, credential)?;
    Ok((
        headers,
        Json(AuthResponse {
            message: "Logged in",
            token,
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    services::logout(&state, user_id, &headers).await?;

    let mut response_headers = HeaderMap::new();
    if state.config.auth.strategy == AuthStrategy::Session {
        let cfg = &state.config.auth.session;
        response_headers.insert(header::SET_COOKIE, session_cookie(cfg, "", 0)?);
    }
    Ok((
        response_headers,
        Json(MessageResponse::new("Logged out successfully")),
    ))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = services::profile(&state, user_id).await?;
    Ok(Json(ProfileResponse::from(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ProfileUpdatedResponse>, AppError> {
    let user = services::update_profile(&state, user_id, payload).await?;
    Ok(Json(ProfileUpdatedResponse {
        message: "Profile updated successfully",
        user: PublicUser::from(&user),
    }))
}
