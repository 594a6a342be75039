use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    locations::{
        dto::{LocationListResponse, LocationPatch, LocationSavedResponse},
        repo_types::{Location, LocationFields},
        services,
    },
    responses::MessageResponse,
    state::AppState,
    validation::ValidatedJson,
};

pub fn collection_routes() -> Router<AppState> {
    Router::new().route("/locations", get(list_locations).post(create_location))
}

pub fn item_routes() -> Router<AppState> {
    Router::new().route(
        "/locations/:id",
        get(get_location).put(update_location).delete(delete_location),
    )
}

#[instrument(skip(state, fields))]
pub async fn create_location(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidatedJson(fields): ValidatedJson<LocationFields>,
) -> Result<(StatusCode, Json<LocationSavedResponse>), AppError> {
    let location = services::create(&state, user_id, fields).await?;
    Ok((
        StatusCode::CREATED,
        Json(LocationSavedResponse {
            message: "Location added successfully",
            location,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_locations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<LocationListResponse>, AppError> {
    let locations = services::list(&state, user_id).await?;
    Ok(Json(LocationListResponse {
        count: locations.len(),
        locations,
    }))
}

#[instrument(skip(state))]
pub async fn get_location(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Location>, AppError> {
    Ok(Json(services::get(&state, user_id, &id).await?))
}

#[instrument(skip(state, patch))]
pub async fn update_location(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    ValidatedJson(patch): ValidatedJson<LocationPatch>,
) -> Result<Json<LocationSavedResponse>, AppError> {
    let location = services::update(&state, user_id, &id, patch).await?;
    Ok(Json(LocationSavedResponse {
        message: "Location updated successfully",
        location,
    }))
}

#[instrument(skip(state))]
pub async fn delete_location(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    services::delete(&state, user_id, &id).await?;
    Ok(Json(MessageResponse::new("Location deleted successfully")))
}
