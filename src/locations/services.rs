use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    locations::{
        dto::LocationPatch,
        repo_types::{Location, LocationFields},
    },
    state::AppState,
};

fn not_found() -> AppError {
    AppError::NotFound("Location not found".into())
}

/// Unparseable ids cannot name an existing location, so they read as "not found".
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| not_found())
}

pub async fn create(
    state: &AppState,
    user_id: Uuid,
    fields: LocationFields,
) -> Result<Location, AppError> {
    let fields = fields.normalized();
    let location = state.locations.create(user_id, fields).await?;
    info!(%user_id, location_id = %location.id, city = %location.city, "location created");
    Ok(location)
}

pub async fn list(state: &AppState, user_id: Uuid) -> Result<Vec<Location>, AppError> {
    Ok(state.locations.list_by_user(user_id).await?)
}

pub async fn get(state: &AppState, user_id: Uuid, raw_id: &str) -> Result<Location, AppError> {
    let id = parse_id(raw_id)?;
    state
        .locations
        .find_owned(user_id, id)
        .await?
        .ok_or_else(not_found)
}

/// Merges the patch over the stored location and re-checks the combined result,
/// so an update can never leave a location in a state `create` would refuse.
pub async fn update(
    state: &AppState,
    user_id: Uuid,
    raw_id: &str,
    patch: LocationPatch,
) -> Result<Location, AppError> {
    let current = get(state, user_id, raw_id).await?;
    let merged = patch.merge_into(&current).normalized();
    merged.validate()?;

    let location = state
        .locations
        .update_owned(user_id, current.id, merged)
        .await?
        .ok_or_else(not_found)?;
    info!(%user_id, location_id = %location.id, "location updated");
    Ok(location)
}

pub async fn delete(state: &AppState, user_id: Uuid, raw_id: &str) -> Result<(), AppError> {
    let id = parse_id(raw_id)?;
    if !state.locations.delete_owned(user_id, id).await? {
        return Err(not_found());
    }
    info!(%user_id, location_id = %id, "location deleted");
    Ok(())
}
