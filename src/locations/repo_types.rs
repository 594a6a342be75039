use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::validation::city_present;

/// Saved location, always owned by exactly one user.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    pub user_id: Uuid,
    pub city: String,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub nickname: Option<String>,
    pub is_favorite: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The client-controlled part of a location. Used both as the create body and as the
/// merged result of a patch, so both paths go through the same rules.
///
/// There is deliberately no owner field: unknown keys such as `userId` are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LocationFields {
    #[serde(default)]
    #[validate(custom(function = "city_present"))]
    pub city: String,
    pub country: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,
    #[validate(length(max = 50, message = "Nickname cannot exceed 50 characters"))]
    pub nickname: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl LocationFields {
    /// Trims text fields; blank optional text becomes `None`.
    pub fn normalized(self) -> Self {
        Self {
            city: self.city.trim().to_string(),
            country: trim_optional(self.country),
            nickname: trim_optional(self.nickname),
            ..self
        }
    }
}

impl From<&Location> for LocationFields {
    fn from(loc: &Location) -> Self {
        Self {
            city: loc.city.clone(),
            country: loc.country.clone(),
            latitude: loc.latitude,
            longitude: loc.longitude,
            nickname: loc.nickname.clone(),
            is_favorite: loc.is_favorite,
        }
    }
}

fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
