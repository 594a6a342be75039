use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::locations::repo_types::{Location, LocationFields};

/// Partial update; only supplied keys are merged into the stored location.
///
/// Nullable fields use `Option<Option<_>>`: a missing key is `None` (keep), an explicit
/// `null` is `Some(None)` (clear). A `null` city clears it and is then caught by the
/// merged-result validation.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LocationPatch {
    #[serde(default, deserialize_with = "present")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub longitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub nickname: Option<Option<String>>,
    pub is_favorite: Option<bool>,
}

/// Marks a key that appeared in the body, whether or not its value was `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl LocationPatch {
    pub fn merge_into(self, current: &Location) -> LocationFields {
        let base = LocationFields::from(current);
        LocationFields {
            city: match self.city {
                Some(city) => city.unwrap_or_default(),
                None => base.city,
            },
            country: self.country.unwrap_or(base.country),
            latitude: self.latitude.unwrap_or(base.latitude),
            longitude: self.longitude.unwrap_or(base.longitude),
            nickname: self.nickname.unwrap_or(base.nickname),
            is_favorite: self.is_favorite.unwrap_or(base.is_favorite),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LocationSavedResponse {
    pub message: &'static str,
    pub location: Location,
}

#[derive(Debug, Serialize)]
pub struct LocationListResponse {
    pub count: usize,
    pub locations: Vec<Location>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn stored() -> Location {
        let now = OffsetDateTime::now_utc();
        Location {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            city: "Paris".into(),
            country: Some("FR".into()),
            latitude: Some(1.5),
            longitude: Some(2.5),
            nickname: Some("Home".into()),
            is_favorite: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn patch(body: &str) -> LocationPatch {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn missing_keys_keep_stored_values() {
        let merged = patch("{}").merge_into(&stored());
        assert_eq!(merged, LocationFields::from(&stored()));
    }

    #[test]
    fn explicit_null_clears_optional_fields() {
        let merged = patch(r#"{"latitude":null,"longitude":null,"nickname":null,"country":null}"#)
            .merge_into(&stored());
        assert_eq!(merged.latitude, None);
        assert_eq!(merged.longitude, None);
        assert_eq!(merged.nickname, None);
        assert_eq!(merged.country, None);
        assert_eq!(merged.city, "Paris");
        assert!(merged.is_favorite);
    }

    #[test]
    fn null_city_fails_merged_validation() {
        let merged = patch(r#"{"city":null}"#).merge_into(&stored());
        assert_eq!(merged.city, "");
        assert!(merged.validate().is_err());
    }
}
