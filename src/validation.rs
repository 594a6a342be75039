use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::error::AppError;

lazy_static! {
    pub static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex");
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub fn email_form(email: &str) -> Result<(), ValidationError> {
    if is_valid_email(email) {
        return Ok(());
    }
    let mut error = ValidationError::new("email");
    error.message = Some("Please provide a valid email".into());
    Err(error)
}

/// Display names are 3 to 50 characters once surrounding whitespace is dropped.
pub fn name_length(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    let message = match len {
        0..=2 => "Name must be at least 3 characters",
        3..=50 => return Ok(()),
        _ => "Name cannot exceed 50 characters",
    };
    let mut error = ValidationError::new("length");
    error.message = Some(message.into());
    Err(error)
}

/// City names must contain something besides whitespace.
pub fn city_present(city: &str) -> Result<(), ValidationError> {
    if !city.trim().is_empty() {
        return Ok(());
    }
    let mut error = ValidationError::new("required");
    error.message = Some("City name is required".into());
    Err(error)
}

/// Well-formed JSON with wrong field types is a validation failure; anything else
/// (syntax, content type) is a plain bad request.
fn json_rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(e) => AppError::Validation(vec![e.body_text()]),
        other => AppError::BadRequest(other.body_text()),
    }
}

/// JSON body that has been deserialized and checked against its `Validate` rules.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        value.validate()?;
        Ok(Self(value))
    }
}
