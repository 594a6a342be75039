use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registered claims carried by an access token. `sub` is the user id; times are unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}
