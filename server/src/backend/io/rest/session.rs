//! Caller identity from the headers set by the fronting identity layer.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use tracing::warn;

use crate::backend::domain::Session;
use crate::backend::io::rest::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(user_id) = header_value(parts, USER_ID_HEADER) else {
            warn!("Rejecting {} {}: no user id", parts.method, parts.uri);
            return Err(ApiError::unauthorized("Please sign in"));
        };
        Ok(Session::new(user_id, header_value(parts, USER_EMAIL_HEADER)))
    }
}
