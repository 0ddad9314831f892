//! Caller identity propagation.
//!
//! Every authenticated order-service method receives the acting user id as
//! an `x-user-id` header, read case-insensitively and parsed as a UUID.
//! Missing or malformed values are an authentication failure, never a
//! validation one.

use axum::http::HeaderMap;
use common::UserId;
use std::str::FromStr;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Extracts and parses the caller's user id from request headers.
pub fn caller_user_id(headers: &HeaderMap) -> Result<UserId, ApiError> {
    let value = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| ApiError::Unauthenticated("missing x-user-id header".to_string()))?
        .to_str()
        .map_err(|_| ApiError::Unauthenticated("x-user-id header is not valid UTF-8".to_string()))?;

    UserId::from_str(value)
        .map_err(|_| ApiError::Unauthenticated("x-user-id header is not a valid UUID".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_valid_user_id() {
        let user_id = UserId::new();
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&user_id.to_string()).unwrap());

        assert_eq!(caller_user_id(&headers).unwrap(), user_id);
    }

    #[test]
    fn rejects_missing_header() {
        let headers = HeaderMap::new();
        assert!(matches!(
            caller_user_id(&headers),
            Err(ApiError::Unauthenticated(_))
        ));
    }

    #[test]
    fn rejects_malformed_uuid() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(matches!(
            caller_user_id(&headers),
            Err(ApiError::Unauthenticated(_))
        ));
    }
}
