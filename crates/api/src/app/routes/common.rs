use std::str::FromStr;

use axum::response::Response;

use vestry_core::DomainError;

use crate::app::errors;

/// Parse a typed id out of a path segment, turning a malformed value into
/// the standard 400 response.
pub fn parse_id<T>(raw: &str) -> Result<T, Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(errors::domain_error_response)
}

/// As above, for optional query parameters.
pub fn parse_optional_id<T>(raw: Option<&str>) -> Result<Option<T>, Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.map(|r| parse_id(r)).transpose()
}
