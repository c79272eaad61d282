//! # Scaleway API Errors
//!
//! Typed errors for the Scaleway API.
//!
//! Classified kinds mirror the error taxonomy of the Scaleway API: the
//! `type` field of an error body is authoritative, with the HTTP status code
//! as a fallback. Anything else stays an unclassified [`Error::Api`].

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Error returned by the Scaleway API or its transport
#[derive(Debug, Error)]
pub enum Error {
    #[error("resource {resource} with ID {resource_id} is not found")]
    ResourceNotFound { resource: String, resource_id: String },
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },
    #[error("insufficient permissions: {message}")]
    PermissionsDenied { message: String },
    #[error("resource {resource} is out of stock")]
    OutOfStock { resource: String },
    #[error("quota exceeded: {message}")]
    QuotasExceeded { message: String },
    #[error("resource {resource} with ID {resource_id} is locked")]
    ResourceLocked { resource: String, resource_id: String },
    #[error("resource {resource} with ID {resource_id} is in a transient state: {current_state}")]
    TransientState {
        resource: String,
        resource_id: String,
        current_state: String,
    },
    /// Unclassified API error
    #[error("scaleway api error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("scaleway transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Error body returned by the Scaleway API
#[derive(Debug, Default, Deserialize)]
struct RawError {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    resource: String,
    #[serde(default)]
    resource_id: String,
    #[serde(default)]
    current_state: String,
}

impl Error {
    /// Map an unsuccessful HTTP response onto a typed error
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        let raw: RawError = serde_json::from_str(body).unwrap_or_default();
        let message = if raw.message.is_empty() {
            body.trim().to_string()
        } else {
            raw.message.clone()
        };

        match (raw.kind.as_str(), status.as_u16()) {
            ("not_found", _) | (_, 404) => Error::ResourceNotFound {
                resource: raw.resource,
                resource_id: raw.resource_id,
            },
            ("invalid_arguments", _) | (_, 400) => Error::InvalidArguments { message },
            ("permissions_denied", _) | (_, 403) => Error::PermissionsDenied { message },
            ("out_of_stock", _) => Error::OutOfStock {
                resource: raw.resource,
            },
            ("quotas_exceeded", _) => Error::QuotasExceeded { message },
            ("locked", _) => Error::ResourceLocked {
                resource: raw.resource,
                resource_id: raw.resource_id,
            },
            ("transient_state", _) => Error::TransientState {
                resource: raw.resource,
                resource_id: raw.resource_id,
                current_state: raw.current_state,
            },
            _ => Error::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Returns true if the error means the backend resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ResourceNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_error_type_field() {
        let body = r#"{"type":"transient_state","resource":"instance","resource_id":"1234","current_state":"provisioning"}"#;
        let err = Error::from_response(StatusCode::CONFLICT, body);
        assert!(matches!(
            err,
            Error::TransientState { ref current_state, .. } if current_state == "provisioning"
        ));
    }

    #[test]
    fn falls_back_to_http_status() {
        let err = Error::from_response(StatusCode::NOT_FOUND, "");
        assert!(err.is_not_found());

        let err = Error::from_response(StatusCode::FORBIDDEN, r#"{"message":"denied"}"#);
        assert!(matches!(err, Error::PermissionsDenied { ref message } if message == "denied"));
    }

    #[test]
    fn unknown_errors_stay_unclassified() {
        let err = Error::from_response(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(err, Error::Api { status: 500, ref message } if message == "boom"));
    }

    #[test]
    fn error_type_wins_over_status() {
        let body = r#"{"type":"out_of_stock","resource":"lssd_disk"}"#;
        let err = Error::from_response(StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, Error::OutOfStock { ref resource } if resource == "lssd_disk"));
    }
}
