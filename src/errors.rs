// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Custom application error with conversions from common Rust and 3rd-party errors.

use derive_more::Display;
use log::error;

#[derive(Debug, Display, PartialEq)]
pub enum ServiceError {
    #[display("Internal server error: {_0}")]
    InternalServerError(String),

    #[display("Internal serialization error: {_0}")]
    SerializationError(String),

    #[display("BadRequest: {_0}")]
    BadRequest(String),

    /// Requested attribute, zone or device doesn't exist.
    #[display("Not found: {_0}")]
    NotFound(String),

    /// The device client couldn't deliver the requested data.
    #[display("Service unavailable: {_0}")]
    ServiceUnavailable(String),
}

impl std::error::Error for ServiceError {}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        error!("{:?}", e);
        ServiceError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_json_is_serialization_error() {
        let e = serde_json::from_str::<serde_json::Value>("{\"away\": ").unwrap_err();
        assert!(matches!(
            ServiceError::from(e),
            ServiceError::SerializationError(_)
        ));
    }
}
