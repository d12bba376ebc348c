//! DomainError → HTTP status mapping

use axum::http::StatusCode;
use axum::Json;
use tracing::{error, warn};

use super::ApiResponse;
use crate::domain::DomainError;

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn status_for(e: &DomainError) -> StatusCode {
    match e {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::InvalidTariff(_)
        | DomainError::TariffCoverage { .. }
        | DomainError::InvalidConsumption { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn api_error(e: DomainError) -> ApiError {
    let status = status_for(&e);
    if status.is_server_error() {
        error!(error = %e, "Request failed");
    } else {
        warn!(status = status.as_u16(), error = %e, "Request rejected");
    }
    (status, Json(ApiResponse::error(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn maps_each_error_kind() {
        let cases = [
            (DomainError::not_found("Bill", "id", 7), StatusCode::NOT_FOUND),
            (DomainError::InvalidTariff("gap".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                DomainError::TariffCoverage {
                    consumption: dec!(600),
                    covered_to: dec!(500),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                DomainError::InvalidConsumption { units: dec!(-5) },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (DomainError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (DomainError::Conflict("stale".into()), StatusCode::CONFLICT),
            (DomainError::Storage("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(status_for(&err), expected, "{err}");
        }
    }

    #[test]
    fn body_carries_message() {
        let (status, Json(body)) = api_error(DomainError::Conflict("stale version".into()));
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(!body.success);
        assert!(body.error.unwrap().contains("stale version"));
    }
}
