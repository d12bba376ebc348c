//! `ValidatedJson<T>`: `axum::Json<T>` followed by `validator::Validate`.
//!
//! Malformed JSON is rejected with 400, field errors with 422. Both use the
//! `ApiResponse` envelope.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::ApiResponse;

pub struct ValidatedJson<T>(pub T);

pub enum ValidatedJsonRejection {
    Json(JsonRejection),
    Invalid(ValidationErrors),
}

/// `field: message` pairs, sorted so responses are stable.
fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{field}: {msg}")
            })
        })
        .collect();
    parts.sort();

    if parts.is_empty() {
        "Validation failed".to_string()
    } else {
        parts.join("; ")
    }
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Json(rejection) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON: {rejection}"),
            ),
            Self::Invalid(errors) => (StatusCode::UNPROCESSABLE_ENTITY, describe(&errors)),
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::Json)?;
        value.validate().map_err(ValidatedJsonRejection::Invalid)?;
        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::routing::post;
    use axum::Router;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct MeterReading {
        #[validate(range(min = 1, message = "meter_id must be positive"))]
        meter_id: i32,
        #[validate(length(min = 1, max = 20))]
        register: String,
    }

    async fn accept(ValidatedJson(body): ValidatedJson<MeterReading>) -> String {
        format!("{}:{}", body.meter_id, body.register)
    }

    async fn post_json(raw: &str) -> (StatusCode, String) {
        let app = Router::new().route("/readings", post(accept));
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/readings")
                    .header("content-type", "application/json")
                    .body(Body::from(raw.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn valid_body_reaches_handler() {
        let (status, body) = post_json(r#"{"meter_id": 12, "register": "kwh"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "12:kwh");
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let (status, body) = post_json("{meter_id").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Invalid JSON"));
    }

    #[tokio::test]
    async fn field_errors_are_422_with_messages() {
        let (status, body) = post_json(r#"{"meter_id": 0, "register": ""}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("meter_id must be positive"));
        assert!(body.contains("register:"));
    }
}
