//! API router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{BillingService, TariffService};
use crate::interfaces::http::common::{ApiResponse, PaginatedResponse};
use crate::interfaces::http::modules::bills::{self, BillState};
use crate::interfaces::http::modules::health::{self, HealthState};
use crate::interfaces::http::modules::metrics::{
    http_metrics_middleware, prometheus_metrics, MetricsState,
};
use crate::interfaces::http::modules::request_id::request_id_middleware;
use crate::interfaces::http::modules::tariffs::{self, TariffState};

/// Everything the HTTP layer needs; handlers pull their slice via `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub tariffs: Arc<TariffService>,
    pub billing: Arc<BillingService>,
    pub db: Option<DatabaseConnection>,
    pub default_currency: String,
    pub started_at: Arc<Instant>,
}

impl ApiState {
    pub fn new(
        tariffs: Arc<TariffService>,
        billing: Arc<BillingService>,
        db: Option<DatabaseConnection>,
        default_currency: impl Into<String>,
    ) -> Self {
        Self {
            tariffs,
            billing,
            db,
            default_currency: default_currency.into(),
            started_at: Arc::new(Instant::now()),
        }
    }
}

impl FromRef<ApiState> for TariffState {
    fn from_ref(s: &ApiState) -> Self {
        TariffState {
            tariffs: Arc::clone(&s.tariffs),
            default_currency: s.default_currency.clone(),
        }
    }
}

impl FromRef<ApiState> for BillState {
    fn from_ref(s: &ApiState) -> Self {
        BillState {
            billing: Arc::clone(&s.billing),
        }
    }
}

impl FromRef<ApiState> for HealthState {
    fn from_ref(s: &ApiState) -> Self {
        HealthState {
            db: s.db.clone(),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        tariffs::list_tariffs,
        tariffs::get_tariff,
        tariffs::get_effective_tariff,
        tariffs::create_tariff,
        tariffs::revise_tariff,
        tariffs::preview_charges,
        bills::issue_bill,
        bills::list_bills,
        bills::get_bill,
        bills::apply_late_fee,
        bills::list_payments,
        bills::record_payment,
        bills::cancel_bill,
    ),
    components(
        schemas(
            ApiResponse<String>,
            PaginatedResponse<bills::BillResponse>,
            health::HealthResponse,
            health::StorageHealth,
            tariffs::SlabDto,
            tariffs::TariffResponse,
            tariffs::CreateTariffRequest,
            tariffs::ReviseTariffRequest,
            tariffs::PreviewRequest,
            bills::LineItemDto,
            bills::ChargesResponse,
            bills::BillResponse,
            bills::IssueBillRequest,
            bills::RecordPaymentRequest,
            bills::PaymentResponse,
            bills::PaymentReceipt,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and storage health"),
        (name = "Tariffs", description = "Tiered tariff snapshots and charge previews"),
        (name = "Bills", description = "Bill issuance, lookup and late fees"),
        (name = "Payments", description = "Payments against bills"),
    ),
    info(
        title = "Utility Billing API",
        version = "1.0.0",
        description = "Progressive slab rating and bill composition for electricity customers",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Routes under `/api/v1` plus `/health`; no metrics endpoint, no Swagger.
fn api_routes(state: ApiState) -> Router {
    let tariff_routes = Router::new()
        .route("/", get(tariffs::list_tariffs).post(tariffs::create_tariff))
        .route("/effective", get(tariffs::get_effective_tariff))
        .route("/{id}", get(tariffs::get_tariff))
        .route("/{id}/revisions", post(tariffs::revise_tariff))
        .route("/{id}/preview", post(tariffs::preview_charges));

    let bill_routes = Router::new()
        .route("/", get(bills::list_bills).post(bills::issue_bill))
        .route("/{id}", get(bills::get_bill))
        .route(
            "/{id}/payments",
            get(bills::list_payments).post(bills::record_payment),
        )
        .route("/{id}/late-fee", post(bills::apply_late_fee))
        .route("/{id}/cancel", post(bills::cancel_bill));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1/tariffs", tariff_routes)
        .nest("/api/v1/bills", bill_routes)
        .with_state(state)
}

/// Create the API router with all routes
pub fn create_api_router(state: ApiState, prometheus: PrometheusHandle) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let metrics_routes = Router::new()
        .route("/metrics", get(prometheus_metrics))
        .with_state(MetricsState { handle: prometheus });

    let swagger = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger)
        .merge(metrics_routes)
        .merge(api_routes(state))
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{create_event_bus, BillingSettings};
    use crate::domain::RepositoryProvider;
    use crate::infrastructure::InMemoryStorage;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryStorage::new());
        let bus = create_event_bus();
        let tariffs = Arc::new(TariffService::new(repos.clone(), bus.clone()));
        let billing = Arc::new(BillingService::new(
            repos,
            tariffs.clone(),
            bus,
            BillingSettings::default(),
        ));
        api_routes(ApiState::new(tariffs, billing, None, "SAR"))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };
        let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn residential_tariff() -> Value {
        json!({
            "code": "RES-2024",
            "name": "Residential",
            "connection_type": "residential",
            "effective_from": "2024-01-01",
            "fixed_charge": "5.00",
            "tax_percentage": "15",
            "slabs": [
                {"slab_number": 1, "from_units": "0", "to_units": "100", "rate_per_unit": "0.18"},
                {"slab_number": 2, "from_units": "100", "to_units": "300", "rate_per_unit": "0.30"},
                {"slab_number": 3, "from_units": "300", "to_units": null, "rate_per_unit": "0.40"}
            ]
        })
    }

    fn bill_for(previous: &str, current: &str) -> Value {
        json!({
            "customer_id": 1,
            "meter_id": 10,
            "connection_type": "residential",
            "billing_period_start": "2024-03-01",
            "billing_period_end": "2024-03-31",
            "previous_reading": previous,
            "current_reading": current,
            "issue_date": "2024-04-01",
            "due_date": "2024-04-15"
        })
    }

    #[tokio::test]
    async fn health_reports_memory_backend() {
        let (status, body) = send(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage"]["backend"], "memory");
    }

    #[tokio::test]
    async fn create_tariff_then_fetch_effective() {
        let app = app();
        let (status, body) = send(&app, "POST", "/api/v1/tariffs", Some(residential_tariff())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["currency"], "SAR");
        assert_eq!(body["data"]["slabs"].as_array().unwrap().len(), 3);

        let (status, body) = send(
            &app,
            "GET",
            "/api/v1/tariffs/effective?connection_type=residential&date=2024-06-01",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["code"], "RES-2024");
    }

    #[tokio::test]
    async fn duplicate_tariff_code_is_409() {
        let app = app();
        send(&app, "POST", "/api/v1/tariffs", Some(residential_tariff())).await;
        let (status, body) = send(&app, "POST", "/api/v1/tariffs", Some(residential_tariff())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn gapped_slabs_are_422() {
        let mut tariff = residential_tariff();
        tariff["slabs"][1]["from_units"] = json!("120");
        let (status, _) = send(&app(), "POST", "/api/v1/tariffs", Some(tariff)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn unknown_connection_type_is_400() {
        let mut tariff = residential_tariff();
        tariff["connection_type"] = json!("spaceport");
        let (status, _) = send(&app(), "POST", "/api/v1/tariffs", Some(tariff)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn preview_prices_across_slabs() {
        let app = app();
        let (_, created) = send(&app, "POST", "/api/v1/tariffs", Some(residential_tariff())).await;
        let id = created["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/tariffs/{id}/preview"),
            Some(json!({"previous_reading": "1000", "current_reading": "1250"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        // 100 × 0.18 + 150 × 0.30 = 63.00; tax 15% of 68.00 = 10.20
        assert_eq!(body["data"]["energy_charges"], "63.00");
        assert_eq!(body["data"]["total_amount"], "78.20");
    }

    #[tokio::test]
    async fn bill_lifecycle_over_http() {
        let app = app();
        send(&app, "POST", "/api/v1/tariffs", Some(residential_tariff())).await;

        let (status, body) = send(&app, "POST", "/api/v1/bills", Some(bill_for("1000", "1250"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["bill_number"], "BILL-2024-000001");
        assert_eq!(body["data"]["status"], "pending");
        let id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/bills/{id}/payments"),
            Some(json!({"amount": "40.00", "method": "cash"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["bill"]["status"], "partially_paid");
        assert_eq!(body["data"]["bill"]["remaining_amount"], "38.20");

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/bills/{id}/payments"),
            Some(json!({"amount": "100.00", "method": "card"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, "GET", &format!("/api/v1/bills/{id}/payments"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/bills/{id}/late-fee?as_of=2024-05-01"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "overdue");
        let late_fee: rust_decimal::Decimal =
            body["data"]["charges"]["late_fee"].as_str().unwrap().parse().unwrap();
        assert_eq!(late_fee, rust_decimal_macros::dec!(50));

        let (status, body) = send(&app, "GET", "/api/v1/bills?customer_id=1&status=overdue", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 1);
    }

    #[tokio::test]
    async fn cancel_over_http() {
        let app = app();
        send(&app, "POST", "/api/v1/tariffs", Some(residential_tariff())).await;

        let (_, body) = send(&app, "POST", "/api/v1/bills", Some(bill_for("1000", "1250"))).await;
        let unpaid = body["data"]["id"].as_i64().unwrap();
        let (status, body) = send(&app, "POST", &format!("/api/v1/bills/{unpaid}/cancel"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "cancelled");

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/bills/{unpaid}/payments"),
            Some(json!({"amount": "10.00", "method": "cash"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, "POST", "/api/v1/bills", Some(bill_for("1250", "1300"))).await;
        let partial = body["data"]["id"].as_i64().unwrap();
        send(
            &app,
            "POST",
            &format!("/api/v1/bills/{partial}/payments"),
            Some(json!({"amount": "5.00", "method": "cash"})),
        )
        .await;
        let (status, _) = send(&app, "POST", &format!("/api/v1/bills/{partial}/cancel"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "POST", "/api/v1/bills/999/cancel", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn negative_consumption_is_422() {
        let app = app();
        send(&app, "POST", "/api/v1/tariffs", Some(residential_tariff())).await;
        let (status, body) = send(&app, "POST", "/api/v1/bills", Some(bill_for("1250", "1000"))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("-250"));
    }

    #[tokio::test]
    async fn missing_tariff_is_404() {
        let (status, _) = send(&app(), "POST", "/api/v1/bills", Some(bill_for("0", "10"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_dto_is_422() {
        let mut bill = bill_for("0", "10");
        bill["customer_id"] = json!(0);
        let (status, _) = send(&app(), "POST", "/api/v1/bills", Some(bill)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn unknown_bill_is_404() {
        let (status, body) = send(&app(), "GET", "/api/v1/bills/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }
}
