//! Bill, payment and late-fee handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use super::dto::{
    BillListQuery, BillResponse, IssueBillRequest, LateFeeQuery, PaymentReceipt,
    PaymentResponse, RecordPaymentRequest,
};
use crate::application::BillingService;
use crate::domain::bill::BillFilter;
use crate::domain::NewPayment;
use crate::interfaces::http::common::{
    api_error, ApiError, ApiResponse, ApiResult, PaginatedResponse, ValidatedJson,
};

#[derive(Clone)]
pub struct BillState {
    pub billing: Arc<BillingService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/bills",
    tag = "Bills",
    request_body = IssueBillRequest,
    responses(
        (status = 201, description = "Bill issued", body = ApiResponse<BillResponse>),
        (status = 400, description = "Invalid readings or dates"),
        (status = 404, description = "No tariff found"),
        (status = 422, description = "Negative consumption, invalid tariff or insufficient coverage")
    )
)]
pub async fn issue_bill(
    State(state): State<BillState>,
    ValidatedJson(req): ValidatedJson<IssueBillRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BillResponse>>), ApiError> {
    let cycle = req.into_cycle().map_err(api_error)?;
    let bill = state.billing.issue_bill(cycle).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(bill.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/bills",
    tag = "Bills",
    params(BillListQuery),
    responses(
        (status = 200, description = "Bills, newest first", body = ApiResponse<PaginatedResponse<BillResponse>>)
    )
)]
pub async fn list_bills(
    State(state): State<BillState>,
    Query(q): Query<BillListQuery>,
) -> ApiResult<PaginatedResponse<BillResponse>> {
    let status = match q.status.as_deref() {
        Some(raw) => Some(raw.parse().map_err(api_error)?),
        None => None,
    };
    let filter = BillFilter {
        customer_id: q.customer_id,
        meter_id: q.meter_id,
        status,
    };
    let page = q.page.max(1);
    let limit = q.limit.clamp(1, 100);

    let (bills, total) = state
        .billing
        .list_bills(&filter, page, limit)
        .await
        .map_err(api_error)?;
    let items = bills.into_iter().map(BillResponse::from).collect();
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/bills/{id}",
    tag = "Bills",
    params(("id" = i32, Path, description = "Bill ID")),
    responses(
        (status = 200, description = "Bill with line items", body = ApiResponse<BillResponse>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_bill(State(state): State<BillState>, Path(id): Path<i32>) -> ApiResult<BillResponse> {
    let bill = state.billing.get_bill(id).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(bill.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/bills/{id}/payments",
    tag = "Payments",
    params(("id" = i32, Path, description = "Bill ID")),
    responses(
        (status = 200, description = "Payments in the order received", body = ApiResponse<Vec<PaymentResponse>>),
        (status = 404, description = "Bill not found")
    )
)]
pub async fn list_payments(
    State(state): State<BillState>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<PaymentResponse>> {
    let payments = state.billing.list_payments(id).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(
        payments.into_iter().map(PaymentResponse::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/bills/{id}/payments",
    tag = "Payments",
    params(("id" = i32, Path, description = "Bill ID")),
    request_body = RecordPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = ApiResponse<PaymentReceipt>),
        (status = 400, description = "Non-positive amount, overpayment or bill closed"),
        (status = 404, description = "Bill not found"),
        (status = 409, description = "Bill kept changing; retry")
    )
)]
pub async fn record_payment(
    State(state): State<BillState>,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentReceipt>>), ApiError> {
    let new = NewPayment {
        amount: req.amount,
        method: req.method.parse().map_err(api_error)?,
        reference: req.reference,
        notes: req.notes,
        paid_at: req.paid_at,
    };
    let (bill, payment) = state
        .billing
        .record_payment(id, new)
        .await
        .map_err(api_error)?;
    let receipt = PaymentReceipt {
        payment: payment.into(),
        bill: bill.into(),
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::success(receipt))))
}

#[utoipa::path(
    post,
    path = "/api/v1/bills/{id}/late-fee",
    tag = "Bills",
    params(("id" = i32, Path, description = "Bill ID"), LateFeeQuery),
    responses(
        (status = 200, description = "Bill after assessment; unchanged if not overdue or already charged", body = ApiResponse<BillResponse>),
        (status = 404, description = "Not found")
    )
)]
pub async fn apply_late_fee(
    State(state): State<BillState>,
    Path(id): Path<i32>,
    Query(q): Query<LateFeeQuery>,
) -> ApiResult<BillResponse> {
    let as_of = q.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let bill = state
        .billing
        .apply_late_fee(id, as_of)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(bill.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/bills/{id}/cancel",
    tag = "Bills",
    params(("id" = i32, Path, description = "Bill ID")),
    responses(
        (status = 200, description = "Bill cancelled; unchanged if already cancelled", body = ApiResponse<BillResponse>),
        (status = 400, description = "Bill is paid or has payments"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Bill kept changing; retry")
    )
)]
pub async fn cancel_bill(State(state): State<BillState>, Path(id): Path<i32>) -> ApiResult<BillResponse> {
    let bill = state.billing.cancel_bill(id).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(bill.into())))
}
