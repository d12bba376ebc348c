//! Tariff REST API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use super::dto::{
    CreateTariffRequest, EffectiveTariffQuery, PreviewRequest, ReviseTariffRequest,
    TariffResponse,
};
use crate::application::TariffService;
use crate::domain::tariff::{BillingCycle, NewTariff, Slab};
use crate::domain::{Consumption, DomainResult, Tariff};
use crate::interfaces::http::common::{
    api_error, ApiError, ApiResponse, ApiResult, ValidatedJson,
};
use crate::interfaces::http::modules::bills::dto::ChargesResponse;

#[derive(Clone)]
pub struct TariffState {
    pub tariffs: Arc<TariffService>,
    /// Currency for tariffs created without one
    pub default_currency: String,
}

async fn with_slabs(service: &TariffService, tariff: Tariff) -> DomainResult<TariffResponse> {
    let table = service.load_slabs(tariff.id).await?;
    Ok(TariffResponse::new(tariff, &table))
}

#[utoipa::path(
    get,
    path = "/api/v1/tariffs",
    tag = "Tariffs",
    responses(
        (status = 200, description = "All tariff snapshots", body = ApiResponse<Vec<TariffResponse>>)
    )
)]
pub async fn list_tariffs(State(state): State<TariffState>) -> ApiResult<Vec<TariffResponse>> {
    let tariffs = state.tariffs.list().await.map_err(api_error)?;
    let mut out = Vec::with_capacity(tariffs.len());
    for tariff in tariffs {
        out.push(with_slabs(&state.tariffs, tariff).await.map_err(api_error)?);
    }
    Ok(Json(ApiResponse::success(out)))
}

#[utoipa::path(
    get,
    path = "/api/v1/tariffs/{id}",
    tag = "Tariffs",
    params(("id" = i32, Path, description = "Tariff ID")),
    responses(
        (status = 200, description = "Tariff with slabs", body = ApiResponse<TariffResponse>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_tariff(
    State(state): State<TariffState>,
    Path(id): Path<i32>,
) -> ApiResult<TariffResponse> {
    let tariff = state.tariffs.get(id).await.map_err(api_error)?;
    let body = with_slabs(&state.tariffs, tariff).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(body)))
}

#[utoipa::path(
    get,
    path = "/api/v1/tariffs/effective",
    tag = "Tariffs",
    params(EffectiveTariffQuery),
    responses(
        (status = 200, description = "Snapshot effective on the date", body = ApiResponse<TariffResponse>),
        (status = 404, description = "No tariff effective on the date"),
        (status = 409, description = "More than one tariff effective on the date")
    )
)]
pub async fn get_effective_tariff(
    State(state): State<TariffState>,
    Query(q): Query<EffectiveTariffQuery>,
) -> ApiResult<TariffResponse> {
    let connection_type = q.connection_type.parse().map_err(api_error)?;
    let date = q.date.unwrap_or_else(|| Utc::now().date_naive());
    let tariff = state
        .tariffs
        .effective_for(connection_type, date)
        .await
        .map_err(api_error)?;
    let body = with_slabs(&state.tariffs, tariff).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(body)))
}

#[utoipa::path(
    post,
    path = "/api/v1/tariffs",
    tag = "Tariffs",
    request_body = CreateTariffRequest,
    responses(
        (status = 201, description = "Created", body = ApiResponse<TariffResponse>),
        (status = 400, description = "Invalid data"),
        (status = 409, description = "Code taken or range overlaps an existing tariff"),
        (status = 422, description = "Invalid slab table")
    )
)]
pub async fn create_tariff(
    State(state): State<TariffState>,
    ValidatedJson(req): ValidatedJson<CreateTariffRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TariffResponse>>), ApiError> {
    let billing_cycle = match req.billing_cycle.as_deref() {
        Some(raw) => raw.parse().map_err(api_error)?,
        None => BillingCycle::default(),
    };
    let new = NewTariff {
        code: req.code,
        name: req.name,
        description: req.description,
        connection_type: req.connection_type.parse().map_err(api_error)?,
        effective_from: req.effective_from,
        effective_to: req.effective_to,
        fixed_charge: req.fixed_charge,
        minimum_charge: req.minimum_charge,
        tax_percentage: req.tax_percentage,
        currency: req
            .currency
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| state.default_currency.clone()),
        billing_cycle,
        slabs: req.slabs.into_iter().map(Slab::from).collect(),
    };

    let tariff = state.tariffs.define(new).await.map_err(api_error)?;
    let body = with_slabs(&state.tariffs, tariff).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(body))))
}

#[utoipa::path(
    post,
    path = "/api/v1/tariffs/{id}/revisions",
    tag = "Tariffs",
    params(("id" = i32, Path, description = "Tariff ID being superseded")),
    request_body = ReviseTariffRequest,
    responses(
        (status = 201, description = "New snapshot", body = ApiResponse<TariffResponse>),
        (status = 400, description = "Effective date outside the current range"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Code already used")
    )
)]
pub async fn revise_tariff(
    State(state): State<TariffState>,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<ReviseTariffRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TariffResponse>>), ApiError> {
    let tariff = state
        .tariffs
        .revise(id, req.into())
        .await
        .map_err(api_error)?;
    let body = with_slabs(&state.tariffs, tariff).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(body))))
}

#[utoipa::path(
    post,
    path = "/api/v1/tariffs/{id}/preview",
    tag = "Tariffs",
    params(("id" = i32, Path, description = "Tariff ID")),
    request_body = PreviewRequest,
    responses(
        (status = 200, description = "Charges that would be billed", body = ApiResponse<ChargesResponse>),
        (status = 404, description = "Not found"),
        (status = 422, description = "Negative consumption or consumption beyond the slabs")
    )
)]
pub async fn preview_charges(
    State(state): State<TariffState>,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<PreviewRequest>,
) -> ApiResult<ChargesResponse> {
    let mut consumption =
        Consumption::new(req.previous_reading, req.current_reading).map_err(api_error)?;
    if let Some(capacity) = req.rollover_at {
        consumption = consumption.with_rollover(capacity).map_err(api_error)?;
    }
    let charges = state
        .tariffs
        .preview(id, &consumption, req.discount, req.previous_balance)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(charges.into())))
}
