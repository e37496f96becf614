// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        registry::{CustomerBalance, CustomerFilter},
        reports::{
            CashFlowQuery, CashFlowReport, Dashboard, NotesReport, NotesReportQuery, PeriodQuery, WoodReport,
            WoodReportQuery,
        },
    },
};

// GET /api/reports/dashboard
#[utoipa::path(
    get,
    path = "/api/reports/dashboard",
    tag = "Relatórios",
    params(PeriodQuery),
    responses((status = 200, description = "Indicadores do mês", body = Dashboard)),
    security(("api_jwt" = []))
)]
pub async fn get_dashboard(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let dashboard = app_state
        .report_service
        .dashboard(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(dashboard))
}

// GET /api/reports/notes
#[utoipa::path(
    get,
    path = "/api/reports/notes",
    tag = "Relatórios",
    params(NotesReportQuery),
    responses((status = 200, description = "Ficha de romaneios", body = NotesReport)),
    security(("api_jwt" = []))
)]
pub async fn notes_report(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<NotesReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .notes_report(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}

// GET /api/reports/woods
#[utoipa::path(
    get,
    path = "/api/reports/woods",
    tag = "Relatórios",
    params(WoodReportQuery),
    responses((status = 200, description = "Ficha de madeiras", body = WoodReport)),
    security(("api_jwt" = []))
)]
pub async fn wood_report(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<WoodReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .wood_report(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}

// GET /api/reports/cash-flow
#[utoipa::path(
    get,
    path = "/api/reports/cash-flow",
    tag = "Relatórios",
    params(CashFlowQuery),
    responses((status = 200, description = "Fluxo financeiro com saldo corrente", body = CashFlowReport)),
    security(("api_jwt" = []))
)]
pub async fn cash_flow(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<CashFlowQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .cash_flow(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}

// GET /api/reports/customer-balances
#[utoipa::path(
    get,
    path = "/api/reports/customer-balances",
    tag = "Relatórios",
    params(CustomerFilter),
    responses((status = 200, description = "Saldo de todos os clientes do filtro", body = Vec<CustomerBalance>)),
    security(("api_jwt" = []))
)]
pub async fn customer_balances(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(filter): Query<CustomerFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .report_service
        .customer_balances(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}
