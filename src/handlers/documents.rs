// src/handlers/documents.rs

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        registry::CustomerFilter,
        reports::{CashFlowQuery, NotesReportQuery, WoodReportQuery},
    },
    services::{
        csv_export::{self, period_filename, safe_filename, CSV_CONTENT_TYPE},
        document_service::PDF_CONTENT_TYPE,
    },
};

/// Resposta de download com o nome de arquivo já saneado.
fn attachment(content_type: &'static str, filename: &str, bytes: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", safe_filename(filename));
    (
        [(header::CONTENT_TYPE, content_type.to_string()), (header::CONTENT_DISPOSITION, disposition)],
        bytes,
    )
        .into_response()
}

// GET /api/delivery-notes/{id}/pdf
#[utoipa::path(
    get,
    path = "/api/delivery-notes/{id}/pdf",
    tag = "Documentos",
    params(("id" = Uuid, Path, description = "ID do romaneio")),
    responses(
        (status = 200, description = "PDF do romaneio", content_type = "application/pdf"),
        (status = 404, description = "Romaneio não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn note_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let note = app_state
        .delivery_service
        .get_note(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .document_service
        .note_pdf(&note)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(attachment(PDF_CONTENT_TYPE, &format!("romaneio_{}.pdf", note.note.number), pdf_bytes))
}

// GET /api/reports/notes/csv
#[utoipa::path(
    get,
    path = "/api/reports/notes/csv",
    tag = "Documentos",
    params(NotesReportQuery),
    responses((status = 200, description = "Ficha de romaneios, uma linha por item", content_type = "text/csv")),
    security(("api_jwt" = []))
)]
pub async fn notes_report_csv(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<NotesReportQuery>,
) -> Result<Response, ApiError> {
    let (period, rows) = app_state
        .report_service
        .notes_report_items(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let bytes = csv_export::notes_items_csv(&rows).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(attachment(CSV_CONTENT_TYPE, &period_filename("relatorio_romaneios", &period, "csv"), bytes))
}

// GET /api/reports/notes/pdf
#[utoipa::path(
    get,
    path = "/api/reports/notes/pdf",
    tag = "Documentos",
    params(NotesReportQuery),
    responses((status = 200, description = "Ficha de romaneios em PDF", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn notes_report_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<NotesReportQuery>,
) -> Result<Response, ApiError> {
    let report = app_state
        .report_service
        .notes_report(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let bytes = app_state
        .document_service
        .notes_report_pdf(&report)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(attachment(PDF_CONTENT_TYPE, &period_filename("ficha_romaneios", &report.period, "pdf"), bytes))
}

// GET /api/reports/woods/csv
#[utoipa::path(
    get,
    path = "/api/reports/woods/csv",
    tag = "Documentos",
    params(WoodReportQuery),
    responses((status = 200, description = "Ficha de madeiras em CSV", content_type = "text/csv")),
    security(("api_jwt" = []))
)]
pub async fn wood_report_csv(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<WoodReportQuery>,
) -> Result<Response, ApiError> {
    let report = app_state
        .report_service
        .wood_report(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let bytes = csv_export::wood_report_csv(&report).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(attachment(CSV_CONTENT_TYPE, &period_filename("ficha_madeiras", &report.period, "csv"), bytes))
}

// GET /api/reports/woods/pdf
#[utoipa::path(
    get,
    path = "/api/reports/woods/pdf",
    tag = "Documentos",
    params(WoodReportQuery),
    responses((status = 200, description = "Ficha de madeiras em PDF", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn wood_report_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<WoodReportQuery>,
) -> Result<Response, ApiError> {
    let report = app_state
        .report_service
        .wood_report(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let bytes = app_state
        .document_service
        .wood_report_pdf(&report)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(attachment(PDF_CONTENT_TYPE, &period_filename("ficha_madeiras", &report.period, "pdf"), bytes))
}

// GET /api/reports/cash-flow/csv
#[utoipa::path(
    get,
    path = "/api/reports/cash-flow/csv",
    tag = "Documentos",
    params(CashFlowQuery),
    responses((status = 200, description = "Fluxo financeiro em CSV", content_type = "text/csv")),
    security(("api_jwt" = []))
)]
pub async fn cash_flow_csv(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<CashFlowQuery>,
) -> Result<Response, ApiError> {
    let report = app_state
        .report_service
        .cash_flow(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let bytes = csv_export::cash_flow_csv(&report).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(attachment(CSV_CONTENT_TYPE, &period_filename("fluxo_financeiro", &report.period, "csv"), bytes))
}

// GET /api/reports/cash-flow/pdf
#[utoipa::path(
    get,
    path = "/api/reports/cash-flow/pdf",
    tag = "Documentos",
    params(CashFlowQuery),
    responses((status = 200, description = "Fluxo financeiro em PDF", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn cash_flow_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<CashFlowQuery>,
) -> Result<Response, ApiError> {
    let report = app_state
        .report_service
        .cash_flow(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let bytes = app_state
        .document_service
        .cash_flow_pdf(&report)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(attachment(PDF_CONTENT_TYPE, &period_filename("fluxo_financeiro", &report.period, "pdf"), bytes))
}

// GET /api/reports/customer-balances/csv
#[utoipa::path(
    get,
    path = "/api/reports/customer-balances/csv",
    tag = "Documentos",
    params(CustomerFilter),
    responses((status = 200, description = "Saldos dos clientes em CSV", content_type = "text/csv")),
    security(("api_jwt" = []))
)]
pub async fn customer_balances_csv(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(filter): Query<CustomerFilter>,
) -> Result<Response, ApiError> {
    let rows = app_state
        .report_service
        .customer_balances(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let bytes = csv_export::customer_balances_csv(&rows).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(attachment(CSV_CONTENT_TYPE, "saldos_clientes.csv", bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_sets_download_headers() {
        let response = attachment(CSV_CONTENT_TYPE, "romaneio 12/A.csv", b"x".to_vec());
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], CSV_CONTENT_TYPE);
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"romaneio_12_A.csv\""
        );
    }
}
