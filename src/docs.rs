// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::common;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::list_users,
        handlers::auth::create_user,

        // --- Cadastros ---
        handlers::customers::create_customer,
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,
        handlers::wood_types::create_wood_type,
        handlers::wood_types::list_wood_types,
        handlers::wood_types::get_wood_type,
        handlers::wood_types::update_wood_type,
        handlers::wood_types::delete_wood_type,
        handlers::wood_types::get_price,
        handlers::drivers::create_driver,
        handlers::drivers::list_drivers,
        handlers::drivers::get_driver,
        handlers::drivers::update_driver,
        handlers::drivers::delete_driver,

        // --- Romaneios ---
        handlers::delivery_notes::create_note,
        handlers::delivery_notes::list_notes,
        handlers::delivery_notes::get_note,
        handlers::delivery_notes::update_note,
        handlers::delivery_notes::delete_note,
        handlers::delivery_notes::add_item,
        handlers::delivery_notes::update_item,
        handlers::delivery_notes::delete_item,
        handlers::delivery_notes::add_log,
        handlers::delivery_notes::update_log,
        handlers::delivery_notes::delete_log,

        // --- Pagamentos ---
        handlers::payments::create_payment,
        handlers::payments::list_payments,
        handlers::payments::get_payment,
        handlers::payments::update_payment,
        handlers::payments::delete_payment,

        // --- Relatórios ---
        handlers::reports::get_dashboard,
        handlers::reports::notes_report,
        handlers::reports::wood_report,
        handlers::reports::cash_flow,
        handlers::reports::customer_balances,

        // --- Documentos ---
        handlers::documents::note_pdf,
        handlers::documents::notes_report_csv,
        handlers::documents::notes_report_pdf,
        handlers::documents::wood_report_csv,
        handlers::documents::wood_report_pdf,
        handlers::documents::cash_flow_csv,
        handlers::documents::cash_flow_pdf,
        handlers::documents::customer_balances_csv,
    ),
    components(
        schemas(
            common::period::Period,

            // --- Auth ---
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::CreateUserPayload,
            models::auth::AuthResponse,

            // --- Cadastros ---
            models::registry::Customer,
            models::registry::CustomerPayload,
            models::registry::BalanceStatus,
            models::registry::BalanceSummary,
            models::registry::CustomerDetail,
            models::registry::CustomerBalance,
            models::registry::BalanceFilter,
            models::registry::CustomerSort,
            models::registry::WoodType,
            models::registry::WoodTypePayload,
            models::registry::PriceResponse,
            models::registry::Driver,
            models::registry::DriverPayload,

            // --- Romaneios ---
            models::delivery::FreightMode,
            models::delivery::WeighingMode,
            models::delivery::DeliveryNote,
            models::delivery::NoteItem,
            models::delivery::LogUnit,
            models::delivery::LogPayload,
            models::delivery::ItemPayload,
            models::delivery::CreateNotePayload,
            models::delivery::UpdateNotePayload,
            models::delivery::UpdateItemPayload,
            models::delivery::ItemDetail,
            models::delivery::NoteDetail,
            models::delivery::NoteSummary,
            models::delivery::NoteList,

            // --- Pagamentos ---
            models::finance::PaymentMethod,
            models::finance::Payment,
            models::finance::PaymentView,
            models::finance::PaymentPayload,
            models::finance::PaymentList,

            // --- Relatórios ---
            models::reports::SortDir,
            models::reports::NotesSort,
            models::reports::NotesReportRow,
            models::reports::NotesReport,
            models::reports::WoodSort,
            models::reports::ItemReportRow,
            models::reports::WoodReport,
            models::reports::MovementKind,
            models::reports::CashFlowMovement,
            models::reports::CashFlowReport,
            models::reports::CustomerAmount,
            models::reports::WoodVolume,
            models::reports::Dashboard,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e operadores"),
        (name = "Clientes", description = "Cadastro de clientes e saldo"),
        (name = "Madeiras", description = "Tipos de madeira e preços por m³"),
        (name = "Motoristas", description = "Cadastro de motoristas"),
        (name = "Romaneios", description = "Romaneios, itens e toras"),
        (name = "Pagamentos", description = "Pagamentos recebidos dos clientes"),
        (name = "Relatórios", description = "Fichas, fluxo financeiro e painel"),
        (name = "Documentos", description = "Exportações em PDF e CSV")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}
