// src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Sem configuração válida a aplicação não sobe
    let settings = Settings::from_env()?;
    let app_state = AppState::new(settings).await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    if let (Some(email), Some(password)) = (&app_state.settings.admin_email, &app_state.settings.admin_password) {
        match app_state.auth_service.bootstrap_admin(email, password).await {
            Ok(Some(user)) => tracing::info!("👤 Usuário administrador criado: {}", user.email),
            Ok(None) => tracing::debug!("Usuários já existem; bootstrap do administrador ignorado"),
            Err(e) => tracing::warn!("Falha ao criar o administrador inicial: {}", e),
        }
    }

    tracing::info!("Regra de preço de madeira: {:?}", app_state.settings.wood_price_rule);

    let listener = TcpListener::bind(&app_state.settings.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, router(app_state)).await?;
    Ok(())
}

fn router(app_state: AppState) -> Router {
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/api/users/me", get(handlers::auth::get_me))
        .route(
            "/api/users",
            get(handlers::auth::list_users).post(handlers::auth::create_user),
        );

    let registry_routes = Router::new()
        .route(
            "/api/customers",
            post(handlers::customers::create_customer).get(handlers::customers::list_customers),
        )
        .route(
            "/api/customers/{id}",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .route(
            "/api/wood-types",
            post(handlers::wood_types::create_wood_type).get(handlers::wood_types::list_wood_types),
        )
        .route(
            "/api/wood-types/{id}",
            get(handlers::wood_types::get_wood_type)
                .put(handlers::wood_types::update_wood_type)
                .delete(handlers::wood_types::delete_wood_type),
        )
        .route("/api/wood-types/{id}/price", get(handlers::wood_types::get_price))
        .route(
            "/api/drivers",
            post(handlers::drivers::create_driver).get(handlers::drivers::list_drivers),
        )
        .route(
            "/api/drivers/{id}",
            get(handlers::drivers::get_driver)
                .put(handlers::drivers::update_driver)
                .delete(handlers::drivers::delete_driver),
        );

    let delivery_routes = Router::new()
        .route(
            "/api/delivery-notes",
            post(handlers::delivery_notes::create_note).get(handlers::delivery_notes::list_notes),
        )
        .route(
            "/api/delivery-notes/{id}",
            get(handlers::delivery_notes::get_note)
                .put(handlers::delivery_notes::update_note)
                .delete(handlers::delivery_notes::delete_note),
        )
        .route("/api/delivery-notes/{id}/pdf", get(handlers::documents::note_pdf))
        .route("/api/delivery-notes/{id}/items", post(handlers::delivery_notes::add_item))
        .route(
            "/api/delivery-notes/items/{item_id}",
            put(handlers::delivery_notes::update_item).delete(handlers::delivery_notes::delete_item),
        )
        .route(
            "/api/delivery-notes/items/{item_id}/logs",
            post(handlers::delivery_notes::add_log),
        )
        .route(
            "/api/delivery-notes/logs/{log_id}",
            put(handlers::delivery_notes::update_log).delete(handlers::delivery_notes::delete_log),
        );

    let payment_routes = Router::new()
        .route(
            "/api/payments",
            post(handlers::payments::create_payment).get(handlers::payments::list_payments),
        )
        .route(
            "/api/payments/{id}",
            get(handlers::payments::get_payment)
                .put(handlers::payments::update_payment)
                .delete(handlers::payments::delete_payment),
        );

    let report_routes = Router::new()
        .route("/api/reports/dashboard", get(handlers::reports::get_dashboard))
        .route("/api/reports/notes", get(handlers::reports::notes_report))
        .route("/api/reports/notes/csv", get(handlers::documents::notes_report_csv))
        .route("/api/reports/notes/pdf", get(handlers::documents::notes_report_pdf))
        .route("/api/reports/woods", get(handlers::reports::wood_report))
        .route("/api/reports/woods/csv", get(handlers::documents::wood_report_csv))
        .route("/api/reports/woods/pdf", get(handlers::documents::wood_report_pdf))
        .route("/api/reports/cash-flow", get(handlers::reports::cash_flow))
        .route("/api/reports/cash-flow/csv", get(handlers::documents::cash_flow_csv))
        .route("/api/reports/cash-flow/pdf", get(handlers::documents::cash_flow_pdf))
        .route("/api/reports/customer-balances", get(handlers::reports::customer_balances))
        .route(
            "/api/reports/customer-balances/csv",
            get(handlers::documents::customer_balances_csv),
        );

    // Tudo abaixo exige token
    let protected = Router::new()
        .merge(user_routes)
        .merge(registry_routes)
        .merge(delivery_routes)
        .merge(payment_routes)
        .merge(report_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use chrono::NaiveDate;
    use http_body_util::BodyExt;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::common::clock::FixedClock;

    fn app() -> Router {
        let settings = Settings::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/madeireira_test".into()),
            "JWT_SECRET" => Some("segredo-de-teste".into()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new().connect_lazy(&settings.database_url).unwrap();
        let clock = Arc::new(FixedClock(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()));
        router(AppState::with_pool(pool, settings, clock))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for uri in ["/api/customers", "/api/delivery-notes", "/api/reports/cash-flow/csv", "/api/users/me"] {
            let response = app()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn malformed_token_is_rejected_with_code() {
        let response = app()
            .oneshot(
                Request::get("/api/payments")
                    .header(header::AUTHORIZATION, "Bearer nao-e-um-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["code"], "error.invalid_token");
    }

    #[tokio::test]
    async fn invalid_login_payload_is_a_validation_error() {
        let response = app()
            .oneshot(
                Request::post("/api/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::ACCEPT_LANGUAGE, "en")
                    .body(Body::from(r#"{"email":"nao-e-email","password":""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "error.validation");
        assert!(body["details"].get("email").is_some());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn oversized_log_measures_are_a_validation_error(pool: sqlx::PgPool) {
        let state = AppState::for_tests(pool);
        state
            .auth_service
            .create_user("operador@madeireira.com", "senha-forte", None, true)
            .await
            .unwrap();
        let token = state
            .auth_service
            .login_user("operador@madeireira.com", "senha-forte")
            .await
            .unwrap();
        let app = router(state);

        let big = r#"{"length":"1000000000000000","rodo":"1000000000000000"}"#;
        let requests = [
            Request::post(format!("/api/delivery-notes/items/{}/logs", uuid::Uuid::new_v4())),
            Request::put(format!("/api/delivery-notes/logs/{}", uuid::Uuid::new_v4())),
        ];
        for request in requests {
            let response = app
                .clone()
                .oneshot(
                    request
                        .header(header::AUTHORIZATION, format!("Bearer {token}"))
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(Body::from(big))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = body_json(response).await;
            assert_eq!(body["code"], "error.validation");
            assert!(body["details"].get("length").is_some());
            assert!(body["details"].get("rodo").is_some());
        }
    }

    #[test]
    fn openapi_lists_the_main_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/api/delivery-notes", "/api/payments/{id}", "/api/reports/cash-flow"] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
    }
}
