pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::Settings,
    service::ServiceContext,
};
use state::AppState;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        .nest("/api", api_routes())
        .nest("/admin", admin_routes(app_state.clone()))

        .with_state(app_state)

        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", openapi::ApiDoc::openapi()))

        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/pricing", get(handlers::pricing::list))
        .route("/payment", post(handlers::payments::create))
        .route("/payment/confirm", post(handlers::payments::confirm))
        // Authenticated by signature, not by session
        .route("/webhooks/stripe", post(handlers::webhooks::stripe_webhook))
        .route("/bookings/:id", get(handlers::bookings::get))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/bookings", get(handlers::admin::list_bookings))
        .route(
            "/pricing",
            get(handlers::admin::list_pricing).put(handlers::admin::upsert_pricing),
        )
        .route("/users/:user_id/bookings", get(handlers::admin::user_bookings))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_admin,
        ))
}
