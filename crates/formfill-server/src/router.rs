use crate::handlers;
use axum::Router;
use axum::routing::{get, post};
use formfill_interpreter::FormInterpreter;
use formfill_store::ProfileStore;
use http::Method;
use http::header::CONTENT_TYPE;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

/// Prefix under which every route is mounted a second time
const API_PREFIX: &str = "/api";

/// How long browsers may cache a preflight answer
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86400);

/// Services shared by all requests
pub struct ApiState {
    pub interpreter: Arc<FormInterpreter>,
    pub store: Arc<dyn ProfileStore>,
}

impl ApiState {
    pub fn new(interpreter: Arc<FormInterpreter>, store: Arc<dyn ProfileStore>) -> Self {
        Self { interpreter, store }
    }
}

fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/data", get(handlers::get_data).post(handlers::save_data))
        .route("/interpret", post(handlers::interpret))
        .route("/interpretations", get(handlers::get_interpretation))
        .route(
            "/mappings",
            get(handlers::get_mappings).post(handlers::save_mapping),
        )
        .route("/mappings/bulk", post(handlers::save_mappings))
        .method_not_allowed_fallback(handlers::method_not_allowed)
}

/// The API application: every route at the root and again under `/api`
///
/// Unknown paths get a JSON 404. CORS is open to any origin, and preflight
/// requests are answered by the CORS layer before routing.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(PREFLIGHT_MAX_AGE);

    Router::new()
        .merge(routes())
        .nest(API_PREFIX, routes())
        .fallback(handlers::not_found)
        .layer(cors)
        .with_state(Arc::new(state))
}
