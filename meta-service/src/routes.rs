//! Route table.

use axum::{
    routing::{get, patch},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/query", get(handlers::run_query).post(handlers::run_query))
        .route("/config", get(handlers::get_config))
        .route("/config/version", get(handlers::get_version))
        .route("/schemas", get(handlers::list_schemas).post(handlers::create_schema))
        .route("/schemas/{id}", patch(handlers::patch_schema))
        .route("/types", get(handlers::list_types))
        .route("/functions", get(handlers::list_functions))
        .route("/tables", get(handlers::list_tables).post(handlers::create_table))
        .route("/extensions", get(handlers::list_extensions))
        .route("/roles", get(handlers::list_roles).post(handlers::create_role))
}
