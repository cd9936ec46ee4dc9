//! PostgreSQL metadata gateway.
//!
//! Exposes a live database's catalog (schemas, tables, types, functions,
//! extensions, roles, settings) and a raw SQL endpoint over HTTP. Every
//! request names its own target database and gets a pool that lives only as
//! long as the request.

pub mod assembler;
pub mod catalog;
pub mod descriptor;
pub mod extract;
pub mod handlers;
pub mod planner;
pub mod pool_manager;
pub mod routes;
pub mod service;
pub mod state;

use axum::{middleware, routing::get, Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use common::middleware::request_id::request_id_middleware;

pub use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "pg-meta API",
        version = "0.1.0",
        description = "PostgreSQL metadata gateway"
    ),
    paths(
        handlers::root,
        handlers::health_check,
        handlers::run_query,
        handlers::get_config,
        handlers::get_version,
        handlers::list_schemas,
        handlers::create_schema,
        handlers::patch_schema,
        handlers::list_types,
        handlers::list_functions,
        handlers::list_tables,
        handlers::create_table,
        handlers::list_extensions,
        handlers::list_roles,
        handlers::create_role,
    ),
    components(schemas(
        common::models::QueryRequest,
        common::models::ConfigSetting,
        common::models::VersionInfo,
        common::models::Schema,
        common::models::CreateSchemaRequest,
        common::models::UpdateSchemaRequest,
        common::models::PgType,
        common::models::Function,
        common::models::Table,
        common::models::Column,
        common::models::Grant,
        common::models::Policy,
        common::models::Relationship,
        common::models::CreateTableRequest,
        common::models::CreateColumnRequest,
        common::models::Extension,
        common::models::Role,
        common::models::RoleGrant,
        common::models::CreateRoleRequest,
        common::response::ApiResponse,
        common::response::ApiError,
        common::response::ResponseMeta,
        handlers::RootResponse,
        handlers::HealthResponse,
    )),
    tags(
        (name = "health", description = "Liveness endpoints"),
        (name = "query", description = "Raw SQL execution"),
        (name = "config", description = "Server settings and version"),
        (name = "schemas", description = "Schema listing and DDL"),
        (name = "types", description = "Data types"),
        (name = "functions", description = "Functions and procedures"),
        (name = "tables", description = "Table listing and DDL"),
        (name = "extensions", description = "Extensions"),
        (name = "roles", description = "Role listing and DDL")
    )
)]
pub struct ApiDoc;

/// Builds the application router with middleware applied.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
