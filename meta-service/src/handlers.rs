//! HTTP handlers.
//!
//! Listings answer with bare JSON arrays and mutations with the bare object;
//! failures go through `AppError`'s error envelope.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use common::errors::AppError;
use common::models::{
    ConfigSetting, CreateRoleRequest, CreateSchemaRequest, CreateTableRequest, Extension,
    Function, ListParams, PgType, QueryRequest, Role, Schema, Table, UpdateSchemaRequest,
    VersionInfo,
};
use common::response::ApiResponse;

use crate::extract::Connection;
use crate::service::{MetaService, MetaServiceTrait};
use crate::state::AppState;

fn service(state: &AppState) -> MetaService {
    MetaService::new(state.pool_manager.clone())
}

#[derive(Serialize, ToSchema)]
pub struct RootResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub date: DateTime<Utc>,
}

/// Liveness and gateway version.
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses((status = 200, description = "Service is running", body = RootResponse))
)]
pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok".to_string(),
        service: state.config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Liveness with the current date.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is running", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { date: Utc::now() })
}

/// Execute SQL against the target database.
#[utoipa::path(
    post,
    path = "/query",
    tag = "query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Result rows", body = Vec<Object>),
        (status = 400, description = "Empty query", body = ApiResponse),
        (status = 500, description = "Descriptor, connection or query failure", body = ApiResponse)
    )
)]
pub async fn run_query(
    State(state): State<AppState>,
    Connection(conn): Connection,
    Json(req): Json<QueryRequest>,
) -> Result<Json<Vec<Value>>, AppError> {
    req.validate()?;
    let rows = service(&state).run_query(&conn, &req.query).await?;
    Ok(Json(rows))
}

/// List run-time configuration settings.
#[utoipa::path(
    get,
    path = "/config",
    tag = "config",
    responses(
        (status = 200, description = "Settings", body = Vec<ConfigSetting>),
        (status = 500, description = "Descriptor, connection or query failure", body = ApiResponse)
    )
)]
pub async fn get_config(
    State(state): State<AppState>,
    Connection(conn): Connection,
) -> Result<Json<Vec<ConfigSetting>>, AppError> {
    Ok(Json(service(&state).config(&conn).await?))
}

/// Server version.
#[utoipa::path(
    get,
    path = "/config/version",
    tag = "config",
    responses(
        (status = 200, description = "Version information", body = VersionInfo),
        (status = 500, description = "Descriptor, connection or query failure", body = ApiResponse)
    )
)]
pub async fn get_version(
    State(state): State<AppState>,
    Connection(conn): Connection,
) -> Result<Json<VersionInfo>, AppError> {
    Ok(Json(service(&state).version(&conn).await?))
}

/// List schemas.
#[utoipa::path(
    get,
    path = "/schemas",
    tag = "schemas",
    params(ListParams),
    responses(
        (status = 200, description = "Schemas", body = Vec<Schema>),
        (status = 500, description = "Descriptor, connection or query failure", body = ApiResponse)
    )
)]
pub async fn list_schemas(
    State(state): State<AppState>,
    Connection(conn): Connection,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Schema>>, AppError> {
    Ok(Json(service(&state).list_schemas(&conn, params.into()).await?))
}

/// Create a schema.
#[utoipa::path(
    post,
    path = "/schemas",
    tag = "schemas",
    request_body = CreateSchemaRequest,
    responses(
        (status = 200, description = "Created schema", body = Schema),
        (status = 400, description = "Invalid request", body = ApiResponse),
        (status = 500, description = "Descriptor, connection or query failure", body = ApiResponse)
    )
)]
pub async fn create_schema(
    State(state): State<AppState>,
    Connection(conn): Connection,
    Json(req): Json<CreateSchemaRequest>,
) -> Result<Json<Schema>, AppError> {
    Ok(Json(service(&state).create_schema(&conn, req).await?))
}

/// Rename a schema or change its owner.
#[utoipa::path(
    patch,
    path = "/schemas/{id}",
    tag = "schemas",
    params(("id" = i64, Path, description = "Schema OID")),
    request_body = UpdateSchemaRequest,
    responses(
        (status = 200, description = "Updated schema", body = Schema),
        (status = 400, description = "Invalid request", body = ApiResponse),
        (status = 404, description = "Schema not found", body = ApiResponse),
        (status = 500, description = "Descriptor, connection or query failure", body = ApiResponse)
    )
)]
pub async fn patch_schema(
    State(state): State<AppState>,
    Connection(conn): Connection,
    Path(id): Path<i64>,
    Json(req): Json<UpdateSchemaRequest>,
) -> Result<Json<Schema>, AppError> {
    Ok(Json(service(&state).patch_schema(&conn, id, req).await?))
}

/// List data types.
#[utoipa::path(
    get,
    path = "/types",
    tag = "types",
    params(ListParams),
    responses(
        (status = 200, description = "Types", body = Vec<PgType>),
        (status = 500, description = "Descriptor, connection or query failure", body = ApiResponse)
    )
)]
pub async fn list_types(
    State(state): State<AppState>,
    Connection(conn): Connection,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PgType>>, AppError> {
    Ok(Json(service(&state).list_types(&conn, params.into()).await?))
}

/// List functions.
#[utoipa::path(
    get,
    path = "/functions",
    tag = "functions",
    params(ListParams),
    responses(
        (status = 200, description = "Functions", body = Vec<Function>),
        (status = 500, description = "Descriptor, connection or query failure", body = ApiResponse)
    )
)]
pub async fn list_functions(
    State(state): State<AppState>,
    Connection(conn): Connection,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Function>>, AppError> {
    Ok(Json(service(&state).list_functions(&conn, params.into()).await?))
}

/// List tables with columns, keys, grants, policies and relationships.
#[utoipa::path(
    get,
    path = "/tables",
    tag = "tables",
    params(ListParams),
    responses(
        (status = 200, description = "Tables", body = Vec<Table>),
        (status = 500, description = "Descriptor, connection or query failure", body = ApiResponse)
    )
)]
pub async fn list_tables(
    State(state): State<AppState>,
    Connection(conn): Connection,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Table>>, AppError> {
    Ok(Json(service(&state).list_tables(&conn, params.into()).await?))
}

/// Create a table.
#[utoipa::path(
    post,
    path = "/tables",
    tag = "tables",
    request_body = CreateTableRequest,
    responses(
        (status = 200, description = "Created table", body = Table),
        (status = 400, description = "Invalid request or type name", body = ApiResponse),
        (status = 500, description = "Descriptor, connection or query failure", body = ApiResponse)
    )
)]
pub async fn create_table(
    State(state): State<AppState>,
    Connection(conn): Connection,
    Json(req): Json<CreateTableRequest>,
) -> Result<Json<Table>, AppError> {
    Ok(Json(service(&state).create_table(&conn, req).await?))
}

/// List available and installed extensions.
#[utoipa::path(
    get,
    path = "/extensions",
    tag = "extensions",
    params(ListParams),
    responses(
        (status = 200, description = "Extensions", body = Vec<Extension>),
        (status = 500, description = "Descriptor, connection or query failure", body = ApiResponse)
    )
)]
pub async fn list_extensions(
    State(state): State<AppState>,
    Connection(conn): Connection,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Extension>>, AppError> {
    Ok(Json(service(&state).list_extensions(&conn, params.into()).await?))
}

/// List roles with their schema privileges.
#[utoipa::path(
    get,
    path = "/roles",
    tag = "roles",
    params(ListParams),
    responses(
        (status = 200, description = "Roles", body = Vec<Role>),
        (status = 500, description = "Descriptor, connection or query failure", body = ApiResponse)
    )
)]
pub async fn list_roles(
    State(state): State<AppState>,
    Connection(conn): Connection,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Role>>, AppError> {
    Ok(Json(service(&state).list_roles(&conn, params.into()).await?))
}

/// Create a role.
#[utoipa::path(
    post,
    path = "/roles",
    tag = "roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 200, description = "Created role", body = Role),
        (status = 400, description = "Invalid request", body = ApiResponse),
        (status = 500, description = "Descriptor, connection or query failure", body = ApiResponse)
    )
)]
pub async fn create_role(
    State(state): State<AppState>,
    Connection(conn): Connection,
    Json(req): Json<CreateRoleRequest>,
) -> Result<Json<Role>, AppError> {
    Ok(Json(service(&state).create_role(&conn, req).await?))
}
