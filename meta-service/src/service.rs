//! Metadata service.
//!
//! Each call opens a pool for the request's connection, does its work, and
//! lets the pool manager tear the pool down again. Mutation requests are
//! validated and planned before any connection is made.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use validator::Validate;

use common::errors::AppResult;
use common::models::{
    ConfigSetting, ConnectionConfig, CreateRoleRequest, CreateSchemaRequest, CreateTableRequest,
    Extension, Function, PgType, Role, Schema, Table, UpdateSchemaRequest, VersionInfo,
};

use crate::assembler;
use crate::catalog::{self, CatalogFilter};
use crate::planner;
use crate::pool_manager::PoolManager;

/// Catalog and DDL operations against a target database.
#[async_trait]
pub trait MetaServiceTrait: Send + Sync {
    /// Runs arbitrary SQL and returns the rows.
    async fn run_query(&self, conn: &ConnectionConfig, sql: &str) -> AppResult<Vec<Value>>;

    /// Lists run-time settings.
    async fn config(&self, conn: &ConnectionConfig) -> AppResult<Vec<ConfigSetting>>;

    /// Reports the server version.
    async fn version(&self, conn: &ConnectionConfig) -> AppResult<VersionInfo>;

    async fn list_schemas(&self, conn: &ConnectionConfig, filter: CatalogFilter) -> AppResult<Vec<Schema>>;

    async fn create_schema(&self, conn: &ConnectionConfig, req: CreateSchemaRequest) -> AppResult<Schema>;

    /// Changes the owner and/or name of the schema with OID `id`.
    async fn patch_schema(
        &self,
        conn: &ConnectionConfig,
        id: i64,
        req: UpdateSchemaRequest,
    ) -> AppResult<Schema>;

    async fn list_types(&self, conn: &ConnectionConfig, filter: CatalogFilter) -> AppResult<Vec<PgType>>;

    async fn list_functions(&self, conn: &ConnectionConfig, filter: CatalogFilter) -> AppResult<Vec<Function>>;

    /// Lists tables with columns, keys, grants, policies and relationships.
    async fn list_tables(&self, conn: &ConnectionConfig, filter: CatalogFilter) -> AppResult<Vec<Table>>;

    async fn create_table(&self, conn: &ConnectionConfig, req: CreateTableRequest) -> AppResult<Table>;

    async fn list_extensions(&self, conn: &ConnectionConfig, filter: CatalogFilter) -> AppResult<Vec<Extension>>;

    /// Lists roles with their schema privileges.
    async fn list_roles(&self, conn: &ConnectionConfig, filter: CatalogFilter) -> AppResult<Vec<Role>>;

    async fn create_role(&self, conn: &ConnectionConfig, req: CreateRoleRequest) -> AppResult<Role>;
}

/// Default [`MetaServiceTrait`] implementation over per-request pools.
pub struct MetaService {
    pool_manager: Arc<PoolManager>,
}

impl MetaService {
    pub fn new(pool_manager: Arc<PoolManager>) -> Self {
        Self { pool_manager }
    }
}

#[async_trait]
impl MetaServiceTrait for MetaService {
    async fn run_query(&self, conn: &ConnectionConfig, sql: &str) -> AppResult<Vec<Value>> {
        self.pool_manager.execute(conn, sql).await
    }

    async fn config(&self, conn: &ConnectionConfig) -> AppResult<Vec<ConfigSetting>> {
        self.pool_manager
            .with_pool(conn, |pool| async move { catalog::fetch_config(&pool).await })
            .await
    }

    async fn version(&self, conn: &ConnectionConfig) -> AppResult<VersionInfo> {
        self.pool_manager
            .with_pool(conn, |pool| async move { catalog::fetch_version(&pool).await })
            .await
    }

    async fn list_schemas(&self, conn: &ConnectionConfig, filter: CatalogFilter) -> AppResult<Vec<Schema>> {
        self.pool_manager
            .with_pool(conn, |pool| async move { catalog::fetch_schemas(&pool, &filter).await })
            .await
    }

    async fn create_schema(&self, conn: &ConnectionConfig, req: CreateSchemaRequest) -> AppResult<Schema> {
        req.validate()?;
        let plan = planner::plan_create_schema(&req)?;
        self.pool_manager
            .with_pool(conn, |pool| async move { planner::create_schema(&pool, &plan).await })
            .await
    }

    async fn patch_schema(
        &self,
        conn: &ConnectionConfig,
        id: i64,
        req: UpdateSchemaRequest,
    ) -> AppResult<Schema> {
        req.validate()?;
        let patch = planner::plan_patch_schema(&req)?;
        self.pool_manager
            .with_pool(conn, |pool| async move { planner::patch_schema(&pool, id, &patch).await })
            .await
    }

    async fn list_types(&self, conn: &ConnectionConfig, filter: CatalogFilter) -> AppResult<Vec<PgType>> {
        self.pool_manager
            .with_pool(conn, |pool| async move { catalog::fetch_types(&pool, &filter).await })
            .await
    }

    async fn list_functions(&self, conn: &ConnectionConfig, filter: CatalogFilter) -> AppResult<Vec<Function>> {
        self.pool_manager
            .with_pool(conn, |pool| async move { catalog::fetch_functions(&pool, &filter).await })
            .await
    }

    async fn list_tables(&self, conn: &ConnectionConfig, filter: CatalogFilter) -> AppResult<Vec<Table>> {
        self.pool_manager
            .with_pool(conn, |pool| async move { assembler::list_tables(&pool, &filter).await })
            .await
    }

    async fn create_table(&self, conn: &ConnectionConfig, req: CreateTableRequest) -> AppResult<Table> {
        req.validate()?;
        let plan = planner::plan_create_table(&req)?;
        self.pool_manager
            .with_pool(conn, |pool| async move { planner::create_table(&pool, &plan).await })
            .await
    }

    async fn list_extensions(&self, conn: &ConnectionConfig, filter: CatalogFilter) -> AppResult<Vec<Extension>> {
        self.pool_manager
            .with_pool(conn, |pool| async move { catalog::fetch_extensions(&pool, &filter).await })
            .await
    }

    async fn list_roles(&self, conn: &ConnectionConfig, filter: CatalogFilter) -> AppResult<Vec<Role>> {
        self.pool_manager
            .with_pool(conn, |pool| async move { assembler::list_roles(&pool, &filter).await })
            .await
    }

    async fn create_role(&self, conn: &ConnectionConfig, req: CreateRoleRequest) -> AppResult<Role> {
        req.validate()?;
        let plan = planner::plan_create_role(&req)?;
        self.pool_manager
            .with_pool(conn, |pool| async move { planner::create_role(&pool, &plan).await })
            .await
    }
}
