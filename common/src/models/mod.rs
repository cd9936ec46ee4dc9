//! Shared data models.

pub mod catalog;
pub mod connection;
pub mod query;
pub mod role;
pub mod schema;
pub mod table;

pub use catalog::{ConfigSetting, Extension, Function, PgType, VersionInfo};
pub use connection::{ConnectionConfig, SslMode};
pub use query::{ListParams, QueryRequest};
pub use role::{CreateRoleRequest, Role, RoleGrant};
pub use schema::{CreateSchemaRequest, Schema, UpdateSchemaRequest};
pub use table::{
    Column, CreateColumnRequest, CreateTableRequest, Grant, Policy, Relationship, Table,
};
