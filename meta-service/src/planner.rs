//! Mutation planner.
//!
//! Requests are turned into plans (quoted DDL plus whatever is needed to read
//! the object back) before a connection is opened. Applying a plan runs its
//! statements in one transaction and re-reads the object through the listing
//! path.

use std::sync::LazyLock;

use regex::Regex;
use sqlx::{Executor, PgPool};

use common::errors::{AppError, AppResult};
use common::models::role::rfc3339_millis;
use common::models::{
    CreateRoleRequest, CreateSchemaRequest, CreateTableRequest, Role, Schema, Table,
    UpdateSchemaRequest,
};
use common::utils::{quote_ident, quote_literal, quote_qualified};

use crate::assembler;
use crate::catalog::{self, CatalogFilter};

/// One type word, bare or double-quoted with `""` escapes.
macro_rules! type_ident {
    () => {
        r#"(?:[A-Za-z_][A-Za-z0-9_$]*|"(?:[^"\x00]|"")+")"#
    };
}

/// `(p)` for types that take a single precision.
macro_rules! precision {
    () => {
        r"(?:\s*\(\s*\d+\s*\))"
    };
}

/// Accepted column types: one optionally schema-qualified word with an
/// optional `(p[,s])` modifier, or one of the SQL multi-word type names.
/// Either may be followed by array brackets.
static TYPE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:",
        r"double\s+precision",
        r"|(?:character|char|bit)\s+varying",
        precision!(),
        r"?",
        r"|(?:timestamp|time)",
        precision!(),
        r"?\s+with(?:out)?\s+time\s+zone",
        r"|interval(?:\s+(?:year\s+to\s+month|day\s+to\s+(?:hour|minute|second)",
        r"|hour\s+to\s+(?:minute|second)|minute\s+to\s+second",
        r"|year|month|day|hour|minute|second))?",
        precision!(),
        r"?",
        r"|(?:",
        type_ident!(),
        r"\.)?",
        type_ident!(),
        r"(?:\s*\(\s*\d+(?:\s*,\s*\d+)?\s*\))?",
        r")(?:\[\d*\])*$",
    ))
    .expect("type name pattern is valid")
});

/// Checks that `data_type` is a type name and nothing more, returning it
/// trimmed. Quoted words must already be in `quote_ident` form.
pub fn check_type_name(data_type: &str) -> AppResult<&str> {
    let trimmed = data_type.trim();
    if TYPE_NAME.is_match(trimmed) {
        Ok(trimmed)
    } else {
        Err(AppError::Validation("unsupported type name".into()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPlan {
    pub sql: String,
    pub name: String,
}

pub fn plan_create_schema(req: &CreateSchemaRequest) -> AppResult<SchemaPlan> {
    let mut sql = format!("CREATE SCHEMA {}", quote_ident(&req.name)?);
    if let Some(owner) = &req.owner {
        sql.push_str(&format!(" AUTHORIZATION {}", quote_ident(owner)?));
    }
    Ok(SchemaPlan {
        sql,
        name: req.name.clone(),
    })
}

/// Pre-quoted pieces of a schema patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaPatch {
    owner: Option<String>,
    rename: Option<(String, String)>,
}

pub fn plan_patch_schema(req: &UpdateSchemaRequest) -> AppResult<SchemaPatch> {
    Ok(SchemaPatch {
        owner: req.owner.as_deref().map(quote_ident).transpose()?,
        rename: match &req.name {
            Some(name) => Some((name.clone(), quote_ident(name)?)),
            None => None,
        },
    })
}

impl SchemaPatch {
    /// `OWNER TO` first, then `RENAME TO`, both against the current name.
    pub fn statements(&self, current_name: &str) -> AppResult<Vec<String>> {
        let current = quote_ident(current_name)?;
        let mut statements = Vec::new();
        if let Some(owner) = &self.owner {
            statements.push(format!("ALTER SCHEMA {current} OWNER TO {owner}"));
        }
        if let Some((raw, quoted)) = &self.rename {
            if raw != current_name {
                statements.push(format!("ALTER SCHEMA {current} RENAME TO {quoted}"));
            }
        }
        Ok(statements)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePlan {
    pub sql: String,
    pub schema: String,
    pub name: String,
}

pub fn plan_create_table(req: &CreateTableRequest) -> AppResult<TablePlan> {
    let mut definitions = Vec::with_capacity(req.columns.len() + 1);
    for column in &req.columns {
        let mut def = format!(
            "{} {}",
            quote_ident(&column.name)?,
            check_type_name(&column.data_type)?
        );
        if column.is_identity {
            def.push_str(" GENERATED BY DEFAULT AS IDENTITY");
        }
        if !column.is_nullable {
            def.push_str(" NOT NULL");
        }
        definitions.push(def);
    }

    if !req.primary_keys.is_empty() {
        let keys = req
            .primary_keys
            .iter()
            .map(|k| quote_ident(k))
            .collect::<AppResult<Vec<_>>>()?;
        definitions.push(format!("PRIMARY KEY ({})", keys.join(", ")));
    }

    Ok(TablePlan {
        sql: format!(
            "CREATE TABLE {} ({})",
            quote_qualified(&req.schema, &req.name)?,
            definitions.join(", ")
        ),
        schema: req.schema.clone(),
        name: req.name.clone(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePlan {
    pub sql: String,
    pub name: String,
}

pub fn plan_create_role(req: &CreateRoleRequest) -> AppResult<RolePlan> {
    let flags = [
        (req.is_superuser, "SUPERUSER"),
        (req.can_create_db, "CREATEDB"),
        (req.can_create_role, "CREATEROLE"),
        (req.inherit_role, "INHERIT"),
        (req.can_login, "LOGIN"),
        (req.is_replication_role, "REPLICATION"),
        (req.can_bypass_rls, "BYPASSRLS"),
    ];

    let mut options: Vec<String> = flags
        .iter()
        .filter_map(|(value, keyword)| {
            value.map(|on| if on { keyword.to_string() } else { format!("NO{keyword}") })
        })
        .collect();

    if let Some(limit) = req.connection_limit {
        options.push(format!("CONNECTION LIMIT {limit}"));
    }
    if let Some(password) = &req.password {
        options.push(format!("PASSWORD {}", quote_literal(password)?));
    }
    if let Some(valid_until) = &req.valid_until {
        options.push(format!(
            "VALID UNTIL {}",
            quote_literal(&rfc3339_millis::format(valid_until))?
        ));
    }

    let mut sql = format!("CREATE ROLE {}", quote_ident(&req.name)?);
    if !options.is_empty() {
        sql.push_str(" WITH ");
        sql.push_str(&options.join(" "));
    }
    Ok(RolePlan {
        sql,
        name: req.name.clone(),
    })
}

async fn apply(pool: &PgPool, sql: &str) -> AppResult<()> {
    let mut tx = pool.begin().await?;
    (&mut *tx).execute(sqlx::raw_sql(sql)).await?;
    tx.commit().await?;
    Ok(())
}

pub async fn create_schema(pool: &PgPool, plan: &SchemaPlan) -> AppResult<Schema> {
    apply(pool, &plan.sql).await?;
    tracing::info!(schema = %plan.name, "Schema created");

    let filter = CatalogFilter {
        include_system_schemas: true,
        schema: Some(plan.name.clone()),
        ..CatalogFilter::default()
    };
    catalog::fetch_schemas(pool, &filter)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("schema {}", plan.name)))
}

pub async fn patch_schema(pool: &PgPool, id: i64, patch: &SchemaPatch) -> AppResult<Schema> {
    let mut tx = pool.begin().await?;
    let current = catalog::fetch_schema_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("schema {id}")))?;
    for sql in patch.statements(&current.name)? {
        (&mut *tx).execute(sqlx::raw_sql(&sql)).await?;
    }
    tx.commit().await?;
    tracing::info!(id, schema = %current.name, "Schema updated");

    catalog::fetch_schema_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("schema {id}")))
}

pub async fn create_table(pool: &PgPool, plan: &TablePlan) -> AppResult<Table> {
    apply(pool, &plan.sql).await?;
    tracing::info!(schema = %plan.schema, table = %plan.name, "Table created");

    assembler::list_tables(pool, &CatalogFilter::table(&plan.schema, &plan.name))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("table {}.{}", plan.schema, plan.name)))
}

pub async fn create_role(pool: &PgPool, plan: &RolePlan) -> AppResult<Role> {
    apply(pool, &plan.sql).await?;
    tracing::info!(role = %plan.name, "Role created");

    assembler::list_roles(pool, &CatalogFilter::role(&plan.name))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("role {}", plan.name)))
}
