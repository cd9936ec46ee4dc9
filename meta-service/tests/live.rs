//! Tests against a real database.
//!
//! Skipped unless `PG_META_TEST_CONNECTION` holds a superuser connection
//! string for a disposable database. Tests create what they need.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::time::Duration;

use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::config::AppConfig;
use common::models::ConnectionConfig;
use meta_service::descriptor::DescriptorCodec;
use meta_service::pool_manager::PoolManager;
use meta_service::{create_router, AppState};

const KEY: &str = "live-test-key";

fn connection() -> Option<String> {
    std::env::var("PG_META_TEST_CONNECTION")
        .ok()
        .filter(|v| !v.is_empty())
}

fn app(connection: &str) -> Router {
    create_router(AppState::new(config(connection)))
}

fn config(connection: &str) -> AppConfig {
    AppConfig {
        default_connection: Some(connection.to_string()),
        crypto_key: Some(KEY.to_string()),
        ..AppConfig::default()
    }
}

/// Tags sessions so `pg_stat_activity` can tell them apart from other tests.
fn with_application_name(connection: &str, name: &str) -> String {
    if !connection.contains("://") {
        format!("{connection} application_name={name}")
    } else if connection.contains('?') {
        format!("{connection}&application_name={name}")
    } else {
        format!("{connection}?application_name={name}")
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn json_request(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

fn find<'a>(items: &'a Value, pred: impl Fn(&Value) -> bool) -> Option<&'a Value> {
    items.as_array().and_then(|a| a.iter().find(|x| pred(x)))
}

async fn query(app: &Router, sql: &str) -> (StatusCode, Value) {
    json_request(app, "POST", "/query", json!({ "query": sql })).await
}

async fn sessions(app: &Router, application_name: &str) -> i64 {
    let (_, body) = query(
        app,
        &format!(
            "SELECT count(*)::int8 AS n FROM pg_stat_activity WHERE application_name = '{application_name}'"
        ),
    )
    .await;
    body[0]["n"].as_i64().unwrap()
}

/// Polls until no session carries `application_name`, returning the last count.
async fn wait_for_no_sessions(app: &Router, application_name: &str) -> i64 {
    let mut count = sessions(app, application_name).await;
    for _ in 0..30 {
        if count == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
        count = sessions(app, application_name).await;
    }
    count
}

async fn ensure_fixture(app: &Router) {
    let (status, body) = query(
        app,
        "CREATE TABLE IF NOT EXISTS public.users (
            id bigint GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
            name text
        );
        CREATE TABLE IF NOT EXISTS public.todos (
            id bigint GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
            details text,
            user_id bigint NOT NULL REFERENCES public.users (id)
        );",
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

macro_rules! live_app {
    () => {
        match connection() {
            Some(conn) => (app(&conn), conn),
            None => {
                eprintln!("PG_META_TEST_CONNECTION not set; skipping");
                return;
            }
        }
    };
}

#[tokio::test]
async fn encrypted_descriptor_matches_plain() {
    let (app, conn) = live_app!();
    let encrypted = DescriptorCodec::new(Some(KEY.to_string()))
        .encrypt(&conn)
        .unwrap();
    let request = Request::builder()
        .uri("/config")
        .header("x-connection-encrypted", encrypted)
        .body(Body::empty())
        .unwrap();
    let (status, encrypted_body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(find(&encrypted_body, |x| x["name"] == "max_connections").is_some());

    let (_, plain_body) = get(&app, "/config").await;
    assert_eq!(
        encrypted_body.as_array().map(Vec::len),
        plain_body.as_array().map(Vec::len)
    );
}

#[tokio::test]
async fn config_version() {
    let (app, _) = live_app!();
    let (status, body) = get(&app, "/config/version").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["version_number"]
        .as_str()
        .is_some_and(|v| v.chars().all(|c| c.is_ascii_digit())));
    assert!(body["max_connections"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn query_returns_rows() {
    let (app, _) = live_app!();
    let (status, body) = json_request(
        &app,
        "POST",
        "/query",
        json!({ "query": "SELECT 1::int8 AS id, 'Joe Bloggs' AS name, true AS ok, NULL AS missing" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "id": 1, "name": "Joe Bloggs", "ok": true, "missing": null }]));
}

#[tokio::test]
async fn query_decodes_arrays_and_timestamps() {
    let (app, _) = live_app!();
    let (status, body) = query(
        &app,
        "SELECT '2020-01-01 12:34:56.789+00'::timestamptz AS t, ARRAY[1,2] AS a, \
         ARRAY['x', NULL] AS s, ARRAY[[1,2],[3,4]] AS m, 'infinity'::timestamptz AS inf",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "t": "2020-01-01T12:34:56.789Z",
            "a": [1, 2],
            "s": ["x", null],
            "m": "{{1,2},{3,4}}",
            "inf": "infinity"
        }])
    );
}

#[tokio::test]
async fn pool_is_closed_after_success_and_error() {
    let (app, conn) = live_app!();
    let tagged = create_router(AppState::new(config(&with_application_name(&conn, "live_teardown"))));

    let (status, _) = query(&tagged, "SELECT 1 AS one").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wait_for_no_sessions(&app, "live_teardown").await, 0);

    let (status, _) = query(&tagged, "SELECT * FROM no_such_table").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(wait_for_no_sessions(&app, "live_teardown").await, 0);
}

#[tokio::test]
async fn concurrent_requests_use_separate_sessions() {
    let (app, conn) = live_app!();
    let codec = DescriptorCodec::new(Some(KEY.to_string()));
    let request = |name: &str| {
        let encrypted = codec
            .encrypt(&with_application_name(&conn, name))
            .unwrap();
        Request::builder()
            .method("POST")
            .uri("/query")
            .header("content-type", "application/json")
            .header("x-connection-encrypted", encrypted)
            .body(Body::from(
                json!({
                    "query": "SELECT pg_backend_pid() AS pid, current_setting('application_name') AS app FROM pg_sleep(0.5)"
                })
                .to_string(),
            ))
            .unwrap()
    };

    let ((status_a, a), (status_b, b)) = tokio::join!(
        send(&app, request("live_concurrent_a")),
        send(&app, request("live_concurrent_b"))
    );
    assert_eq!(status_a, StatusCode::OK);
    assert_eq!(status_b, StatusCode::OK);
    assert_eq!(a[0]["app"], "live_concurrent_a");
    assert_eq!(b[0]["app"], "live_concurrent_b");
    assert_ne!(a[0]["pid"], b[0]["pid"]);
}

#[tokio::test]
async fn timed_out_statement_is_cancelled() {
    let (app, conn) = live_app!();
    let tagged = create_router(AppState::new(AppConfig {
        query_timeout_secs: 2,
        ..config(&with_application_name(&conn, "live_timeout"))
    }));

    let (status, body) = query(&tagged, "SELECT pg_sleep(30)").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // The server-side statement timeout may fire first.
    assert!(
        body["error"]["code"] == "QUERY_TIMEOUT" || body["error"]["code"] == "QUERY_ERROR",
        "{body}"
    );
    assert_eq!(wait_for_no_sessions(&app, "live_timeout").await, 0);
}

#[tokio::test]
async fn dropped_request_cancels_statement() {
    let (app, conn) = live_app!();
    let manager = PoolManager::new(&AppConfig {
        query_timeout_secs: 60,
        ..AppConfig::default()
    });
    let target: ConnectionConfig = with_application_name(&conn, "live_dropped")
        .parse()
        .unwrap();

    let abandoned = tokio::time::timeout(
        Duration::from_secs(1),
        manager.execute(&target, "SELECT pg_sleep(60)"),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(wait_for_no_sessions(&app, "live_dropped").await, 0);
}

#[tokio::test]
async fn query_error_carries_sqlstate() {
    let (app, _) = live_app!();
    let (status, body) =
        json_request(&app, "POST", "/query", json!({ "query": "SELECT * FROM no_such_table" }))
            .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "QUERY_ERROR");
    assert_eq!(body["error"]["details"]["sqlstate"], "42P01");
}

#[tokio::test]
async fn schemas_hide_system_schemas_by_default() {
    let (app, _) = live_app!();
    let (_, body) = get(&app, "/schemas").await;
    assert!(find(&body, |x| x["name"] == "public").is_some());
    assert!(find(&body, |x| x["name"] == "pg_toast").is_none());

    let (_, body) = get(&app, "/schemas?includeSystemSchemas=true").await;
    assert!(find(&body, |x| x["name"] == "pg_toast").is_some());
}

#[tokio::test]
async fn schema_create_and_patch() {
    let (app, _) = live_app!();
    query(
        &app,
        "DROP SCHEMA IF EXISTS live_api, live_api_updated CASCADE; \
         DROP ROLE IF EXISTS live_schema_owner; \
         CREATE ROLE live_schema_owner",
    )
    .await;

    let (status, created) = json_request(&app, "POST", "/schemas", json!({ "name": "live_api" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["name"], "live_api");
    let id = created["id"].as_i64().unwrap();

    let (_, renamed) =
        json_request(&app, "PATCH", &format!("/schemas/{id}"), json!({ "name": "live_api_updated" }))
            .await;
    assert_eq!(renamed["name"], "live_api_updated");
    assert_eq!(renamed["owner"], created["owner"]);

    let (_, listed) = get(&app, "/schemas").await;
    assert!(find(&listed, |x| x["name"] == "live_api").is_none());
    assert!(find(&listed, |x| x["name"] == "live_api_updated").is_some());

    let (_, restored) = json_request(
        &app,
        "PATCH",
        &format!("/schemas/{id}"),
        json!({ "name": "live_api", "owner": "live_schema_owner" }),
    )
    .await;
    assert_eq!(restored["name"], "live_api");
    assert_eq!(restored["owner"], "live_schema_owner");

    let (_, listed) = get(&app, "/schemas").await;
    let listed = find(&listed, |x| x["id"] == id).unwrap();
    assert_eq!(listed["owner"], "live_schema_owner");

    query(&app, "DROP SCHEMA live_api; DROP ROLE live_schema_owner").await;
}

#[tokio::test]
async fn patch_unknown_schema_is_404() {
    let (app, _) = live_app!();
    let (status, _) = json_request(&app, "PATCH", "/schemas/1", json!({ "name": "x" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn types_and_functions_respect_system_filter() {
    let (app, _) = live_app!();
    for path in ["/types", "/functions"] {
        let (status, body) = get(&app, path).await;
        assert_eq!(status, StatusCode::OK);
        assert!(find(&body, |x| x["schema"] == "pg_catalog").is_none(), "{path}");

        let (_, body) = get(&app, &format!("{path}?includeSystemSchemas=true")).await;
        assert!(find(&body, |x| x["schema"] == "pg_catalog").is_some(), "{path}");
    }
}

#[tokio::test]
async fn tables_carry_nested_objects() {
    let (app, _) = live_app!();
    ensure_fixture(&app).await;
    let (status, tables) = get(&app, "/tables").await;
    assert_eq!(status, StatusCode::OK);
    assert!(find(&tables, |x| x["schema"] == "pg_catalog" && x["name"] == "pg_type").is_none());

    let users = find(&tables, |x| x["schema"] == "public" && x["name"] == "users").unwrap();
    let id = find(&users["columns"], |c| c["name"] == "id").unwrap();
    let name = find(&users["columns"], |c| c["name"] == "name").unwrap();
    assert_eq!(id["is_identity"], true);
    assert_eq!(id["is_updatable"], true);
    assert_eq!(name["is_identity"], false);
    assert!(!users["primary_keys"].as_array().unwrap().is_empty());
    assert!(!users["grants"].as_array().unwrap().is_empty());
    assert!(users["policies"].as_array().is_some());

    let rel = find(&users["relationships"], |r| {
        r["source_schema"] == "public" && r["source_table_name"] == "todos"
    })
    .unwrap();
    assert_eq!(rel["target_table_name"], "users");

    let (_, all) = get(&app, "/tables?includeSystemSchemas=true").await;
    assert!(find(&all, |x| x["schema"] == "pg_catalog" && x["name"] == "pg_type").is_some());
}

#[tokio::test]
async fn table_create_round_trips_columns() {
    let (app, _) = live_app!();
    let (status, table) = json_request(
        &app,
        "POST",
        "/tables",
        json!({
            "schema": "public",
            "name": "live_test",
            "columns": [
                { "name": "id", "is_identity": true, "is_nullable": false, "data_type": "bigint" },
                { "name": "data", "data_type": "text" }
            ],
            "primary_keys": ["id"]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(table["primary_keys"], json!(["id"]));

    let (_, tables) = get(&app, "/tables?schema=public&table=live_test").await;
    let test = find(&tables, |x| x["name"] == "live_test").unwrap();
    let id = find(&test["columns"], |c| c["name"] == "id").unwrap();
    let data = find(&test["columns"], |c| c["name"] == "data").unwrap();
    assert_eq!(id["is_identity"], true);
    assert_eq!(id["is_nullable"], false);
    assert_eq!(id["data_type"], "bigint");
    assert_eq!(data["is_identity"], false);
    assert_eq!(data["is_nullable"], true);
    assert_eq!(data["data_type"], "text");

    json_request(&app, "POST", "/query", json!({ "query": "DROP TABLE public.live_test" })).await;
}

#[tokio::test]
async fn extensions_include_uninstalled() {
    let (app, _) = live_app!();
    let (status, body) = get(&app, "/extensions").await;
    assert_eq!(status, StatusCode::OK);
    assert!(find(&body, |x| x["schema"].is_null()).is_some());
}

#[tokio::test]
async fn roles_list_schema_grants() {
    let (app, _) = live_app!();
    let (status, roles) = get(&app, "/roles").await;
    assert_eq!(status, StatusCode::OK);
    assert!(find(&roles, |r| r["name"].as_str().is_some_and(|n| n.starts_with("pg_"))).is_none());

    let postgres = find(&roles, |r| r["name"] == "postgres").unwrap();
    assert!(find(&postgres["grants"], |g| g["schema"] == "public").is_some());
    assert!(find(&postgres["grants"], |g| g["schema"] == "information_schema").is_none());
}

#[tokio::test]
async fn role_create_round_trips_attributes() {
    let (app, _) = live_app!();
    let (status, role) = json_request(
        &app,
        "POST",
        "/roles",
        json!({
            "name": "live_test_role",
            "is_superuser": true,
            "can_create_db": true,
            "is_replication_role": true,
            "can_bypass_rls": true,
            "connection_limit": 100,
            "valid_until": "2020-01-01T00:00:00.000Z"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(role["is_superuser"], true);
    assert_eq!(role["can_create_db"], true);
    assert_eq!(role["is_replication_role"], true);
    assert_eq!(role["can_bypass_rls"], true);
    assert_eq!(role["connection_limit"], 100);
    assert_eq!(role["valid_until"], "2020-01-01T00:00:00.000Z");

    json_request(&app, "POST", "/query", json!({ "query": "DROP ROLE live_test_role" })).await;
}
