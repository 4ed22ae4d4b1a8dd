//! End-to-end route tests against the in-memory store

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use spellbook_server::config::CorsConfig;
use spellbook_server::db::Fault;
use spellbook_server::models::SpellAttributes;
use spellbook_server::{build_router, ApiSettings, AppState, ErrorMode, FanInPolicy, MemoryStore};

fn fixture() -> Arc<MemoryStore> {
    let mut fireball = SpellAttributes::named("Fireball", 3);
    fireball.kind = Some("Evocation".into());
    fireball.casting_time = Some("1 action".into());

    Arc::new(
        MemoryStore::new()
            .with_class(1, "Wizard")
            .with_class(2, "Cleric")
            .with_spell(5, fireball)
            .with_spell(6, SpellAttributes::named("Burning Hands", 1))
            .with_spell(7, SpellAttributes::named("Fire Bolt", 0))
            .with_class_spell(1, 5, 3)
            .with_class_spell(1, 6, 1)
            .with_class_spell(1, 7, 0),
    )
}

fn app_with(store: Arc<MemoryStore>, settings: ApiSettings) -> Router {
    let state = AppState::new(store, settings);
    build_router(state, &CorsConfig::default()).unwrap()
}

fn app(store: Arc<MemoryStore>) -> Router {
    app_with(store, ApiSettings::default())
}

async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: &Router, uri: &str) -> Value {
    let (status, body) = call(app, "GET", uri).await;
    assert_eq!(status, StatusCode::OK, "GET {uri}");
    body
}

#[tokio::test]
async fn class_listing_and_lookup() {
    let app = app(fixture());

    assert_eq!(get(&app, "/classes").await, json!([1, 2]));
    assert_eq!(get(&app, "/classes/1").await, json!({"name": "Wizard"}));
    assert_eq!(get(&app, "/classes/999").await, json!({}));
}

#[tokio::test]
async fn class_aggregates() {
    let app = app(fixture());

    assert_eq!(
        get(&app, "/classes/all").await,
        json!({"1": {"name": "Wizard"}, "2": {"name": "Cleric"}})
    );
    assert_eq!(
        get(&app, "/classes/all2").await,
        json!([{"id": 1, "name": "Wizard"}, {"id": 2, "name": "Cleric"}])
    );
}

#[tokio::test]
async fn degraded_class_renders_empty_entry() {
    let store = fixture();
    store.inject_class_fault(2, Fault::Query);
    let app = app(store);

    assert_eq!(
        get(&app, "/classes/all").await,
        json!({"1": {"name": "Wizard"}, "2": {}})
    );
    assert_eq!(
        get(&app, "/classes/all2").await,
        json!([{"id": 1, "name": "Wizard"}, {"id": 2}])
    );
}

#[tokio::test]
async fn wizard_spells_by_level() {
    let app = app(fixture());

    assert_eq!(get(&app, "/classes/1/spells").await, json!([0, 1, 3]));
    assert_eq!(get(&app, "/classes/1/spells/3").await, json!([5]));
    // Ordered by spell name: Burning Hands, Fire Bolt, Fireball.
    assert_eq!(get(&app, "/classes/1/spells/3/upto").await, json!([6, 7, 5]));
    assert_eq!(get(&app, "/classes/1/spells/2").await, json!([]));
}

#[tokio::test]
async fn spell_attributes_use_wire_names() {
    let app = app(fixture());

    let body = get(&app, "/spells/5").await;
    assert_eq!(body["name"], "Fireball");
    assert_eq!(body["type"], "Evocation");
    assert_eq!(body["casting_time"], "1 action");
    assert_eq!(body["range"], Value::Null);
    assert_eq!(body["level"], 3);

    assert_eq!(get(&app, "/spells/404").await, json!({}));
    assert_eq!(get(&app, "/spells").await, json!([5, 6, 7]));
}

#[tokio::test]
async fn spell_search() {
    let app = app(fixture());

    assert_eq!(
        get(&app, "/spells/search?q=fire").await,
        json!([{"id": 7, "name": "Fire Bolt"}, {"id": 5, "name": "Fireball"}])
    );
    assert_eq!(
        get(&app, "/spells/search?q=hands&anywhere=1").await,
        json!([{"id": 6, "name": "Burning Hands"}])
    );
    assert_eq!(get(&app, "/spells/search?q=hands&anywhere=0").await, json!([]));
}

#[tokio::test]
async fn search_without_query_skips_store() {
    let store = fixture();
    let app = app(store.clone());

    assert_eq!(get(&app, "/spells/search").await, json!([]));
    assert_eq!(get(&app, "/spells/search?q=").await, json!([]));
    assert_eq!(store.queries_issued(), 0);
}

#[tokio::test]
async fn invalid_params_short_circuit() {
    let store = fixture();
    let app = app(store.clone());

    for uri in [
        "/classes/abc",
        "/classes/-1",
        "/classes/1.5",
        "/classes/99999999999",
        "/classes/x/spells",
        "/classes/1/spells/x",
        "/classes/x/spells/1/upto",
        "/spells/fire",
    ] {
        assert_eq!(get(&app, uri).await, json!({}), "GET {uri}");
    }

    let (status, body) = call(&app, "POST", "/users/Alice/spells/abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    assert_eq!(store.queries_issued(), 0);
}

#[tokio::test]
async fn alice_lifecycle() {
    let app = app(fixture());

    assert_eq!(get(&app, "/users/Alice").await, json!({}));

    let (_, created) = call(&app, "POST", "/users/Alice").await;
    assert_eq!(created, json!({"name": "Alice", "spells": []}));

    let (_, added) = call(&app, "POST", "/users/Alice/spells/5").await;
    assert_eq!(added, json!({"name": "Alice", "spells": [5]}));

    let (_, again) = call(&app, "POST", "/users/alice/spells/5").await;
    assert_eq!(again, json!({"name": "Alice", "spells": [5]}));

    let user = get(&app, "/users/ALICE").await;
    assert_eq!(user["name"], "Alice");
    assert_eq!(user["spells"], json!([5]));

    let (_, removed) = call(&app, "DELETE", "/users/Alice/spells/5").await;
    assert_eq!(removed, json!({"name": "Alice", "spells": []}));

    assert_eq!(get(&app, "/users").await, json!(["Alice"]));
}

#[tokio::test]
async fn create_does_not_wipe_and_reset_does() {
    let store = Arc::new(MemoryStore::new().with_user("Alice", vec![5, 8]));
    let app = app(store);

    let (_, state) = call(&app, "POST", "/users/Alice").await;
    assert_eq!(state, json!({"name": "Alice", "spells": [5, 8]}));

    let (_, state) = call(&app, "DELETE", "/users/Alice/spells").await;
    assert_eq!(state, json!({"name": "Alice", "spells": []}));
}

#[tokio::test]
async fn edits_for_unknown_user_are_empty() {
    let app = app(fixture());

    let (status, body) = call(&app, "POST", "/users/Bob/spells/5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (_, body) = call(&app, "DELETE", "/users/Bob/spells/5").await;
    assert_eq!(body, json!({}));

    assert_eq!(get(&app, "/users").await, json!([]));
}

#[tokio::test]
async fn lenient_store_failures_render_empty_shapes() {
    let store = fixture();
    store.inject("class_ids", Fault::Connection);
    store.inject("spell", Fault::Query);
    let app = app(store);

    assert_eq!(get(&app, "/classes").await, json!([]));
    assert_eq!(get(&app, "/classes/all").await, json!({}));
    assert_eq!(get(&app, "/classes/all2").await, json!([]));
    assert_eq!(get(&app, "/spells/5").await, json!({}));
}

#[tokio::test]
async fn strict_store_failures_render_errors() {
    let store = fixture();
    store.inject("class_ids", Fault::Timeout);
    store.inject("spell_ids", Fault::Connection);
    store.inject("find_user", Fault::Query);

    let app = app_with(
        store,
        ApiSettings {
            error_mode: ErrorMode::Strict,
            ..ApiSettings::default()
        },
    );

    let (status, body) = call(&app, "GET", "/classes").await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "timeout");

    let (status, body) = call(&app, "GET", "/spells").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "connection_error");

    let (status, body) = call(&app, "GET", "/users/Alice").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "query_error");

    // Malformed parameters are still answered with an empty object.
    let (status, body) = call(&app, "GET", "/classes/abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn malformed_stored_list_renders_per_mode() {
    let malformed = || Arc::new(MemoryStore::new().with_raw_user("Alice", Some("5,12")));

    let store = malformed();
    let lenient = app(store.clone());
    assert_eq!(get(&lenient, "/users/Alice").await, json!({}));
    let (status, body) = call(&lenient, "POST", "/users/Alice/spells/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
    assert_eq!(store.stored_spells("Alice").as_deref(), Some("5,12"));

    let store = malformed();
    let strict = app_with(
        store.clone(),
        ApiSettings {
            error_mode: ErrorMode::Strict,
            ..ApiSettings::default()
        },
    );
    let (status, body) = call(&strict, "POST", "/users/Alice/spells/3").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "decode_error");
    let (status, _) = call(&strict, "GET", "/users/alice").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(store.stored_spells("Alice").as_deref(), Some("5,12"));
}

#[tokio::test]
async fn fail_fast_aggregate_surfaces_error() {
    let store = fixture();
    store.inject_class_fault(2, Fault::Query);

    let app = app_with(
        store,
        ApiSettings {
            error_mode: ErrorMode::Strict,
            fan_in: FanInPolicy::FailFast,
            ..ApiSettings::default()
        },
    );

    let (status, _) = call(&app, "GET", "/classes/all").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health_reports_version() {
    let app = app(fixture());

    let body = get(&app, "/health").await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
