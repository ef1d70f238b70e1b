use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use movies_api::{
    BUNDLED_SEED, MovieSchema, MovieStore, build_router, cors::AllowList, state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;

const SEED: &str = r#"[
  {
    "id": "a1",
    "title": "X",
    "year": 2000,
    "director": "D",
    "duration": 100,
    "rating": 7,
    "poster": "http://p",
    "genre": ["Action"]
  },
  {
    "id": "b2",
    "title": "Y",
    "year": 2010,
    "director": "E",
    "duration": 90,
    "poster": "http://q",
    "genre": ["Drama", "Comedy"]
  }
]"#;

fn app() -> Router {
    let schema = MovieSchema::with_max_year(2025);
    let store = MovieStore::from_seed(SEED, &schema).expect("seed should be valid");
    build_router(AppState::new(store, schema, Arc::new(AllowList::default())))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    origin: Option<&str>,
    payload: Option<Value>,
) -> (StatusCode, header::HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(origin) = origin {
        builder = builder.header(header::ORIGIN, origin);
    }
    let body = match payload {
        Some(payload) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(payload.to_string())
        }
        None => Body::empty(),
    };
    let request = builder.body(body).expect("request should build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("response expected");
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should be readable");

    if body.is_empty() {
        return (status, headers, Value::Null);
    }

    let json = serde_json::from_slice::<Value>(&body).expect("body should be valid JSON");
    (status, headers, json)
}

async fn send_json(app: &Router, method: Method, uri: &str, payload: Value) -> (StatusCode, Value) {
    let (status, _, body) = send(app, method, uri, None, Some(payload)).await;
    (status, body)
}

async fn send_empty(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = send(app, method, uri, None, None).await;
    (status, body)
}

fn inception() -> Value {
    json!({
        "title": "Inception",
        "year": 2010,
        "director": "Christopher Nolan",
        "duration": 148,
        "poster": "https://img.example.com/inception.jpg",
        "genre": ["Action", "Sci-Fi"]
    })
}

#[tokio::test]
async fn list_returns_all_movies_in_order() {
    let app = app();

    let (status, body) = send_empty(&app, Method::GET, "/movies").await;

    assert_eq!(status, StatusCode::OK);
    let movies = body.as_array().expect("list should be an array");
    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0]["id"], "a1");
    assert_eq!(movies[1]["id"], "b2");
    assert_eq!(movies[1]["rating"], 5.0);
}

#[tokio::test]
async fn genre_filter_is_case_insensitive() {
    let app = app();

    let (_, lower) = send_empty(&app, Method::GET, "/movies?genre=action").await;
    let (_, upper) = send_empty(&app, Method::GET, "/movies?genre=ACTION").await;
    let (status, none) = send_empty(&app, Method::GET, "/movies?genre=horror").await;

    assert_eq!(lower, upper);
    assert_eq!(lower.as_array().map(Vec::len), Some(1));
    assert_eq!(lower[0]["id"], "a1");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(none, json!([]));
}

#[tokio::test]
async fn empty_genre_filter_lists_everything() {
    let app = app();

    let (status, body) = send_empty(&app, Method::GET, "/movies?genre=").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(2));
    assert_eq!(body[0]["id"], "a1");
    assert_eq!(body[1]["id"], "b2");
}

#[tokio::test]
async fn get_unknown_movie_is_not_found() {
    let app = app();

    let (status, body) = send_empty(&app, Method::GET, "/movies/missing").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Movie not found");
}

#[tokio::test]
async fn create_then_get_movie() {
    let app = app();

    let (status, created) = send_json(&app, Method::POST, "/movies", inception()).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["rating"], 5.0);
    let id = created["id"].as_str().expect("created movie should have id");

    let (status, fetched) = send_empty(&app, Method::GET, &format!("/movies/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (_, all) = send_empty(&app, Method::GET, "/movies").await;
    assert_eq!(all.as_array().map(Vec::len), Some(3));
    assert_eq!(all[2], created);
}

#[tokio::test]
async fn create_reports_every_violation() {
    let app = app();

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/movies",
        json!({
            "id": "client-chosen",
            "year": 1850,
            "director": "Someone",
            "duration": 0,
            "poster": "nope",
            "genre": ["Western"]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = body["error"]
        .as_array()
        .expect("violations should be an array")
        .iter()
        .map(|violation| violation["field"].as_str().expect("field is a string"))
        .collect::<Vec<_>>();
    for field in ["title", "year", "duration", "poster", "genre", "id"] {
        assert!(fields.contains(&field), "missing violation for {field}: {body}");
    }

    let (_, all) = send_empty(&app, Method::GET, "/movies").await;
    assert_eq!(all.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/movies")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request should build");
    let response = app.oneshot(request).await.expect("response expected");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn patch_merges_supplied_fields_only() {
    let app = app();
    let (_, before) = send_empty(&app, Method::GET, "/movies/a1").await;

    let (status, updated) =
        send_json(&app, Method::PATCH, "/movies/a1", json!({ "rating": 9 })).await;

    assert_eq!(status, StatusCode::OK);
    let mut expected = before.clone();
    expected["rating"] = json!(9.0);
    assert_eq!(updated, expected);

    let (_, fetched) = send_empty(&app, Method::GET, "/movies/a1").await;
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn empty_patch_leaves_movie_unchanged() {
    let app = app();
    let (_, before) = send_empty(&app, Method::GET, "/movies/b2").await;

    let (status, updated) = send_json(&app, Method::PATCH, "/movies/b2", json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated, before);
}

#[tokio::test]
async fn patch_rejects_invalid_and_unknown_ids() {
    let app = app();

    let (status, body) =
        send_json(&app, Method::PATCH, "/movies/a1", json!({ "id": "other" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"][0]["field"], "id");

    let (status, _) = send_json(&app, Method::PATCH, "/movies/a1", json!({ "year": "2020" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        send_json(&app, Method::PATCH, "/movies/missing", json!({ "year": 2020 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_movie() {
    let app = app();

    let (status, body) = send_empty(&app, Method::DELETE, "/movies/a1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Movie deleted");

    let (status, _) = send_empty(&app, Method::GET, "/movies/a1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_empty(&app, Method::DELETE, "/movies/a1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, all) = send_empty(&app, Method::GET, "/movies").await;
    assert_eq!(all.as_array().map(Vec::len), Some(1));
    assert_eq!(all[0]["id"], "b2");
}

#[tokio::test]
async fn disallowed_origin_is_rejected_before_handlers() {
    let app = app();

    let (status, _, body) = send(
        &app,
        Method::DELETE,
        "/movies/a1",
        Some("http://evil.example"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not allowed by CORS");

    let (status, _) = send_empty(&app, Method::GET, "/movies/a1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn allowed_origin_gets_cors_headers() {
    let app = app();

    let (status, headers, _) =
        send(&app, Method::GET, "/movies", Some("http://movies.com"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some("http://movies.com")
    );
}

#[tokio::test]
async fn preflight_from_allowed_origin_succeeds() {
    let app = app();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/movies/a1")
        .header(header::ORIGIN, "http://localhost:8080")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
        .body(Body::empty())
        .expect("request should build");
    let response = app.oneshot(request).await.expect("response expected");

    assert_eq!(response.status(), StatusCode::OK);
    let methods = response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(methods.contains("PATCH"), "allowed methods: {methods}");
}

#[tokio::test]
async fn custom_policy_can_be_plugged_in() {
    let schema = MovieSchema::with_max_year(2025);
    let store = MovieStore::from_seed(SEED, &schema).expect("seed should be valid");
    let only_tools = |origin: Option<&str>| origin == Some("http://tools.internal");
    let app = build_router(AppState::new(store, schema, Arc::new(only_tools)));

    let (status, _, _) = send(&app, Method::GET, "/movies", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(
        &app,
        Method::GET,
        "/movies",
        Some("http://tools.internal"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

fn bundled_app() -> Router {
    let store = MovieStore::from_seed(BUNDLED_SEED, &MovieSchema::default())
        .expect("bundled seed should pass the schema");
    build_router(AppState::with_store(store))
}

#[tokio::test]
async fn healthcheck_is_ok() {
    let app = bundled_app();
    let (status, body) = send_empty(&app, Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn bundled_seed_serves_with_default_policy() {
    let app = bundled_app();

    let (status, _, scifi) = send(
        &app,
        Method::GET,
        "/movies?genre=sci-fi",
        Some("http://midu.dev"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!scifi.as_array().expect("list should be an array").is_empty());

    let (status, _, _) = send(
        &app,
        Method::GET,
        "/movies",
        Some("http://localhost:3000"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
