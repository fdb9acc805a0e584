//! Catalog and stats clients against an in-process fake backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use dark_sprinter::catalog::{CatalogClient, TrackCatalog};
use dark_sprinter::config::ImportDefaults;
use dark_sprinter::error::ApiError;
use dark_sprinter::importer;
use dark_sprinter::stats::StatsClient;
use dark_sprinter::track::{ListenReport, NewTrack};

// ---------------------------------------------------------------------------
// Fake backend
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Backend {
    tracks: Vec<Value>,
    stats: Vec<Value>,
    list_queries: Vec<HashMap<String, String>>,
    created: Vec<Value>,
    listens: Vec<Value>,
    stats_status: Option<StatusCode>,
}

type Shared = Arc<Mutex<Backend>>;

async fn list_tracks(
    State(backend): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let mut backend = backend.lock().unwrap();
    let limit = params
        .get("limit")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(50);
    backend.list_queries.push(params);
    Json(Value::Array(backend.tracks.iter().take(limit).cloned().collect()))
}

async fn create_track(
    State(backend): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let required = ["youtube_url", "title", "artist"];
    let missing = required
        .iter()
        .any(|key| body[key].as_str().map_or(true, str::is_empty));
    if missing {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "youtube_url, title, and artist are required"})),
        );
    }

    let mut backend = backend.lock().unwrap();
    backend.created.push(body.clone());
    let mut created = body;
    created["id"] = json!(backend.created.len());
    (StatusCode::CREATED, Json(created))
}

async fn list_stats(State(backend): State<Shared>) -> (StatusCode, Json<Value>) {
    let backend = backend.lock().unwrap();
    match backend.stats_status {
        Some(status) => (status, Json(json!({"error": "unavailable"}))),
        None => (StatusCode::OK, Json(Value::Array(backend.stats.clone()))),
    }
}

async fn record_listen(
    State(backend): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut backend = backend.lock().unwrap();
    if let Some(status) = backend.stats_status {
        return (status, Json(json!({"error": "unavailable"})));
    }
    backend.listens.push(body);
    (StatusCode::CREATED, Json(json!({"success": true, "id": backend.listens.len()})))
}

async fn broken() -> &'static str {
    "<html>gateway timeout</html>"
}

/// Serve the fake backend on an ephemeral port and return its base URL.
async fn spawn_backend(backend: Backend) -> (String, Shared) {
    let shared: Shared = Arc::new(Mutex::new(backend));
    let router = Router::new()
        .route("/tracks", get(list_tracks).post(create_track))
        .route("/stats", get(list_stats).post(record_listen))
        .route("/broken", get(broken))
        .with_state(shared.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{addr}"), shared)
}

fn track_json(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "youtube_url": format!("https://youtube.com/watch?v={id}"),
        "title": title,
        "artist": "Electronic Pulse",
        "year": "2024",
        "album": "Night Waves",
        "cover_url": null,
        "created_at": "2024-06-01 10:00:00",
        "is_active": true,
        "play_count": 0
    })
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_requests_path_and_limit() {
    let (base, backend) = spawn_backend(Backend {
        tracks: vec![track_json(3, "C"), track_json(2, "B"), track_json(1, "A")],
        ..Default::default()
    })
    .await;
    let client = CatalogClient::new(format!("{base}/tracks"));

    let tracks = client.list(Some(2)).await.unwrap();

    let titles: Vec<&str> = tracks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["C", "B"]);
    assert_eq!(tracks[0].cover_url, "");

    let backend = backend.lock().unwrap();
    let queries = &backend.list_queries;
    assert_eq!(queries[0].get("path").map(String::as_str), Some("list"));
    assert_eq!(queries[0].get("limit").map(String::as_str), Some("2"));
}

#[tokio::test]
async fn list_without_limit_leaves_it_to_the_server() {
    let (base, backend) = spawn_backend(Backend::default()).await;
    let client = CatalogClient::new(format!("{base}/tracks"));

    let tracks = client.list(None).await.unwrap();

    assert!(tracks.is_empty());
    assert!(!backend.lock().unwrap().list_queries[0].contains_key("limit"));
}

#[tokio::test]
async fn create_posts_the_wire_body() {
    let (base, backend) = spawn_backend(Backend::default()).await;
    let client = CatalogClient::new(format!("{base}/tracks"));

    client
        .create(&NewTrack {
            youtube_url: "https://youtube.com/watch?v=xyz".into(),
            title: "Midnight Dreams".into(),
            artist: "Electronic Pulse".into(),
            year: "2024".into(),
            album: "Night Waves".into(),
            cover_url: "https://example.com/cover.jpg".into(),
        })
        .await
        .unwrap();

    assert_eq!(
        backend.lock().unwrap().created,
        [json!({
            "youtube_url": "https://youtube.com/watch?v=xyz",
            "title": "Midnight Dreams",
            "artist": "Electronic Pulse",
            "year": "2024",
            "album": "Night Waves",
            "cover_url": "https://example.com/cover.jpg"
        })]
    );
}

#[tokio::test]
async fn rejected_create_surfaces_status() {
    let (base, _backend) = spawn_backend(Backend::default()).await;
    let client = CatalogClient::new(format!("{base}/tracks"));

    let err = client
        .create(&NewTrack {
            youtube_url: "u".into(),
            title: String::new(),
            artist: "a".into(),
            year: "2024".into(),
            album: "Single".into(),
            cover_url: String::new(),
        })
        .await
        .unwrap_err();

    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("required"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_is_a_decode_error() {
    let (base, _backend) = spawn_backend(Backend::default()).await;
    let client = CatalogClient::new(format!("{base}/broken"));

    let err = client.list(None).await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_endpoint_is_a_request_error() {
    let client = CatalogClient::new("http://127.0.0.1:1/tracks".to_string());

    let err = client.list(None).await.unwrap_err();

    assert!(matches!(err, ApiError::Request(_)), "got {err:?}");
}

#[tokio::test]
async fn bulk_import_submits_valid_lines_in_order() {
    let (base, backend) = spawn_backend(Backend::default()).await;
    let client = CatalogClient::new(format!("{base}/tracks"));

    let report = importer::import(
        &client,
        "u1|T1|Ar1\nbad\nu2|T2|Ar2|2020|Alb2|cov2",
        &ImportDefaults::default(),
    )
    .await;

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);

    let backend = backend.lock().unwrap();
    let created = &backend.created;
    assert_eq!(
        created[0],
        json!({"youtube_url": "u1", "title": "T1", "artist": "Ar1",
               "year": "2024", "album": "Single", "cover_url": ""})
    );
    assert_eq!(
        created[1],
        json!({"youtube_url": "u2", "title": "T2", "artist": "Ar2",
               "year": "2020", "album": "Alb2", "cover_url": "cov2"})
    );
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stats_are_returned_in_server_order() {
    let (base, _backend) = spawn_backend(Backend {
        stats: vec![
            json!({"id": 2, "title": "Hit", "artist": "A", "total_plays": 12,
                   "total_duration": 2400, "last_played": "2024-06-02 08:00:00.000001"}),
            json!({"id": 1, "title": "Deep cut", "artist": "B", "total_plays": 0,
                   "total_duration": null, "last_played": null}),
        ],
        ..Default::default()
    })
    .await;
    let client = StatsClient::new(format!("{base}/stats"));

    let stats = client.list().await.unwrap();

    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].title, "Hit");
    assert_eq!(stats[0].plays(), 12);
    assert_eq!(stats[0].total_duration, Some(2400));
    assert_eq!(stats[1].plays(), 0);
}

#[tokio::test]
async fn record_posts_track_and_duration() {
    let (base, backend) = spawn_backend(Backend::default()).await;
    let client = StatsClient::new(format!("{base}/stats"));

    client
        .record(ListenReport {
            track_id: 5,
            duration_seconds: 95,
        })
        .await
        .unwrap();

    assert_eq!(
        backend.lock().unwrap().listens,
        [json!({"track_id": 5, "duration_seconds": 95})]
    );
}

#[tokio::test]
async fn logged_record_swallows_failures() {
    let (base, backend) = spawn_backend(Backend {
        stats_status: Some(StatusCode::INTERNAL_SERVER_ERROR),
        ..Default::default()
    })
    .await;
    let client = StatsClient::new(format!("{base}/stats"));

    client
        .clone()
        .record_logged(ListenReport {
            track_id: 1,
            duration_seconds: 3,
        })
        .await;

    assert!(backend.lock().unwrap().listens.is_empty());
    let err = client.list().await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 500, .. }));
}
