use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Release ids with special behavior
pub const RELEASE_WITHOUT_IMAGES: u64 = 2;
pub const RELEASE_NOT_FOUND: u64 = 404;
pub const RELEASE_RATE_LIMITED: u64 = 429;
pub const RELEASE_SERVER_ERROR: u64 = 500;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
}

/// Local stand-in for api.discogs.com and its image host
#[derive(Clone, Default)]
pub struct FakeDiscogs {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeDiscogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/database/search", get(search))
            .route("/releases/:id", get(release))
            .route("/images/cover.png", get(cover_png))
            .route("/images/page.html", get(html_page))
            .with_state(self.clone())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests made against the API, ignoring image downloads
    pub fn api_requests(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| !r.path.starts_with("/images/"))
            .collect()
    }

    fn record(&self, path: String, query: HashMap<String, String>, headers: HeaderMap) -> u32 {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            path,
            query,
            headers,
        });
        requests.len() as u32
    }
}

fn quota_headers(used: u32) -> [(&'static str, String); 3] {
    [
        ("x-discogs-ratelimit", "60".to_string()),
        ("x-discogs-ratelimit-used", used.to_string()),
        (
            "x-discogs-ratelimit-remaining",
            60u32.saturating_sub(used).to_string(),
        ),
    ]
}

async fn search(
    State(fake): State<FakeDiscogs>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let page: u32 = query
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    let used = fake.record("/database/search".to_string(), query, headers);

    let results = if page == 1 {
        json!([
            {
                "id": 1,
                "type": "release",
                "title": "Miles Davis (2) - Kind of Blue",
                "year": "1959",
                "label": ["Columbia"],
                "catno": "CL 1355",
                "format": ["Vinyl", "LP", "Album"],
                "country": "US",
                "thumb": "https://i.discogs.com/thumb.jpg",
                "cover_image": "https://i.discogs.com/cover.jpg"
            },
            {
                "id": 2,
                "type": "release",
                "title": "Miles Davis - Kind of Blue",
                "year": "1997"
            }
        ])
    } else {
        json!([{ "id": 3, "type": "release", "title": "Untitled" }])
    };

    let body = json!({
        "pagination": { "page": page, "pages": 2, "per_page": 2, "items": 3 },
        "results": results
    });

    (quota_headers(used), Json(body)).into_response()
}

async fn release(
    State(fake): State<FakeDiscogs>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("127.0.0.1")
        .to_string();
    let used = fake.record(format!("/releases/{}", id), HashMap::new(), headers);

    match id {
        RELEASE_NOT_FOUND => (
            StatusCode::NOT_FOUND,
            quota_headers(used),
            Json(json!({ "message": "Release not found." })),
        )
            .into_response(),
        RELEASE_RATE_LIMITED => (
            StatusCode::TOO_MANY_REQUESTS,
            quota_headers(60),
            Json(json!({ "message": "You are making requests too quickly." })),
        )
            .into_response(),
        RELEASE_SERVER_ERROR => {
            (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
        }
        _ => {
            let images = if id == RELEASE_WITHOUT_IMAGES {
                json!([])
            } else {
                json!([
                    { "type": "secondary", "uri": format!("http://{}/images/back.png", host) },
                    { "type": "primary", "uri": format!("http://{}/images/cover.png", host) }
                ])
            };

            let body = json!({
                "id": id,
                "title": "Kind of Blue",
                "year": 1959,
                "artists": [{ "id": 23755, "name": "Miles Davis (2)" }],
                "artists_sort": "Davis, Miles",
                "labels": [{ "id": 1866, "name": "Columbia", "catno": "CL 1355" }],
                "formats": [{ "name": "Vinyl", "qty": "1", "descriptions": ["LP", "Album", "Mono"] }],
                "country": "US",
                "genres": ["Jazz"],
                "styles": ["Modal", "Jazz"],
                "tracklist": [
                    { "position": "", "type_": "heading", "title": "Side A", "duration": "" },
                    { "position": "A1", "type_": "track", "title": "So What", "duration": "9:22" },
                    { "position": "A2", "type_": "track", "title": "Freddie Freeloader", "duration": "9:46" },
                    { "position": "", "type_": "heading", "title": "Side B", "duration": "" },
                    { "position": "B1", "type_": "track", "title": "Blue In Green", "duration": "5:37" }
                ],
                "images": images
            });

            (quota_headers(used), Json(body)).into_response()
        }
    }
}

async fn cover_png(State(fake): State<FakeDiscogs>, headers: HeaderMap) -> Response {
    fake.record("/images/cover.png".to_string(), HashMap::new(), headers);
    ([(header::CONTENT_TYPE, "image/png")], PNG_BYTES).into_response()
}

async fn html_page(State(fake): State<FakeDiscogs>, headers: HeaderMap) -> Response {
    fake.record("/images/page.html".to_string(), HashMap::new(), headers);
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        "<html>not an image</html>",
    )
        .into_response()
}
