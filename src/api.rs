use crate::discogs::client::DEFAULT_PER_PAGE;
use crate::discogs::transform::{
    primary_cover_image_url, transform_release_to_vinyl_form, transform_search_result,
};
use crate::discogs::{
    validate_barcode, BarcodeError, DiscogsSearchResponse, RateLimit, ReleaseCatalog,
};
use crate::image_proxy::{ImageProxy, ImageProxyError};
use crate::models::{PageInfo, SearchPage, VinylFormData};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Discogs API server state
#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<dyn ReleaseCatalog>,
    /// Absent when cover storage is not configured
    pub image_proxy: Option<Arc<dyn ImageProxy>>,
    /// Bearer token of the collection owner
    pub owner_token: Option<String>,
}

/// Response envelope shared by every route
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

fn success<T: Serialize>(data: T) -> Response {
    Json(ApiResponse {
        data: Some(data),
        error: None,
    })
    .into_response()
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            data: None,
            error: Some(message.into()),
        }),
    )
        .into_response()
}

/// Paging values are read as text and parsed by `paging_value`
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

/// Parse a positive paging value, falling back to `default`
fn paging_value(value: Option<&str>, default: u32) -> u32 {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

#[derive(Debug, Deserialize)]
pub struct BarcodeParams {
    pub barcode: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReleaseDetail {
    pub vinyl: VinylFormData,
    #[serde(rename = "coverImageUrl")]
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageProxyRequest {
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(rename = "discogsId")]
    pub discogs_id: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageProxyResponse {
    pub url: String,
}

/// Create the Discogs API router
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/discogs/search", get(search))
        .route("/api/discogs/barcode", get(barcode))
        .route("/api/discogs/release/:id", get(release))
        .route("/api/discogs/image-proxy", post(image_proxy))
        .route("/api/discogs/rate-limit", get(rate_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn to_search_page(response: &DiscogsSearchResponse) -> SearchPage {
    SearchPage {
        results: response.results.iter().map(transform_search_result).collect(),
        pagination: PageInfo {
            page: response.pagination.page,
            pages: response.pagination.pages,
            total: response.pagination.items,
        },
    }
}

async fn search(State(state): State<ApiState>, Query(params): Query<SearchParams>) -> Response {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Search query is required");
    }

    let page = paging_value(params.page.as_deref(), 1);
    let per_page = paging_value(params.per_page.as_deref(), DEFAULT_PER_PAGE);

    match state.catalog.search_releases(query, page, per_page).await {
        Ok(response) => success(to_search_page(&response)),
        Err(e) => {
            error!("Search for '{}' failed: {}", query, e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn barcode(State(state): State<ApiState>, Query(params): Query<BarcodeParams>) -> Response {
    let barcode = match validate_barcode(params.barcode.as_deref().unwrap_or_default()) {
        Ok(barcode) => barcode,
        Err(BarcodeError::Empty) => {
            return failure(StatusCode::BAD_REQUEST, "Barcode is required");
        }
        Err(BarcodeError::InvalidLength(len)) => {
            debug!("Rejected barcode with {} digits", len);
            return failure(StatusCode::BAD_REQUEST, "Invalid barcode format");
        }
    };

    match state.catalog.search_by_barcode(&barcode).await {
        Ok(response) => success(to_search_page(&response)),
        Err(e) => {
            error!("Barcode lookup for {} failed: {}", barcode, e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn release(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    let release_id = match id.trim().parse::<u64>() {
        Ok(release_id) if release_id > 0 => release_id,
        _ => return failure(StatusCode::BAD_REQUEST, "Invalid release ID"),
    };

    match state.catalog.get_release(release_id).await {
        Ok(release) => success(ReleaseDetail {
            vinyl: transform_release_to_vinyl_form(&release),
            cover_image_url: primary_cover_image_url(&release),
        }),
        Err(e) => {
            error!("Fetching release {} failed: {}", release_id, e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn is_owner(headers: &HeaderMap, owner_token: Option<&str>) -> bool {
    let Some(expected) = owner_token else {
        return false;
    };

    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| constant_time_eq(token.trim().as_bytes(), expected.as_bytes()))
        .unwrap_or(false)
}

/// Byte comparison whose running time does not depend on where the inputs differ
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

async fn image_proxy(State(state): State<ApiState>, headers: HeaderMap, body: Bytes) -> Response {
    if !is_owner(&headers, state.owner_token.as_deref()) {
        warn!("Rejected image proxy request without owner credentials");
        return failure(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let request: ImageProxyRequest = if body.is_empty() {
        ImageProxyRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(e) => {
                debug!("Malformed image proxy body: {}", e);
                return failure(StatusCode::BAD_REQUEST, "Invalid request body");
            }
        }
    };

    let image_url = request.image_url.as_deref().map(str::trim).unwrap_or_default();
    if image_url.is_empty() {
        return failure(StatusCode::BAD_REQUEST, ImageProxyError::MissingUrl.to_string());
    }

    let Some(proxy) = state.image_proxy.as_ref() else {
        return failure(
            StatusCode::SERVICE_UNAVAILABLE,
            "Image storage is not configured",
        );
    };

    // Discogs ids arrive as numbers or strings depending on the caller
    let discogs_id = request.discogs_id.and_then(|id| match id {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => Some(s),
        _ => None,
    });

    match proxy.proxy_image(image_url, discogs_id.as_deref()).await {
        Ok(url) => {
            info!("Image proxied to {}", url);
            success(ImageProxyResponse { url })
        }
        Err(e) => {
            let status = match e {
                ImageProxyError::MissingUrl | ImageProxyError::InvalidFormat(_) => {
                    StatusCode::BAD_REQUEST
                }
                ImageProxyError::Fetch(_) | ImageProxyError::Upload(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            error!("Image proxy failed: {:?}", e);
            failure(status, e.to_string())
        }
    }
}

async fn rate_limit(State(state): State<ApiState>) -> Response {
    let rate_limit: Option<RateLimit> = state.catalog.rate_limit().await;
    Json(ApiResponse {
        data: rate_limit,
        error: None,
    })
    .into_response()
}
