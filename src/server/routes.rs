use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use super::neterra::NeterraService;
use crate::error::UpstreamError;
use super::playlist::PLAYLIST_PATH;

pub const EPG_PATH: &str = "/epg.xml";
pub const EPG_REDIRECT_URL: &str = "http://epg.kodibg.org/dl.php";

static CHANNEL_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

// ── Application state shared across all routes ─────────────────────────────────

#[derive(Clone)]
pub struct ApiState {
    pub neterra: Arc<NeterraService>,
}

// ── Error helpers ─────────────────────────────────────────────────────────────

fn bad_gateway(msg: impl std::fmt::Display) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(serde_json::json!({ "error": msg.to_string() })),
    )
        .into_response()
}

fn bad_request(msg: impl std::fmt::Display) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": msg.to_string() })),
    )
        .into_response()
}

fn m3u8_response(body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/x-mpegURL"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"playlist.m3u8\""),
        ],
        body,
    )
        .into_response()
}

fn moved_permanently(location: String) -> Response {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

// ── Query param structs ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PlaylistQuery {
    ch: Option<String>,
    name: Option<String>,
}

// ── Route handlers ────────────────────────────────────────────────────────────

async fn handle_epg() -> Response {
    moved_permanently(EPG_REDIRECT_URL.to_string())
}

async fn handle_playlist(
    Query(q): Query<PlaylistQuery>,
    State(state): State<ApiState>,
) -> Response {
    match q.ch.filter(|ch| !ch.is_empty()) {
        Some(ch) => handle_channel(&state, &ch, q.name.as_deref()).await,
        None => handle_full_playlist(&state).await,
    }
}

async fn handle_full_playlist(state: &ApiState) -> Response {
    match state.neterra.get_playlist().await {
        Ok(playlist) => {
            debug!("serving playlist ({} bytes)", playlist.len());
            m3u8_response(playlist)
        }
        Err(e) => {
            if let UpstreamError::CatalogParse { body, .. } = &e {
                debug!("unparsed catalog body: {body}");
            }
            warn!("error fetching playlist: {e}");
            bad_gateway(e)
        }
    }
}

async fn handle_channel(state: &ApiState, ch: &str, name: Option<&str>) -> Response {
    if name.map_or(true, str::is_empty) {
        debug!("url param 'name' is missing for channel {ch}");
        return bad_request("Missing name parameter");
    }
    if !CHANNEL_ID_RE.is_match(ch) {
        return bad_request("Invalid channel identifier");
    }

    match state.neterra.get_stream_url(ch).await {
        Ok(url) => {
            debug!("serving: {url}");
            moved_permanently(url)
        }
        Err(e) => {
            warn!("error fetching stream url for channel {ch}: {e}");
            bad_gateway(e)
        }
    }
}

// ── Router factory ────────────────────────────────────────────────────────────

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route(EPG_PATH, get(handle_epg))
        .route(PLAYLIST_PATH, get(handle_playlist))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::server::neterra::tests::{mount_login, service, LOGGED_IN};

    async fn router(server: &MockServer) -> Router {
        mount_login(server, LOGGED_IN).await;
        build_router(ApiState {
            neterra: Arc::new(service(server)),
        })
    }

    async fn get(router: Router, uri: &str) -> Response {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn epg_redirects_to_fixed_guide() {
        let server = MockServer::start().await;
        let resp = get(router(&server).await, "/epg.xml").await;

        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()[header::LOCATION], EPG_REDIRECT_URL);
    }

    #[tokio::test]
    async fn playlist_without_channel_serves_m3u() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/content/live"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"tv_choice_result": [[{"issues_id": "42", "issues_name": "Upstream Example"}]]}"#,
            ))
            .mount(&server)
            .await;

        let resp = get(router(&server).await, "/playlist.m3u8").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "application/x-mpegURL"
        );

        let body = body_text(resp).await;
        assert!(body.starts_with("#EXTM3U\n"));
        assert!(body.contains("http://proxy.lan:8080/playlist.m3u8?ch=42&name=Example\n"));
    }

    #[tokio::test]
    async fn channel_request_redirects_to_stream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/content/get_stream"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"play_link":"http://cdn/x.m3u8?sig=abc"}"#),
            )
            .mount(&server)
            .await;

        let resp = get(router(&server).await, "/playlist.m3u8?ch=42&name=Example").await;
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            resp.headers()[header::LOCATION],
            "http://cdn/x.m3u8?sig=abc"
        );
    }

    #[tokio::test]
    async fn channel_request_without_name_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/content/get_stream"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let resp = get(router(&server).await, "/playlist.m3u8?ch=42").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = get(router(&server).await, "/playlist.m3u8?ch=..%2F1&name=x").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn failed_resolution_never_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/content/get_stream"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let resp = get(router(&server).await, "/playlist.m3u8?ch=42&name=Example").await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert!(resp.headers().get(header::LOCATION).is_none());
    }

    #[tokio::test]
    async fn malformed_catalog_yields_no_playlist() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/content/live"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let resp = get(router(&server).await, "/playlist.m3u8").await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert!(!body_text(resp).await.contains("#EXTM3U"));
    }

    #[tokio::test]
    async fn catalog_error_body_stays_server_side() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/content/live"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html>Welcome back, account user@example.com, card ****1234</html>",
            ))
            .mount(&server)
            .await;

        let resp = get(router(&server).await, "/playlist.m3u8").await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let body = body_text(resp).await;
        assert!(body.contains("cannot parse live catalog"));
        assert!(!body.contains("user@example.com"));
        assert!(!body.contains("1234"));
    }
}
