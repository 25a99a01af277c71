//! Development server with preview mode
//!
//! Published pages are served from the public directory. A preview session
//! is a cookie holding the preview ref; while it is present the home page
//! and post pages are rendered on demand against that ref.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::generator::Generator;
use crate::helpers::{resolve_link, url_for};
use crate::prismic::QueryOptions;

/// Server state
struct ServerState {
    generator: Generator,
    cookie_name: String,
}

/// Query of `/api/preview`
#[derive(Debug, Deserialize)]
struct PreviewParams {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

/// Start the server
pub async fn start(generator: Generator, ip: &str, port: u16, open: bool) -> Result<()> {
    let cookie_name = generator.blog().config.preview.cookie_name.clone();
    let state = Arc::new(ServerState {
        generator,
        cookie_name,
    });
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Preview sessions start at {}/api/preview", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/preview", get(preview_handler))
        .route("/api/exit-preview", get(exit_preview_handler))
        .route("/", get(home_handler))
        .route("/post/:uid", get(post_handler))
        .route("/post/:uid/", get(post_handler))
        .fallback(static_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start a preview session and redirect to the previewed document
async fn preview_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<PreviewParams>,
) -> Response {
    let Some(token) = params.token.filter(|t| !t.is_empty()) else {
        return invalid_token();
    };

    let source = state.generator.source();
    let document_id = match params.document_id.filter(|id| !id.is_empty()) {
        Some(id) => Some(id),
        None => match source.preview_document(&token).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Rejected preview session: {}", e);
                return invalid_token();
            }
        },
    };

    let config = &state.generator.blog().config;
    let mut location = url_for(&config.root, "/");
    if let Some(id) = document_id {
        let options = QueryOptions::new().with_ref(Some(&token));
        match source.get_by_id(&id, &options).await {
            Ok(Some(doc)) => {
                location = resolve_link(
                    &config.root,
                    &config.prismic.document_type,
                    &doc.doc_type,
                    doc.uid.as_deref(),
                );
            }
            Ok(None) => tracing::debug!("Previewed document {} not found", id),
            Err(e) => {
                tracing::warn!("Failed to resolve previewed document {}: {}", id, e);
                return invalid_token();
            }
        }
    }

    tracing::info!("Preview session started, redirecting to {}", location);
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, location),
            (
                header::SET_COOKIE,
                preview_cookie(&state.cookie_name, &token),
            ),
        ],
    )
        .into_response()
}

/// End the preview session
async fn exit_preview_handler(State(state): State<Arc<ServerState>>) -> Response {
    let root = url_for(&state.generator.blog().config.root, "/");
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, root),
            (header::SET_COOKIE, clear_cookie(&state.cookie_name)),
        ],
    )
        .into_response()
}

async fn home_handler(State(state): State<Arc<ServerState>>, request: Request<Body>) -> Response {
    match preview_ref(request.headers(), &state.cookie_name) {
        Some(reference) => {
            let html = state.generator.render_home(Some(&reference), true).await;
            respond(html.map(Some))
        }
        None => serve_static(&state, request).await,
    }
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(uid): Path<String>,
    request: Request<Body>,
) -> Response {
    match preview_ref(request.headers(), &state.cookie_name) {
        Some(reference) => {
            let html = state
                .generator
                .render_post(&uid, Some(&reference), true)
                .await;
            respond(html)
        }
        None => serve_static(&state, request).await,
    }
}

async fn static_handler(State(state): State<Arc<ServerState>>, request: Request<Body>) -> Response {
    serve_static(&state, request).await
}

/// Serve a generated file using tower-http
async fn serve_static(state: &ServerState, request: Request<Body>) -> Response {
    let mut service =
        ServeDir::new(&state.generator.blog().public_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

fn respond(html: Result<Option<String>>) -> Response {
    match html {
        Ok(Some(html)) => Html(html).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        Err(e) => {
            tracing::error!("Preview rendering failed: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

fn invalid_token() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "message": "Invalid token" })),
    )
        .into_response()
}

/// `Set-Cookie` value storing the preview ref
fn preview_cookie(name: &str, reference: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        name,
        utf8_percent_encode(reference, NON_ALPHANUMERIC)
    )
}

/// `Set-Cookie` value removing the preview cookie
fn clear_cookie(name: &str) -> String {
    format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", name)
}

/// The preview ref carried by the request's cookies, if any
fn preview_ref(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| percent_decode_str(value).decode_utf8().ok())
        .map(|value| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
