use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tracing::info;

use crate::api::{
    APIResponse, BookmarkView, ErrorResponse, HighlightView, PageView, PagesParams, StatusResponse,
    SummaryParams,
};
use crate::dal::Dal;
use crate::error::HandlerError;
use crate::report::{DEFAULT_TOP, Summary};

#[derive(Clone)]
pub struct AppState {
    pub dal: Arc<Dal>,
    pub service_url: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(healthcheck))
        .route("/bookmarks", get(get_bookmarks))
        .route("/highlights", get(get_highlights))
        .route("/pages", get(get_pages))
        .route("/summary", get(get_summary))
}

fn success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(APIResponse { data })).into_response()
}

fn server_error(err: HandlerError) -> Response {
    let msg = err.to_string();
    tracing::error!(error = %msg, "failed to read exports");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: msg })).into_response()
}

/// The aggregator does blocking file io, keep it off the async workers.
async fn with_dal<T, F>(state: &AppState, f: F) -> Result<T, HandlerError>
where
    T: Send + 'static,
    F: FnOnce(&Dal) -> Result<T, crate::error::DalError> + Send + 'static,
{
    let dal = state.dal.clone();
    let result = tokio::task::spawn_blocking(move || f(dal.as_ref())).await??;
    Ok(result)
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_bookmarks(State(state): State<AppState>) -> Response {
    match with_dal(&state, |dal| dal.bookmarks()).await {
        Ok(bookmarks) => {
            info!(count = bookmarks.len(), "got bookmarks");
            let views: Vec<BookmarkView> = bookmarks
                .values()
                .map(|b| BookmarkView::new(b, &state.service_url))
                .collect();
            success(views)
        }
        Err(e) => server_error(e),
    }
}

pub async fn get_highlights(State(state): State<AppState>) -> Response {
    match with_dal(&state, |dal| dal.highlights()).await {
        Ok(highlights) => {
            info!(count = highlights.len(), "got highlights");
            let views: Vec<HighlightView> = highlights
                .values()
                .map(|h| HighlightView::new(h, &state.service_url))
                .collect();
            success(views)
        }
        Err(e) => server_error(e),
    }
}

pub async fn get_pages(State(state): State<AppState>, Query(params): Query<PagesParams>) -> Response {
    match with_dal(&state, |dal| dal.pages()).await {
        Ok(pages) => {
            info!(count = pages.len(), "got pages");
            // pages are oldest first, a limit keeps the newest
            let skip = params.limit.map_or(0, |limit| pages.len().saturating_sub(limit));
            let views: Vec<PageView> = pages[skip..]
                .iter()
                .map(|p| PageView::new(p, &state.service_url))
                .collect();
            success(views)
        }
        Err(e) => server_error(e),
    }
}

pub async fn get_summary(State(state): State<AppState>, Query(params): Query<SummaryParams>) -> Response {
    let top = params.top.unwrap_or(DEFAULT_TOP);
    match with_dal(&state, move |dal| dal.pages().map(|pages| Summary::from_pages(&pages, top))).await {
        Ok(summary) => success(summary),
        Err(e) => server_error(e),
    }
}
