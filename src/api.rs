use serde::{Deserialize, Serialize};

use crate::model::{Bookmark, Highlight, Page};

#[derive(Debug, Deserialize)]
pub struct PagesParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub top: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct APIResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct BookmarkView {
    pub id: String,
    pub dt: String,
    pub url: String,
    pub title: String,
    pub link: String,
}

impl BookmarkView {
    pub fn new(bookmark: &Bookmark, service_url: &str) -> Self {
        BookmarkView {
            id: bookmark.id().to_string(),
            dt: bookmark.dt().to_rfc3339(),
            url: bookmark.url().to_string(),
            title: bookmark.title().to_string(),
            link: bookmark.link(service_url),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HighlightView {
    pub id: String,
    pub bookmark_id: String,
    pub dt: String,
    pub text: String,
    pub note: Option<String>,
    pub link: String,
}

impl HighlightView {
    pub fn new(highlight: &Highlight, service_url: &str) -> Self {
        HighlightView {
            id: highlight.id().to_string(),
            bookmark_id: highlight.bookmark_id().to_string(),
            dt: highlight.dt().to_rfc3339(),
            text: highlight.text().to_string(),
            note: highlight.note().map(str::to_string),
            link: highlight.link(service_url),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageView {
    pub bookmark: BookmarkView,
    pub highlights: Vec<HighlightView>,
}

impl PageView {
    pub fn new(page: &Page, service_url: &str) -> Self {
        PageView {
            bookmark: BookmarkView::new(&page.bookmark, service_url),
            highlights: page
                .highlights
                .iter()
                .map(|h| HighlightView::new(h, service_url))
                .collect(),
        }
    }
}
