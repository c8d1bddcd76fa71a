use std::collections::HashMap;
use std::fmt::Write;

use serde::Serialize;

use crate::model::Page;

pub const DEFAULT_TOP: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageCount {
    pub url: String,
    pub title: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub pages: usize,
    pub highlights: usize,
    pub top: Vec<PageCount>,
}

impl Summary {
    pub fn from_pages(pages: &[Page], top: usize) -> Self {
        Summary {
            pages: pages.len(),
            highlights: pages.iter().map(|p| p.highlights.len()).sum(),
            top: most_highlighted(pages, top),
        }
    }
}

/// Pages sharing a url and title are counted together.
pub fn most_highlighted(pages: &[Page], n: usize) -> Vec<PageCount> {
    let mut counts: HashMap<(&str, &str), usize> = HashMap::new();
    for page in pages {
        *counts.entry((page.url(), page.title())).or_default() += page.highlights.len();
    }

    let mut counts: Vec<PageCount> = counts
        .into_iter()
        .map(|((url, title), count)| PageCount {
            url: url.to_string(),
            title: title.to_string(),
            count,
        })
        .collect();

    counts.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.url.cmp(&b.url))
            .then_with(|| a.title.cmp(&b.title))
    });
    counts.truncate(n);
    counts
}

pub fn render_text(summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Parsed {} pages", summary.pages);
    let _ = writeln!(out, "{} most highlighted pages:", summary.top.len());
    for entry in &summary.top {
        let _ = writeln!(out, "{:4} {} \"{}\"", entry.count, entry.url, entry.title);
    }
    out
}
