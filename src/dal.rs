//! Merges a set of overlapping Instapaper exports into one view.
//!
//! Every export is a full or partial dump of the account at the time it was
//! taken, so the same bookmark or highlight usually shows up in many of them.
//! Records are keyed by id and the last one read wins.
//!
//! Nothing is cached: each of [`Dal::bookmarks`], [`Dal::highlights`] and
//! [`Dal::pages`] reads every source again.
//!
//! Deleted items can not be detected. An id missing from the newest export may
//! just have fallen outside the export's size limit.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::DalError;
use crate::export::decode_snapshot;
use crate::model::{Bid, Bookmark, Hid, Highlight, Page};
use crate::progress::{NoProgress, Progress};

pub type Bookmarks = IndexMap<Bid, Bookmark>;
pub type Highlights = IndexMap<Hid, Highlight>;

/// What to do with a highlight whose bookmark is in none of the sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrphanPolicy {
    #[default]
    Fail,
    Drop,
}

pub struct Dal {
    sources: Vec<PathBuf>,
    progress: Box<dyn Progress>,
    orphans: OrphanPolicy,
}

impl Dal {
    pub fn new<I, P>(sources: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
            progress: Box::new(NoProgress),
            orphans: OrphanPolicy::default(),
        }
    }

    pub fn with_progress(mut self, progress: Box<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_orphans(mut self, orphans: OrphanPolicy) -> Self {
        self.orphans = orphans;
        self
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn bookmarks(&self) -> Result<Bookmarks, DalError> {
        Ok(self.get_all()?.0)
    }

    pub fn highlights(&self) -> Result<Highlights, DalError> {
        Ok(self.get_all()?.1)
    }

    /// One page per bookmark, oldest bookmark first.
    ///
    /// Highlights inside a page are oldest first. Both sorts are stable, so
    /// records with equal timestamps keep the order they were first seen in.
    pub fn pages(&self) -> Result<Vec<Page>, DalError> {
        let (bookmarks, highlights) = self.get_all()?;
        build_pages(bookmarks, highlights, self.orphans)
    }

    fn get_all(&self) -> Result<(Bookmarks, Highlights), DalError> {
        let mut all_bks = Bookmarks::new();
        let mut all_hls = Highlights::new();

        let total = self.sources.len();
        self.progress.start(total);
        for (i, path) in self.sources.iter().enumerate() {
            self.progress.tick(i + 1, total, path);
            read_source(path, &mut all_bks, &mut all_hls)?;
        }
        self.progress.finish(total);

        tracing::debug!(
            sources = self.sources.len(),
            bookmarks = all_bks.len(),
            highlights = all_hls.len(),
            "merged exports"
        );

        Ok((all_bks, all_hls))
    }
}

fn read_source(path: &Path, bookmarks: &mut Bookmarks, highlights: &mut Highlights) -> Result<(), DalError> {
    let snapshot = decode_snapshot(path)?;

    for raw in snapshot.highlights {
        let hl = Highlight::from_raw(raw, path)?;
        // insert keeps the slot of the first occurrence and swaps in the new value
        highlights.insert(hl.id().to_string(), hl);
    }
    for raw in snapshot.bookmarks {
        let bk = Bookmark::from_raw(raw, path)?;
        bookmarks.insert(bk.id().to_string(), bk);
    }

    Ok(())
}

pub fn build_pages(bookmarks: Bookmarks, highlights: Highlights, orphans: OrphanPolicy) -> Result<Vec<Page>, DalError> {
    let mut page2hls: IndexMap<Bid, Vec<Highlight>> =
        bookmarks.keys().map(|bid| (bid.clone(), Vec::new())).collect();

    for hl in highlights.into_values() {
        match page2hls.get_mut(hl.bookmark_id()) {
            Some(hls) => hls.push(hl),
            None if orphans == OrphanPolicy::Drop => {
                tracing::warn!(
                    highlight_id = hl.id(),
                    bookmark_id = hl.bookmark_id(),
                    "dropping highlight of unknown bookmark"
                );
            }
            None => {
                return Err(DalError::DanglingReference {
                    highlight_id: hl.id().to_string(),
                    bookmark_id: hl.bookmark_id().to_string(),
                });
            }
        }
    }

    let mut pages: Vec<Page> = bookmarks
        .into_values()
        .zip(page2hls.into_values())
        .map(|(bookmark, mut highlights)| {
            highlights.sort_by_key(|h| h.dt());
            Page { bookmark, highlights }
        })
        .collect();
    pages.sort_by_key(|p| p.dt());

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bookmark(id: u64, time: i64) -> Bookmark {
        let raw = json!({"bookmark_id": id, "time": time, "url": format!("https://{id}"), "title": id.to_string()});
        Bookmark::from_raw(raw, Path::new("test.json")).unwrap()
    }

    fn highlight(id: u64, bid: u64, time: i64) -> Highlight {
        let raw = json!({"highlight_id": id, "bookmark_id": bid, "time": time, "text": "t", "note": null});
        Highlight::from_raw(raw, Path::new("test.json")).unwrap()
    }

    fn bookmarks(items: Vec<Bookmark>) -> Bookmarks {
        items.into_iter().map(|b| (b.id().to_string(), b)).collect()
    }

    fn highlights(items: Vec<Highlight>) -> Highlights {
        items.into_iter().map(|h| (h.id().to_string(), h)).collect()
    }

    #[test]
    fn test_build_pages_sorts_pages_and_highlights() {
        let bks = bookmarks(vec![bookmark(1, 300), bookmark(2, 100), bookmark(3, 200)]);
        let hls = highlights(vec![highlight(10, 1, 5), highlight(11, 1, 3), highlight(12, 2, 1)]);

        let pages = build_pages(bks, hls, OrphanPolicy::Fail).unwrap();

        let order: Vec<&str> = pages.iter().map(|p| p.bookmark.id()).collect();
        assert_eq!(order, vec!["2", "3", "1"]);

        let last: Vec<&str> = pages[2].highlights.iter().map(|h| h.id()).collect();
        assert_eq!(last, vec!["11", "10"]);
        assert!(pages[1].highlights.is_empty());
    }

    #[test]
    fn test_build_pages_ties_keep_insertion_order() {
        let bks = bookmarks(vec![bookmark(5, 100), bookmark(4, 100), bookmark(6, 100)]);
        let pages = build_pages(bks, Highlights::new(), OrphanPolicy::Fail).unwrap();

        let order: Vec<&str> = pages.iter().map(|p| p.bookmark.id()).collect();
        assert_eq!(order, vec!["5", "4", "6"]);
    }

    #[test]
    fn test_orphan_fails_by_default() {
        let bks = bookmarks(vec![bookmark(1, 1)]);
        let hls = highlights(vec![highlight(10, 99, 1)]);

        let err = build_pages(bks, hls, OrphanPolicy::Fail).unwrap_err();
        match err {
            DalError::DanglingReference { highlight_id, bookmark_id } => {
                assert_eq!(highlight_id, "10");
                assert_eq!(bookmark_id, "99");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_orphan_dropped_when_asked() {
        let bks = bookmarks(vec![bookmark(1, 1)]);
        let hls = highlights(vec![highlight(10, 99, 1), highlight(11, 1, 2)]);

        let pages = build_pages(bks, hls, OrphanPolicy::Drop).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].highlights.len(), 1);
        assert_eq!(pages[0].highlights[0].id(), "11");
    }

    #[test]
    fn test_sources_keep_input_order() {
        let dal = Dal::new(["b.json", "a.json", "c.json"]);
        let names: Vec<&str> = dal.sources().iter().map(|p| p.to_str().unwrap()).collect();
        assert_eq!(names, vec!["b.json", "a.json", "c.json"]);
    }

    #[test]
    fn test_no_sources_is_empty() {
        let dal = Dal::new(Vec::<PathBuf>::new());
        assert!(dal.bookmarks().unwrap().is_empty());
        assert!(dal.pages().unwrap().is_empty());
    }
}
