use std::error::Error;

pub mod api;
pub mod config;
pub mod dal;
pub mod error;
pub mod export;
pub mod handler;
pub mod model;
pub mod progress;
pub mod report;
pub mod sources;

pub use dal::{Dal, OrphanPolicy};
pub use error::DalError;
pub use model::{Bookmark, Highlight, Page};

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
