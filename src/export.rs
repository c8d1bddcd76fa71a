//! Decoders for the two export layouts Instapaper has produced over time.
//!
//! Older exports are flat:
//!
//! ```json
//! { "highlights": [...], "bookmarks": [...] }
//! ```
//!
//! Newer exports partition everything by folder:
//!
//! ```json
//! { "bookmarks": { "unread": { "highlights": [...], "bookmarks": [...] } } }
//! ```
//!
//! Both decode into the same flat [`Snapshot`]. Folder names are dropped.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::DalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Legacy,
    Current,
}

impl ExportFormat {
    /// A top-level `highlights` key only ever appears in legacy exports.
    pub fn detect(doc: &Map<String, Value>) -> Self {
        if doc.contains_key("highlights") {
            ExportFormat::Legacy
        } else {
            ExportFormat::Current
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Legacy => "legacy",
            ExportFormat::Current => "current",
        }
    }
}

/// Raw bookmark and highlight records of one export, in document order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Snapshot {
    pub bookmarks: Vec<Value>,
    pub highlights: Vec<Value>,
}

pub fn decode_snapshot(path: &Path) -> Result<Snapshot, DalError> {
    let text = fs::read_to_string(path).map_err(|source| DalError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let doc: Value = serde_json::from_str(&text).map_err(|source| DalError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    decode_document(doc, path)
}

pub fn decode_document(doc: Value, path: &Path) -> Result<Snapshot, DalError> {
    let Value::Object(mut doc) = doc else {
        return Err(unrecognized(path, "top level is not an object"));
    };

    let format = ExportFormat::detect(&doc);
    tracing::debug!(path = %path.display(), format = format.as_str(), "detected export format");

    match format {
        ExportFormat::Legacy => decode_legacy(&mut doc, path),
        ExportFormat::Current => decode_current(&mut doc, path),
    }
}

fn decode_legacy(doc: &mut Map<String, Value>, path: &Path) -> Result<Snapshot, DalError> {
    Ok(Snapshot {
        highlights: take_list(doc, "highlights", path)?,
        bookmarks: take_list(doc, "bookmarks", path)?,
    })
}

fn decode_current(doc: &mut Map<String, Value>, path: &Path) -> Result<Snapshot, DalError> {
    let folders = match doc.remove("bookmarks") {
        Some(Value::Object(folders)) => folders,
        Some(_) => return Err(unrecognized(path, "'bookmarks' is not a folder mapping")),
        None => return Err(unrecognized(path, "neither 'highlights' nor 'bookmarks' present")),
    };

    let mut snapshot = Snapshot::default();
    for (folder, group) in folders {
        let Value::Object(mut group) = group else {
            return Err(unrecognized(path, &format!("folder '{}' is not an object", folder)));
        };
        snapshot.highlights.extend(take_list(&mut group, "highlights", path)?);
        snapshot.bookmarks.extend(take_list(&mut group, "bookmarks", path)?);
    }

    Ok(snapshot)
}

fn take_list(obj: &mut Map<String, Value>, key: &str, path: &Path) -> Result<Vec<Value>, DalError> {
    match obj.remove(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(unrecognized(path, &format!("'{}' is not a list", key))),
        None => Err(unrecognized(path, &format!("'{}' is missing", key))),
    }
}

fn unrecognized(path: &Path, reason: &str) -> DalError {
    DalError::UnrecognizedFormat {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path() -> &'static Path {
        Path::new("export.json")
    }

    #[test]
    fn test_detect_format() {
        let legacy = json!({"highlights": [], "bookmarks": []});
        let current = json!({"bookmarks": {}});

        assert_eq!(ExportFormat::detect(legacy.as_object().unwrap()), ExportFormat::Legacy);
        assert_eq!(ExportFormat::detect(current.as_object().unwrap()), ExportFormat::Current);
    }

    #[test]
    fn test_decode_legacy() {
        let doc = json!({
            "highlights": [{"highlight_id": 1}],
            "bookmarks": [{"bookmark_id": 2}, {"bookmark_id": 3}],
        });
        let snapshot = decode_document(doc, path()).unwrap();

        assert_eq!(snapshot.highlights.len(), 1);
        assert_eq!(snapshot.bookmarks.len(), 2);
    }

    #[test]
    fn test_decode_current_flattens_folders_in_order() {
        let doc = json!({
            "bookmarks": {
                "unread": {"highlights": [], "bookmarks": [{"bookmark_id": 1}]},
                "archive": {"highlights": [{"highlight_id": 5}], "bookmarks": [{"bookmark_id": 2}]},
            }
        });
        let snapshot = decode_document(doc, path()).unwrap();

        assert_eq!(
            snapshot.bookmarks,
            vec![json!({"bookmark_id": 1}), json!({"bookmark_id": 2})]
        );
        assert_eq!(snapshot.highlights, vec![json!({"highlight_id": 5})]);
    }

    #[test]
    fn test_unrecognized_shapes() {
        for doc in [
            json!([]),
            json!({}),
            json!({"bookmarks": []}),
            json!({"highlights": [], "bookmarks": {}}),
            json!({"bookmarks": {"unread": {"bookmarks": []}}}),
        ] {
            let err = decode_document(doc.clone(), path()).unwrap_err();
            assert!(
                matches!(err, DalError::UnrecognizedFormat { .. }),
                "expected unrecognized format for {doc}"
            );
        }
    }
}
