use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};

use crate::error::{DalError, RecordKind};

pub const DEFAULT_SERVICE_URL: &str = "https://instapaper.com";

pub type Bid = String;
pub type Hid = String;

/// A saved article, decoded from one export record.
#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    id: Bid,
    dt: DateTime<Utc>,
    url: String,
    title: String,
    raw: Value,
}

impl Bookmark {
    pub fn from_raw(raw: Value, path: &Path) -> Result<Self, DalError> {
        let kind = RecordKind::Bookmark;
        let obj = as_record(&raw, kind, path)?;

        let id = id_field(obj, "bookmark_id", kind, path)?;
        let dt = time_field(obj, kind, &id, path)?;
        let url = str_field(obj, "url", kind, path)?.to_string();
        let title = str_field(obj, "title", kind, path)?.to_string();

        Ok(Bookmark {
            id,
            dt,
            url,
            title,
            raw,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Save time. Exports carry bare epoch seconds, which are assumed to be UTC.
    pub fn dt(&self) -> DateTime<Utc> {
        self.dt
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn link(&self, service_url: &str) -> String {
        format!("{}/read/{}", service_url.trim_end_matches('/'), self.id)
    }

    pub fn instapaper_link(&self) -> String {
        self.link(DEFAULT_SERVICE_URL)
    }
}

/// An excerpt selected inside a bookmark.
///
/// A highlight only knows its bookmark by id, so it has no url or title of
/// its own. Reach highlights through [`Page`] when those are needed.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    id: Hid,
    bookmark_id: Bid,
    dt: DateTime<Utc>,
    text: String,
    note: Option<String>,
    raw: Value,
}

impl Highlight {
    pub fn from_raw(raw: Value, path: &Path) -> Result<Self, DalError> {
        let kind = RecordKind::Highlight;
        let obj = as_record(&raw, kind, path)?;

        let id = id_field(obj, "highlight_id", kind, path)?;
        let bookmark_id = id_field(obj, "bookmark_id", kind, path)?;
        let dt = time_field(obj, kind, &id, path)?;
        let text = str_field(obj, "text", kind, path)?.to_string();

        // null and a missing key both mean "no note", "" is an empty note
        let note = match obj.get("note") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(DalError::MissingField {
                    kind,
                    field: "note",
                    path: path.to_path_buf(),
                });
            }
        };

        Ok(Highlight {
            id,
            bookmark_id,
            dt,
            text,
            note,
            raw,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn bookmark_id(&self) -> &str {
        &self.bookmark_id
    }

    /// Highlight time, UTC by the same convention as [`Bookmark::dt`].
    pub fn dt(&self) -> DateTime<Utc> {
        self.dt
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn link(&self, service_url: &str) -> String {
        format!(
            "{}/read/{}/{}",
            service_url.trim_end_matches('/'),
            self.bookmark_id,
            self.id
        )
    }

    pub fn instapaper_link(&self) -> String {
        self.link(DEFAULT_SERVICE_URL)
    }
}

/// A bookmark together with all of its highlights, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub bookmark: Bookmark,
    pub highlights: Vec<Highlight>,
}

impl Page {
    pub fn dt(&self) -> DateTime<Utc> {
        self.bookmark.dt()
    }

    pub fn url(&self) -> &str {
        self.bookmark.url()
    }

    pub fn title(&self) -> &str {
        self.bookmark.title()
    }
}

fn as_record<'a>(raw: &'a Value, kind: RecordKind, path: &Path) -> Result<&'a Map<String, Value>, DalError> {
    raw.as_object().ok_or_else(|| DalError::UnrecognizedFormat {
        path: path.to_path_buf(),
        reason: format!("{} record is not an object", kind),
    })
}

fn missing(kind: RecordKind, field: &'static str, path: &Path) -> DalError {
    DalError::MissingField {
        kind,
        field,
        path: path.to_path_buf(),
    }
}

fn str_field<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
    kind: RecordKind,
    path: &Path,
) -> Result<&'a str, DalError> {
    obj.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| missing(kind, field, path))
}

fn id_field(
    obj: &Map<String, Value>,
    field: &'static str,
    kind: RecordKind,
    path: &Path,
) -> Result<String, DalError> {
    match obj.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(normalize_id(n)),
        _ => Err(missing(kind, field, path)),
    }
}

/// Renders a numeric id the way the same id looks when exported as a string.
pub fn normalize_id(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => (f as i64).to_string(),
        _ => n.to_string(),
    }
}

fn time_field(
    obj: &Map<String, Value>,
    kind: RecordKind,
    id: &str,
    path: &Path,
) -> Result<DateTime<Utc>, DalError> {
    let value = obj.get("time").ok_or_else(|| missing(kind, "time", path))?;

    let invalid = || DalError::InvalidTimestamp {
        kind,
        id: id.to_string(),
        value: value.to_string(),
    };

    let Value::Number(n) = value else {
        return Err(invalid());
    };

    if let Some(secs) = n.as_i64() {
        return DateTime::from_timestamp(secs, 0).ok_or_else(invalid);
    }

    let secs = n.as_f64().filter(|f| f.is_finite()).ok_or_else(invalid)?;
    epoch_to_utc(secs).ok_or_else(invalid)
}

pub fn epoch_to_utc(secs: f64) -> Option<DateTime<Utc>> {
    let whole = secs.floor();
    if whole.abs() >= i64::MAX as f64 {
        return None;
    }
    let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
    DateTime::from_timestamp(whole as i64, nanos)
}
