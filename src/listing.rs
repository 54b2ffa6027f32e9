//! The file list view: load, search, sort, paginate, and summarize.
//!
//! Everything here is presentation-agnostic. A manifest is parsed once into
//! fully-populated [`Entry`] values; from then on a [`ViewState`] plus the
//! entries fully determine what is shown, through a single pure function:
//!
//! ```text
//! render_view(entries, state, now)  →  View { visible, pagination, stats }
//! reduce(state, entries, event)     →  ViewState
//! ```
//!
//! The HTML adapter in [`crate::render`] only turns a [`View`] into markup.
//!
//! ## Fallbacks
//!
//! The manifest is untrusted JSON. Per-field fallbacks are applied once, in
//! [`normalize_record`]:
//!
//! | field | fallback |
//! |-------|----------|
//! | `size` | `0` (numbers, numeric strings accepted) |
//! | `lastModified` | unknown (sorts before every known date) |
//! | `file_type` | empty string (labelled "desconhecido") |
//! | `download_url` | the file name, as a relative link |
//!
//! Records without a usable `name` are dropped. A top-level value that is not
//! an array is a load failure, same as a transport or parse error.

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Most page-number buttons shown at once, not counting first/last jumps.
pub const MAX_PAGE_BUTTONS: usize = 5;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {status} fetching {url}")]
    Status { status: u16, url: String },
    #[error("Malformed manifest JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Manifest is not a JSON array")]
    NotAnArray,
}

/// A manifest record after fallbacks; no optional fields except the date.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    /// Empty when the manifest had none.
    pub file_type: String,
    pub download_url: String,
}

// ============================================================================
// Loading
// ============================================================================

/// Read a manifest from a local path or an `http(s)://` URL.
pub fn load_manifest(source: &str, timeout: Duration) -> Result<Vec<Entry>, LoadError> {
    let text = if crate::fetch::is_valid_url(source) {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        let response = client.get(source).send()?;
        if !response.status().is_success() {
            return Err(LoadError::Status {
                status: response.status().as_u16(),
                url: source.to_string(),
            });
        }
        response.text()?
    } else {
        std::fs::read_to_string(source)?
    };
    parse_manifest(&text)
}

/// Parse manifest JSON text into entries, applying per-field fallbacks.
pub fn parse_manifest(text: &str) -> Result<Vec<Entry>, LoadError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(items) = value else {
        return Err(LoadError::NotAnArray);
    };

    let mut entries = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match normalize_record(item) {
            Some(entry) => entries.push(entry),
            None => warn!("skipping manifest record {idx}: no usable name"),
        }
    }
    Ok(entries)
}

/// Turn one untrusted JSON record into an [`Entry`]. `None` when the record
/// is not an object or has no non-empty `name`.
pub fn normalize_record(item: &Value) -> Option<Entry> {
    let obj = item.as_object()?;
    let name = obj.get("name")?.as_str()?.to_string();
    if name.is_empty() {
        return None;
    }

    let size = obj.get("size").map(size_from_value).unwrap_or(0);
    let last_modified = obj
        .get("lastModified")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));
    let file_type = obj
        .get("file_type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let download_url = obj
        .get("download_url")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| name.clone());

    Some(Entry {
        name,
        size,
        last_modified,
        file_type,
        download_url,
    })
}

fn size_from_value(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

// ============================================================================
// Search and sort
// ============================================================================

/// Sort orders offered by the sort selector. Serialized with the selector's
/// option values (`"name"`, `"nameDesc"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Name,
    NameDesc,
    Date,
    DateDesc,
    Size,
    SizeDesc,
    Type,
    TypeDesc,
}

#[derive(Error, Debug, Clone)]
#[error("unknown sort key '{0}' (expected one of: name, nameDesc, date, dateDesc, size, sizeDesc, type, typeDesc)")]
pub struct ParseSortKeyError(String);

impl SortKey {
    pub const ALL: [SortKey; 8] = [
        SortKey::Name,
        SortKey::NameDesc,
        SortKey::Date,
        SortKey::DateDesc,
        SortKey::Size,
        SortKey::SizeDesc,
        SortKey::Type,
        SortKey::TypeDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::NameDesc => "nameDesc",
            SortKey::Date => "date",
            SortKey::DateDesc => "dateDesc",
            SortKey::Size => "size",
            SortKey::SizeDesc => "sizeDesc",
            SortKey::Type => "type",
            SortKey::TypeDesc => "typeDesc",
        }
    }

    /// Selector label.
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Name => "Nome (A-Z)",
            SortKey::NameDesc => "Nome (Z-A)",
            SortKey::Date => "Data (mais antigo)",
            SortKey::DateDesc => "Data (mais recente)",
            SortKey::Size => "Tamanho (menor)",
            SortKey::SizeDesc => "Tamanho (maior)",
            SortKey::Type => "Tipo (A-Z)",
            SortKey::TypeDesc => "Tipo (Z-A)",
        }
    }

    /// Total order for this key. Descending keys reverse the comparison, so
    /// ties keep input order in both directions under a stable sort.
    pub fn compare(self, a: &Entry, b: &Entry) -> Ordering {
        match self {
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::NameDesc => b.name.cmp(&a.name),
            SortKey::Date => a.last_modified.cmp(&b.last_modified),
            SortKey::DateDesc => b.last_modified.cmp(&a.last_modified),
            SortKey::Size => a.size.cmp(&b.size),
            SortKey::SizeDesc => b.size.cmp(&a.size),
            SortKey::Type => a.file_type.cmp(&b.file_type),
            SortKey::TypeDesc => b.file_type.cmp(&a.file_type),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ParseSortKeyError(s.to_string()))
    }
}

/// Case-insensitive substring match on the name. An empty term matches all.
pub fn filter_entries<'a>(entries: &'a [Entry], term: &str) -> Vec<&'a Entry> {
    let needle = term.to_lowercase();
    entries
        .iter()
        .filter(|e| needle.is_empty() || e.name.to_lowercase().contains(&needle))
        .collect()
}

/// Stable sort in place.
pub fn sort_entries(entries: &mut [&Entry], key: SortKey) {
    entries.sort_by(|a, b| key.compare(a, b));
}

// ============================================================================
// View state and reducer
// ============================================================================

/// Everything the user can change about the view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub search_term: String,
    pub sort: SortKey,
    /// 1-based. May be stale after the entries change; `render_view` clamps.
    pub page: usize,
    pub page_size: usize,
}

impl ViewState {
    pub fn new(sort: SortKey, page_size: usize) -> Self {
        Self {
            search_term: String::new(),
            sort,
            page: 1,
            page_size: page_size.max(1),
        }
    }
}

/// A discrete user interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Search(String),
    Sort(SortKey),
    PageSize(usize),
    GoToPage(usize),
    NextPage,
    PreviousPage,
}

/// Number of pages for `items` entries at `page_size` per page.
pub fn page_count(items: usize, page_size: usize) -> usize {
    items.div_ceil(page_size.max(1))
}

/// Apply one event. Out-of-range page requests and zero page sizes are
/// ignored; the returned state always has a valid page for `entries`.
pub fn reduce(state: &ViewState, entries: &[Entry], event: ViewEvent) -> ViewState {
    let mut next = state.clone();
    match event {
        ViewEvent::Search(term) => {
            next.search_term = term;
            next.page = 1;
        }
        ViewEvent::Sort(key) => next.sort = key,
        ViewEvent::PageSize(size) if size > 0 => {
            next.page_size = size;
            next.page = 1;
        }
        ViewEvent::PageSize(_) => {}
        ViewEvent::GoToPage(page) => {
            let pages = page_count(
                filter_entries(entries, &state.search_term).len(),
                state.page_size,
            );
            if (1..=pages).contains(&page) {
                next.page = page;
            }
        }
        ViewEvent::NextPage => {
            return reduce(state, entries, ViewEvent::GoToPage(state.page + 1));
        }
        ViewEvent::PreviousPage => {
            return reduce(
                state,
                entries,
                ViewEvent::GoToPage(state.page.saturating_sub(1)),
            );
        }
    }
    next.page = clamp_page(next.page, entries, &next);
    next
}

fn clamp_page(page: usize, entries: &[Entry], state: &ViewState) -> usize {
    let pages = page_count(
        filter_entries(entries, &state.search_term).len(),
        state.page_size,
    );
    page.clamp(1, pages.max(1))
}

// ============================================================================
// Rendering
// ============================================================================

/// One slot in the page-number strip.
#[derive(Debug, Clone, PartialEq)]
pub enum PageItem {
    Page { number: usize, current: bool },
    Ellipsis,
}

/// Pagination control descriptor, regenerated on every render.
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    pub current: usize,
    pub total_pages: usize,
    /// Size of the filtered set.
    pub total_items: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub items: Vec<PageItem>,
}

impl Pagination {
    /// "Página X de Y | N arquivos"
    pub fn summary(&self) -> String {
        format!(
            "Página {} de {} | {} arquivos",
            self.current, self.total_pages, self.total_items
        )
    }
}

/// Aggregates over the whole manifest, ignoring the search filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub total_files: usize,
    pub total_size: u64,
    /// Most recent known modification time.
    pub last_update: Option<DateTime<Utc>>,
    /// When the view was built ("now" at page load).
    pub generated_at: DateTime<Utc>,
}

pub fn compute_stats(entries: &[Entry], now: DateTime<Utc>) -> Stats {
    Stats {
        total_files: entries.len(),
        total_size: entries.iter().map(|e| e.size).fold(0, u64::saturating_add),
        last_update: entries.iter().filter_map(|e| e.last_modified).max(),
        generated_at: now,
    }
}

/// Everything needed to draw one screen.
#[derive(Debug, Clone, PartialEq)]
pub struct View<'a> {
    /// Records on the current page, in display order.
    pub visible: Vec<&'a Entry>,
    /// `None` when the filtered set is empty.
    pub pagination: Option<Pagination>,
    pub stats: Stats,
}

/// Filter, sort, and slice `entries` for `state`.
pub fn render_view<'a>(entries: &'a [Entry], state: &ViewState, now: DateTime<Utc>) -> View<'a> {
    let mut matched = filter_entries(entries, &state.search_term);
    sort_entries(&mut matched, state.sort);

    let page_size = state.page_size.max(1);
    let total_pages = page_count(matched.len(), page_size);
    let stats = compute_stats(entries, now);

    if total_pages == 0 {
        return View {
            visible: Vec::new(),
            pagination: None,
            stats,
        };
    }

    let current = state.page.clamp(1, total_pages);
    let start = (current - 1) * page_size;
    let end = (start + page_size).min(matched.len());

    View {
        pagination: Some(Pagination {
            current,
            total_pages,
            total_items: matched.len(),
            has_previous: current > 1,
            has_next: current < total_pages,
            items: page_window(current, total_pages),
        }),
        visible: matched[start..end].to_vec(),
        stats,
    }
}

/// Page-number strip: up to [`MAX_PAGE_BUTTONS`] numbers around `current`,
/// plus a jump to the first/last page (with an ellipsis when there is a gap)
/// whenever the window does not reach that edge.
pub fn page_window(current: usize, total: usize) -> Vec<PageItem> {
    if total == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, total);

    let mut start = current.saturating_sub(MAX_PAGE_BUTTONS / 2).max(1);
    let end = (start + MAX_PAGE_BUTTONS - 1).min(total);
    if end + 1 - start < MAX_PAGE_BUTTONS {
        start = (end + 1).saturating_sub(MAX_PAGE_BUTTONS).max(1);
    }

    let mut items = Vec::new();
    if start > 1 {
        items.push(PageItem::Page {
            number: 1,
            current: false,
        });
        if start > 2 {
            items.push(PageItem::Ellipsis);
        }
    }
    for number in start..=end {
        items.push(PageItem::Page {
            number,
            current: number == current,
        });
    }
    if end < total {
        if end + 1 < total {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Page {
            number: total,
            current: false,
        });
    }
    items
}
