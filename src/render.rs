//! HTML rendering of the file list.
//!
//! Turns a [`View`](crate::listing::View) into a standalone page. The CLI
//! renders one page per result page of the current search/sort/page-size:
//!
//! ```text
//! out/
//! ├── index.html      # page 1
//! ├── page-2.html
//! └── page-3.html
//! ```
//!
//! Every page carries the same chrome: title header with the theme selector,
//! the stats strip (computed over the whole manifest), the search box, sort
//! and items-per-page selectors, the list, and the pagination controls. A
//! failed manifest load renders [`render_error_page`] instead, with a link
//! back to `index.html` that the next successful render replaces.
//!
//! The pre-rendered pages are the no-script view: plain links between
//! `index.html` and `page-N.html`. Each page also embeds the normalized
//! list as JSON (`#file-data`), with display labels and per-key sort ranks
//! precomputed here, and `static/list.js` drives search, sort, page size and
//! paging from it with the [`reduce`](crate::listing::reduce) rules. The
//! controls form stays `hidden` until that script takes over.
//!
//! CSS is the configured palette plus `static/style.css`. `static/theme.js`
//! applies the stored theme before first paint.

use crate::config::{self, SiteConfig};
use crate::format::{display_offset, format_file_size, format_file_type, format_optional_date};
use crate::listing::{Entry, PageItem, Pagination, SortKey, Stats, View, ViewState, render_view};
use crate::theme::{DARK_CLASS, MemoryStore, STORAGE_KEY, ThemeController, ThemePreference};
use chrono::{DateTime, FixedOffset, Utc};
use log::debug;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

const CSS_STATIC: &str = include_str!("../static/style.css");
const THEME_JS: &str = include_str!("../static/theme.js");
const LIST_JS: &str = include_str!("../static/list.js");

const DEFAULT_ICON: &str = "📄";

/// Summary of a [`write_pages`] run.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    /// Written file names, page order.
    pub pages: Vec<String>,
    /// Size of the filtered set.
    pub matched: usize,
    pub stats: Stats,
}

/// Output file for a 1-based page number.
pub fn page_file_name(page: usize) -> String {
    if page <= 1 {
        "index.html".to_string()
    } else {
        format!("page-{page}.html")
    }
}

/// Inverse of [`page_file_name`] for `page-N.html` names (N >= 2).
fn page_number_of(file_name: &str) -> Option<usize> {
    file_name
        .strip_prefix("page-")?
        .strip_suffix(".html")?
        .parse()
        .ok()
        .filter(|n| *n >= 2)
}

/// Delete `page-N.html` files with N above `keep` left by an earlier,
/// longer render. Returns the removed names, sorted.
pub fn remove_stale_pages(output_dir: &Path, keep: usize) -> Result<Vec<String>, RenderError> {
    let mut removed = Vec::new();
    for entry in fs::read_dir(output_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if page_number_of(&name).is_some_and(|n| n > keep) && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            debug!("removed stale {name}");
            removed.push(name);
        }
    }
    removed.sort();
    Ok(removed)
}

/// Icon shown next to a file, by lowercase extension.
pub fn icon_for(file_type: &str) -> &'static str {
    match file_type {
        "m3u" | "m3u8" | "pls" => "📺",
        "mp3" | "aac" | "flac" | "ogg" | "wav" | "m4a" => "🎵",
        "mp4" | "mkv" | "avi" | "mov" | "webm" | "ts" => "🎬",
        "jpg" | "jpeg" | "png" | "gif" | "webp" | "svg" | "avif" => "🖼️",
        "pdf" => "📕",
        "txt" | "md" | "log" => "📝",
        "json" | "xml" | "csv" | "yaml" | "yml" | "toml" => "🗂️",
        "gz" | "zip" | "tar" | "7z" | "rar" | "xz" => "📦",
        "html" | "htm" | "css" | "js" => "🌐",
        _ => DEFAULT_ICON,
    }
}

fn page_css(config: &SiteConfig) -> String {
    format!(
        "{}\n\n{}",
        config::generate_color_css(&config.colors),
        CSS_STATIC
    )
}

// ============================================================================
// Embedded list data
// ============================================================================

/// Payload of the `#file-data` script read by `static/list.js`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListData<'a> {
    search_term: &'a str,
    sort: SortKey,
    page_size: usize,
    /// Index into each item's `ranks`.
    sort_keys: Vec<&'static str>,
    items: Vec<ListItem<'a>>,
}

#[derive(Debug, Serialize)]
struct ListItem<'a> {
    name: &'a str,
    url: &'a str,
    icon: &'static str,
    size: String,
    date: String,
    #[serde(rename = "type")]
    file_type: String,
    /// Position in the stable sort of the whole manifest, per sort key.
    /// Ordering any filtered subset by rank equals stable-sorting it.
    ranks: Vec<usize>,
}

/// JSON for the `#file-data` script, safe to embed in HTML.
pub fn list_data_json(
    entries: &[Entry],
    state: &ViewState,
    config: &SiteConfig,
) -> Result<String, RenderError> {
    let offset = display_offset(config.utc_offset_hours);
    let mut ranks = vec![vec![0; SortKey::ALL.len()]; entries.len()];
    for (k, key) in SortKey::ALL.into_iter().enumerate() {
        let mut order: Vec<usize> = (0..entries.len()).collect();
        order.sort_by(|&a, &b| key.compare(&entries[a], &entries[b]));
        for (rank, index) in order.into_iter().enumerate() {
            ranks[index][k] = rank;
        }
    }

    let data = ListData {
        search_term: &state.search_term,
        sort: state.sort,
        page_size: state.page_size,
        sort_keys: SortKey::ALL.iter().map(|k| k.as_str()).collect(),
        items: entries
            .iter()
            .zip(ranks)
            .map(|(entry, ranks)| ListItem {
                name: &entry.name,
                url: &entry.download_url,
                icon: icon_for(&entry.file_type),
                size: format_file_size(entry.size),
                date: format_optional_date(entry.last_modified.as_ref(), offset),
                file_type: format_file_type(&entry.file_type),
                ranks,
            })
            .collect(),
    };
    // `<` only occurs inside JSON strings, where `\u003c` is equivalent.
    Ok(serde_json::to_string(&data)?.replace('<', "\\u003c"))
}

/// Write every result page for `state` into `output_dir`.
///
/// `state.page` is ignored; all pages are written. An empty result still
/// writes `index.html` with an empty list and no pagination. Pages beyond the
/// new last page from an earlier run are deleted.
pub fn write_pages(
    output_dir: &Path,
    entries: &[Entry],
    state: &ViewState,
    config: &SiteConfig,
    now: DateTime<Utc>,
) -> Result<RenderReport, RenderError> {
    fs::create_dir_all(output_dir)?;
    let css = page_css(config);
    let list_data = list_data_json(entries, state, config)?;

    let first = render_view(entries, &ViewState { page: 1, ..state.clone() }, now);
    let total_pages = first
        .pagination
        .as_ref()
        .map(|p| p.total_pages)
        .unwrap_or(1);
    let matched = first.pagination.as_ref().map(|p| p.total_items).unwrap_or(0);
    let stats = first.stats.clone();

    let mut pages = Vec::with_capacity(total_pages);
    for page in 1..=total_pages {
        let page_state = ViewState {
            page,
            ..state.clone()
        };
        let view = render_view(entries, &page_state, now);
        let file_name = page_file_name(page);
        let markup = render_page(&view, &page_state, config, &css, &list_data);
        fs::write(output_dir.join(&file_name), markup.into_string())?;
        debug!("wrote {file_name} ({} entries)", view.visible.len());
        pages.push(file_name);
    }
    remove_stale_pages(output_dir, total_pages)?;

    Ok(RenderReport {
        pages,
        matched,
        stats,
    })
}

/// Write the load-failure page as `index.html`, dropping any `page-N.html`
/// so no outdated list stays reachable.
pub fn write_error_page(
    output_dir: &Path,
    message: &str,
    config: &SiteConfig,
) -> Result<PathBuf, RenderError> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(page_file_name(1));
    let markup = render_error_page(message, config, &page_css(config));
    fs::write(&path, markup.into_string())?;
    remove_stale_pages(output_dir, 1)?;
    Ok(path)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Theme state of a first visit: nothing stored, light system scheme.
/// `theme.js` corrects both before first paint.
fn initial_theme() -> ThemeController<MemoryStore> {
    ThemeController::load(MemoryStore::default(), false)
}

fn base_document(title: &str, css: &str, content: Markup) -> Markup {
    let theme = initial_theme();
    html! {
        (DOCTYPE)
        html lang="pt-BR" class=[theme.mode().root_class()] {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                meta name="color-scheme" content="light dark";
                title { (title) }
                style { (PreEscaped(css)) }
                script data-storage-key=(STORAGE_KEY) data-dark-class=(DARK_CLASS) {
                    (PreEscaped(THEME_JS))
                }
            }
            body {
                (content)
            }
        }
    }
}

fn site_header(title: &str) -> Markup {
    let initial = initial_theme().preference();
    html! {
        header.site-header {
            h1 { (title) }
            div.theme-picker {
                label for="theme-select" { "Tema" }
                select #theme-select {
                    @for pref in ThemePreference::ALL {
                        option value=(pref.as_str()) selected[pref == initial] {
                            (pref.label())
                        }
                    }
                }
            }
        }
    }
}

fn stats_strip(stats: &Stats, offset: FixedOffset) -> Markup {
    html! {
        section.stats {
            div.stat {
                span.stat-label { "Total de arquivos" }
                span #total-files .stat-value { (stats.total_files) }
            }
            div.stat {
                span.stat-label { "Tamanho total" }
                span #total-size .stat-value { (format_file_size(stats.total_size)) }
            }
            div.stat {
                span.stat-label { "Última atualização" }
                span #last-update .stat-value {
                    (format_optional_date(stats.last_update.as_ref(), offset))
                }
            }
            div.stat {
                span.stat-label { "Gerado em" }
                span #build-date .stat-value {
                    (format_optional_date(Some(&stats.generated_at), offset))
                }
            }
        }
    }
}

/// Offered page sizes, with `current` added in order when it is not one of
/// them.
fn page_size_options(page_sizes: &[usize], current: usize) -> Vec<usize> {
    let mut sizes = page_sizes.to_vec();
    if !sizes.contains(&current) {
        sizes.push(current);
        sizes.sort_unstable();
    }
    sizes
}

fn controls(state: &ViewState, page_sizes: &[usize]) -> Markup {
    html! {
        form.controls role="search" hidden {
            input #search type="search" name="q" value=(state.search_term)
                placeholder="Buscar arquivos..." aria-label="Buscar arquivos";
            select #sort-select name="sort" aria-label="Ordenar" {
                @for key in SortKey::ALL {
                    option value=(key.as_str()) selected[key == state.sort] { (key.label()) }
                }
            }
            select #items-per-page name="per_page" aria-label="Itens por página" {
                @for size in page_size_options(page_sizes, state.page_size) {
                    option value=(size) selected[size == state.page_size] { (size) " por página" }
                }
            }
        }
    }
}

fn file_item(entry: &Entry, offset: FixedOffset) -> Markup {
    html! {
        li.file-item {
            span.file-icon aria-hidden="true" { (icon_for(&entry.file_type)) }
            div.file-info {
                a.file-name href=(entry.download_url) target="_blank" rel="noopener noreferrer" {
                    (entry.name)
                }
                div.file-meta {
                    span.file-size { (format_file_size(entry.size)) }
                    span.file-date { (format_optional_date(entry.last_modified.as_ref(), offset)) }
                    span.file-type { (format_file_type(&entry.file_type)) }
                }
            }
        }
    }
}

fn file_list(visible: &[&Entry], offset: FixedOffset) -> Markup {
    html! {
        ul #file-list .file-list {
            @for entry in visible {
                (file_item(entry, offset))
            }
            @if visible.is_empty() {
                li.empty-state { "Nenhum arquivo encontrado" }
            }
        }
    }
}

/// Previous/next plus the page-number strip. Renders an empty container
/// when there is nothing to paginate.
pub fn pagination_controls(pagination: Option<&Pagination>) -> Markup {
    html! {
        nav #pagination .pagination aria-label="Paginação" {
            @if let Some(p) = pagination {
                @if p.has_previous {
                    a.page-button.prev href=(page_file_name(p.current - 1)) data-page=(p.current - 1) {
                        "« Anterior"
                    }
                } @else {
                    span.page-button.prev.disabled aria-disabled="true" { "« Anterior" }
                }
                @for item in &p.items {
                    @match item {
                        PageItem::Page { number, current: true } => {
                            span.page-button.current aria-current="page" { (number) }
                        }
                        PageItem::Page { number, current: false } => {
                            a.page-button href=(page_file_name(*number)) data-page=(number) { (number) }
                        }
                        PageItem::Ellipsis => {
                            span.page-ellipsis { "…" }
                        }
                    }
                }
                @if p.has_next {
                    a.page-button.next href=(page_file_name(p.current + 1)) data-page=(p.current + 1) {
                        "Próxima »"
                    }
                } @else {
                    span.page-button.next.disabled aria-disabled="true" { "Próxima »" }
                }
            }
        }
        p #pagination-info .pagination-info {
            @if let Some(p) = pagination {
                (p.summary())
            }
        }
    }
}

// ============================================================================
// Pages
// ============================================================================

/// One result page. `list_data` is the [`list_data_json`] payload shared by
/// every page of the run.
pub fn render_page(
    view: &View<'_>,
    state: &ViewState,
    config: &SiteConfig,
    css: &str,
    list_data: &str,
) -> Markup {
    let offset = display_offset(config.utc_offset_hours);
    let current = view.pagination.as_ref().map(|p| p.current).unwrap_or(1);
    let content = html! {
        (site_header(&config.viewer.title))
        main {
            (stats_strip(&view.stats, offset))
            (controls(state, &config.viewer.page_sizes))
            div #loading .loading hidden { "Carregando..." }
            (file_list(&view.visible, offset))
            (pagination_controls(view.pagination.as_ref()))
        }
        script #file-data type="application/json" data-page=(current) { (PreEscaped(list_data)) }
        script { (PreEscaped(LIST_JS)) }
    };
    base_document(&config.viewer.title, css, content)
}

/// Load-failure page: the message and a link back to the first page, which
/// the next successful render overwrites.
pub fn render_error_page(message: &str, config: &SiteConfig, css: &str) -> Markup {
    let content = html! {
        (site_header(&config.viewer.title))
        main {
            div.error-state role="alert" {
                p { "Erro ao carregar a lista de arquivos." }
                p.error-detail { (message) }
                a.reload-button href=(page_file_name(1)) { "Tentar novamente" }
            }
        }
    };
    base_document(&config.viewer.title, css, content)
}
