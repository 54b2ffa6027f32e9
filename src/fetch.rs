//! Remote source refresh.
//!
//! Downloads the files listed under `[[fetch.sources]]` into the root
//! directory before the manifest is generated. Sources are fetched in
//! parallel on a bounded [rayon](https://docs.rs/rayon) pool; each source is
//! retried independently.
//!
//! ## Per-source rules
//!
//! - URLs must start with `http://` or `https://`; anything else fails
//!   without a request.
//! - A transport error, a non-2xx status, or an empty body is a failed
//!   attempt. Up to `retries` attempts are made, `retry_delay_secs` apart.
//! - Bodies are written to a temp file in the target directory and renamed
//!   into place, so a failed attempt never clobbers the previous copy.
//! - A successful download reports its size and SHA-256 digest.
//!
//! One failing source does not stop the others; the caller decides the exit
//! status from the [`FetchSummary`].

use crate::config::{FetchConfig, FetchSource, effective_workers};
use log::{info, warn};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;
use std::sync::mpsc::Sender;
use std::time::Duration;
use tempfile::NamedTempFile;
use thiserror::Error;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; file-index)";

/// Extensions removed by `fetch --clean`.
const CLEANABLE_SUFFIXES: &[&str] = &[".m3u", ".xml.gz"];

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("Empty response body")]
    EmptyBody,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Progress reported while fetching, consumed by the CLI printer.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Attempt {
        name: String,
        attempt: u32,
        retries: u32,
    },
    AttemptFailed {
        name: String,
        attempt: u32,
        error: String,
    },
    Saved {
        name: String,
        bytes: u64,
        sha256: String,
    },
    GaveUp {
        name: String,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Saved {
    pub bytes: u64,
    pub sha256: String,
}

/// Result of a fetch run, in source order.
#[derive(Debug, Default)]
pub struct FetchSummary {
    pub saved: Vec<(String, Saved)>,
    pub failed: Vec<(String, String)>,
}

impl FetchSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub fn is_valid_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Whether `--clean` removes this file.
pub fn is_cleanable(name: &str) -> bool {
    CLEANABLE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Delete cleanable files directly inside `dir`. Returns the removed names.
pub fn clean(dir: &Path) -> Result<Vec<String>, FetchError> {
    let mut removed = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.file_type()?.is_file() && is_cleanable(&name) {
            std::fs::remove_file(entry.path())?;
            info!("removed {name}");
            removed.push(name);
        }
    }
    Ok(removed)
}

/// Download every configured source into `dir`.
pub fn fetch_all(
    dir: &Path,
    config: &FetchConfig,
    events: Option<Sender<FetchEvent>>,
) -> Result<FetchSummary, FetchError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(USER_AGENT)
        .build()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(effective_workers(config))
        .build()?;

    let outcomes: Vec<(String, Result<Saved, FetchError>)> = pool.install(|| {
        config
            .sources
            .par_iter()
            .map(|source| {
                let result = fetch_source(&client, source, dir, config, events.as_ref());
                (source.name.clone(), result)
            })
            .collect()
    });

    let mut summary = FetchSummary::default();
    for (name, result) in outcomes {
        match result {
            Ok(saved) => summary.saved.push((name, saved)),
            Err(err) => summary.failed.push((name, err.to_string())),
        }
    }
    Ok(summary)
}

fn emit(events: Option<&Sender<FetchEvent>>, event: FetchEvent) {
    if let Some(tx) = events {
        // The printer may have gone away; progress is best-effort.
        let _ = tx.send(event);
    }
}

/// Download one source with retries.
pub fn fetch_source(
    client: &reqwest::blocking::Client,
    source: &FetchSource,
    dir: &Path,
    config: &FetchConfig,
    events: Option<&Sender<FetchEvent>>,
) -> Result<Saved, FetchError> {
    let give_up = |err: FetchError| {
        warn!("giving up on {}: {err}", source.url);
        emit(
            events,
            FetchEvent::GaveUp {
                name: source.name.clone(),
                error: err.to_string(),
            },
        );
        Err(err)
    };

    if !is_valid_url(&source.url) {
        return give_up(FetchError::InvalidUrl(source.url.clone()));
    }

    let retries = config.retries.max(1);
    let target = dir.join(&source.name);
    let mut attempt = 1;
    loop {
        info!("attempt {attempt}/{retries}: downloading {}", source.url);
        emit(
            events,
            FetchEvent::Attempt {
                name: source.name.clone(),
                attempt,
                retries,
            },
        );

        match download_once(client, &source.url, &target) {
            Ok(saved) => {
                info!(
                    "saved {} ({} bytes, sha256 {})",
                    target.display(),
                    saved.bytes,
                    saved.sha256
                );
                emit(
                    events,
                    FetchEvent::Saved {
                        name: source.name.clone(),
                        bytes: saved.bytes,
                        sha256: saved.sha256.clone(),
                    },
                );
                return Ok(saved);
            }
            Err(err) => {
                warn!("attempt {attempt} for {} failed: {err}", source.url);
                emit(
                    events,
                    FetchEvent::AttemptFailed {
                        name: source.name.clone(),
                        attempt,
                        error: err.to_string(),
                    },
                );
                if attempt >= retries {
                    return give_up(err);
                }
                std::thread::sleep(Duration::from_secs(config.retry_delay_secs));
                attempt += 1;
            }
        }
    }
}

fn download_once(
    client: &reqwest::blocking::Client,
    url: &str,
    target: &Path,
) -> Result<Saved, FetchError> {
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    let body = response.bytes()?;
    if body.is_empty() {
        return Err(FetchError::EmptyBody);
    }

    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(&body)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;

    Ok(Saved {
        bytes: body.len() as u64,
        sha256: format!("{:x}", Sha256::digest(&body)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use tempfile::TempDir;

    /// Serve the given raw HTTP responses, one per connection, in order.
    fn serve(responses: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            for response in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut line = String::new();
                while reader.read_line(&mut line).unwrap() > 0 {
                    if line == "\r\n" {
                        break;
                    }
                    line.clear();
                }
                stream.write_all(response.as_bytes()).unwrap();
            }
        });
        format!("http://{addr}")
    }

    fn http(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}/gone.m3u", listener.local_addr().unwrap())
    }

    fn quick_config(sources: Vec<FetchSource>) -> FetchConfig {
        FetchConfig {
            timeout_secs: 5,
            retries: 2,
            retry_delay_secs: 0,
            max_workers: 2,
            sources,
        }
    }

    fn source(name: &str, url: String) -> FetchSource {
        FetchSource {
            name: name.to_string(),
            url,
        }
    }

    #[test]
    fn url_validation() {
        assert!(is_valid_url("https://example.com/a.m3u"));
        assert!(is_valid_url("http://example.com/a.m3u"));
        assert!(!is_valid_url("ftp://example.com/a.m3u"));
        assert!(!is_valid_url("example.com/a.m3u"));
    }

    #[test]
    fn clean_removes_only_playlist_artifacts() {
        let tmp = setup_site(&[
            ("a.m3u", "x"),
            ("guide.xml.gz", "x"),
            ("guide.xml", "x"),
            ("notes.txt", "x"),
        ]);
        let mut removed = clean(tmp.path()).unwrap();
        removed.sort();
        assert_eq!(removed, vec!["a.m3u", "guide.xml.gz"]);
        assert!(tmp.path().join("guide.xml").exists());
        assert!(tmp.path().join("notes.txt").exists());
    }

    #[test]
    fn no_sources_is_empty_success() {
        let tmp = TempDir::new().unwrap();
        let summary = fetch_all(tmp.path(), &quick_config(vec![]), None).unwrap();
        assert!(summary.is_success());
        assert!(summary.saved.is_empty());
    }

    #[test]
    fn successful_download_is_saved_with_digest() {
        let tmp = TempDir::new().unwrap();
        let base = serve(vec![http("200 OK", "#EXTM3U")]);
        let config = quick_config(vec![source("list.m3u", format!("{base}/list.m3u"))]);

        let summary = fetch_all(tmp.path(), &config, None).unwrap();
        assert!(summary.is_success());
        let (name, saved) = &summary.saved[0];
        assert_eq!(name, "list.m3u");
        assert_eq!(saved.bytes, 7);
        assert_eq!(saved.sha256, format!("{:x}", Sha256::digest(b"#EXTM3U")));
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("list.m3u")).unwrap(),
            "#EXTM3U"
        );
    }

    #[test]
    fn error_status_then_success_is_retried() {
        let tmp = TempDir::new().unwrap();
        let base = serve(vec![http("503 Service Unavailable", ""), http("200 OK", "ok")]);
        let config = quick_config(vec![source("a.m3u", format!("{base}/a.m3u"))]);
        let (tx, rx) = mpsc::channel();

        let summary = fetch_all(tmp.path(), &config, Some(tx)).unwrap();
        assert!(summary.is_success());

        let events: Vec<FetchEvent> = rx.iter().collect();
        assert!(matches!(
            events[1],
            FetchEvent::AttemptFailed { attempt: 1, .. }
        ));
        assert!(matches!(events.last(), Some(FetchEvent::Saved { bytes: 2, .. })));
    }

    #[test]
    fn empty_body_is_not_kept() {
        let tmp = TempDir::new().unwrap();
        let base = serve(vec![http("200 OK", ""), http("200 OK", "")]);
        let config = quick_config(vec![source("empty.m3u", format!("{base}/e"))]);

        let summary = fetch_all(tmp.path(), &config, None).unwrap();
        assert!(!summary.is_success());
        assert_eq!(summary.failed[0].1, "Empty response body");
        assert!(!tmp.path().join("empty.m3u").exists());
    }

    #[test]
    fn failed_download_keeps_previous_copy() {
        let tmp = setup_site(&[("a.m3u", "old")]);
        let base = serve(vec![http("404 Not Found", ""), http("404 Not Found", "")]);
        let config = quick_config(vec![source("a.m3u", format!("{base}/a"))]);

        let summary = fetch_all(tmp.path(), &config, None).unwrap();
        assert_eq!(summary.failed[0].1, "HTTP status 404");
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("a.m3u")).unwrap(),
            "old"
        );
    }

    #[test]
    fn unreachable_source_exhausts_retries() {
        let tmp = TempDir::new().unwrap();
        let config = quick_config(vec![source("gone.m3u", closed_port_url())]);
        let (tx, rx) = mpsc::channel();

        let summary = fetch_all(tmp.path(), &config, Some(tx)).unwrap();
        assert_eq!(summary.failed.len(), 1);

        let events: Vec<FetchEvent> = rx.iter().collect();
        let attempts = events
            .iter()
            .filter(|e| matches!(e, FetchEvent::Attempt { .. }))
            .count();
        assert_eq!(attempts, 2);
        assert!(matches!(events.last(), Some(FetchEvent::GaveUp { .. })));
    }

    #[test]
    fn invalid_url_fails_without_attempt() {
        let tmp = TempDir::new().unwrap();
        let config = quick_config(vec![source("x.m3u", "file:///etc/passwd".into())]);
        let (tx, rx) = mpsc::channel();

        let summary = fetch_all(tmp.path(), &config, Some(tx)).unwrap();
        assert!(summary.failed[0].1.starts_with("Invalid URL"));
        let events: Vec<FetchEvent> = rx.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], FetchEvent::GaveUp { .. }));
    }

    #[test]
    fn one_failure_does_not_stop_others() {
        let tmp = TempDir::new().unwrap();
        let base = serve(vec![http("200 OK", "data")]);
        let config = quick_config(vec![
            source("bad.m3u", "nope".into()),
            source("good.m3u", format!("{base}/good")),
        ]);

        let summary = fetch_all(tmp.path(), &config, None).unwrap();
        assert_eq!(summary.saved.len(), 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.saved[0].0, "good.m3u");
        assert_eq!(summary.failed[0].0, "bad.m3u");
    }
}
