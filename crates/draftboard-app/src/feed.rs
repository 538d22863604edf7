// Ranked-player feeds: where the available pool comes from.
//
// A feed only produces the raw payload (a JSON array of provider rows).
// `load_pool` runs it through normalization and scoring.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Number, Value};
use thiserror::Error;
use tracing::{debug, info};

use draftboard_core::draft::player::Player;
use draftboard_core::draft::state::sort_by_rank;
use draftboard_core::valuation::metrics::{score_players, MetricsPolicy};
use draftboard_core::valuation::normalize::normalize_feed;

use crate::config::FeedConfig;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("feed at {url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("no feed source configured")]
    NotConfigured,
}

// ---------------------------------------------------------------------------
// Feed trait
// ---------------------------------------------------------------------------

/// A source of raw ranked-player rows.
#[async_trait]
pub trait PlayerFeed: Send + Sync {
    /// Fetch the raw payload. Anything other than a JSON array is treated as
    /// an empty feed downstream.
    async fn fetch(&self) -> Result<Value, FeedError>;

    /// Human-readable source, for logs.
    fn describe(&self) -> String;
}

/// Build the configured feed. The HTTP endpoint wins when both are set.
pub fn feed_from_config(config: &FeedConfig) -> Result<Arc<dyn PlayerFeed>, FeedError> {
    if let Some(url) = &config.url {
        let feed = HttpFeed::new(url.clone(), Duration::from_secs(config.timeout_secs))?;
        return Ok(Arc::new(feed));
    }
    if let Some(path) = &config.csv_path {
        return Ok(Arc::new(CsvFeed::new(path)));
    }
    Err(FeedError::NotConfigured)
}

/// Fetch, normalize, score, and rank-order a fresh pool.
pub async fn load_pool(feed: &dyn PlayerFeed, policy: &MetricsPolicy) -> Result<Vec<Player>, FeedError> {
    info!("fetching player pool from {}", feed.describe());
    let payload = feed.fetch().await?;

    let normalized = normalize_feed(&payload);
    let mut pool = score_players(&normalized, policy);
    sort_by_rank(&mut pool);

    info!("loaded {} players", pool.len());
    Ok(pool)
}

// ---------------------------------------------------------------------------
// HTTP JSON feed
// ---------------------------------------------------------------------------

pub struct HttpFeed {
    http: reqwest::Client,
    url: String,
}

impl HttpFeed {
    pub fn new(url: String, timeout: Duration) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FeedError::Client)?;
        Ok(Self { http, url })
    }
}

#[async_trait]
impl PlayerFeed for HttpFeed {
    async fn fetch(&self) -> Result<Value, FeedError> {
        let http_err = |source| FeedError::Http {
            url: self.url.clone(),
            source,
        };

        let response = self.http.get(&self.url).send().await.map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: self.url.clone(),
                status,
            });
        }
        response.json::<Value>().await.map_err(http_err)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

// ---------------------------------------------------------------------------
// Local CSV feed
// ---------------------------------------------------------------------------

pub struct CsvFeed {
    path: PathBuf,
}

impl CsvFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PlayerFeed for CsvFeed {
    async fn fetch(&self) -> Result<Value, FeedError> {
        let path = self.path.display().to_string();
        let bytes = tokio::fs::read(&self.path).await.map_err(|source| FeedError::Io {
            path: path.clone(),
            source,
        })?;
        csv_to_json(bytes.as_slice()).map_err(|source| FeedError::Csv { path, source })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Convert CSV with a header row into a JSON array of objects.
///
/// Cells are typed: integers and finite floats become numbers, `true` and
/// `false` become booleans, and empty cells are left out so they read as
/// absent fields.
pub fn csv_to_json<R: Read>(rdr: R) -> Result<Value, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = Map::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            if let Some(value) = typed_cell(cell) {
                row.insert(header.trim().to_string(), value);
            }
        }
        if row.is_empty() {
            debug!("skipping blank CSV row");
            continue;
        }
        rows.push(Value::Object(row));
    }
    Ok(Value::Array(rows))
}

fn typed_cell(cell: &str) -> Option<Value> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Ok(n) = cell.parse::<i64>() {
        return Some(Value::Number(n.into()));
    }
    if let Some(n) = cell.parse::<f64>().ok().and_then(Number::from_f64) {
        return Some(Value::Number(n));
    }
    match cell {
        "true" | "TRUE" => Some(Value::Bool(true)),
        "false" | "FALSE" => Some(Value::Bool(false)),
        _ => Some(Value::String(cell.to_string())),
    }
}
