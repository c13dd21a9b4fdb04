//! Travel-distance resolution for office selection.
//!
//! Distances come from a persisted JSON cache first, then from the
//! Distance Matrix API for anything unseen. Destinations the API
//! reports as unroutable are simply omitted; the selector treats a
//! missing entry as "do not go there".

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::errors::BookingError;

/// Public endpoint of the Distance Matrix API.
pub const DISTANCE_MATRIX_ENDPOINT: &str =
    "https://maps.googleapis.com/maps/api/distancematrix/json";

/// The Distance Matrix API accepts at most this many destinations per
/// call.
pub const DISTANCE_MATRIX_BATCH_LIMIT: usize = 25;

/// External distance lookup. Implementations declare their own chunk
/// limit; the resolver respects it.
#[allow(async_fn_in_trait)]
pub trait DistanceLookup {
    /// Maximum destinations per `lookup` call.
    fn batch_limit(&self) -> usize;

    /// Travel distance in meters from `origin` to each destination.
    /// Unroutable destinations are omitted from the result, not errors.
    async fn lookup(
        &self,
        origin: &str,
        destinations: &[String],
    ) -> Result<HashMap<String, u32>, BookingError>;
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<MatrixDistance>,
}

#[derive(Debug, Deserialize)]
struct MatrixDistance {
    value: u32,
}

/// Distance Matrix API client.
pub struct DistanceMatrixClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: Url,
}

impl DistanceMatrixClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, BookingError> {
        let endpoint = Url::parse(DISTANCE_MATRIX_ENDPOINT)
            .map_err(|e| BookingError::Transport(e.to_string()))?;
        Self::with_endpoint(api_key, endpoint)
    }

    /// Point the client at a different endpoint (used by tests).
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: Url) -> Result<Self, BookingError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(DistanceMatrixClient {
            http,
            api_key: api_key.into(),
            endpoint,
        })
    }
}

impl DistanceLookup for DistanceMatrixClient {
    fn batch_limit(&self) -> usize {
        DISTANCE_MATRIX_BATCH_LIMIT
    }

    async fn lookup(
        &self,
        origin: &str,
        destinations: &[String],
    ) -> Result<HashMap<String, u32>, BookingError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("language", "en")
            .append_pair("region", "es")
            .append_pair("origins", origin)
            .append_pair("destinations", &destinations.join("|"));

        let response = self.http.get(url).send().await.map_err(|e| {
            BookingError::DistanceService {
                message: e.to_string(),
                fatal: false,
            }
        })?;
        if !response.status().is_success() {
            return Err(BookingError::DistanceService {
                message: format!("distance API returned HTTP {}", response.status()),
                fatal: false,
            });
        }

        let body: MatrixResponse =
            response
                .json()
                .await
                .map_err(|e| BookingError::DistanceService {
                    message: format!("unparseable distance API response: {e}"),
                    fatal: false,
                })?;
        if body.status != "OK" || body.rows.is_empty() {
            return Err(BookingError::DistanceService {
                message: format!("distance API status {}", body.status),
                // a rejected key will never start working on retry
                fatal: body.status == "REQUEST_DENIED",
            });
        }

        let mut distances = HashMap::new();
        for (destination, element) in destinations.iter().zip(&body.rows[0].elements) {
            match (&element.status[..], &element.distance) {
                ("OK", Some(d)) => {
                    distances.insert(destination.clone(), d.value);
                }
                _ => debug!(destination = %destination, "no route to destination"),
            }
        }
        Ok(distances)
    }
}

/// File-backed distance cache. Loading is best-effort: a missing file
/// is a cold start, not an error. Writes are serialized behind one
/// lock; entries are never invalidated during a run.
pub struct DistanceCache {
    path: Option<PathBuf>,
    entries: Mutex<HashMap<String, u32>>,
}

impl DistanceCache {
    pub fn load(path: PathBuf) -> Self {
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring unparseable distance cache");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        debug!(entries = entries.len(), "loaded distance cache");
        DistanceCache {
            path: Some(path),
            entries: Mutex::new(entries),
        }
    }

    /// Cache with no backing file; useful for tests and one-off runs.
    pub fn in_memory() -> Self {
        DistanceCache {
            path: None,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn preloaded(entries: HashMap<String, u32>) -> Self {
        DistanceCache {
            path: None,
            entries: Mutex::new(entries),
        }
    }

    pub async fn snapshot(&self) -> HashMap<String, u32> {
        self.entries.lock().await.clone()
    }

    /// Merge new entries and persist. Last writer wins on duplicate
    /// keys; persistence failures are logged, not fatal.
    pub async fn extend(&self, new: &HashMap<String, u32>) {
        if new.is_empty() {
            return;
        }
        let mut entries = self.entries.lock().await;
        entries.extend(new.iter().map(|(k, v)| (k.clone(), *v)));
        if let Some(path) = &self.path {
            match serde_json::to_string(&*entries) {
                Ok(raw) => {
                    if let Err(e) = std::fs::write(path, raw) {
                        warn!(path = %path.display(), error = %e, "failed to persist distance cache");
                    }
                }
                Err(e) => warn!(error = %e, "failed to serialize distance cache"),
            }
        }
    }
}

/// Cache-first distance resolution with batched lookups for misses.
pub struct DistanceResolver<L> {
    lookup: L,
    cache: Arc<DistanceCache>,
}

impl<L: DistanceLookup> DistanceResolver<L> {
    pub fn new(lookup: L, cache: Arc<DistanceCache>) -> Self {
        DistanceResolver { lookup, cache }
    }

    /// Distances from `origin` to each named office. Cache hits are
    /// served directly; misses go to the external lookup in chunks of
    /// its declared batch limit. Unroutable offices are omitted. A
    /// partial result is not an error.
    pub async fn resolve(
        &self,
        origin: &str,
        office_names: &[String],
    ) -> Result<HashMap<String, u32>, BookingError> {
        let cached = self.cache.snapshot().await;

        let mut distances = HashMap::new();
        let mut misses = Vec::new();
        for name in office_names {
            match cached.get(name) {
                Some(d) => {
                    distances.insert(name.clone(), *d);
                }
                None => misses.push(name.clone()),
            }
        }
        if misses.is_empty() {
            return Ok(distances);
        }

        debug!(hits = distances.len(), misses = misses.len(), "resolving distances");
        let limit = self.lookup.batch_limit().max(1);
        let mut fresh = HashMap::new();
        for chunk in misses.chunks(limit) {
            fresh.extend(self.lookup.lookup(origin, chunk).await?);
        }
        self.cache.extend(&fresh).await;
        distances.extend(fresh);
        Ok(distances)
    }
}

#[cfg(test)]
#[path = "distance_test.rs"]
mod distance_test;
