//! Listed-company registry (CVM "cadastro de companhias abertas")
//!
//! The registry is a `;`-delimited Latin-1 CSV published by CVM. Only the
//! CNPJ roots are kept. The set is memoized by [`RegistryCache`] for a fixed
//! window. Fetch failures are never cached so the next request retries.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::ingest::{decode_latin1, read_delimited};
use crate::normalize::{cnpj_root, CNPJ_ROOT_LEN};
use crate::{Error, Result};

/// Default CVM registry location
pub const CVM_URL: &str = "https://dados.cvm.gov.br/dados/CIA_ABERTA/CAD/DADOS/cad_cia_aberta.csv";

/// Default network timeout for the registry download
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Default memoization window (24h)
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 3600);

const USER_AGENT: &str = concat!("brazil-tech-mapper/", env!("CARGO_PKG_VERSION"));

/// Deduplicated set of listed CNPJ roots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListedSet {
    roots: HashSet<String>,
}

impl ListedSet {
    /// Build from raw identifiers; anything that is not a full root is dropped
    pub fn from_identifiers<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roots = identifiers
            .into_iter()
            .map(|id| cnpj_root(id.as_ref()))
            .filter(|root| root.len() == CNPJ_ROOT_LEN)
            .collect();
        Self { roots }
    }

    /// Membership test on a canonical root
    pub fn contains(&self, root: &str) -> bool {
        !root.is_empty() && self.roots.contains(root)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Parse the registry text into a [`ListedSet`]
///
/// The identifier column is the first header containing "CNPJ"
/// (case-insensitive).
pub fn parse_registry(text: &str) -> Result<ListedSet> {
    let table = read_delimited(text, b';')?;
    let column = table
        .headers
        .iter()
        .position(|h| h.to_uppercase().contains("CNPJ"))
        .ok_or_else(|| {
            Error::RegistryShape(format!(
                "no CNPJ column in registry header: {}",
                table.headers.join(";")
            ))
        })?;

    debug!("Registry CNPJ column: {}", table.headers[column]);
    Ok(ListedSet::from_identifiers(
        (0..table.len()).map(|row| table.cell(row, column)),
    ))
}

/// Source of the listed-company set
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Short description for logs (URL, path, ...)
    fn describe(&self) -> String;

    /// Download and parse the registry
    async fn fetch(&self) -> Result<ListedSet>;
}

/// Registry downloaded over HTTP
pub struct HttpRegistrySource {
    http_client: reqwest::Client,
    url: String,
}

impl HttpRegistrySource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http_client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RegistrySource for HttpRegistrySource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<ListedSet> {
        let response = self.http_client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Registry(format!(
                "GET {} returned HTTP {}",
                self.url, status
            )));
        }
        let body = response.bytes().await?;
        parse_registry(&decode_latin1(&body))
    }
}

/// Registry read from a local copy of the CVM file
pub struct FileRegistrySource {
    path: PathBuf,
}

impl FileRegistrySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RegistrySource for FileRegistrySource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<ListedSet> {
        let bytes = tokio::fs::read(&self.path).await?;
        parse_registry(&decode_latin1(&bytes))
    }
}

/// Fixed in-memory registry
pub struct StaticRegistrySource {
    set: ListedSet,
}

impl StaticRegistrySource {
    pub fn new(set: ListedSet) -> Self {
        Self { set }
    }
}

#[async_trait]
impl RegistrySource for StaticRegistrySource {
    fn describe(&self) -> String {
        format!("static ({} roots)", self.set.len())
    }

    async fn fetch(&self) -> Result<ListedSet> {
        Ok(self.set.clone())
    }
}

#[derive(Debug, Clone)]
struct CachedSet {
    set: Arc<ListedSet>,
    expires_at: DateTime<Utc>,
}

/// Time-windowed memo over a [`RegistrySource`]
///
/// Callers pass the current time so expiry is testable without a wall clock.
/// Fetches are serialized by `fetch_lock`; the entry itself is only locked
/// briefly, so status reads never wait on a download in flight.
pub struct RegistryCache {
    source: Arc<dyn RegistrySource>,
    ttl: ChronoDuration,
    entry: RwLock<Option<CachedSet>>,
    fetch_lock: Mutex<()>,
}

impl RegistryCache {
    pub fn new(source: Arc<dyn RegistrySource>, ttl: Duration) -> Self {
        let ttl = ChronoDuration::from_std(ttl).unwrap_or_else(|_| {
            warn!(
                "Registry cache window of {}s is out of range, entries will not expire",
                ttl.as_secs()
            );
            ChronoDuration::MAX
        });
        Self {
            source,
            ttl,
            entry: RwLock::new(None),
            fetch_lock: Mutex::new(()),
        }
    }

    /// Cached set if still fresh at `now`, otherwise fetch and store
    pub async fn get(&self, now: DateTime<Utc>) -> Result<Arc<ListedSet>> {
        if let Some(set) = self.fresh(now).await {
            return Ok(set);
        }

        let _fetching = self.fetch_lock.lock().await;
        // Another request may have finished the fetch while we waited
        if let Some(set) = self.fresh(now).await {
            return Ok(set);
        }
        self.fetch_and_store(now).await
    }

    /// Refetch regardless of expiry
    ///
    /// On failure the previous entry is left untouched.
    pub async fn refresh(&self, now: DateTime<Utc>) -> Result<Arc<ListedSet>> {
        let _fetching = self.fetch_lock.lock().await;
        self.fetch_and_store(now).await
    }

    /// Drop the cached set
    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
    }

    /// Expiry of the current entry, if any
    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.entry.read().await.as_ref().map(|c| c.expires_at)
    }

    async fn fresh(&self, now: DateTime<Utc>) -> Option<Arc<ListedSet>> {
        let entry = self.entry.read().await;
        let cached = entry.as_ref()?;
        if now < cached.expires_at {
            Some(Arc::clone(&cached.set))
        } else {
            debug!("Registry cache expired at {}", cached.expires_at);
            None
        }
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    async fn fetch_and_store(&self, now: DateTime<Utc>) -> Result<Arc<ListedSet>> {
        let origin = self.source.describe();
        info!("Fetching listed-company registry from {}", origin);
        match self.source.fetch().await {
            Ok(set) => {
                info!("Registry loaded: {} listed CNPJ roots", set.len());
                let set = Arc::new(set);
                *self.entry.write().await = Some(CachedSet {
                    set: Arc::clone(&set),
                    expires_at: self.expiry_from(now),
                });
                Ok(set)
            }
            Err(e) => {
                warn!("Registry fetch from {} failed: {}", origin, e);
                Err(e)
            }
        }
    }
}
