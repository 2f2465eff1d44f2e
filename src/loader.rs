use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::LoadCache;
use crate::domain::FormatType;
use crate::error::StanzaError;
use crate::formats::{Dataset, decode};
use crate::request::{CacheKey, build_request_url};
use crate::transport::{FetchRequest, Transport};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10 * 60 * 1000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub url: String,
    pub format: FormatType,
    pub timeout: Duration,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl LoadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: FormatType::default(),
            timeout: DEFAULT_TIMEOUT,
            limit: None,
            offset: None,
        }
    }

    pub fn format(mut self, format: FormatType) -> Self {
        self.format = format;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: Option<u64>) -> Self {
        self.offset = offset;
        self
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.url, self.format, self.limit, self.offset)
    }
}

pub trait LoadNotifier: Send + Sync {
    fn on_begin_load(&self);
    fn on_end_load(&self);
    fn on_error(&self, message: &str);
}

pub struct DataLoader<T: Transport> {
    transport: T,
    cache: LoadCache,
}

impl<T: Transport> DataLoader<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            cache: LoadCache::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cache(&self) -> &LoadCache {
        &self.cache
    }

    /// Loads one dataset.
    ///
    /// A request whose cache key matches the last successful load returns the
    /// cached dataset as is: no fetch, no notifier events, no re-stamping.
    /// Otherwise the fetch races a timer of `request.timeout`; on success the
    /// rows are stamped with their positions and the result replaces the
    /// cache slot. Failures are reported to the notifier and then returned.
    pub async fn load(
        &self,
        request: &LoadRequest,
        notifier: Option<&dyn LoadNotifier>,
    ) -> Result<Arc<Dataset>, StanzaError> {
        let key = request.cache_key();
        if let Some(dataset) = self.cache.get(&key) {
            debug!(url = %request.url, format = %request.format, "cache hit");
            return Ok(dataset);
        }

        let url = build_request_url(&request.url, request.format, request.limit, request.offset)?;
        let fetch_request = FetchRequest {
            url,
            accept: request.format.accept(),
        };

        let signal = CancellationToken::new();
        let _timer = TimeoutTimer::start(signal.clone(), request.timeout);
        let _loading = LoadingGuard::begin(notifier);

        match self.fetch_and_decode(&fetch_request, request.format, &signal).await {
            Ok(mut dataset) => {
                dataset.stamp_row_ids();
                let dataset = Arc::new(dataset);
                self.cache.put(key, Arc::clone(&dataset));
                info!(
                    url = %fetch_request.url,
                    format = %request.format,
                    rows = dataset.len(),
                    "dataset loaded"
                );
                Ok(dataset)
            }
            Err(err) => {
                warn!(url = %fetch_request.url, error = %err, "load failed");
                if let Some(notifier) = notifier {
                    notifier.on_error(&err.notification_message());
                }
                Err(err)
            }
        }
    }

    async fn fetch_and_decode(
        &self,
        request: &FetchRequest,
        format: FormatType,
        signal: &CancellationToken,
    ) -> Result<Dataset, StanzaError> {
        let body = tokio::select! {
            biased;
            _ = signal.cancelled() => return Err(StanzaError::Timeout),
            body = self.transport.fetch(request) => body?,
        };
        decode(format, &body)
    }
}

pub async fn load_data<T: Transport>(
    loader: &DataLoader<T>,
    url: &str,
    format: Option<FormatType>,
    notifier: Option<&dyn LoadNotifier>,
    timeout: Option<Duration>,
    limit: Option<u64>,
    offset: Option<u64>,
) -> Result<Arc<Dataset>, StanzaError> {
    let request = LoadRequest::new(url)
        .format(format.unwrap_or_default())
        .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
        .limit(limit)
        .offset(offset);
    loader.load(&request, notifier).await
}

struct TimeoutTimer {
    handle: JoinHandle<()>,
}

impl TimeoutTimer {
    fn start(signal: CancellationToken, timeout: Duration) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            signal.cancel();
        });
        Self { handle }
    }
}

impl Drop for TimeoutTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct LoadingGuard<'a> {
    notifier: Option<&'a dyn LoadNotifier>,
}

impl<'a> LoadingGuard<'a> {
    fn begin(notifier: Option<&'a dyn LoadNotifier>) -> Self {
        if let Some(notifier) = notifier {
            notifier.on_begin_load();
        }
        Self { notifier }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if let Some(notifier) = self.notifier {
            notifier.on_end_load();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let request = LoadRequest::new("https://example.org/data");
        assert_eq!(request.format, FormatType::Json);
        assert_eq!(request.timeout, Duration::from_secs(600));
        assert_eq!(request.limit, None);
        assert_eq!(request.offset, None);
    }

    #[test]
    fn cache_key_tracks_every_parameter() {
        let base = LoadRequest::new("https://example.org/data");
        let variants = [
            base.clone().limit(Some(10)),
            base.clone().offset(Some(5)),
            base.clone().format(FormatType::Csv),
            LoadRequest::new("https://example.org/other"),
        ];
        for variant in variants {
            assert_ne!(variant.cache_key(), base.cache_key());
        }
        assert_eq!(
            base.clone().timeout(Duration::from_secs(1)).cache_key(),
            base.cache_key()
        );
    }
}
