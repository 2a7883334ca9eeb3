//! Broker facade.
//!
//! One `Broker` per process owns every component and hands out the
//! layered call path:
//!
//! ```text
//! cached_call: Instrumentation::run → ResultCache::get_or_fetch → RetryingClient::call → op
//! call:        Instrumentation::run → RetryingClient::call → op
//! ```

use std::fmt::{Debug, Display};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::cache::{cache_key, CacheStore, FileStore, MemoryStore, ResultCache};
use crate::config::{BrokerConfig, SecretSource, StoreKind};
use crate::error::BrokerError;
use crate::observability::{summarize_input, Instrumentation, RequestContext, Severity};
use crate::resilience::{Classify, RetryPolicy, RetryingClient};
use crate::secrets::{DirSecretStore, EnvSecretStore, SecretProvider, SecretStore};
use crate::upstream::{ApiClient, SearchItem, Upstreams, VideoItem};

pub const SEARCH_FUNCTION: &str = "customSearch";
pub const VIDEOS_FUNCTION: &str = "searchYoutube";
pub const GENERATE_FUNCTION: &str = "generateContent";

const DEFAULT_SECRET_DIR: &str = "/run/secrets";

pub struct Broker {
    instrumentation: Arc<Instrumentation>,
    cache: ResultCache,
    retry: RetryingClient,
    upstreams: Upstreams,
}

impl Broker {
    pub fn new(
        instrumentation: Arc<Instrumentation>,
        cache: ResultCache,
        retry: RetryingClient,
        upstreams: Upstreams,
    ) -> Self {
        Self {
            instrumentation,
            cache,
            retry,
            upstreams,
        }
    }

    /// Build every component from configuration, logging through `tracing`.
    pub fn from_config(config: &BrokerConfig) -> Result<Self, BrokerError> {
        Self::with_instrumentation(config, Arc::new(Instrumentation::tracing()))
    }

    pub fn with_instrumentation(
        config: &BrokerConfig,
        instrumentation: Arc<Instrumentation>,
    ) -> Result<Self, BrokerError> {
        let cache = ResultCache::new(cache_store(config), config.cache.default_ttl())
            .with_single_flight(config.cache.single_flight);
        let retry = RetryingClient::new(RetryPolicy::from(&config.retries));
        let secrets = Arc::new(SecretProvider::new(secret_store(config), config.secrets.ttl()));
        let client = ApiClient::new(&config.upstream)?;
        let upstreams = Upstreams::new(client, secrets, config.upstream.clone());

        tracing::info!(
            cache_store = ?config.cache.store,
            secret_source = ?config.secrets.source,
            retries = config.retries.retries,
            "Broker initialized"
        );

        Ok(Self::new(instrumentation, cache, retry, upstreams))
    }

    pub fn instrumentation(&self) -> &Arc<Instrumentation> {
        &self.instrumentation
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn retry(&self) -> &RetryingClient {
        &self.retry
    }

    pub fn secrets(&self) -> &Arc<SecretProvider> {
        self.upstreams.secrets()
    }

    pub fn upstreams(&self) -> &Upstreams {
        &self.upstreams
    }

    /// Instrumented, cached, retried invocation of `op`.
    ///
    /// Cache misses also emit a `<function>:upstream` performance record.
    /// The error of the last attempt is returned unchanged.
    pub async fn cached_call<T, E, F, Fut>(
        &self,
        function_name: &str,
        request: RequestContext,
        key: &str,
        ttl: Duration,
        op: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: Classify + Display + Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.instrumentation
            .run(function_name, request, |ctx| async move {
                self.instrumentation.log(
                    Severity::Debug,
                    "Cache lookup",
                    &ctx,
                    Some(json!({ "cacheKey": key, "ttlSecs": ttl.as_secs() })),
                );
                self.cache
                    .get_or_fetch(key, ttl, || async {
                        let timer = self.instrumentation.timer(&ctx, format!("{}:upstream", function_name));
                        let result = self.retry.call(function_name, op).await;
                        match &result {
                            Ok(_) => timer.finish(),
                            Err(e) => timer.fail(&e.to_string()),
                        };
                        result
                    })
                    .await
            })
            .await
    }

    /// Instrumented, retried invocation of `op` without caching.
    pub async fn call<T, E, F, Fut>(&self, function_name: &str, request: RequestContext, op: F) -> Result<T, E>
    where
        E: Classify + Display + Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.instrumentation
            .run(function_name, request, |_ctx| self.retry.call(function_name, op))
            .await
    }

    /// Web search, cached for the default TTL.
    pub async fn search(&self, request: RequestContext, query: &str) -> Result<Vec<SearchItem>, BrokerError> {
        let key = cache_key("search", [query]);
        let request = with_summary(request, json!({ "query": query }));
        self.cached_call(SEARCH_FUNCTION, request, &key, self.cache.default_ttl(), move || {
            self.upstreams.custom_search(query)
        })
        .await
    }

    /// Video search, cached per query and result count.
    pub async fn videos(
        &self,
        request: RequestContext,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<VideoItem>, BrokerError> {
        let key = cache_key("videos", [query.to_string(), max_results.to_string()]);
        let request = with_summary(request, json!({ "query": query, "maxResults": max_results }));
        self.cached_call(VIDEOS_FUNCTION, request, &key, self.cache.default_ttl(), move || {
            self.upstreams.youtube_search(query, max_results)
        })
        .await
    }

    /// Text generation; never cached since output varies per call.
    pub async fn generate(&self, request: RequestContext, prompt: &str) -> Result<String, BrokerError> {
        let request = with_summary(request, json!({ "prompt": prompt }));
        self.call(GENERATE_FUNCTION, request, move || self.upstreams.gemini_generate(prompt))
            .await
    }
}

impl Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("instrumentation", &self.instrumentation)
            .field("cache", &self.cache)
            .field("retry", self.retry.policy())
            .field("upstreams", &self.upstreams)
            .finish()
    }
}

fn with_summary(request: RequestContext, input: serde_json::Value) -> RequestContext {
    if request.input_summary.is_some() {
        return request;
    }
    request.with_input(summarize_input(&input))
}

/// A file store that cannot be opened falls back to memory.
fn cache_store(config: &BrokerConfig) -> Arc<dyn CacheStore> {
    match (config.cache.store, config.cache.file_path.as_deref()) {
        (StoreKind::File, Some(path)) => match FileStore::open(path) {
            Ok(store) => {
                tracing::info!(path = %store.path().display(), documents = store.len(), "Using file cache store");
                Arc::new(store)
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "Cache file unusable, using in-memory cache");
                Arc::new(MemoryStore::new())
            }
        },
        _ => Arc::new(MemoryStore::new()),
    }
}

fn secret_store(config: &BrokerConfig) -> Arc<dyn SecretStore> {
    match config.secrets.source {
        SecretSource::Env => Arc::new(EnvSecretStore::new(config.secrets.env_prefix.clone())),
        SecretSource::Dir => {
            let dir = config
                .secrets
                .dir
                .as_deref()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SECRET_DIR));
            Arc::new(DirSecretStore::new(dir))
        }
    }
}
