use log::{debug, error, info};
use reqwest::blocking::Client;
use serde_json::Value;

use crate::utils::cache::{Cache, CachePolicy};
use crate::utils::config::Config;
use crate::utils::error::Result;
use crate::utils::http::{RetryPolicy, build_client, check_status};

/// Source of raw element graphs for a query.
pub trait RawDataSource {
    /// The decoded response for `query`, or `None` when it could not be
    /// obtained.
    fn fetch(&mut self, query: &str) -> Option<Value>;
}

impl<T: RawDataSource + ?Sized> RawDataSource for Box<T> {
    fn fetch(&mut self, query: &str) -> Option<Value> {
        (**self).fetch(query)
    }
}

/// Runs a single Overpass QL query and decodes the answer.
pub trait QueryExecutor {
    fn execute(&self, query: &str) -> Result<Value>;
}

/// HTTP transport for the Overpass API.
pub struct OverpassHttp {
    client: Client,
    url: String,
    retry: RetryPolicy,
}

impl OverpassHttp {
    pub fn new(url: impl Into<String>, client: Client, retry: RetryPolicy) -> Self {
        Self {
            client,
            url: url.into(),
            retry,
        }
    }
}

impl QueryExecutor for OverpassHttp {
    fn execute(&self, query: &str) -> Result<Value> {
        self.retry.run("overpass query", || {
            let response = self
                .client
                .post(&self.url)
                .form(&[("data", query)])
                .send()?;
            Ok(check_status(response)?.json()?)
        })
    }
}

/// Overpass API client with a query-result cache.
pub struct OverpassClient<X = OverpassHttp> {
    executor: X,
    cache: Option<Cache<String, Value>>,
}

impl OverpassClient<OverpassHttp> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = config.enable_cache.then(|| {
            CachePolicy::unbounded()
                .with_capacity(config.query_cache_size)
                .with_ttl(config.cache_ttl)
        });
        let http = OverpassHttp::new(
            config.overpass_api_url.clone(),
            build_client(config.api_timeout)?,
            RetryPolicy::new(config.max_retries),
        );
        Ok(Self::new(http, cache))
    }
}

impl<X: QueryExecutor> OverpassClient<X> {
    pub fn new(executor: X, cache: Option<CachePolicy>) -> Self {
        Self {
            executor,
            cache: cache.map(Cache::new),
        }
    }

    /// Runs `query` against the endpoint, bypassing the cache.
    pub fn execute(&self, query: &str) -> Result<Value> {
        self.executor.execute(query)
    }

    pub fn cached_queries(&self) -> usize {
        self.cache.as_ref().map_or(0, Cache::len)
    }
}

impl<X: QueryExecutor> RawDataSource for OverpassClient<X> {
    fn fetch(&mut self, query: &str) -> Option<Value> {
        let key = query.trim().to_string();
        if let Some(hit) = self.cache.as_mut().and_then(|cache| cache.get(&key)) {
            debug!("Using cached Overpass result");
            return Some(hit);
        }

        match self.execute(query) {
            Ok(value) => {
                let count = value
                    .get("elements")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len);
                info!("Overpass returned {} elements", count);
                if let Some(cache) = self.cache.as_mut() {
                    cache.insert(key, value.clone());
                }
                Some(value)
            }
            Err(err) => {
                error!("Overpass query failed: {}", err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::Error;
    use serde_json::json;
    use std::cell::Cell;

    struct CountingExecutor {
        calls: Cell<usize>,
        fail: bool,
    }

    impl CountingExecutor {
        fn new(fail: bool) -> Self {
            Self {
                calls: Cell::new(0),
                fail,
            }
        }
    }

    impl QueryExecutor for CountingExecutor {
        fn execute(&self, query: &str) -> Result<Value> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(Error::HttpStatus(504));
            }
            Ok(json!({"elements": [{"type": "node", "id": 1, "tags": {"q": query}}]}))
        }
    }

    #[test]
    fn test_repeated_query_is_served_from_cache() {
        let mut client = OverpassClient::new(
            CountingExecutor::new(false),
            Some(CachePolicy::unbounded().with_capacity(8)),
        );
        let first = client.fetch("node(1);out;");
        let second = client.fetch("  node(1);out;\n");
        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(client.executor.calls.get(), 1);
        assert_eq!(client.cached_queries(), 1);

        client.fetch("node(2);out;");
        assert_eq!(client.executor.calls.get(), 2);
        assert_eq!(client.cached_queries(), 2);
    }

    #[test]
    fn test_without_cache_every_fetch_executes() {
        let mut client = OverpassClient::new(CountingExecutor::new(false), None);
        client.fetch("node(1);out;");
        client.fetch("node(1);out;");
        assert_eq!(client.executor.calls.get(), 2);
        assert_eq!(client.cached_queries(), 0);
    }

    #[test]
    fn test_failed_query_yields_none_and_is_not_cached() {
        let mut client = OverpassClient::new(
            CountingExecutor::new(true),
            Some(CachePolicy::unbounded()),
        );
        assert_eq!(client.fetch("node(1);out;"), None);
        assert_eq!(client.fetch("node(1);out;"), None);
        assert_eq!(client.executor.calls.get(), 2);
        assert_eq!(client.cached_queries(), 0);
    }
}
