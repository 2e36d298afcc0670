//! Turns a [`Query`] into a cached [`Resolution`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use grab_schema::{Asset, Assets, Query, QueryHash, Resolution, Target};
use reqwest::Client;
use tracing::{debug, info};

use crate::cache::{TtlCache, default_ttl};
use crate::clock::{Clock, SystemClock};
use crate::error::ResolveError;
use crate::forges::{Forge, ReleaseSource, new_forge};
use crate::selector::select_asset;

/// Per-request timeout for provider API calls.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the HTTP client shared by every provider call.
///
/// # Errors
///
/// Returns [`ResolveError::Config`] if the TLS backend cannot be initialized.
pub fn http_client() -> Result<Client, ResolveError> {
    Client::builder()
        .user_agent(crate::USER_AGENT)
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| ResolveError::Config(format!("failed to build HTTP client: {e}")))
}

/// Resolves queries against their provider, fronted by a TTL cache.
///
/// Share one instance (behind an `Arc`) across concurrent requests: the cache
/// is internally locked and the HTTP client is reference-counted.
pub struct Resolver {
    client: Client,
    cache: TtlCache<QueryHash, Arc<Resolution>>,
    /// Provider clients by (provider, base URL), built on first use.
    forges: Mutex<HashMap<(String, String), Forge>>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Resolver {
    /// Resolver on the system clock with the default client and a one hour TTL.
    ///
    /// # Errors
    ///
    /// See [`http_client`].
    pub fn new() -> Result<Self, ResolveError> {
        Ok(Self::with_client(http_client()?, Arc::new(SystemClock)))
    }

    pub fn with_client(client: Client, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            cache: TtlCache::with_clock(default_ttl(), clock.clone()),
            forges: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Bound the result cache to `capacity` entries.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = self.cache.with_capacity(capacity);
        self
    }

    pub fn cache(&self) -> &TtlCache<QueryHash, Arc<Resolution>> {
        &self.cache
    }

    /// Resolve `query`, serving a cached result when one is still live.
    ///
    /// A cache hit returns the stored resolution unchanged, original timestamp
    /// included. On a miss the provider is asked for repository metadata and
    /// then the release; the assets are classified, one is selected, and the
    /// result is cached. Any failure aborts the request and nothing is stored.
    ///
    /// # Errors
    ///
    /// Any [`ResolveError`]: bad provider selection, upstream failures, or no
    /// asset for the requested platform.
    pub async fn execute(&self, query: &Query) -> Result<Arc<Resolution>, ResolveError> {
        let key = query.cache_key();
        if let Some(hit) = self.cache.lookup(&key) {
            debug!(%query, "cache hit");
            return Ok(hit);
        }
        debug!(%query, "cache miss");

        if query.user.is_empty() || query.program.is_empty() {
            return Err(ResolveError::Config(
                "repository owner and name are required".to_string(),
            ));
        }

        let forge = self.forge(&query.provider, &query.base_url)?;
        let resolution = Arc::new(self.resolve(&forge, query).await?);

        info!(
            %query,
            version = %resolution.version,
            asset = %resolution.selected.name,
            "resolved release asset"
        );
        self.cache.store(key, resolution.clone());
        Ok(resolution)
    }

    /// The client for `provider` at `base_url`, reused across requests.
    /// Construction failures are returned and not remembered.
    fn forge(&self, provider: &str, base_url: &str) -> Result<Forge, ResolveError> {
        let key = (
            provider.trim().to_lowercase(),
            base_url.trim().trim_end_matches('/').to_string(),
        );
        let mut forges = self.forges.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(forge) = forges.get(&key) {
            return Ok(forge.clone());
        }
        let forge = new_forge(&key.0, &key.1, &self.client)?;
        forges.insert(key, forge.clone());
        Ok(forge)
    }

    async fn resolve(
        &self,
        source: &dyn ReleaseSource,
        query: &Query,
    ) -> Result<Resolution, ResolveError> {
        let repo = source
            .fetch_repository(&query.user, &query.program, &query.token)
            .await?;
        let release = source
            .fetch_release(&query.user, &query.program, &query.release, &query.token)
            .await?;

        let assets: Assets = release.assets.into_iter().map(Asset::classify).collect();
        let target = Target::from_query(query);
        let selected = select_asset(assets.as_slice(), &target)?.clone();

        let mut query = query.clone();
        query.private = repo.private;

        Ok(Resolution {
            query,
            timestamp: self.clock.now(),
            has_apple_silicon: assets.has_apple_silicon(),
            assets,
            selected,
            version: release.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Duration as ChronoDuration;
    use mockito::{Mock, Server, ServerGuard};

    const RELEASE_BODY: &str = r#"{
        "tag_name": "v1.4.0",
        "assets": [
            {"name": "tool_1.4.0_linux_amd64.tar.gz", "browser_download_url": "https://dl.example.com/linux-amd64"},
            {"name": "tool_1.4.0_linux_arm64.tar.gz", "browser_download_url": "https://dl.example.com/linux-arm64"},
            {"name": "tool_1.4.0_darwin_arm64.tar.gz", "browser_download_url": "https://dl.example.com/darwin-arm64"},
            {"name": "checksums.txt", "browser_download_url": "https://dl.example.com/checksums"}
        ]
    }"#;

    async fn mock_repo(server: &mut ServerGuard, status: usize, hits: usize) -> Mock {
        server
            .mock("GET", "/api/v1/repos/acme/tool")
            .with_status(status)
            .with_body(r#"{"private": true}"#)
            .expect(hits)
            .create_async()
            .await
    }

    async fn mock_release(server: &mut ServerGuard, body: &str, hits: usize) -> Mock {
        server
            .mock("GET", "/api/v1/repos/acme/tool/releases/latest")
            .with_status(200)
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    fn query(server: &ServerGuard) -> Query {
        let mut q = Query::new("acme", "tool");
        q.provider = "forgejo".to_string();
        q.base_url = server.url();
        q
    }

    fn resolver(clock: Arc<ManualClock>) -> Resolver {
        Resolver::with_client(Client::new(), clock)
    }

    #[tokio::test]
    async fn test_execute_resolves_and_classifies() {
        let mut server = Server::new_async().await;
        let _repo = mock_repo(&mut server, 200, 1).await;
        let _rel = mock_release(&mut server, RELEASE_BODY, 1).await;

        let resolver = resolver(Arc::new(ManualClock::default()));
        let mut q = query(&server);
        q.arch = "aarch64".to_string();

        let res = resolver.execute(&q).await.unwrap();
        assert_eq!(res.version, "v1.4.0");
        assert_eq!(res.assets.len(), 4);
        assert_eq!(res.selected.name, "tool_1.4.0_linux_arm64.tar.gz");
        assert_eq!(res.selected.key(), "linux/arm64");
        assert!(res.has_apple_silicon);
        assert!(res.query.private);
        assert!(!q.private);
    }

    #[tokio::test]
    async fn test_second_call_is_a_cache_hit() {
        let mut server = Server::new_async().await;
        let repo = mock_repo(&mut server, 200, 1).await;
        let rel = mock_release(&mut server, RELEASE_BODY, 1).await;

        let clock = Arc::new(ManualClock::default());
        let resolver = resolver(clock.clone());
        let q = query(&server);

        let first = resolver.execute(&q).await.unwrap();
        clock.advance(ChronoDuration::minutes(30));
        let second = resolver.execute(&q).await.unwrap();

        assert_eq!(first.timestamp, second.timestamp);
        assert!(Arc::ptr_eq(&first, &second));
        repo.assert_async().await;
        rel.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let mut server = Server::new_async().await;
        let repo = mock_repo(&mut server, 200, 2).await;
        let rel = mock_release(&mut server, RELEASE_BODY, 2).await;

        let clock = Arc::new(ManualClock::default());
        let resolver = resolver(clock.clone());
        let q = query(&server);

        let first = resolver.execute(&q).await.unwrap();
        clock.advance(ChronoDuration::minutes(61));
        let second = resolver.execute(&q).await.unwrap();

        assert!(second.timestamp > first.timestamp);
        repo.assert_async().await;
        rel.assert_async().await;
    }

    #[tokio::test]
    async fn test_tokens_do_not_share_entries() {
        let mut server = Server::new_async().await;
        let repo = mock_repo(&mut server, 200, 2).await;
        let rel = mock_release(&mut server, RELEASE_BODY, 2).await;

        let resolver = resolver(Arc::new(ManualClock::default()));
        let mut a = query(&server);
        a.token = "token-a".to_string();
        let mut b = a.clone();
        b.token = "token-b".to_string();

        let first = resolver.execute(&a).await.unwrap();
        let second = resolver.execute(&b).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.cache().len(), 2);
        repo.assert_async().await;
        rel.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_repository_skips_release_fetch() {
        let mut server = Server::new_async().await;
        let _repo = mock_repo(&mut server, 404, 1).await;
        let rel = mock_release(&mut server, RELEASE_BODY, 0).await;

        let resolver = resolver(Arc::new(ManualClock::default()));
        let err = resolver.execute(&query(&server)).await.unwrap_err();

        assert!(matches!(err, ResolveError::NotFound { .. }));
        assert!(resolver.cache().is_empty());
        rel.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_matching_asset_is_not_cached() {
        let mut server = Server::new_async().await;
        let repo = mock_repo(&mut server, 200, 2).await;
        let rel = mock_release(&mut server, RELEASE_BODY, 2).await;

        let resolver = resolver(Arc::new(ManualClock::default()));
        let mut q = query(&server);
        q.platform = "windows".to_string();

        for _ in 0..2 {
            let err = resolver.execute(&q).await.unwrap_err();
            assert!(matches!(err, ResolveError::NoMatchingAsset { .. }));
        }
        assert!(resolver.cache().is_empty());
        repo.assert_async().await;
        rel.assert_async().await;
    }

    #[tokio::test]
    async fn test_apple_silicon_flag_ignores_selection() {
        let mut server = Server::new_async().await;
        let _repo = mock_repo(&mut server, 200, 1).await;
        let _rel = mock_release(&mut server, RELEASE_BODY, 1).await;

        let resolver = resolver(Arc::new(ManualClock::default()));
        let mut q = query(&server);
        q.include = "amd64".to_string();

        let res = resolver.execute(&q).await.unwrap();
        assert_eq!(res.selected.key(), "linux/amd64");
        assert!(res.has_apple_silicon);
    }

    #[tokio::test]
    async fn test_unsupported_provider() {
        let resolver = resolver(Arc::new(ManualClock::default()));
        let mut q = Query::new("acme", "tool");
        q.provider = "bogus".to_string();
        let err = resolver.execute(&q).await.unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedProvider(ref p) if p == "bogus"));
    }

    #[tokio::test]
    async fn test_gitlab_end_to_end() {
        let mut server = Server::new_async().await;
        let _project = server
            .mock(
                "GET",
                mockito::Matcher::Regex("^/api/v4/projects/acme(%2F|/)tool$".to_string()),
            )
            .with_status(200)
            .with_body(r#"{"visibility": "public"}"#)
            .create_async()
            .await;
        let _release = server
            .mock(
                "GET",
                mockito::Matcher::Regex("^/api/v4/projects/acme(%2F|/)tool/releases/v3.1.0$".to_string()),
            )
            .with_status(200)
            .with_body(
                r#"{"tag_name": "v3.1.0", "assets": {"links": [
                    {"name": "tool-v3.1.0-x86_64-unknown-linux-musl.tar.gz", "url": "https://gl.example.com/a"}
                ]}}"#,
            )
            .create_async()
            .await;

        let resolver = resolver(Arc::new(ManualClock::default()));
        let mut q = Query::new("acme", "tool");
        q.provider = "gitlab".to_string();
        q.base_url = server.url();
        q.release = "v3.1.0".to_string();
        q.arch = "amd64".to_string();

        let res = resolver.execute(&q).await.unwrap();
        assert_eq!(res.version, "v3.1.0");
        assert_eq!(res.selected.url, "https://gl.example.com/a");
        assert!(!res.query.private);
        assert!(!res.has_apple_silicon);
    }

    #[tokio::test]
    async fn test_provider_client_is_reused() {
        let mut server = Server::new_async().await;
        let _repo = mock_repo(&mut server, 200, 2).await;
        let _rel = mock_release(&mut server, RELEASE_BODY, 2).await;

        let resolver = resolver(Arc::new(ManualClock::default()));
        let a = query(&server);
        let mut b = a.clone();
        b.platform = "darwin".to_string();
        b.provider = " Forgejo ".to_string();
        b.base_url = format!("{}/", server.url());

        resolver.execute(&a).await.unwrap();
        resolver.execute(&b).await.unwrap();
        assert_eq!(resolver.cache().len(), 2);
        assert_eq!(resolver.forges.lock().unwrap().len(), 1);

        let mut c = Query::new("acme", "tool");
        c.provider = "bogus".to_string();
        assert!(resolver.execute(&c).await.is_err());
        assert_eq!(resolver.forges.lock().unwrap().len(), 1);
    }
}
