//! A mapper that rediscovers the cluster when a lookup finds nothing
use crate::{BoxError, DiscoveryRestMapper, Error, Result, RestMapper};
use async_trait::async_trait;
use parking_lot::RwLock;
use restmapper_core::{ApiGroupResources, GroupKind, GroupVersionKind, GroupVersionResource, RestMapping};
use std::{fmt, sync::Arc};
use tokio::{sync::Mutex, time::Instant};

/// A source of discovery data, typically an apiserver client.
///
/// Implementations return every served group along with its resources per version,
/// i.e. the combined result of listing `/api`, `/apis` and each group version under them.
#[async_trait]
pub trait Discover: Send + Sync {
    /// Lists all served groups and their resources
    async fn api_group_resources(&self) -> Result<Vec<ApiGroupResources>, BoxError>;
}

#[async_trait]
impl<D: Discover + ?Sized> Discover for Arc<D> {
    async fn api_group_resources(&self) -> Result<Vec<ApiGroupResources>, BoxError> {
        (**self).api_group_resources().await
    }
}

/// Discovery data held in memory
///
/// Useful for offline tooling and tests. [`StaticDiscovery::replace`] swaps the served
/// groups, which is how a schema change looks to a [`DynamicRestMapper`].
#[derive(Debug, Default)]
pub struct StaticDiscovery {
    groups: RwLock<Vec<ApiGroupResources>>,
}

impl StaticDiscovery {
    /// Serve a fixed set of groups
    pub fn new(groups: Vec<ApiGroupResources>) -> Self {
        Self {
            groups: RwLock::new(groups),
        }
    }

    /// Serve a different set of groups from now on
    pub fn replace(&self, groups: Vec<ApiGroupResources>) {
        *self.groups.write() = groups;
    }
}

#[async_trait]
impl Discover for StaticDiscovery {
    async fn api_group_resources(&self) -> Result<Vec<ApiGroupResources>, BoxError> {
        Ok(self.groups.read().clone())
    }
}

/// Configuration for a [`DynamicRestMapper`]
///
/// ```
/// use restmapper::dynamic::Config;
/// let config = Config::default().lazy().reload_limit(2, 0.5);
/// assert!(config.lazy);
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// Defer the first discovery until the first lookup
    ///
    /// Defaults to `false`: [`DynamicRestMapper::run`] discovers eagerly and fails fast.
    pub lazy: bool,

    /// Rediscoveries allowed back to back
    ///
    /// The initial discovery is not counted.
    pub reload_burst: u32,

    /// Rediscoveries per second allowed on average after the burst is spent
    pub reload_rate: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lazy: false,
            reload_burst: 5,
            reload_rate: 5.0,
        }
    }
}

impl Config {
    /// Defer the first discovery until the first lookup
    #[must_use]
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    /// Limit rediscovery to `burst` back to back runs, refilled at `per_second`
    #[must_use]
    pub fn reload_limit(mut self, burst: u32, per_second: f64) -> Self {
        self.reload_burst = burst;
        self.reload_rate = per_second;
        self
    }
}

/// Token bucket guarding rediscovery
#[derive(Debug)]
struct ReloadLimiter {
    burst: f64,
    rate: f64,
    tokens: f64,
    refilled_at: Instant,
}

impl ReloadLimiter {
    fn new(config: &Config) -> Self {
        let burst = f64::from(config.reload_burst);
        Self {
            burst,
            rate: config.reload_rate.max(0.0),
            tokens: burst,
            refilled_at: Instant::now(),
        }
    }

    fn try_acquire(&mut self) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.refilled_at).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.burst);
        self.refilled_at = now;
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

type ReloadHook = Box<dyn Fn() + Send + Sync>;

/// A [`RestMapper`] that keeps itself up to date with the served schema.
///
/// Lookups are answered from a [`DiscoveryRestMapper`] snapshot. When a lookup finds no
/// match, the snapshot is rebuilt from the [`Discover`] source and the lookup retried once,
/// so newly installed CRDs become resolvable without restarting. Rebuilds are rate limited
/// per [`Config`]; a lookup that cannot rebuild returns its original no-match error.
///
/// Only no-match errors trigger a rebuild. Ambiguities and discovery failures are returned as is.
pub struct DynamicRestMapper<D> {
    discovery: D,
    config: Config,
    current: RwLock<Option<Arc<DiscoveryRestMapper>>>,
    reload: Mutex<ReloadLimiter>,
    hooks: Vec<ReloadHook>,
}

impl<D: fmt::Debug> fmt::Debug for DynamicRestMapper<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicRestMapper")
            .field("discovery", &self.discovery)
            .field("config", &self.config)
            .field("loaded", &self.current.read().is_some())
            .finish_non_exhaustive()
    }
}

impl<D: Discover> DynamicRestMapper<D> {
    /// Construct a mapper over a discovery source
    ///
    /// Nothing is discovered until [`DynamicRestMapper::run`] or the first lookup.
    #[must_use]
    pub fn new(discovery: D, config: Config) -> Self {
        let reload = Mutex::new(ReloadLimiter::new(&config));
        Self {
            discovery,
            config,
            current: RwLock::new(None),
            reload,
            hooks: vec![],
        }
    }

    /// Call `hook` every time the snapshot is rebuilt, including the initial discovery
    #[must_use]
    pub fn on_reload(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Runs the initial discovery, unless the mapper is configured to be lazy
    pub async fn run(self) -> Result<Self> {
        if !self.config.lazy {
            let _guard = self.reload.lock().await;
            self.rebuild().await?;
        }
        Ok(self)
    }

    /// The discovery source
    pub fn discovery(&self) -> &D {
        &self.discovery
    }

    fn snapshot(&self) -> Option<Arc<DiscoveryRestMapper>> {
        self.current.read().clone()
    }

    /// Replaces the snapshot; callers hold the reload lock
    async fn rebuild(&self) -> Result<Arc<DiscoveryRestMapper>> {
        let groups = self.discovery.api_group_resources().await.map_err(Error::Discovery)?;
        let mapper = Arc::new(DiscoveryRestMapper::new(&groups));
        tracing::debug!(groups = groups.len(), kinds = mapper.kind_count(), "rebuilt rest mapper from discovery");
        *self.current.write() = Some(Arc::clone(&mapper));
        for hook in &self.hooks {
            hook();
        }
        Ok(mapper)
    }

    /// The current snapshot, discovering first if nothing has been loaded yet
    async fn loaded(&self) -> Result<Arc<DiscoveryRestMapper>> {
        if let Some(mapper) = self.snapshot() {
            return Ok(mapper);
        }
        let _guard = self.reload.lock().await;
        match self.snapshot() {
            Some(mapper) => Ok(mapper),
            None => self.rebuild().await,
        }
    }

    /// Runs `lookup` against the snapshot, rebuilding it once if nothing matched
    async fn check_and_reload<T, F>(&self, lookup: F) -> Result<T>
    where
        F: Fn(&DiscoveryRestMapper) -> Result<T> + Send + Sync,
        T: Send,
    {
        let mapper = self.loaded().await?;
        let stale = match lookup(&mapper) {
            Err(err) if err.is_no_match() => err,
            res => return res,
        };

        let mut limiter = self.reload.lock().await;
        // another lookup may have rebuilt while we waited
        if let Some(current) = self.snapshot().filter(|current| !Arc::ptr_eq(current, &mapper)) {
            match lookup(&current) {
                Err(err) if err.is_no_match() => {}
                res => return res,
            }
        }
        if !limiter.try_acquire() {
            tracing::debug!(error = %stale, "rediscovery rate limited");
            return Err(stale);
        }
        let fresh = self.rebuild().await?;
        drop(limiter);
        lookup(&fresh)
    }
}

#[async_trait]
impl<D: Discover> RestMapper for DynamicRestMapper<D> {
    async fn kind_for(&self, resource: &GroupVersionResource) -> Result<GroupVersionKind> {
        self.check_and_reload(|m| m.find_kind(resource)).await
    }

    async fn kinds_for(&self, resource: &GroupVersionResource) -> Result<Vec<GroupVersionKind>> {
        self.check_and_reload(|m| m.find_kinds(resource)).await
    }

    async fn resource_for(&self, input: &GroupVersionResource) -> Result<GroupVersionResource> {
        self.check_and_reload(|m| m.find_resource(input)).await
    }

    async fn resources_for(&self, input: &GroupVersionResource) -> Result<Vec<GroupVersionResource>> {
        self.check_and_reload(|m| m.find_resources(input)).await
    }

    async fn rest_mapping(&self, gk: &GroupKind, versions: &[&str]) -> Result<RestMapping> {
        self.check_and_reload(|m| m.find_mapping(gk, versions)).await
    }

    async fn rest_mappings(&self, gk: &GroupKind, versions: &[&str]) -> Result<Vec<RestMapping>> {
        self.check_and_reload(|m| m.find_mappings(gk, versions)).await
    }

    async fn resource_singularizer(&self, resource: &str) -> Result<String> {
        // no match here surfaces as NoSingular, which does not warrant rediscovery
        self.loaded().await?.find_singular(resource)
    }
}
