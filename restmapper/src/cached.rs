//! Memoizing wrapper around an authoritative mapper
use crate::{
    dynamic::{self, Discover, DynamicRestMapper},
    Result, RestMapper,
};
use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::RwLock;
use restmapper_core::{GroupKind, GroupVersionKind, GroupVersionResource, RestMapping};
use std::sync::Arc;

/// Successful single-version lookups, keyed on the exact kind and version
#[derive(Debug, Default)]
pub(crate) struct Memo {
    entries: RwLock<AHashMap<GroupVersionKind, RestMapping>>,
}

impl Memo {
    pub(crate) fn get(&self, key: &GroupVersionKind) -> Option<RestMapping> {
        // Clone to let go of the read lock ASAP
        self.entries.read().get(key).cloned()
    }

    pub(crate) fn insert(&self, key: GroupVersionKind, mapping: RestMapping) {
        self.entries.write().insert(key, mapping);
    }

    /// Forgets everything; only for when the authoritative mapper is rebuilt
    pub(crate) fn reset(&self) {
        self.entries.write().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }
}

/// A [`RestMapper`] that remembers the mappings of pinned kinds.
///
/// [`rest_mapping`](RestMapper::rest_mapping) calls naming exactly one version are answered
/// from memory after the first successful lookup of that `(group, kind, version)`.
/// Everything else goes straight to the wrapped mapper:
/// - lookups with zero or several versions, because which version wins is up to the wrapped
///   mapper's priorities and those are not part of the key
/// - failures, so a transient error or a kind that is not served yet never sticks
/// - every other method of [`RestMapper`]
///
/// Concurrent misses on the same key may each consult the wrapped mapper; whichever
/// answer is stored last is kept.
///
/// ```no_run
/// use restmapper::{CachedRestMapper, DiscoveryRestMapper, RestMapper};
/// use restmapper_core::GroupKind;
/// # async fn wrap(groups: Vec<restmapper_core::ApiGroupResources>) -> restmapper::Result<()> {
/// let mapper = CachedRestMapper::new(DiscoveryRestMapper::new(&groups));
/// let pods = mapper.rest_mapping(&GroupKind::gk("", "Pod"), &["v1"]).await?;
/// assert_eq!(pods.resource.resource, "pods");
/// # Ok(())
/// # }
/// ```
pub struct CachedRestMapper<M> {
    mapper: M,
    memo: Arc<Memo>,
}

impl<M: RestMapper> CachedRestMapper<M> {
    /// Wrap an authoritative mapper with an empty memo
    #[must_use]
    pub fn new(mapper: M) -> Self {
        Self {
            mapper,
            memo: Arc::default(),
        }
    }

    /// The wrapped mapper
    pub fn inner(&self) -> &M {
        &self.mapper
    }

    /// Number of remembered mappings
    pub fn cached_len(&self) -> usize {
        self.memo.len()
    }
}

impl<D: Discover + 'static> CachedRestMapper<DynamicRestMapper<D>> {
    /// Builds a [`DynamicRestMapper`] over `discovery` and wraps it.
    ///
    /// The memo is emptied whenever the dynamic mapper rebuilds itself from fresh discovery data.
    pub async fn from_discovery(discovery: D, config: dynamic::Config) -> Result<Self> {
        let memo = Arc::<Memo>::default();
        let on_reload = Arc::clone(&memo);
        let mapper = DynamicRestMapper::new(discovery, config)
            .on_reload(move || on_reload.reset())
            .run()
            .await?;
        Ok(Self { mapper, memo })
    }
}

#[async_trait]
impl<M: RestMapper> RestMapper for CachedRestMapper<M> {
    async fn kind_for(&self, resource: &GroupVersionResource) -> Result<GroupVersionKind> {
        self.mapper.kind_for(resource).await
    }

    async fn kinds_for(&self, resource: &GroupVersionResource) -> Result<Vec<GroupVersionKind>> {
        self.mapper.kinds_for(resource).await
    }

    async fn resource_for(&self, input: &GroupVersionResource) -> Result<GroupVersionResource> {
        self.mapper.resource_for(input).await
    }

    async fn resources_for(&self, input: &GroupVersionResource) -> Result<Vec<GroupVersionResource>> {
        self.mapper.resources_for(input).await
    }

    async fn rest_mapping(&self, gk: &GroupKind, versions: &[&str]) -> Result<RestMapping> {
        let [version] = versions else {
            return self.mapper.rest_mapping(gk, versions).await;
        };
        let key = gk.with_version(version);
        if let Some(mapping) = self.memo.get(&key) {
            tracing::trace!(gvk = %key, "rest mapping cache hit");
            return Ok(mapping);
        }
        tracing::debug!(gvk = %key, "rest mapping cache miss");
        let mapping = self.mapper.rest_mapping(gk, versions).await?;
        self.memo.insert(key, mapping.clone());
        Ok(mapping)
    }

    async fn rest_mappings(&self, gk: &GroupKind, versions: &[&str]) -> Result<Vec<RestMapping>> {
        self.mapper.rest_mappings(gk, versions).await
    }

    async fn resource_singularizer(&self, resource: &str) -> Result<String> {
        self.mapper.resource_singularizer(resource).await
    }
}
