//! Resolves kinds through a cached mapper backed by a discovery dump on disk.
//!
//! The dump is re-read on every rediscovery, so editing it while this runs
//! behaves like installing a CRD on a live cluster.
//!
//!     RUST_LOG=restmapper=debug cargo run --example cached_mapper [path/to/discovery.json]
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIGroup, APIResourceList};
use restmapper::{
    core::{ApiGroupResources, GroupVersionKind},
    dynamic::Config,
    group_version_resource, BoxError, CachedRestMapper, Discover, RestMapper,
};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::*;

/// What `kubectl get --raw` returns for `/api/v1` and each group under `/apis`
#[derive(Deserialize)]
struct Dump {
    core: Vec<APIResourceList>,
    groups: Vec<GroupDump>,
}

#[derive(Deserialize)]
struct GroupDump {
    group: APIGroup,
    resources: Vec<APIResourceList>,
}

struct FileDiscovery {
    path: PathBuf,
}

#[async_trait]
impl Discover for FileDiscovery {
    async fn api_group_resources(&self) -> Result<Vec<ApiGroupResources>, BoxError> {
        let raw = tokio::fs::read(&self.path).await?;
        let dump: Dump = serde_json::from_slice(&raw)?;
        let mut groups = vec![ApiGroupResources::core(dump.core)?];
        for g in dump.groups {
            groups.push(ApiGroupResources::from_lists(g.group, g.resources)?);
        }
        Ok(groups)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/discovery.json")));

    let mapper = CachedRestMapper::from_discovery(FileDiscovery { path }, Config::default()).await?;

    let kinds = [
        GroupVersionKind::gvk("", "v1", "Pod"),
        GroupVersionKind::gvk("apps", "v1", "Deployment"),
        GroupVersionKind::gvk("batch", "v1", "CronJob"),
        GroupVersionKind::gvk("", "v1", "Pod"),
        GroupVersionKind::gvk("example.com", "v1", "Widget"),
    ];
    for gvk in &kinds {
        match group_version_resource(&mapper, gvk).await {
            Ok(gvr) => info!("{gvk} -> {gvr}"),
            Err(e) if e.is_no_match() => warn!("{gvk} is not served: {e}"),
            Err(e) => return Err(e.into()),
        }
    }
    info!("{} mappings cached", mapper.cached_len());

    let scope = mapper.rest_mapping(&kinds[0].group_kind(), &[]).await?.scope;
    info!("pods are {scope:?}");
    let singular = mapper.resource_singularizer("statefulsets").await?;
    info!("statefulsets -> {singular}");
    Ok(())
}
