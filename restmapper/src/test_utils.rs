use crate::{dynamic::StaticDiscovery, BoxError, Discover, Error, Result, RestMapper};
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIGroup, APIResourceList};
use restmapper_core::{ApiGroupResources, GroupKind, GroupVersionKind, GroupVersionResource, RestMapping};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

fn resource_list(value: serde_json::Value) -> APIResourceList {
    serde_json::from_value(value).expect("valid APIResourceList fixture")
}

fn api_group(value: serde_json::Value) -> APIGroup {
    serde_json::from_value(value).expect("valid APIGroup fixture")
}

/// Core, apps, batch, extensions and kube.rs groups, as discovered in that order
pub(crate) fn fixture_groups() -> Vec<ApiGroupResources> {
    let core = ApiGroupResources::core(vec![
        resource_list(json!({
            "kind": "APIResourceList",
            "apiVersion": "v1",
            "groupVersion": "v1",
            "resources": [
                { "name": "pods", "singularName": "pod", "namespaced": true, "kind": "Pod", "verbs": ["get", "list"] },
                { "name": "pods/log", "singularName": "", "namespaced": true, "kind": "Pod", "verbs": ["get"] },
                { "name": "nodes", "singularName": "", "namespaced": false, "kind": "Node", "verbs": ["get", "list"] },
            ]
        })),
        resource_list(json!({
            "kind": "APIResourceList",
            "apiVersion": "v1",
            "groupVersion": "v2",
            "resources": [
                { "name": "pods", "singularName": "pod", "namespaced": true, "kind": "Pod", "verbs": ["get"] },
            ]
        })),
    ])
    .expect("core fixture");

    let apps = ApiGroupResources::from_lists(
        api_group(json!({
            "kind": "APIGroup",
            "apiVersion": "v1",
            "name": "apps",
            "versions": [
                { "groupVersion": "apps/v1", "version": "v1" },
                { "groupVersion": "apps/v1beta1", "version": "v1beta1" },
            ],
            "preferredVersion": { "groupVersion": "apps/v1", "version": "v1" }
        })),
        vec![
            resource_list(json!({
                "kind": "APIResourceList",
                "apiVersion": "v1",
                "groupVersion": "apps/v1",
                "resources": [
                    { "name": "deployments", "singularName": "deployment", "namespaced": true, "kind": "Deployment", "verbs": [] },
                ]
            })),
            resource_list(json!({
                "kind": "APIResourceList",
                "apiVersion": "v1",
                "groupVersion": "apps/v1beta1",
                "resources": [
                    { "name": "deployments", "singularName": "deployment", "namespaced": true, "kind": "Deployment", "verbs": [] },
                    { "name": "replicasets", "singularName": "replicaset", "namespaced": true, "kind": "ReplicaSet", "verbs": [] },
                ]
            })),
        ],
    )
    .expect("apps fixture");

    let batch = ApiGroupResources::from_lists(
        api_group(json!({
            "kind": "APIGroup",
            "apiVersion": "v1",
            "name": "batch",
            "versions": [{ "groupVersion": "batch/v1", "version": "v1" }],
            "preferredVersion": { "groupVersion": "batch/v1", "version": "v1" }
        })),
        vec![resource_list(json!({
            "kind": "APIResourceList",
            "apiVersion": "v1",
            "groupVersion": "batch/v1",
            "resources": [
                { "name": "jobs", "singularName": "job", "namespaced": true, "kind": "Job", "verbs": [] },
            ]
        }))],
    )
    .expect("batch fixture");

    let extensions = ApiGroupResources::from_lists(
        api_group(json!({
            "kind": "APIGroup",
            "apiVersion": "v1",
            "name": "extensions",
            "versions": [{ "groupVersion": "extensions/v1beta", "version": "v1beta" }],
        })),
        vec![resource_list(json!({
            "kind": "APIResourceList",
            "apiVersion": "v1",
            "groupVersion": "extensions/v1beta",
            "resources": [
                { "name": "jobs", "singularName": "job", "namespaced": true, "kind": "Job", "verbs": [] },
            ]
        }))],
    )
    .expect("extensions fixture");

    let kube_rs = ApiGroupResources::from_lists(
        api_group(json!({
            "kind": "APIGroup",
            "apiVersion": "v1",
            "name": "kube.rs",
            "versions": [
                { "groupVersion": "kube.rs/v2alpha1", "version": "v2alpha1" },
                { "groupVersion": "kube.rs/v1alpha1", "version": "v1alpha1" },
            ],
        })),
        ["v2alpha1", "v1alpha1"].map(|v| {
            resource_list(json!({
                "kind": "APIResourceList",
                "apiVersion": "v1",
                "groupVersion": format!("kube.rs/{v}"),
                "resources": [
                    { "name": "widgets", "singularName": "widget", "namespaced": false, "kind": "Widget", "verbs": [] },
                ]
            }))
        }),
    )
    .expect("kube.rs fixture");

    vec![core, apps, batch, extensions, kube_rs]
}

/// A group serving only `Gizmo` at `v1`, for simulating schema changes
pub(crate) fn gizmo_group() -> ApiGroupResources {
    ApiGroupResources::from_lists(
        api_group(json!({
            "kind": "APIGroup",
            "apiVersion": "v1",
            "name": "gizmo.io",
            "versions": [{ "groupVersion": "gizmo.io/v1", "version": "v1" }],
            "preferredVersion": { "groupVersion": "gizmo.io/v1", "version": "v1" }
        })),
        vec![resource_list(json!({
            "kind": "APIResourceList",
            "apiVersion": "v1",
            "groupVersion": "gizmo.io/v1",
            "resources": [
                { "name": "gizmos", "singularName": "gizmo", "namespaced": true, "kind": "Gizmo", "verbs": [] },
            ]
        }))],
    )
    .expect("gizmo fixture")
}

/// Wraps a mapper and counts calls to `rest_mapping`
///
/// While `failing` is set, `rest_mapping` returns a discovery error without consulting the inner mapper.
pub(crate) struct CountingMapper<M> {
    inner: M,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl<M: RestMapper> CountingMapper<M> {
    pub(crate) fn new(inner: M) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl<M: RestMapper> RestMapper for CountingMapper<M> {
    async fn kind_for(&self, resource: &GroupVersionResource) -> Result<GroupVersionKind> {
        self.inner.kind_for(resource).await
    }

    async fn kinds_for(&self, resource: &GroupVersionResource) -> Result<Vec<GroupVersionKind>> {
        self.inner.kinds_for(resource).await
    }

    async fn resource_for(&self, input: &GroupVersionResource) -> Result<GroupVersionResource> {
        self.inner.resource_for(input).await
    }

    async fn resources_for(&self, input: &GroupVersionResource) -> Result<Vec<GroupVersionResource>> {
        self.inner.resources_for(input).await
    }

    async fn rest_mapping(&self, gk: &GroupKind, versions: &[&str]) -> Result<RestMapping> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // let other tasks interleave like a real network call would
        tokio::task::yield_now().await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Discovery("connection refused".into()));
        }
        self.inner.rest_mapping(gk, versions).await
    }

    async fn rest_mappings(&self, gk: &GroupKind, versions: &[&str]) -> Result<Vec<RestMapping>> {
        self.inner.rest_mappings(gk, versions).await
    }

    async fn resource_singularizer(&self, resource: &str) -> Result<String> {
        self.inner.resource_singularizer(resource).await
    }
}

/// Wraps a [`StaticDiscovery`] and counts discovery runs
#[derive(Debug, Default)]
pub(crate) struct CountingDiscovery {
    pub(crate) inner: StaticDiscovery,
    runs: AtomicUsize,
    failing: AtomicBool,
}

impl CountingDiscovery {
    pub(crate) fn new(groups: Vec<ApiGroupResources>) -> Self {
        Self {
            inner: StaticDiscovery::new(groups),
            ..Self::default()
        }
    }

    pub(crate) fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Discover for CountingDiscovery {
    async fn api_group_resources(&self) -> Result<Vec<ApiGroupResources>, BoxError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err("the server is currently unable to handle the request".into());
        }
        self.inner.api_group_resources().await
    }
}
