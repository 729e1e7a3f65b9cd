use crate::Result;
use async_trait::async_trait;
use restmapper_core::{GroupKind, GroupVersionKind, GroupVersionResource, RestMapping};
use std::sync::Arc;

/// Maps between kinds and the resources that serve them.
///
/// Partially specified inputs leave `group` or `version` empty to match any value.
/// Implementations may need to talk to the apiserver, so every lookup is async.
/// Lookups that find nothing return an [`Error`](crate::Error) for which
/// [`is_no_match`](crate::Error::is_no_match) holds.
#[async_trait]
pub trait RestMapper: Send + Sync {
    /// The single best kind for a partially specified resource
    async fn kind_for(&self, resource: &GroupVersionResource) -> Result<GroupVersionKind>;

    /// All kinds matching a partially specified resource, best first
    async fn kinds_for(&self, resource: &GroupVersionResource) -> Result<Vec<GroupVersionKind>>;

    /// The single best fully qualified resource for a partially specified one
    async fn resource_for(&self, input: &GroupVersionResource) -> Result<GroupVersionResource>;

    /// All fully qualified resources matching a partially specified one, best first
    async fn resources_for(&self, input: &GroupVersionResource) -> Result<Vec<GroupVersionResource>>;

    /// Resolves a kind to the mapping used to address it.
    ///
    /// `versions` are tried in the caller's order of preference.
    /// With no versions the mapper picks from the versions served for the group.
    async fn rest_mapping(&self, gk: &GroupKind, versions: &[&str]) -> Result<RestMapping>;

    /// All mappings for a kind at the given versions, or at every served version when none are given
    async fn rest_mappings(&self, gk: &GroupKind, versions: &[&str]) -> Result<Vec<RestMapping>>;

    /// The singular name of a resource, e.g. `pod` for `pods`
    async fn resource_singularizer(&self, resource: &str) -> Result<String>;
}

macro_rules! impl_for_pointer {
    ($ptr:ident) => {
        #[async_trait]
        impl<M: RestMapper + ?Sized> RestMapper for $ptr<M> {
            async fn kind_for(&self, resource: &GroupVersionResource) -> Result<GroupVersionKind> {
                (**self).kind_for(resource).await
            }

            async fn kinds_for(&self, resource: &GroupVersionResource) -> Result<Vec<GroupVersionKind>> {
                (**self).kinds_for(resource).await
            }

            async fn resource_for(&self, input: &GroupVersionResource) -> Result<GroupVersionResource> {
                (**self).resource_for(input).await
            }

            async fn resources_for(&self, input: &GroupVersionResource) -> Result<Vec<GroupVersionResource>> {
                (**self).resources_for(input).await
            }

            async fn rest_mapping(&self, gk: &GroupKind, versions: &[&str]) -> Result<RestMapping> {
                (**self).rest_mapping(gk, versions).await
            }

            async fn rest_mappings(&self, gk: &GroupKind, versions: &[&str]) -> Result<Vec<RestMapping>> {
                (**self).rest_mappings(gk, versions).await
            }

            async fn resource_singularizer(&self, resource: &str) -> Result<String> {
                (**self).resource_singularizer(resource).await
            }
        }
    };
}

impl_for_pointer!(Arc);
impl_for_pointer!(Box);
