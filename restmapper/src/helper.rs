use crate::{Result, RestMapper};
use restmapper_core::{GroupVersionKind, GroupVersionResource};

/// Resolves a fully qualified kind to the resource that serves it.
///
/// Asks `mapper` for the mapping of exactly `gvk.version`, so a
/// [`CachedRestMapper`](crate::CachedRestMapper) answers repeat calls from memory.
///
/// ```no_run
/// # async fn resolve(mapper: &impl restmapper::RestMapper) -> restmapper::Result<()> {
/// use restmapper::{core::GroupVersionKind, group_version_resource};
/// let gvr = group_version_resource(mapper, &GroupVersionKind::gvk("apps", "v1", "Deployment")).await?;
/// assert_eq!(gvr.resource, "deployments");
/// # Ok(())
/// # }
/// ```
pub async fn group_version_resource<M: RestMapper + ?Sized>(
    mapper: &M,
    gvk: &GroupVersionKind,
) -> Result<GroupVersionResource> {
    let mapping = mapper.rest_mapping(&gvk.group_kind(), &[gvk.version.as_str()]).await?;
    Ok(mapping.resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_utils::{fixture_groups, CountingMapper},
        CachedRestMapper, DiscoveryRestMapper, Error,
    };
    use restmapper_core::{GroupVersionKind as GVK, GroupVersionResource as GVR};

    #[tokio::test]
    async fn resolves_pinned_kinds() {
        let mapper = DiscoveryRestMapper::new(&fixture_groups());
        let cases = [
            (GVK::gvk("", "v1", "Pod"), GVR::gvr("", "v1", "pods")),
            (GVK::gvk("", "v2", "Pod"), GVR::gvr("", "v2", "pods")),
            (GVK::gvk("extensions", "v1beta", "Job"), GVR::gvr("extensions", "v1beta", "jobs")),
            (GVK::gvk("kube.rs", "v1alpha1", "Widget"), GVR::gvr("kube.rs", "v1alpha1", "widgets")),
        ];
        for (gvk, expected) in cases {
            assert_eq!(group_version_resource(&mapper, &gvk).await.unwrap(), expected, "{gvk}");
        }
    }

    #[tokio::test]
    async fn unknown_kinds_are_no_match() {
        let mapper = CachedRestMapper::new(CountingMapper::new(DiscoveryRestMapper::new(&fixture_groups())));
        let gvk = GVK::gvk("", "v1", "NonExistent");
        for call in 1..=2 {
            let err = group_version_resource(&mapper, &gvk).await.unwrap_err();
            assert!(matches!(&err, Error::NoKindMatch { searched_versions, .. } if searched_versions == &["v1"]));
            assert_eq!(mapper.inner().calls(), call);
        }
    }

    #[tokio::test]
    async fn repeat_lookups_go_through_the_memo() {
        let mapper = CachedRestMapper::new(CountingMapper::new(DiscoveryRestMapper::new(&fixture_groups())));
        let pod = GVK::gvk("", "v1", "Pod");
        for _ in 0..3 {
            let gvr = group_version_resource(&mapper, &pod).await.unwrap();
            assert_eq!(gvr, GVR::gvr("", "v1", "pods"));
        }
        assert_eq!(mapper.inner().calls(), 1);

        // dyn mappers work as well
        let dynamic: &dyn RestMapper = &mapper;
        group_version_resource(dynamic, &pod).await.unwrap();
        assert_eq!(mapper.inner().calls(), 1);
    }
}
