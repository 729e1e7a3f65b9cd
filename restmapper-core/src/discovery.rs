//! Discovery documents grouped the way mappers consume them
use crate::{
    gvk::{GroupVersion, GroupVersionKind, GroupVersionResource, ParseGroupVersionError},
    version::Version,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    APIGroup, APIResource, APIResourceList, GroupVersionForDiscovery,
};
use std::{cmp::Reverse, collections::BTreeMap};

/// One API group along with the resources it serves at each of its versions.
///
/// This is the unit a discovery source hands to a mapper. Versions listed on the
/// [`APIGroup`] without an entry in `version_resources` are considered unserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiGroupResources {
    /// The group as listed under `/apis` (or synthesized for the core group)
    pub group: APIGroup,
    /// Resources served per version, keyed by the bare version string
    pub version_resources: BTreeMap<String, Vec<APIResource>>,
}

impl ApiGroupResources {
    /// Core group name
    pub const CORE_GROUP: &'static str = "";

    /// Collects the resource lists of `group`.
    ///
    /// Lists whose `groupVersion` belongs to another group are ignored.
    pub fn from_lists(
        group: APIGroup,
        lists: impl IntoIterator<Item = APIResourceList>,
    ) -> Result<Self, ParseGroupVersionError> {
        let mut version_resources = BTreeMap::<String, Vec<APIResource>>::new();
        for list in lists {
            let gv: GroupVersion = list.group_version.parse()?;
            if gv.group != group.name {
                continue;
            }
            version_resources.entry(gv.version).or_default().extend(list.resources);
        }
        Ok(Self {
            group,
            version_resources,
        })
    }

    /// Builds the core group from the lists served under `/api`.
    ///
    /// The core group has no `APIGroup` document, so versions are ordered by
    /// [`Version`] priority and `v1` is preferred when served.
    pub fn core(lists: impl IntoIterator<Item = APIResourceList>) -> Result<Self, ParseGroupVersionError> {
        let lists = lists.into_iter().collect::<Vec<_>>();
        let mut versions = vec![];
        for list in &lists {
            let gv: GroupVersion = list.group_version.parse()?;
            if gv.group == Self::CORE_GROUP && !versions.contains(&gv.version) {
                versions.push(gv.version);
            }
        }
        versions.sort_by_cached_key(|v| Reverse(Version::parse(v)));
        let preferred = versions
            .iter()
            .find(|v| v.as_str() == "v1")
            .or_else(|| versions.first())
            .map(|v| discovery_version(v));
        let group = APIGroup {
            name: Self::CORE_GROUP.to_string(),
            preferred_version: preferred,
            versions: versions.iter().map(|v| discovery_version(v)).collect(),
            ..APIGroup::default()
        };
        Self::from_lists(group, lists)
    }

    /// Returns the name of this group.
    pub fn name(&self) -> &str {
        &self.group.name
    }

    /// Versions with served resources, in the order the group lists them
    pub fn served_versions(&self) -> impl Iterator<Item = &str> {
        self.group
            .versions
            .iter()
            .map(|v| v.version.as_str())
            .filter(|v| self.version_resources.contains_key(*v))
    }

    /// The version the server recommends, if it serves any resources
    pub fn preferred_version(&self) -> Option<&str> {
        self.group
            .preferred_version
            .as_ref()
            .map(|v| v.version.as_str())
            .filter(|v| self.version_resources.contains_key(*v))
    }
}

fn discovery_version(version: &str) -> GroupVersionForDiscovery {
    GroupVersionForDiscovery {
        group_version: version.to_string(),
        version: version.to_string(),
    }
}

/// Guesses the plural and singular resources for a kind.
///
/// Only for servers that do not report singular names. The plural may be wrong for
/// kinds with irregular pluralisation, so prefer the names served by discovery.
pub fn guess_kind_to_resource(gvk: &GroupVersionKind) -> (GroupVersionResource, GroupVersionResource) {
    let singular = gvk.kind.to_ascii_lowercase();
    let gv = gvk.group_version();
    (gv.with_resource(&to_plural(&singular)), gv.with_resource(&singular))
}

// Simple pluralizer. Handles the special cases.
fn to_plural(word: &str) -> String {
    match word {
        "" => return String::new(),
        "endpoints" | "endpointslices" => return word.to_owned(),
        "nodemetrics" => return "nodes".to_owned(),
        "podmetrics" => return "pods".to_owned(),
        _ => {}
    }

    // Words ending in s, x, z, ch, sh will be pluralized with -es (eg. foxes).
    if word.ends_with(['s', 'x', 'z']) || word.ends_with("ch") || word.ends_with("sh") {
        return format!("{word}es");
    }

    // Words ending in y that are preceded by a consonant will be pluralized by
    // replacing y with -ies (eg. puppies).
    if let Some(stem) = word.strip_suffix('y') {
        if stem.ends_with(|c: char| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')) {
            return format!("{stem}ies");
        }
    }

    format!("{word}s")
}
