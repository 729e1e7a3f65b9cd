//! A mapper over one snapshot of discovery data
use crate::{Error, Result, RestMapper};
use ahash::AHashMap;
use async_trait::async_trait;
use restmapper_core::{
    discovery::guess_kind_to_resource, ApiGroupResources, GroupKind, GroupVersion, GroupVersionKind,
    GroupVersionResource, RestMapping, Scope,
};

/// An entry in the priority list; `None` matches anything
#[derive(Debug, Clone, PartialEq, Eq)]
struct Priority {
    group: Option<String>,
    version: Option<String>,
}

impl Priority {
    fn at(group: &str, version: &str) -> Self {
        Self {
            group: Some(group.to_string()),
            version: Some(version.to_string()),
        }
    }

    fn any_version(group: &str) -> Self {
        Self {
            group: Some(group.to_string()),
            version: None,
        }
    }

    fn matches(&self, candidate: &impl Served) -> bool {
        let (group, version) = candidate.served_at();
        self.group.as_deref().map_or(true, |g| g == group) && self.version.as_deref().map_or(true, |v| v == version)
    }
}

/// Anything pinned to a group and version
trait Served: Clone {
    fn served_at(&self) -> (&str, &str);
}

impl Served for GroupVersionKind {
    fn served_at(&self) -> (&str, &str) {
        (&self.group, &self.version)
    }
}

impl Served for GroupVersionResource {
    fn served_at(&self) -> (&str, &str) {
        (&self.group, &self.version)
    }
}

impl Served for RestMapping {
    fn served_at(&self) -> (&str, &str) {
        self.gvk.served_at()
    }
}

/// An authoritative [`RestMapper`] built from a fixed set of discovered groups.
///
/// Answers never change after construction; to follow schema changes rebuild it from
/// fresh discovery data, or use a [`DynamicRestMapper`](crate::DynamicRestMapper).
///
/// When several versions could answer a lookup, the group's preferred version wins,
/// then its other served versions in discovery order, then earlier groups over later ones.
/// Versions passed explicitly to [`RestMapper::rest_mapping`] take precedence over all of these.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryRestMapper {
    /// Every served group version in discovery order
    default_group_versions: Vec<GroupVersion>,
    kinds: AHashMap<GroupVersionKind, (GroupVersionResource, Scope)>,
    /// Keyed by both plural and singular resources
    resource_to_kind: AHashMap<GroupVersionResource, GroupVersionKind>,
    plural_to_singular: AHashMap<GroupVersionResource, GroupVersionResource>,
    priorities: Vec<Priority>,
}

impl DiscoveryRestMapper {
    /// Builds the lookup tables for every served version of every group.
    ///
    /// Subresources are skipped. Kinds are registered both as served and lowercased.
    pub fn new(groups: &[ApiGroupResources]) -> Self {
        let mut mapper = Self::default();
        let mut group_priorities = Vec::with_capacity(groups.len());
        for group in groups {
            let name = group.name();
            let preferred = group.preferred_version();
            if let Some(preferred) = preferred {
                mapper.priorities.push(Priority::at(name, preferred));
            }
            for version in group.served_versions() {
                if Some(version) != preferred {
                    mapper.priorities.push(Priority::at(name, version));
                }
                let gv = GroupVersion::gv(name, version);
                for resource in &group.version_resources[version] {
                    if resource.name.contains('/') {
                        continue;
                    }
                    let scope = Scope::from_namespaced(resource.namespaced);
                    let plural = gv.with_resource(&resource.name);
                    let singular = if resource.singular_name.is_empty() {
                        // legacy servers do not list singular names
                        guess_kind_to_resource(&gv.with_kind(&resource.kind)).1
                    } else {
                        gv.with_resource(&resource.singular_name)
                    };
                    mapper.add(gv.with_kind(&resource.kind.to_ascii_lowercase()), &plural, &singular, scope);
                    mapper.add(gv.with_kind(&resource.kind), &plural, &singular, scope);
                }
                mapper.default_group_versions.push(gv);
            }
            group_priorities.push(Priority::any_version(name));
        }
        mapper.priorities.extend(group_priorities);
        mapper
    }

    fn add(
        &mut self,
        kind: GroupVersionKind,
        plural: &GroupVersionResource,
        singular: &GroupVersionResource,
        scope: Scope,
    ) {
        self.resource_to_kind.insert(singular.clone(), kind.clone());
        self.resource_to_kind.insert(plural.clone(), kind.clone());
        self.kinds.insert(kind, (plural.clone(), scope));
        self.plural_to_singular.insert(plural.clone(), singular.clone());
    }

    /// Number of distinct kinds known, counting lowercased aliases
    pub fn kind_count(&self) -> usize {
        self.kinds.len()
    }

    fn rank(&self, candidate: &impl Served) -> usize {
        let (group, version) = candidate.served_at();
        self.default_group_versions
            .iter()
            .position(|gv| gv.group == group && gv.version == version)
            .unwrap_or(usize::MAX)
    }

    /// Narrows candidates through the priority list until one remains
    fn prioritize<T: Served>(&self, candidates: &[T], requested: &[Priority]) -> Option<T> {
        let mut remaining = candidates.iter().collect::<Vec<_>>();
        for pattern in requested.iter().chain(&self.priorities) {
            let matching = remaining
                .iter()
                .copied()
                .filter(|c| pattern.matches(*c))
                .collect::<Vec<_>>();
            match matching.len() {
                0 => continue,
                1 => return Some(matching[0].clone()),
                _ => remaining = matching,
            }
        }
        match remaining.as_slice() {
            [only] => Some((*only).clone()),
            _ => None,
        }
    }

    pub(crate) fn find_mappings(&self, gk: &GroupKind, versions: &[&str]) -> Result<Vec<RestMapping>> {
        let mut requested: Vec<&str> = vec![];
        for version in versions.iter().copied().filter(|v| !v.is_empty()) {
            if !requested.contains(&version) {
                requested.push(version);
            }
        }
        let candidates = if requested.is_empty() {
            self.default_group_versions
                .iter()
                .filter(|gv| gv.group == gk.group)
                .map(|gv| gv.with_kind(&gk.kind))
                .collect::<Vec<_>>()
        } else {
            requested.iter().map(|v| gk.with_version(v)).collect()
        };
        let mappings = candidates
            .into_iter()
            .filter_map(|gvk| {
                let (resource, scope) = self.kinds.get(&gvk)?.clone();
                Some(RestMapping { resource, gvk, scope })
            })
            .collect::<Vec<_>>();
        if mappings.is_empty() {
            return Err(Error::NoKindMatch {
                group_kind: gk.clone(),
                searched_versions: versions.iter().map(ToString::to_string).collect(),
            });
        }
        Ok(mappings)
    }

    pub(crate) fn find_mapping(&self, gk: &GroupKind, versions: &[&str]) -> Result<RestMapping> {
        let mappings = self.find_mappings(gk, versions)?;
        // the caller's versions outrank the discovered preferences
        let requested = versions
            .iter()
            .filter(|v| !v.is_empty())
            .map(|v| Priority::at(&gk.group, v))
            .collect::<Vec<_>>();
        match self.prioritize(&mappings, &requested) {
            Some(mapping) => Ok(mapping),
            None => Err(Error::AmbiguousKind {
                partial: gk.with_version(""),
                matching: mappings.into_iter().map(|m| m.gvk).collect(),
            }),
        }
    }

    pub(crate) fn find_kinds(&self, input: &GroupVersionResource) -> Result<Vec<GroupVersionKind>> {
        let partial = coerce(input)?;
        let mut kinds = self
            .resource_to_kind
            .iter()
            .filter(|(resource, _)| partially_matches(&partial, resource))
            .map(|(_, kind)| kind.clone())
            .collect::<Vec<_>>();
        kinds.sort_by(|a, b| (self.rank(a), &a.kind).cmp(&(self.rank(b), &b.kind)));
        kinds.dedup();
        if kinds.is_empty() {
            return Err(Error::NoResourceMatch { partial });
        }
        Ok(kinds)
    }

    pub(crate) fn find_kind(&self, input: &GroupVersionResource) -> Result<GroupVersionKind> {
        let kinds = self.find_kinds(input)?;
        match self.prioritize(&kinds, &[]) {
            Some(kind) => Ok(kind),
            None => Err(Error::AmbiguousResource {
                partial: input.clone(),
                matching_resources: vec![],
                matching_kinds: kinds,
            }),
        }
    }

    pub(crate) fn find_resources(&self, input: &GroupVersionResource) -> Result<Vec<GroupVersionResource>> {
        let partial = coerce(input)?;
        let mut resources = self
            .plural_to_singular
            .iter()
            .filter(|(plural, singular)| {
                partially_matches(&partial, plural) || partially_matches(&partial, singular)
            })
            .map(|(plural, _)| plural.clone())
            .collect::<Vec<_>>();
        resources.sort_by(|a, b| (self.rank(a), &a.resource).cmp(&(self.rank(b), &b.resource)));
        resources.dedup();
        if resources.is_empty() {
            return Err(Error::NoResourceMatch { partial });
        }
        Ok(resources)
    }

    pub(crate) fn find_resource(&self, input: &GroupVersionResource) -> Result<GroupVersionResource> {
        let resources = self.find_resources(input)?;
        match self.prioritize(&resources, &[]) {
            Some(resource) => Ok(resource),
            None => Err(Error::AmbiguousResource {
                partial: input.clone(),
                matching_resources: resources,
                matching_kinds: vec![],
            }),
        }
    }

    pub(crate) fn find_singular(&self, resource: &str) -> Result<String> {
        let mut candidates: Vec<&str> = vec![];
        for (plural, singular) in &self.plural_to_singular {
            if plural.resource != resource && singular.resource != resource {
                continue;
            }
            if !candidates.contains(&singular.resource.as_str()) {
                candidates.push(&singular.resource);
            }
        }
        match candidates.as_slice() {
            [] => Err(Error::NoSingular(resource.to_string())),
            [singular] => Ok(singular.to_string()),
            _ => {
                candidates.sort_unstable();
                Err(Error::AmbiguousSingular {
                    resource: resource.to_string(),
                    candidates: candidates.into_iter().map(String::from).collect(),
                })
            }
        }
    }
}

fn coerce(input: &GroupVersionResource) -> Result<GroupVersionResource> {
    if input.resource.is_empty() {
        return Err(Error::EmptyResource(input.clone()));
    }
    let mut partial = input.clone();
    partial.resource = partial.resource.to_ascii_lowercase();
    Ok(partial)
}

fn partially_matches(partial: &GroupVersionResource, candidate: &GroupVersionResource) -> bool {
    (partial.group.is_empty() || partial.group == candidate.group)
        && (partial.version.is_empty() || partial.version == candidate.version)
        && partial.resource == candidate.resource
}

#[async_trait]
impl RestMapper for DiscoveryRestMapper {
    async fn kind_for(&self, resource: &GroupVersionResource) -> Result<GroupVersionKind> {
        self.find_kind(resource)
    }

    async fn kinds_for(&self, resource: &GroupVersionResource) -> Result<Vec<GroupVersionKind>> {
        self.find_kinds(resource)
    }

    async fn resource_for(&self, input: &GroupVersionResource) -> Result<GroupVersionResource> {
        self.find_resource(input)
    }

    async fn resources_for(&self, input: &GroupVersionResource) -> Result<Vec<GroupVersionResource>> {
        self.find_resources(input)
    }

    async fn rest_mapping(&self, gk: &GroupKind, versions: &[&str]) -> Result<RestMapping> {
        self.find_mapping(gk, versions)
    }

    async fn rest_mappings(&self, gk: &GroupKind, versions: &[&str]) -> Result<Vec<RestMapping>> {
        self.find_mappings(gk, versions)
    }

    async fn resource_singularizer(&self, resource: &str) -> Result<String> {
        self.find_singular(resource)
    }
}
