//! The answer to a kind lookup
use crate::gvk::{GroupVersionKind, GroupVersionResource};
use serde::{Deserialize, Serialize};

/// Resource scope
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Scope {
    /// Objects are global
    Cluster,
    /// Each object lives in namespace.
    Namespaced,
}

impl Scope {
    /// Scope from the `namespaced` flag of a discovered resource
    pub fn from_namespaced(namespaced: bool) -> Self {
        if namespaced {
            Scope::Namespaced
        } else {
            Scope::Cluster
        }
    }
}

/// Everything needed to address objects of a kind over the API
///
/// Mappers hand these out by value; consumers should not rely on anything beyond equality.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RestMapping {
    /// The plural resource the kind is served under
    pub resource: GroupVersionResource,
    /// The kind, pinned to the version the mapping was found at
    pub gvk: GroupVersionKind,
    /// Whether objects of this kind live in namespaces
    pub scope: Scope,
}

impl RestMapping {
    /// Whether objects of this kind live in namespaces
    pub fn namespaced(&self) -> bool {
        self.scope == Scope::Namespaced
    }
}
