//! Error handling in [`restmapper`][crate]
use restmapper_core::{GroupKind, GroupVersionKind, GroupVersionResource, ParseGroupVersionError};
use thiserror::Error;

/// A type-erased error from a discovery source
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Possible errors when mapping kinds and resources
#[derive(Error, Debug)]
pub enum Error {
    /// The kind is not served at any of the searched versions
    #[error("no matches for kind {:?} in group {:?} (searched versions {searched_versions:?})", .group_kind.kind, .group_kind.group)]
    NoKindMatch {
        /// The kind that was looked up
        group_kind: GroupKind,
        /// The versions the caller asked for, possibly empty
        searched_versions: Vec<String>,
    },

    /// No served resource matches a partially specified resource
    #[error("no matches for {partial}")]
    NoResourceMatch {
        /// The resource that was looked up
        partial: GroupVersionResource,
    },

    /// Several kinds matched and priority could not pick one
    #[error("{partial} matches multiple kinds {matching:?}")]
    AmbiguousKind {
        /// The kind that was looked up, with the version left empty
        partial: GroupVersionKind,
        /// All candidates
        matching: Vec<GroupVersionKind>,
    },

    /// Several resources matched and priority could not pick one
    #[error("{partial} matches multiple resources {matching_resources:?} or kinds {matching_kinds:?}")]
    AmbiguousResource {
        /// The resource that was looked up
        partial: GroupVersionResource,
        /// Candidate resources, empty when kinds were requested
        matching_resources: Vec<GroupVersionResource>,
        /// Candidate kinds, empty when resources were requested
        matching_kinds: Vec<GroupVersionKind>,
    },

    /// A resource lookup was made without a resource name
    #[error("a resource must be present, got: {0}")]
    EmptyResource(GroupVersionResource),

    /// No served resource has this plural or singular name
    #[error("no singular of resource {0} has been defined")]
    NoSingular(String),

    /// The name maps to different singulars in different groups
    #[error("multiple possible singular resources ({candidates:?}) found for {resource}")]
    AmbiguousSingular {
        /// The name that was looked up
        resource: String,
        /// All distinct singulars found
        candidates: Vec<String>,
    },

    /// A discovery document carried an unparseable group version
    #[error("invalid discovery document: {0}")]
    InvalidGroupVersion(#[source] ParseGroupVersionError),

    /// The discovery source failed
    #[error("Error from discovery: {0}")]
    Discovery(#[source] BoxError),
}

impl Error {
    /// Whether the lookup failed because nothing matched
    ///
    /// These are worth retrying after the served schema changes.
    pub fn is_no_match(&self) -> bool {
        matches!(self, Error::NoKindMatch { .. } | Error::NoResourceMatch { .. })
    }

    /// Whether several candidates matched and none could be preferred
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Error::AmbiguousKind { .. } | Error::AmbiguousResource { .. })
    }
}

impl From<ParseGroupVersionError> for Error {
    fn from(err: ParseGroupVersionError) -> Self {
        Error::InvalidGroupVersion(err)
    }
}
