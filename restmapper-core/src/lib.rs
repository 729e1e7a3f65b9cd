//! Types shared by Kubernetes REST mappers
//!
//! Identity types for kinds and resources, the [`RestMapping`] a mapper resolves a kind to,
//! and the grouped discovery documents mappers are built from.
//! None of this needs a client; the mappers themselves live in the `restmapper` crate.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod discovery;
pub use discovery::ApiGroupResources;

pub mod gvk;
pub use gvk::{GroupKind, GroupVersion, GroupVersionKind, GroupVersionResource, ParseGroupVersionError};

pub mod mapping;
pub use mapping::{RestMapping, Scope};

mod version;
pub use version::Version;
