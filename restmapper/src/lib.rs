//! Kubernetes REST mappers for schemas discovered at runtime
//!
//! A [`RestMapper`] resolves the kind of an object to the resource used to address it,
//! and answers the reverse questions. Three implementations compose:
//!
//! - [`DiscoveryRestMapper`] answers from one snapshot of discovery data
//! - [`DynamicRestMapper`] rebuilds that snapshot from a [`Discover`] source when a lookup finds nothing
//! - [`CachedRestMapper`] remembers single-version [`RestMapper::rest_mapping`] answers of any mapper
//!
//! ```no_run
//! use restmapper::{dynamic::Config, group_version_resource, CachedRestMapper, StaticDiscovery};
//! use restmapper::core::GroupVersionKind;
//!
//! # async fn wrapper(groups: Vec<restmapper::core::ApiGroupResources>) -> restmapper::Result<()> {
//! let mapper = CachedRestMapper::from_discovery(StaticDiscovery::new(groups), Config::default()).await?;
//! let gvr = group_version_resource(&mapper, &GroupVersionKind::gvk("", "v1", "Pod")).await?;
//! assert_eq!(gvr.resource, "pods");
//! # Ok(())
//! # }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use restmapper_core as core;

pub mod cached;
pub use cached::CachedRestMapper;

pub mod discovery;
pub use discovery::DiscoveryRestMapper;

pub mod dynamic;
pub use dynamic::{Discover, DynamicRestMapper, StaticDiscovery};

pub mod error;
pub use error::{BoxError, Error};

mod helper;
pub use helper::group_version_resource;

mod mapper;
pub use mapper::RestMapper;

#[cfg(test)]
mod test_utils;

/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
