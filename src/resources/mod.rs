//! Built-in resource types
//!
//! - [`repository`] - local, remote and virtual repositories per package type
//! - [`replication`] - push/pull replication, including the deprecated forms
//! - [`webhook`] - one webhook resource per event domain
//! - [`backup`] - backup entries of the system configuration

pub mod backup;
pub mod replication;
pub mod repository;
pub mod webhook;

use crate::resource::ResourceRegistry;

pub(crate) fn register_all(registry: &mut ResourceRegistry) {
    repository::register(registry);
    replication::register(registry);
    webhook::register(registry);
    backup::register(registry);
}
