//! meshdns-registry — service registry for meshdns.
//!
//! Holds the authoritative set of known services and their replica
//! endpoints, with secondary indexes for lookup by service type and by
//! `(name, namespace)`.
//!
//! # Architecture
//!
//! The registry is plain process memory. [`RegistryStore`] is a regular
//! owned value (`&mut self` for writes) so callers decide how to share it;
//! `meshdns-resolver` keeps it next to the derived DNS records behind one
//! lock so both change together.

pub mod error;
pub mod store;
pub mod types;

pub use error::{MeshDnsError, MeshDnsResult};
pub use store::RegistryStore;
pub use types::*;
