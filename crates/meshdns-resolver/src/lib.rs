//! meshdns-resolver — service discovery and DNS resolution over the
//! meshdns registry.
//!
//! # Components
//!
//! - **`directory`** — [`ServiceDirectory`]: shared registry + derived
//!   records, and the lifecycle API (register, update, health, deregister)
//! - **`records`** — record materialization and the record table
//! - **`resolver`** — address, locator, text, per-pod, leader and balanced
//!   lookups
//! - **`query`** — [`QueryHandler`] for generic `(name, type)` questions
//! - **`mesh`** — connection-string and service-URL builders
//! - **`names`** — the naming scheme
//!
//! ```text
//! provisioner ──► register / update / mark / deregister
//!                        │  (one write guard)
//!                        ▼
//!            RegistryStore ──materialize──► RecordTable
//!                        │
//! collaborator ◄── resolve_* / handle_query / build_* (read guard)
//! ```

pub mod config;
pub mod directory;
pub mod mesh;
pub mod names;
pub mod query;
pub mod records;
pub mod resolver;
pub mod stats;

pub use config::DirectoryConfig;
pub use directory::ServiceDirectory;
pub use mesh::Credentials;
pub use names::ZoneNames;
pub use query::{Answer, QueryHandler, QueryType};
pub use records::{DnsRecord, LocatorTarget, RecordData, RecordType};
pub use resolver::ServiceSnapshot;
pub use stats::{render_prometheus, DirectoryStats};
