//! ServiceDirectory — the shared registry plus its derived records, and
//! the lifecycle API that is the only way either changes.
//!
//! The Registry Store and the record table sit behind one `RwLock`. Every
//! mutation updates the registry entry and re-materializes the service's
//! records under a single write guard, so readers never observe a record
//! set mixing two versions of the same service.
//!
//! When several registrations share a `(name, namespace)`, only the one the
//! registry's name index points at has records. The others stay in the
//! registry without DNS presence until the indexed one is deregistered.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use meshdns_registry::*;

use crate::config::DirectoryConfig;
use crate::names::ZoneNames;
use crate::records::{materialize, RecordTable};

static SERVICE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Registry state guarded as one unit.
#[derive(Debug, Default)]
pub(crate) struct DirectoryState {
    pub(crate) store: RegistryStore,
    pub(crate) records: RecordTable,
}

/// Thread-safe service directory. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct ServiceDirectory {
    state: Arc<RwLock<DirectoryState>>,
    config: Arc<DirectoryConfig>,
    names: ZoneNames,
}

impl ServiceDirectory {
    /// Build an empty directory. Fails when `config` does not validate.
    pub fn new(config: DirectoryConfig) -> MeshDnsResult<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: DirectoryConfig) -> Self {
        let names = ZoneNames::new(&config.zone_suffix);
        Self {
            state: Arc::new(RwLock::new(DirectoryState::default())),
            config: Arc::new(config),
            names,
        }
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    pub fn names(&self) -> &ZoneNames {
        &self.names
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, DirectoryState> {
        self.state.read().expect("directory lock")
    }

    fn write(&self) -> RwLockWriteGuard<'_, DirectoryState> {
        self.state.write().expect("directory lock")
    }

    // ── Registration ───────────────────────────────────────────────

    /// Register a replicated stateful service.
    ///
    /// Leader replicas get the configured leader weight and all others the
    /// default weight, unless the replica carries its own.
    pub fn register_stateful_service(
        &self,
        descriptor: StatefulServiceDescriptor,
    ) -> MeshDnsResult<ServiceRecord> {
        validate_service_name(&descriptor.name, &descriptor.namespace)?;

        let endpoints = descriptor
            .replicas
            .iter()
            .map(|r| ServiceEndpoint {
                ordinal: r.ordinal,
                pod_name: r
                    .pod_name
                    .clone()
                    .unwrap_or_else(|| format!("{}-{}", descriptor.name, r.ordinal)),
                address: r.address.clone(),
                port: r.port,
                node_id: r.node_id.clone(),
                role: r.role,
                healthy: r.healthy,
                weight: r.weight.unwrap_or(if r.role == EndpointRole::Leader {
                    self.config.leader_weight
                } else {
                    self.config.default_weight
                }),
            })
            .collect::<Vec<_>>();
        validate_endpoints(&endpoints)?;

        let mut state = self.write();
        let id = unique_service_id(&state.store, &descriptor.name, &descriptor.namespace);
        let record = self.new_record(
            id,
            descriptor.name,
            descriptor.namespace,
            descriptor.service_type,
            descriptor.owner,
            endpoints,
            descriptor.metadata,
            descriptor.ttl_seconds,
        );
        self.commit(&mut state, record.clone());

        info!(
            service_id = %record.id,
            name = %record.name,
            namespace = %record.namespace,
            replicas = record.endpoints.len(),
            "stateful service registered"
        );
        Ok(record)
    }

    /// Register any other service kind with a pre-built endpoint list.
    ///
    /// An explicit id that is already registered is replaced.
    pub fn register_typed_service(
        &self,
        descriptor: TypedServiceDescriptor,
    ) -> MeshDnsResult<ServiceRecord> {
        validate_service_name(&descriptor.name, &descriptor.namespace)?;
        if descriptor.id.as_deref() == Some("") {
            return Err(MeshDnsError::Validation("id must not be empty".to_string()));
        }
        validate_endpoints(&descriptor.endpoints)?;

        let mut state = self.write();
        let id = match descriptor.id {
            Some(id) => id,
            None => unique_service_id(&state.store, &descriptor.name, &descriptor.namespace),
        };
        let mut record = self.new_record(
            id,
            descriptor.name,
            descriptor.namespace,
            descriptor.service_type,
            descriptor.owner,
            descriptor.endpoints,
            descriptor.metadata,
            descriptor.ttl_seconds,
        );
        if let Some(existing) = state.store.get(&record.id) {
            record.created_at = existing.created_at;
        }
        self.commit(&mut state, record.clone());

        info!(
            service_id = %record.id,
            name = %record.name,
            namespace = %record.namespace,
            service_type = %record.service_type,
            endpoints = record.endpoints.len(),
            "service registered"
        );
        Ok(record)
    }

    // ── Mutation ───────────────────────────────────────────────────

    /// Replace the endpoint list of a service wholesale.
    pub fn update_endpoints(
        &self,
        id: &str,
        endpoints: Vec<ServiceEndpoint>,
    ) -> MeshDnsResult<ServiceRecord> {
        validate_endpoints(&endpoints)?;

        let mut state = self.write();
        let mut record = state
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| MeshDnsError::NotFound(format!("service {id}")))?;

        record.endpoints = endpoints;
        record.updated_at = epoch_secs();
        self.commit(&mut state, record.clone());

        debug!(service_id = %id, endpoints = record.endpoints.len(), "endpoints replaced");
        Ok(record)
    }

    /// Mark the endpoint with `ordinal` healthy. Returns `false` when the
    /// service or ordinal is unknown.
    pub fn mark_healthy(&self, id: &str, ordinal: u32) -> bool {
        self.set_health(id, ordinal, true)
    }

    /// Mark the endpoint with `ordinal` unhealthy. Returns `false` when the
    /// service or ordinal is unknown.
    pub fn mark_unhealthy(&self, id: &str, ordinal: u32) -> bool {
        self.set_health(id, ordinal, false)
    }

    fn set_health(&self, id: &str, ordinal: u32, healthy: bool) -> bool {
        let mut state = self.write();
        let Some(mut record) = state.store.get(id).cloned() else {
            debug!(service_id = %id, ordinal, "health report for unknown service ignored");
            return false;
        };
        let Some(endpoint) = record.endpoint_by_ordinal_mut(ordinal) else {
            debug!(service_id = %id, ordinal, "health report for unknown ordinal ignored");
            return false;
        };
        if endpoint.healthy == healthy {
            return true;
        }

        endpoint.healthy = healthy;
        record.updated_at = epoch_secs();
        self.commit(&mut state, record);

        debug!(service_id = %id, ordinal, healthy, "endpoint health changed");
        true
    }

    /// Remove a service and purge its derived records. Returns `false` when
    /// the id is unknown.
    pub fn deregister(&self, id: &str) -> bool {
        let mut state = self.write();
        let Some(record) = state.store.remove(id) else {
            debug!(service_id = %id, "deregister of unknown service ignored");
            return false;
        };
        let purged = state.records.purge(id);
        self.refresh_name(&mut state, &record.name, &record.namespace);

        info!(
            service_id = %id,
            name = %record.name,
            namespace = %record.namespace,
            purged,
            "service deregistered"
        );
        true
    }

    // ── Internals ──────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    fn new_record(
        &self,
        id: ServiceId,
        name: String,
        namespace: String,
        service_type: ServiceType,
        owner: String,
        endpoints: Vec<ServiceEndpoint>,
        metadata: std::collections::HashMap<String, String>,
        ttl_seconds: Option<u32>,
    ) -> ServiceRecord {
        let now = epoch_secs();
        ServiceRecord {
            headless_name: self.names.headless_name(&name, &namespace),
            cluster_name: self.names.cluster_name(&name, &namespace),
            id,
            name,
            namespace,
            service_type,
            owner,
            endpoints,
            metadata,
            created_at: now,
            updated_at: now,
            ttl_seconds: ttl_seconds.unwrap_or(self.config.default_ttl_secs),
        }
    }

    /// Store `record` and re-materialize the names it touches.
    fn commit(&self, state: &mut DirectoryState, record: ServiceRecord) {
        let (name, namespace) = (record.name.clone(), record.namespace.clone());
        let previous = state.store.put(record);
        self.refresh_name(state, &name, &namespace);
        if let Some(old) = previous.filter(|old| old.name != name || old.namespace != namespace) {
            self.refresh_name(state, &old.name, &old.namespace);
        }
    }

    /// Give the names of `(name, namespace)` to the indexed registration
    /// and drop the records of every other registration sharing them.
    fn refresh_name(&self, state: &mut DirectoryState, name: &str, namespace: &str) {
        let owner = state.store.get_by_name(name, namespace).map(|r| {
            (
                r.id.clone(),
                materialize(r, &self.names, self.config.leader_ttl_secs),
            )
        });

        let mut dropped = 0;
        for id in state.store.ids_with_name(name, namespace) {
            if owner.as_ref().is_none_or(|(owner_id, _)| *owner_id != id) {
                dropped += state.records.purge(&id);
            }
        }

        if let Some((id, records)) = owner {
            let count = records.len();
            dropped += state.records.replace(&id, records);
            debug!(service_id = %id, records = count, dropped, "records materialized");
        }
    }
}

impl Default for ServiceDirectory {
    fn default() -> Self {
        Self::from_config(DirectoryConfig::default())
    }
}

/// `svc-<16 hex>` not yet present in `store`.
fn unique_service_id(store: &RegistryStore, name: &str, namespace: &str) -> ServiceId {
    loop {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        namespace.hash(&mut hasher);
        epoch_secs().hash(&mut hasher);
        SERVICE_SEQ.fetch_add(1, Ordering::Relaxed).hash(&mut hasher);
        let id = format!("svc-{:016x}", hasher.finish());
        if store.get(&id).is_none() {
            return id;
        }
    }
}
