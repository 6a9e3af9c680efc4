//! Read side of the directory.
//!
//! Every lookup runs under one read guard and returns owned data, so
//! callers never hold registry state across calls. Unknown names yield
//! empty lists or `None`, never errors.

use serde::Serialize;

use meshdns_registry::{ServiceEndpoint, ServiceRecord, ServiceType};

use crate::directory::ServiceDirectory;
use crate::names::normalize;
use crate::records::{DnsRecord, LocatorTarget, RecordData};

/// A service and its derived records as of one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSnapshot {
    pub record: ServiceRecord,
    pub records: Vec<DnsRecord>,
}

impl ServiceSnapshot {
    /// Records at `name` within this snapshot.
    pub fn at<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DnsRecord> + 'a {
        self.records.iter().filter(move |r| r.name == name)
    }
}

impl ServiceDirectory {
    /// Every record at `name`, in insertion order.
    pub fn lookup(&self, name: &str) -> Vec<DnsRecord> {
        let state = self.read();
        state
            .records
            .lookup(normalize(name))
            .into_iter()
            .cloned()
            .collect()
    }

    /// ADDRESS record values at `name`.
    pub fn resolve_address(&self, name: &str) -> Vec<String> {
        let state = self.read();
        state
            .records
            .lookup(normalize(name))
            .into_iter()
            .filter_map(|r| match &r.data {
                RecordData::Address(addr) => Some(addr.clone()),
                _ => None,
            })
            .collect()
    }

    /// LOCATOR targets at `name`, unsorted. Callers apply their own
    /// selection policy.
    pub fn resolve_locator(&self, name: &str) -> Vec<LocatorTarget> {
        let state = self.read();
        state
            .records
            .lookup(normalize(name))
            .into_iter()
            .filter_map(|r| match &r.data {
                RecordData::Locator(loc) => Some(loc.clone()),
                _ => None,
            })
            .collect()
    }

    /// TEXT record payloads at `name`.
    pub fn resolve_text(&self, name: &str) -> Vec<String> {
        let state = self.read();
        state
            .records
            .lookup(normalize(name))
            .into_iter()
            .filter_map(|r| match &r.data {
                RecordData::Text(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Endpoint addressed by a per-pod name, healthy or not.
    pub fn resolve_per_pod(&self, fqdn: &str) -> Option<ServiceEndpoint> {
        let pod = self.names().parse_pod_name(fqdn)?;
        let state = self.read();
        state
            .store
            .get_by_name(pod.name, pod.namespace)?
            .endpoint_by_pod(pod.pod)
            .cloned()
    }

    /// The healthy leader of a service, if it has one.
    pub fn resolve_leader(&self, name: &str, namespace: &str) -> Option<ServiceEndpoint> {
        let state = self.read();
        state.store.get_by_name(name, namespace)?.leader().cloned()
    }

    /// Healthy endpoints ordered by weight, highest first. Ties keep
    /// endpoint order.
    pub fn resolve_balanced(&self, name: &str, namespace: &str) -> Vec<ServiceEndpoint> {
        let state = self.read();
        state
            .store
            .get_by_name(name, namespace)
            .map(balanced)
            .unwrap_or_default()
    }

    pub fn get_record(&self, id: &str) -> Option<ServiceRecord> {
        self.read().store.get(id).cloned()
    }

    /// Service whose cluster or headless name is `fqdn`. Among
    /// registrations sharing a name, the indexed one answers.
    pub fn get_record_by_fqdn(&self, fqdn: &str) -> Option<ServiceRecord> {
        let (name, namespace) = self.names().parse_service_name(fqdn)?;
        self.read().store.get_by_name(name, namespace).cloned()
    }

    /// The registry entry of a service together with every record it
    /// currently owns, taken under one read guard.
    pub fn snapshot(&self, name: &str, namespace: &str) -> Option<ServiceSnapshot> {
        let state = self.read();
        let record = state.store.get_by_name(name, namespace)?.clone();
        let records = state.records.records_for(&record.id).to_vec();
        Some(ServiceSnapshot { record, records })
    }

    pub fn list_by_type(&self, service_type: ServiceType) -> Vec<ServiceRecord> {
        self.read().store.list_by_type(service_type)
    }

    pub fn list_all(&self) -> Vec<ServiceRecord> {
        self.read().store.list_all()
    }
}

/// Healthy endpoints sorted by weight descending. `sort_by` is stable, so
/// equal weights keep endpoint order.
pub(crate) fn balanced(record: &ServiceRecord) -> Vec<ServiceEndpoint> {
    let mut endpoints: Vec<ServiceEndpoint> = record.healthy_endpoints().cloned().collect();
    endpoints.sort_by(|a, b| b.weight.cmp(&a.weight));
    endpoints
}
