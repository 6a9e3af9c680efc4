//! Record materialization — derives the complete DNS record set of a
//! service from its registry entry, and the table those sets live in.
//!
//! A service's set is always replaced as a whole. [`RecordTable::replace`]
//! drops every record the service previously owned, under any name, before
//! installing the new set, so records of removed or renamed endpoints never
//! survive a lifecycle mutation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use meshdns_registry::{EndpointRole, ServiceId, ServiceRecord};

use crate::names::ZoneNames;

/// Priority of leader LOCATOR targets. Lower is preferred.
pub const LEADER_PRIORITY: u16 = 0;

/// Priority of every other LOCATOR target.
pub const REPLICA_PRIORITY: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordType {
    /// Name to bare address (DNS `A`).
    Address,
    /// Service-scope name to prioritized, weighted target (DNS `SRV`).
    Locator,
    /// Opaque `key=value;...` metadata (DNS `TXT`).
    Text,
}

/// Target of a LOCATOR record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorTarget {
    pub priority: u16,
    pub weight: u32,
    pub port: u16,
    /// Per-pod name the locator points at.
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RecordData {
    Address(String),
    Locator(LocatorTarget),
    Text(String),
}

/// A derived record. Only [`materialize`] builds these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub name: String,
    pub ttl_secs: u32,
    pub data: RecordData,
}

impl DnsRecord {
    pub fn record_type(&self) -> RecordType {
        match self.data {
            RecordData::Address(_) => RecordType::Address,
            RecordData::Locator(_) => RecordType::Locator,
            RecordData::Text(_) => RecordType::Text,
        }
    }

    /// Address literal, locator target, or text payload.
    pub fn value(&self) -> &str {
        match &self.data {
            RecordData::Address(addr) => addr,
            RecordData::Locator(loc) => &loc.target,
            RecordData::Text(text) => text,
        }
    }
}

/// Build the full record set for `record`.
///
/// Cluster ADDRESS and LOCATOR records cover healthy endpoints only.
/// Per-pod ADDRESS and TEXT records cover every endpoint. The leader
/// record exists only while a healthy leader does.
pub fn materialize(record: &ServiceRecord, names: &ZoneNames, leader_ttl: u32) -> Vec<DnsRecord> {
    let ttl = record.ttl_seconds;
    let locator_name = names.locator_name(&record.name, &record.namespace);
    let mut records = Vec::with_capacity(record.endpoints.len() * 4 + 1);

    for ep in record.healthy_endpoints() {
        records.push(DnsRecord {
            name: record.cluster_name.clone(),
            ttl_secs: ttl,
            data: RecordData::Address(ep.address.clone()),
        });
    }

    for ep in record.healthy_endpoints() {
        let priority = if ep.role == EndpointRole::Leader {
            LEADER_PRIORITY
        } else {
            REPLICA_PRIORITY
        };
        records.push(DnsRecord {
            name: locator_name.clone(),
            ttl_secs: ttl,
            data: RecordData::Locator(LocatorTarget {
                priority,
                weight: ep.weight,
                port: ep.port,
                target: ZoneNames::pod_name(&ep.pod_name, &record.headless_name),
            }),
        });
    }

    for ep in &record.endpoints {
        let pod_name = ZoneNames::pod_name(&ep.pod_name, &record.headless_name);
        records.push(DnsRecord {
            name: pod_name.clone(),
            ttl_secs: ttl,
            data: RecordData::Address(ep.address.clone()),
        });
        records.push(DnsRecord {
            name: pod_name,
            ttl_secs: ttl,
            data: RecordData::Text(format!(
                "role={};healthy={};nodeId={}",
                ep.role, ep.healthy, ep.node_id
            )),
        });
    }

    if let Some(leader) = record.leader() {
        records.push(DnsRecord {
            name: ZoneNames::leader_name(&record.headless_name),
            ttl_secs: leader_ttl,
            data: RecordData::Address(leader.address.clone()),
        });
    }

    records
}

/// Derived records of every service, indexed by owner and by name.
///
/// Each name has exactly one owning service. Installing a set claims its
/// names, dropping whatever another service held under them.
#[derive(Debug, Default)]
pub struct RecordTable {
    sets: HashMap<ServiceId, Vec<DnsRecord>>,
    /// name → owning service.
    by_name: HashMap<String, ServiceId>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `records` as the complete set for `service_id`, dropping
    /// whatever the service owned before and whatever other services held
    /// under the same names. Returns the number of records dropped.
    pub fn replace(&mut self, service_id: &str, records: Vec<DnsRecord>) -> usize {
        let mut dropped = self.purge(service_id);
        for record in &records {
            let Some(previous) = self
                .by_name
                .insert(record.name.clone(), service_id.to_string())
            else {
                continue;
            };
            if previous == service_id {
                continue;
            }
            if let Some(set) = self.sets.get_mut(&previous) {
                let before = set.len();
                set.retain(|r| r.name != record.name);
                dropped += before - set.len();
            }
        }
        self.sets.insert(service_id.to_string(), records);
        dropped
    }

    /// Remove every record owned by `service_id`. Returns how many.
    pub fn purge(&mut self, service_id: &str) -> usize {
        let Some(old) = self.sets.remove(service_id) else {
            return 0;
        };
        for record in &old {
            if self.by_name.get(&record.name).map(String::as_str) == Some(service_id) {
                self.by_name.remove(&record.name);
            }
        }
        old.len()
    }

    /// All records at `name`, in materialization order.
    pub fn lookup(&self, name: &str) -> Vec<&DnsRecord> {
        let Some(owner) = self.by_name.get(name) else {
            return Vec::new();
        };
        self.sets
            .get(owner)
            .map(|set| set.iter().filter(|r| r.name == name).collect())
            .unwrap_or_default()
    }

    /// Service currently owning `name`.
    pub fn owner_of(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    pub fn records_for(&self, service_id: &str) -> &[DnsRecord] {
        self.sets.get(service_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Total number of records across all services.
    pub fn len(&self) -> usize {
        self.sets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
