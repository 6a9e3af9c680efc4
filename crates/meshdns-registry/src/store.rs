//! RegistryStore — the canonical `id → ServiceRecord` map.
//!
//! Two secondary indexes are maintained alongside the primary map:
//! `service_type → {id}` for typed listings and `(name, namespace) → id`
//! for name-based lookup. The store itself is not synchronized; the
//! resolver crate wraps it together with the derived record table behind
//! a single lock.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::types::*;

#[derive(Debug, Default, Clone)]
pub struct RegistryStore {
    records: HashMap<ServiceId, ServiceRecord>,
    by_type: HashMap<ServiceType, BTreeSet<ServiceId>>,
    by_name: HashMap<(String, String), ServiceId>,
}

impl RegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record by id. Returns the previous record.
    ///
    /// A new id, or an id moving to a different `(name, namespace)`, takes
    /// over the name index. Replacing an existing id in place keeps the
    /// index where it was, so updating an older twin does not steal the
    /// name from the newer one.
    pub fn put(&mut self, record: ServiceRecord) -> Option<ServiceRecord> {
        let key = record.name_key();
        let previous = self.records.remove(&record.id);
        let claims_name = match &previous {
            None => true,
            Some(old) => old.name_key() != key || self.by_name.get(&key) == Some(&old.id),
        };
        if let Some(old) = &previous {
            self.unindex(old);
        }

        self.by_type
            .entry(record.service_type)
            .or_default()
            .insert(record.id.clone());
        if claims_name || !self.by_name.contains_key(&key) {
            self.by_name.insert(key, record.id.clone());
        }

        debug!(
            service_id = %record.id,
            name = %record.name,
            namespace = %record.namespace,
            replaced = previous.is_some(),
            "registry record stored"
        );
        self.records.insert(record.id.clone(), record);
        previous
    }

    pub fn get(&self, id: &str) -> Option<&ServiceRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ServiceRecord> {
        self.records.get_mut(id)
    }

    pub fn get_by_name(&self, name: &str, namespace: &str) -> Option<&ServiceRecord> {
        let id = self
            .by_name
            .get(&(name.to_string(), namespace.to_string()))?;
        self.records.get(id)
    }

    /// All records of one type, ordered by namespace, name, then id.
    pub fn list_by_type(&self, service_type: ServiceType) -> Vec<ServiceRecord> {
        let mut results: Vec<ServiceRecord> = self
            .by_type
            .get(&service_type)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.records.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        sort_records(&mut results);
        results
    }

    /// All records, ordered by namespace, name, then id.
    pub fn list_all(&self) -> Vec<ServiceRecord> {
        let mut results: Vec<ServiceRecord> = self.records.values().cloned().collect();
        sort_records(&mut results);
        results
    }

    /// Ids of every record registered under `(name, namespace)`, the
    /// indexed one included.
    pub fn ids_with_name(&self, name: &str, namespace: &str) -> Vec<ServiceId> {
        let mut ids: Vec<ServiceId> = self
            .records
            .values()
            .filter(|r| r.name == name && r.namespace == namespace)
            .map(|r| r.id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceRecord> {
        self.records.values()
    }

    /// Delete a record and scrub both indexes. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Option<ServiceRecord> {
        let removed = self.records.remove(id)?;
        self.unindex(&removed);
        debug!(service_id = %id, "registry record removed");
        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop index entries pointing at `record`. The record itself must
    /// already be out of the primary map.
    fn unindex(&mut self, record: &ServiceRecord) {
        if let Some(ids) = self.by_type.get_mut(&record.service_type) {
            ids.remove(&record.id);
            if ids.is_empty() {
                self.by_type.remove(&record.service_type);
            }
        }

        let key = record.name_key();
        if self.by_name.get(&key) == Some(&record.id) {
            self.by_name.remove(&key);
            // A registration race can leave a second record under the same
            // name; keep it reachable.
            if let Some(other) = self
                .records
                .values()
                .find(|r| r.name == record.name && r.namespace == record.namespace)
            {
                self.by_name.insert(key, other.id.clone());
            }
        }
    }
}

fn sort_records(records: &mut [ServiceRecord]) {
    records.sort_by(|a, b| {
        (&a.namespace, &a.name, &a.id).cmp(&(&b.namespace, &b.name, &b.id))
    });
}
