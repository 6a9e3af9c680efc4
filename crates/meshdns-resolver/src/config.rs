//! Directory configuration: zone suffix, TTLs, and default weights.

use serde::{Deserialize, Serialize};

use meshdns_registry::{DEFAULT_SERVICE_TTL_SECS, MeshDnsError, MeshDnsResult};

/// TTL of the `leader.*` record. Leadership is the most volatile fact in
/// the directory, so it is kept short regardless of the service TTL.
pub const DEFAULT_LEADER_TTL_SECS: u32 = 10;

pub const DEFAULT_LEADER_WEIGHT: u32 = 100;

pub const DEFAULT_REPLICA_WEIGHT: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Zone every derived name ends with, e.g. `mesh.local`.
    pub zone_suffix: String,
    /// TTL applied to services that do not carry their own.
    pub default_ttl_secs: u32,
    pub leader_ttl_secs: u32,
    /// Weight given to leader replicas of stateful services.
    pub leader_weight: u32,
    /// Weight given to every other stateful replica.
    pub default_weight: u32,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            zone_suffix: "mesh.local".to_string(),
            default_ttl_secs: DEFAULT_SERVICE_TTL_SECS,
            leader_ttl_secs: DEFAULT_LEADER_TTL_SECS,
            leader_weight: DEFAULT_LEADER_WEIGHT,
            default_weight: DEFAULT_REPLICA_WEIGHT,
        }
    }
}

impl DirectoryConfig {
    pub fn with_zone_suffix(mut self, zone: &str) -> Self {
        self.zone_suffix = zone.trim_end_matches('.').to_string();
        self
    }

    pub fn validate(&self) -> MeshDnsResult<()> {
        if self.zone_suffix.is_empty() {
            return Err(MeshDnsError::Validation(
                "zone_suffix must not be empty".to_string(),
            ));
        }
        if self.zone_suffix.split('.').any(str::is_empty) {
            return Err(MeshDnsError::Validation(format!(
                "zone_suffix '{}' contains an empty label",
                self.zone_suffix
            )));
        }
        if self.default_ttl_secs == 0 || self.leader_ttl_secs == 0 {
            return Err(MeshDnsError::Validation(
                "record TTLs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DirectoryConfig::default();
        assert_eq!(config.default_ttl_secs, 30);
        assert_eq!(config.leader_ttl_secs, 10);
        assert_eq!(config.leader_weight, 100);
        assert_eq!(config.default_weight, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation() {
        let mut config = DirectoryConfig::default();
        config.zone_suffix = String::new();
        assert!(config.validate().is_err());

        config.zone_suffix = "mesh..local".to_string();
        assert!(config.validate().is_err());

        config = DirectoryConfig::default();
        config.leader_ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zone_override_strips_root_dot() {
        let config = DirectoryConfig::default().with_zone_suffix("cluster.example.");
        assert_eq!(config.zone_suffix, "cluster.example");
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: DirectoryConfig = serde_json::from_str(r#"{"zone_suffix":"grid"}"#).unwrap();
        assert_eq!(config.zone_suffix, "grid");
        assert_eq!(config.default_ttl_secs, 30);
    }
}
