//! meshdns.toml configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use meshdns_registry::{EndpointRole, ReplicaDescriptor, ServiceType, StatefulServiceDescriptor};
use meshdns_resolver::DirectoryConfig;

pub const DEFAULT_API_PORT: u16 = 8053;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DaemonConfig {
    pub directory: DirectoryConfig,
    pub api: ApiConfig,
    /// Stateful services registered at startup.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<StatefulServiceDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_API_PORT,
        }
    }
}

impl DaemonConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DaemonConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields the
    /// defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.api.port = port;
        }
        self
    }

    pub fn with_zone(mut self, zone: Option<String>) -> Self {
        if let Some(zone) = zone {
            self.directory = self.directory.with_zone_suffix(&zone);
        }
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.directory.validate()?;
        Ok(())
    }

    /// Scaffold a starter meshdns.toml with one seeded two-replica service.
    pub fn scaffold() -> Self {
        let replica = |ordinal: u32, role: EndpointRole| ReplicaDescriptor {
            ordinal,
            pod_name: None,
            address: format!("10.0.0.{}", ordinal + 1),
            port: 5432,
            node_id: format!("node-{ordinal}"),
            role,
            healthy: true,
            weight: None,
        };

        DaemonConfig {
            directory: DirectoryConfig::default(),
            api: ApiConfig::default(),
            services: vec![StatefulServiceDescriptor {
                name: "db".to_string(),
                namespace: "default".to_string(),
                service_type: ServiceType::StatefulCluster,
                owner: "local".to_string(),
                replicas: vec![
                    replica(0, EndpointRole::Leader),
                    replica(1, EndpointRole::Follower),
                ],
                metadata: Default::default(),
                ttl_seconds: None,
            }],
        }
    }
}
