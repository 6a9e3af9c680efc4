//! Domain types for the meshdns service registry.
//!
//! A [`ServiceRecord`] is the canonical description of one logical service
//! and owns its [`ServiceEndpoint`]s. DNS records are never stored here; they
//! are derived from these types by the resolver crate.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{MeshDnsError, MeshDnsResult};

/// Opaque, globally unique service identifier assigned at registration.
pub type ServiceId = String;

/// Identifier of the physical or virtual host carrying a replica.
pub type NodeId = String;

/// Default record TTL for a service, in seconds.
pub const DEFAULT_SERVICE_TTL_SECS: u32 = 30;

/// First label of the leader name. Reserved as a pod name.
pub const LEADER_LABEL: &str = "leader";

// ── Service type ──────────────────────────────────────────────────

/// Category of a registered service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    StatefulCluster,
    ConsensusGroup,
    MpcNetwork,
    WorkerPool,
    Database,
    OauthService,
    StorageGateway,
    Indexer,
    RpcGateway,
}

impl ServiceType {
    pub const ALL: [ServiceType; 9] = [
        ServiceType::StatefulCluster,
        ServiceType::ConsensusGroup,
        ServiceType::MpcNetwork,
        ServiceType::WorkerPool,
        ServiceType::Database,
        ServiceType::OauthService,
        ServiceType::StorageGateway,
        ServiceType::Indexer,
        ServiceType::RpcGateway,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::StatefulCluster => "stateful-cluster",
            ServiceType::ConsensusGroup => "consensus-group",
            ServiceType::MpcNetwork => "mpc-network",
            ServiceType::WorkerPool => "worker-pool",
            ServiceType::Database => "database",
            ServiceType::OauthService => "oauth-service",
            ServiceType::StorageGateway => "storage-gateway",
            ServiceType::Indexer => "indexer",
            ServiceType::RpcGateway => "rpc-gateway",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = MeshDnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| MeshDnsError::Validation(format!("unknown service type '{s}'")))
    }
}

// ── Endpoint ──────────────────────────────────────────────────────

/// Role a replica plays within its service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndpointRole {
    Leader,
    Follower,
    MpcParty,
    Worker,
    Candidate,
}

impl EndpointRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointRole::Leader => "leader",
            EndpointRole::Follower => "follower",
            EndpointRole::MpcParty => "mpc-party",
            EndpointRole::Worker => "worker",
            EndpointRole::Candidate => "candidate",
        }
    }
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One replica of a service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceEndpoint {
    /// Stable 0-based position in the replica set.
    pub ordinal: u32,
    /// Stable per-replica identifier, first label of the per-pod name.
    pub pod_name: String,
    pub address: String,
    pub port: u16,
    pub node_id: NodeId,
    pub role: EndpointRole,
    pub healthy: bool,
    /// Load-balancing preference, higher is preferred.
    pub weight: u32,
}

impl ServiceEndpoint {
    /// `address:port` string.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn is_healthy_leader(&self) -> bool {
        self.healthy && self.role == EndpointRole::Leader
    }
}

// ── Service record ────────────────────────────────────────────────

/// The registry entry for one logical service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceRecord {
    pub id: ServiceId,
    pub name: String,
    pub namespace: String,
    pub service_type: ServiceType,
    /// Controlling principal. Only collaborators interpret this.
    pub owner: String,
    pub endpoints: Vec<ServiceEndpoint>,
    /// Per-pod addressing name (`<name>.<namespace>.internal.<zone>`).
    pub headless_name: String,
    /// Load-balanced, health-filtered name (`<name>.<namespace>.svc.<zone>`).
    pub cluster_name: String,
    pub metadata: HashMap<String, String>,
    /// Unix timestamp (seconds) of registration.
    pub created_at: u64,
    /// Unix timestamp (seconds) of the last lifecycle mutation.
    pub updated_at: u64,
    pub ttl_seconds: u32,
}

impl ServiceRecord {
    /// Endpoints with `healthy == true`, in endpoint order.
    pub fn healthy_endpoints(&self) -> impl Iterator<Item = &ServiceEndpoint> {
        self.endpoints.iter().filter(|e| e.healthy)
    }

    /// The first healthy leader, if any.
    pub fn leader(&self) -> Option<&ServiceEndpoint> {
        self.endpoints.iter().find(|e| e.is_healthy_leader())
    }

    pub fn endpoint_by_pod(&self, pod_name: &str) -> Option<&ServiceEndpoint> {
        self.endpoints.iter().find(|e| e.pod_name == pod_name)
    }

    pub fn endpoint_by_ordinal_mut(&mut self, ordinal: u32) -> Option<&mut ServiceEndpoint> {
        self.endpoints.iter_mut().find(|e| e.ordinal == ordinal)
    }

    /// Key used by the name index.
    pub fn name_key(&self) -> (String, String) {
        (self.name.clone(), self.namespace.clone())
    }
}

// ── Registration descriptors ──────────────────────────────────────

/// Replica description handed over by a provisioner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplicaDescriptor {
    pub ordinal: u32,
    /// Defaults to `<service name>-<ordinal>`.
    #[serde(default)]
    pub pod_name: Option<String>,
    pub address: String,
    pub port: u16,
    pub node_id: NodeId,
    pub role: EndpointRole,
    #[serde(default = "default_healthy")]
    pub healthy: bool,
    /// Overrides the role-based default weight.
    #[serde(default)]
    pub weight: Option<u32>,
}

fn default_healthy() -> bool {
    true
}

/// Registration request for a replicated stateful service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatefulServiceDescriptor {
    pub name: String,
    pub namespace: String,
    #[serde(default = "default_stateful_type")]
    pub service_type: ServiceType,
    #[serde(default)]
    pub owner: String,
    pub replicas: Vec<ReplicaDescriptor>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub ttl_seconds: Option<u32>,
}

fn default_stateful_type() -> ServiceType {
    ServiceType::StatefulCluster
}

/// Registration request for any other service kind. Endpoints are taken
/// as-is, no default weighting is applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypedServiceDescriptor {
    /// Caller-chosen id. One is generated when absent.
    #[serde(default)]
    pub id: Option<ServiceId>,
    pub name: String,
    pub namespace: String,
    pub service_type: ServiceType,
    #[serde(default)]
    pub owner: String,
    pub endpoints: Vec<ServiceEndpoint>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub ttl_seconds: Option<u32>,
}

/// Check that `name` and `namespace` can be used as single DNS labels.
///
/// Dots are rejected so that distinct `(name, namespace)` pairs can never
/// derive the same canonical names.
pub fn validate_service_name(name: &str, namespace: &str) -> MeshDnsResult<()> {
    validate_label("name", name)?;
    validate_label("namespace", namespace)
}

/// Check an endpoint list before it is stored.
///
/// Every pod name must be a single DNS label other than the leader label,
/// and pod names and ordinals must be unique within the service.
pub fn validate_endpoints(endpoints: &[ServiceEndpoint]) -> MeshDnsResult<()> {
    let mut pods = HashSet::new();
    let mut ordinals = HashSet::new();
    for ep in endpoints {
        validate_label("pod_name", &ep.pod_name)?;
        if ep.pod_name == LEADER_LABEL {
            return Err(MeshDnsError::Validation(format!(
                "pod_name '{LEADER_LABEL}' is reserved"
            )));
        }
        if !pods.insert(ep.pod_name.as_str()) {
            return Err(MeshDnsError::Validation(format!(
                "duplicate pod_name '{}'",
                ep.pod_name
            )));
        }
        if !ordinals.insert(ep.ordinal) {
            return Err(MeshDnsError::Validation(format!(
                "duplicate ordinal {}",
                ep.ordinal
            )));
        }
    }
    Ok(())
}

fn validate_label(field: &str, value: &str) -> MeshDnsResult<()> {
    if value.is_empty() {
        return Err(MeshDnsError::Validation(format!("{field} must not be empty")));
    }
    if value.contains('.') || value.chars().any(char::is_whitespace) {
        return Err(MeshDnsError::Validation(format!(
            "{field} '{value}' must be a single DNS label"
        )));
    }
    Ok(())
}

pub fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
