//! Directory statistics and their Prometheus text rendering.

use serde::{Deserialize, Serialize};

use crate::directory::ServiceDirectory;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryStats {
    pub services: usize,
    pub endpoints: usize,
    pub healthy_endpoints: usize,
    /// Services that currently have a healthy leader.
    pub leaders: usize,
    /// Derived records across all services.
    pub records: usize,
}

impl ServiceDirectory {
    pub fn stats(&self) -> DirectoryStats {
        let state = self.read();
        let mut stats = DirectoryStats {
            services: state.store.len(),
            records: state.records.len(),
            ..Default::default()
        };
        for record in state.store.iter() {
            stats.endpoints += record.endpoints.len();
            stats.healthy_endpoints += record.healthy_endpoints().count();
            if record.leader().is_some() {
                stats.leaders += 1;
            }
        }
        stats
    }
}

/// Render stats in the Prometheus text exposition format.
pub fn render_prometheus(stats: &DirectoryStats) -> String {
    let gauges = [
        ("meshdns_services", "Registered services.", stats.services),
        ("meshdns_endpoints", "Registered endpoints.", stats.endpoints),
        ("meshdns_healthy_endpoints", "Endpoints currently healthy.", stats.healthy_endpoints),
        ("meshdns_leaders", "Services with a healthy leader.", stats.leaders),
        ("meshdns_records", "Derived DNS records.", stats.records),
    ];

    let mut out = String::new();
    for (name, help, value) in gauges {
        out.push_str(&format!("# HELP {name} {help}\n"));
        out.push_str(&format!("# TYPE {name} gauge\n"));
        out.push_str(&format!("{name} {value}\n"));
    }
    out
}
