//! Naming scheme for derived DNS names.
//!
//! | Name | Format |
//! |---|---|
//! | cluster | `<name>.<namespace>.svc.<zone>` |
//! | headless | `<name>.<namespace>.internal.<zone>` |
//! | per-pod | `<pod>.<name>.<namespace>.internal.<zone>` |
//! | leader | `leader.<name>.<namespace>.internal.<zone>` |
//! | locator | `_<name>._tcp.<namespace>.svc.<zone>` |

pub use meshdns_registry::LEADER_LABEL;

/// Builds and parses names under one zone suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneNames {
    zone: String,
}

/// Components of a per-pod name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PodName<'a> {
    pub pod: &'a str,
    pub name: &'a str,
    pub namespace: &'a str,
}

impl ZoneNames {
    pub fn new(zone: &str) -> Self {
        Self {
            zone: zone.trim_end_matches('.').to_string(),
        }
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn cluster_name(&self, name: &str, namespace: &str) -> String {
        format!("{name}.{namespace}.svc.{}", self.zone)
    }

    pub fn headless_name(&self, name: &str, namespace: &str) -> String {
        format!("{name}.{namespace}.internal.{}", self.zone)
    }

    pub fn locator_name(&self, name: &str, namespace: &str) -> String {
        format!("_{name}._tcp.{namespace}.svc.{}", self.zone)
    }

    pub fn pod_name(pod: &str, headless_name: &str) -> String {
        format!("{pod}.{headless_name}")
    }

    pub fn leader_name(headless_name: &str) -> String {
        format!("{LEADER_LABEL}.{headless_name}")
    }

    /// Split a per-pod name into `pod.name.namespace`.
    ///
    /// Returns `None` unless the name ends in `.internal.<zone>` and has
    /// exactly three labels before that suffix.
    pub fn parse_pod_name<'a>(&self, fqdn: &'a str) -> Option<PodName<'a>> {
        let fqdn = normalize(fqdn);
        let head = fqdn
            .strip_suffix(self.zone.as_str())?
            .strip_suffix(".internal.")?;

        let mut labels = head.split('.');
        let pod = labels.next()?;
        let name = labels.next()?;
        let namespace = labels.next()?;
        if labels.next().is_some() || [pod, name, namespace].iter().any(|l| l.is_empty()) {
            return None;
        }
        Some(PodName {
            pod,
            name,
            namespace,
        })
    }

    /// Split a cluster or headless name into `(name, namespace)`.
    pub fn parse_service_name<'a>(&self, fqdn: &'a str) -> Option<(&'a str, &'a str)> {
        let head = normalize(fqdn).strip_suffix(self.zone.as_str())?;
        let head = head
            .strip_suffix(".svc.")
            .or_else(|| head.strip_suffix(".internal."))?;

        let (name, namespace) = head.split_once('.')?;
        if name.is_empty() || namespace.is_empty() || namespace.contains('.') {
            return None;
        }
        Some((name, namespace))
    }
}

/// Strip a single trailing root dot.
pub fn normalize(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_formats() {
        let names = ZoneNames::new("mesh.local");
        assert_eq!(names.cluster_name("db", "default"), "db.default.svc.mesh.local");
        assert_eq!(
            names.headless_name("db", "default"),
            "db.default.internal.mesh.local"
        );
        assert_eq!(
            names.locator_name("db", "default"),
            "_db._tcp.default.svc.mesh.local"
        );
        assert_eq!(
            ZoneNames::pod_name("db-0", "db.default.internal.mesh.local"),
            "db-0.db.default.internal.mesh.local"
        );
        assert_eq!(
            ZoneNames::leader_name("db.default.internal.mesh.local"),
            "leader.db.default.internal.mesh.local"
        );
    }

    #[test]
    fn parse_pod_name_accepts_canonical_form() {
        let names = ZoneNames::new("mesh.local");
        let parsed = names
            .parse_pod_name("db-0.db.default.internal.mesh.local.")
            .unwrap();
        assert_eq!(parsed.pod, "db-0");
        assert_eq!(parsed.name, "db");
        assert_eq!(parsed.namespace, "default");
    }

    #[test]
    fn parse_pod_name_rejects_other_shapes() {
        let names = ZoneNames::new("mesh.local");
        assert!(names.parse_pod_name("db.default.internal.mesh.local").is_none());
        assert!(names.parse_pod_name("x.db-0.db.default.internal.mesh.local").is_none());
        assert!(names.parse_pod_name("db-0.db.default.svc.mesh.local").is_none());
        assert!(names.parse_pod_name("db-0.db.default.internal.other.zone").is_none());
        assert!(names.parse_pod_name(".db.default.internal.mesh.local").is_none());
        assert!(names.parse_pod_name("").is_none());
    }

    #[test]
    fn parse_service_name_accepts_both_canonical_names() {
        let names = ZoneNames::new("mesh.local");
        assert_eq!(
            names.parse_service_name("db.default.svc.mesh.local"),
            Some(("db", "default"))
        );
        assert_eq!(
            names.parse_service_name("db.default.internal.mesh.local."),
            Some(("db", "default"))
        );
        assert!(names.parse_service_name("_db._tcp.default.svc.mesh.local").is_none());
        assert!(names.parse_service_name("db-0.db.default.internal.mesh.local").is_none());
        assert!(names.parse_service_name("db.default.svc.other.zone").is_none());
    }

    #[test]
    fn normalize_strips_one_dot() {
        assert_eq!(normalize("a.b."), "a.b");
        assert_eq!(normalize("a.b"), "a.b");
    }
}
