//! ---
//! weft_section: "06-security-access-control"
//! weft_subsection: "module"
//! weft_type: "source"
//! weft_scope: "code"
//! weft_description: "Access-control model, decision algorithm, and grant maintenance."
//! weft_version: "v0.0.0-prealpha"
//! weft_owner: "tbd"
//! ---
use std::sync::Arc;

use prometheus::{IntCounter, Registry};

/// Access-control metrics exported via Prometheus.
#[derive(Clone)]
pub struct AuthzMetrics {
    registry: Arc<Registry>,
    checks_total: IntCounter,
    denials_total: IntCounter,
    auto_grants_total: IntCounter,
    purged_rows_total: IntCounter,
}

impl AuthzMetrics {
    /// Register metrics with the provided registry.
    pub fn new(registry: Arc<Registry>) -> anyhow::Result<Self> {
        let checks_total = IntCounter::new(
            "authz_checks_total",
            "Permission checks evaluated against the store",
        )?;
        let denials_total =
            IntCounter::new("authz_denials_total", "Operations denied by authorization")?;
        let auto_grants_total = IntCounter::new(
            "authz_auto_grants_total",
            "Grants created or widened by identity-link maintenance",
        )?;
        let purged_rows_total = IntCounter::new(
            "authz_purged_rows_total",
            "Authorization rows purged with their resource",
        )?;

        registry.register(Box::new(checks_total.clone()))?;
        registry.register(Box::new(denials_total.clone()))?;
        registry.register(Box::new(auto_grants_total.clone()))?;
        registry.register(Box::new(purged_rows_total.clone()))?;

        Ok(Self {
            registry,
            checks_total,
            denials_total,
            auto_grants_total,
            purged_rows_total,
        })
    }

    /// Access the underlying registry.
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Count one evaluated permission check.
    pub fn inc_check(&self) {
        self.checks_total.inc();
    }

    /// Count one denied operation.
    pub fn inc_denial(&self) {
        self.denials_total.inc();
    }

    /// Count one auto-grant upsert.
    pub fn inc_auto_grant(&self) {
        self.auto_grants_total.inc();
    }

    /// Count rows purged together with their resource.
    pub fn add_purged_rows(&self, rows: usize) {
        self.purged_rows_total.inc_by(rows as u64);
    }
}
