use crate::config::ServerConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use retouch::UploadPolicy;
use std::sync::Arc;

/// Shared application state
///
/// The analysis core holds no cross-request mutable data; everything here
/// is read-only after startup, so handlers share it through plain `Arc`s.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Upload admission policy derived from the configuration
    pub policy: Arc<UploadPolicy>,

    /// Prometheus render handle; `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Create new server state
    pub fn new(config: ServerConfig, metrics: Option<PrometheusHandle>) -> Self {
        let policy = config.upload_policy();
        Self {
            config: Arc::new(config),
            policy: Arc::new(policy),
            metrics,
        }
    }
}