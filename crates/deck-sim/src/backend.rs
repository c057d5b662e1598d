use std::future::Future;
use std::time::Duration;

use deck_proto::draft::ConfigDraft;
use deck_proto::survey::{BuildingSurvey, MappingReport};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::info;

use crate::error::OpError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpsConfig {
    pub mapping_delay_ms: u64,
    pub save_delay_ms: u64,
    /// Upper bound for any single device operation.
    pub timeout_ms: u64,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self { mapping_delay_ms: 3000, save_delay_ms: 1000, timeout_ms: 10_000 }
    }
}

impl OpsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Device calls behind the dashboard's operation flags.
///
/// Returned futures own everything they need so they can be spawned.
pub trait DeviceBackend: Send + Sync {
    fn survey_area(&self) -> impl Future<Output = Result<MappingReport, OpError>> + Send + 'static;
    fn save_config(&self, draft: ConfigDraft) -> impl Future<Output = Result<ConfigDraft, OpError>> + Send + 'static;
}

/// Fixed-delay stand-in for a real drone link. Always succeeds.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    mapping_delay: Duration,
    save_delay: Duration,
}

impl SimulatedBackend {
    pub fn new(cfg: &OpsConfig) -> Self {
        Self {
            mapping_delay: Duration::from_millis(cfg.mapping_delay_ms),
            save_delay: Duration::from_millis(cfg.save_delay_ms),
        }
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new(&OpsConfig::default())
    }
}

impl DeviceBackend for SimulatedBackend {
    fn survey_area(&self) -> impl Future<Output = Result<MappingReport, OpError>> + Send + 'static {
        let delay = self.mapping_delay;
        async move {
            tokio::time::sleep(delay).await;
            Ok(MappingReport {
                area_m2: 200.0,
                resolution: "10cm/pixel".into(),
                completed_unix_ms: (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64,
                survey: BuildingSurvey::sample(),
            })
        }
    }

    fn save_config(&self, draft: ConfigDraft) -> impl Future<Output = Result<ConfigDraft, OpError>> + Send + 'static {
        let delay = self.save_delay;
        async move {
            tokio::time::sleep(delay).await;
            info!(
                lat = draft.latitude,
                lon = draft.longitude,
                alt_m = draft.altitude_m,
                "drone configuration saved"
            );
            Ok(draft)
        }
    }
}
