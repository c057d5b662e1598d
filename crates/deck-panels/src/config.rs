use deck_proto::draft::{ConfigDraft, DraftField};
use deck_proto::ops::FlagKind;
use deck_sim::{DeviceBackend, OpError, Operation, OpsConfig, StartOutcome};
use tracing::debug;

use crate::error::PanelError;

/// Mission target form. Submitting runs a save against the device.
pub struct ConfigPanel {
    defaults: ConfigDraft,
    draft: ConfigDraft,
    save: Operation<ConfigDraft>,
}

impl ConfigPanel {
    pub fn mount(defaults: ConfigDraft, ops: &OpsConfig) -> Self {
        Self { defaults, draft: defaults, save: Operation::new(FlagKind::Saving, ops.timeout()) }
    }

    pub fn draft(&self) -> ConfigDraft {
        self.draft
    }

    pub fn set_field(&mut self, field: &str, raw: &str) -> Result<(), PanelError> {
        let field: DraftField = field.parse()?;
        self.draft.set(field, raw)?;
        debug!(?field, raw, "config field edited");
        Ok(())
    }

    pub fn reset(&mut self) {
        self.draft = self.defaults;
    }

    /// The submit button is disabled while saving, so a second submit is ignored.
    pub fn submit<B: DeviceBackend>(&mut self, backend: &B) -> StartOutcome {
        if self.save.is_active() {
            return StartOutcome::AlreadyRunning;
        }
        self.save.start(backend.save_config(self.draft))
    }

    pub fn is_saving(&self) -> bool {
        self.save.is_active()
    }

    pub fn flags(&self) -> Vec<FlagKind> {
        if self.is_saving() {
            vec![FlagKind::Saving]
        } else {
            Vec::new()
        }
    }

    pub fn last_saved(&self) -> Option<ConfigDraft> {
        self.save.last_ok()
    }

    pub fn last_error(&self) -> Option<OpError> {
        self.save.last_outcome().and_then(Result::err)
    }

    pub async fn wait(&mut self) {
        self.save.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_sim::SimulatedBackend;
    use std::time::Duration;

    fn panel() -> ConfigPanel {
        ConfigPanel::mount(ConfigDraft::default(), &OpsConfig::default())
    }

    #[test]
    fn edits_and_reset() {
        let mut p = panel();
        p.set_field("latitude", "48.85").unwrap();
        p.set_field("altitude", "120").unwrap();
        assert_eq!(p.draft().latitude, 48.85);
        assert!(matches!(p.set_field("altitude", "high"), Err(PanelError::Draft(_))));
        assert!(matches!(p.set_field("heading", "1"), Err(PanelError::Draft(_))));
        assert_eq!(p.draft().altitude_m, 120.0);
        p.reset();
        assert_eq!(p.draft(), ConfigDraft::default());
    }

    #[tokio::test(start_paused = true)]
    async fn submit_saves_the_draft_once() {
        let backend = SimulatedBackend::default();
        let mut p = panel();
        p.set_field("lon", "2.35").unwrap();
        assert_eq!(p.submit(&backend), StartOutcome::Started);
        assert!(p.is_saving());
        assert_eq!(p.submit(&backend), StartOutcome::AlreadyRunning);

        // edits while saving do not change what is being saved
        p.set_field("lon", "9").unwrap();
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert!(!p.is_saving());
        assert_eq!(p.last_saved().map(|d| d.longitude), Some(2.35));
        assert!(p.last_error().is_none());
    }
}
