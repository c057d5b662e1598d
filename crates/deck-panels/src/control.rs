use deck_control::{ControlConfig, ControlError, ControlState, IntentVector, QuickAction};
use deck_proto::ops::FlagKind;
use deck_proto::telemetry::TelemetrySnapshot;
use deck_sim::{DriftProfile, TelemetryFeed};
use tokio::sync::watch;

/// Manual flight pad: control state plus its own telemetry feed.
pub struct ControlPanel {
    controls: ControlState,
    feed: TelemetryFeed,
}

impl ControlPanel {
    pub fn mount(cfg: ControlConfig, profile: DriftProfile) -> Self {
        Self { controls: ControlState::new(cfg), feed: TelemetryFeed::spawn("control", profile) }
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.feed.latest()
    }

    pub fn subscribe(&self) -> watch::Receiver<TelemetrySnapshot> {
        self.feed.subscribe()
    }

    pub fn controls(&self) -> &ControlState {
        &self.controls
    }

    pub fn flags(&self) -> Vec<FlagKind> {
        let mut flags = Vec::new();
        if self.controls.is_locked() {
            flags.push(FlagKind::Locked);
        }
        if self.controls.is_recording() {
            flags.push(FlagKind::Recording);
        }
        flags
    }

    pub fn key_down(&mut self, key: &str) -> IntentVector {
        self.controls.key_down(key)
    }

    pub fn key_up(&mut self, key: &str) -> IntentVector {
        self.controls.key_up(key)
    }

    pub fn toggle_lock(&mut self) -> bool {
        self.controls.toggle_lock()
    }

    pub fn toggle_recording(&mut self) -> Result<bool, ControlError> {
        self.controls.toggle_recording()
    }

    pub fn set_speed(&mut self, pct: u8) -> Result<u8, ControlError> {
        self.controls.set_speed(pct)
    }

    pub fn quick_action(&mut self, action: QuickAction) -> Result<(), ControlError> {
        self.controls.quick_action(action)
    }
}
