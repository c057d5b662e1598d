use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::info;

use crate::input::{InputMapper, IntentVector};
use crate::safety::{ControlError, Interlock};
use crate::ControlConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickAction {
    TakeOff,
    Land,
    ReturnHome,
}

impl QuickAction {
    pub fn label(self) -> &'static str {
        match self {
            QuickAction::TakeOff => "take off",
            QuickAction::Land => "land",
            QuickAction::ReturnHome => "return home",
        }
    }
}

impl fmt::Display for QuickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QuickAction {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "takeoff" | "take-off" => Ok(QuickAction::TakeOff),
            "land" => Ok(QuickAction::Land),
            "home" | "rth" => Ok(QuickAction::ReturnHome),
            other => Err(ControlError::UnknownAction(other.to_string())),
        }
    }
}

/// Everything the remote-control pad owns apart from telemetry.
#[derive(Debug, Clone)]
pub struct ControlState {
    cfg: ControlConfig,
    interlock: Interlock,
    mapper: InputMapper,
    speed: u8,
    recording: bool,
    last_action: Option<QuickAction>,
}

impl ControlState {
    pub fn new(cfg: ControlConfig) -> Self {
        let mut st = Self {
            speed: cfg.speed_min,
            cfg,
            interlock: Interlock::default(),
            mapper: InputMapper::default(),
            recording: false,
            last_action: None,
        };
        st.speed = st.snap_speed(st.cfg.speed_default);
        st
    }

    pub fn is_locked(&self) -> bool {
        self.interlock.is_locked()
    }

    pub fn intents(&self) -> IntentVector {
        self.mapper.intents()
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn last_action(&self) -> Option<QuickAction> {
        self.last_action
    }

    pub fn key_down(&mut self, key: &str) -> IntentVector {
        self.mapper.key_down(key)
    }

    pub fn key_up(&mut self, key: &str) -> IntentVector {
        self.mapper.key_up(key)
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.interlock.set(locked);
        if self.cfg.lock_suppresses_input {
            self.mapper.set_enabled(!locked);
        }
        info!(locked, "control lock changed");
    }

    pub fn toggle_lock(&mut self) -> bool {
        let locked = !self.is_locked();
        self.set_locked(locked);
        locked
    }

    pub fn toggle_recording(&mut self) -> Result<bool, ControlError> {
        self.interlock.check("recording")?;
        self.recording = !self.recording;
        info!(recording = self.recording, "onboard recording toggled");
        Ok(self.recording)
    }

    /// Snaps to the slider grid; returns the applied value.
    pub fn set_speed(&mut self, pct: u8) -> Result<u8, ControlError> {
        self.interlock.check("speed change")?;
        self.speed = self.snap_speed(pct);
        Ok(self.speed)
    }

    pub fn quick_action(&mut self, action: QuickAction) -> Result<(), ControlError> {
        self.interlock.check(action.label())?;
        info!(%action, "quick action sent");
        self.last_action = Some(action);
        Ok(())
    }

    fn snap_speed(&self, pct: u8) -> u8 {
        let (min, max) = (self.cfg.speed_min, self.cfg.speed_max.max(self.cfg.speed_min));
        let v = pct.clamp(min, max);
        let step = self.cfg.speed_step.max(1) as u16;
        let offset = (v - min) as u16;
        let snapped = min as u16 + (offset + step / 2) / step * step;
        snapped.min(max as u16) as u8
    }
}
