pub mod doctor;
pub mod input;
pub mod safety;
pub mod state;

use serde::Deserialize;

pub use input::{InputMapper, Intent, IntentVector, Key};
pub use safety::{ControlError, Interlock};
pub use state::{ControlState, QuickAction};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// When locked, ignore movement keys and release held ones.
    /// `false` keeps the lock purely cosmetic for the movement pad.
    pub lock_suppresses_input: bool,

    /// Speed slider, percent of max speed.
    pub speed_default: u8,
    pub speed_min: u8,
    pub speed_max: u8,
    pub speed_step: u8,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            lock_suppresses_input: true,
            speed_default: 50,
            speed_min: 10,
            speed_max: 100,
            speed_step: 10,
        }
    }
}
