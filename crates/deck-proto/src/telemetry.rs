use serde::{Deserialize, Serialize};

/// Battery level above which the pack is considered healthy.
pub const BATTERY_GOOD_PCT: f64 = 50.0;
/// Battery level above which the pack is low but not critical.
pub const BATTERY_LOW_PCT: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySnapshot {
    pub battery_pct: f64,
    pub signal_pct: u8,
    pub altitude_m: f32,
    pub speed_mps: f32,
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            battery_pct: 87.0,
            signal_pct: 92,
            altitude_m: 28.0,
            speed_mps: 15.0,
        }
    }
}

impl TelemetrySnapshot {
    pub fn battery_band(&self) -> BatteryBand {
        BatteryBand::classify(self.battery_pct)
    }

    /// Battery rounded to a whole percent, as shown on the dashboard chip.
    pub fn battery_display(&self) -> u8 {
        self.battery_pct.round().clamp(0.0, 100.0) as u8
    }

    pub fn view(&self) -> TelemetryView {
        TelemetryView {
            battery_pct: self.battery_display(),
            battery_band: self.battery_band(),
            signal_pct: self.signal_pct,
            altitude_m: self.altitude_m,
            speed_mps: self.speed_mps,
        }
    }
}

/// Snapshot as presented to the operator: rounded battery plus its band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetryView {
    pub battery_pct: u8,
    pub battery_band: BatteryBand,
    pub signal_pct: u8,
    pub altitude_m: f32,
    pub speed_mps: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryBand {
    Good,
    Low,
    Critical,
}

impl BatteryBand {
    pub fn classify(pct: f64) -> Self {
        if pct > BATTERY_GOOD_PCT {
            BatteryBand::Good
        } else if pct > BATTERY_LOW_PCT {
            BatteryBand::Low
        } else {
            BatteryBand::Critical
        }
    }
}
