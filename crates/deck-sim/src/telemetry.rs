use deck_proto::telemetry::TelemetrySnapshot;
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;

/// Drift parameters for one simulated telemetry source.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftProfile {
    pub period_ms: u64,
    /// Battery percent drained per tick.
    pub battery_step: f64,
    pub battery_floor: f64,
    pub signal_min: u8,
    pub signal_max: u8,
    pub initial: TelemetrySnapshot,
}

impl DriftProfile {
    /// Remote-control panel: full telemetry, battery drains.
    pub fn control() -> Self {
        Self {
            period_ms: 3000,
            battery_step: 0.1,
            battery_floor: 1.0,
            signal_min: 50,
            signal_max: 99,
            initial: TelemetrySnapshot::default(),
        }
    }

    /// Video downlink: signal only, no battery drain.
    pub fn video() -> Self {
        Self {
            period_ms: 5000,
            battery_step: 0.0,
            battery_floor: 0.0,
            signal_min: 75,
            signal_max: 99,
            initial: TelemetrySnapshot { signal_pct: 95, ..TelemetrySnapshot::default() },
        }
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms.max(1))
    }
}

/// A `[telemetry.*]` config section. Keys left out keep the value of the
/// preset the section is applied to, so a partial video section stays a video
/// profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DriftOverrides {
    pub period_ms: Option<u64>,
    pub battery_step: Option<f64>,
    pub battery_floor: Option<f64>,
    pub signal_min: Option<u8>,
    pub signal_max: Option<u8>,
    pub initial: SnapshotOverrides,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SnapshotOverrides {
    pub battery_pct: Option<f64>,
    pub signal_pct: Option<u8>,
    pub altitude_m: Option<f32>,
    pub speed_mps: Option<f32>,
}

impl DriftOverrides {
    pub fn apply(&self, base: DriftProfile) -> DriftProfile {
        let init = &self.initial;
        DriftProfile {
            period_ms: self.period_ms.unwrap_or(base.period_ms),
            battery_step: self.battery_step.unwrap_or(base.battery_step),
            battery_floor: self.battery_floor.unwrap_or(base.battery_floor),
            signal_min: self.signal_min.unwrap_or(base.signal_min),
            signal_max: self.signal_max.unwrap_or(base.signal_max),
            initial: TelemetrySnapshot {
                battery_pct: init.battery_pct.unwrap_or(base.initial.battery_pct),
                signal_pct: init.signal_pct.unwrap_or(base.initial.signal_pct),
                altitude_m: init.altitude_m.unwrap_or(base.initial.altitude_m),
                speed_mps: init.speed_mps.unwrap_or(base.initial.speed_mps),
            },
        }
    }
}

/// Pure tick logic behind a telemetry feed.
///
/// Battery is derived from the last reset point rather than accumulated, so
/// after N ticks it is exactly `max(floor, origin - N * step)`.
#[derive(Debug)]
pub struct TelemetrySim<R> {
    profile: DriftProfile,
    rng: R,
    origin_battery: f64,
    ticks_since_reset: u64,
    ticks: u64,
    snapshot: TelemetrySnapshot,
}

impl<R: Rng> TelemetrySim<R> {
    pub fn new(profile: DriftProfile, rng: R) -> Self {
        let mut snapshot = profile.initial;
        snapshot.battery_pct = snapshot.battery_pct.clamp(0.0, 100.0);
        snapshot.signal_pct = snapshot.signal_pct.clamp(profile.signal_min, profile.signal_max);
        Self {
            origin_battery: snapshot.battery_pct,
            profile,
            rng,
            ticks_since_reset: 0,
            ticks: 0,
            snapshot,
        }
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.snapshot
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn profile(&self) -> &DriftProfile {
        &self.profile
    }

    pub fn tick(&mut self) -> TelemetrySnapshot {
        self.ticks += 1;
        self.ticks_since_reset += 1;

        // never raise the level when the origin already sits below the floor
        let floor = self.profile.battery_floor.min(self.origin_battery);
        let drained = self.origin_battery - self.ticks_since_reset as f64 * self.profile.battery_step;
        self.snapshot.battery_pct = drained.max(floor);

        let delta: i16 = if self.rng.gen_bool(0.5) { 1 } else { -1 };
        let signal = (self.snapshot.signal_pct as i16 + delta)
            .clamp(self.profile.signal_min as i16, self.profile.signal_max as i16);
        self.snapshot.signal_pct = signal as u8;

        self.snapshot
    }

    /// External battery reset (e.g. pack swap).
    pub fn reset_battery(&mut self, pct: f64) {
        self.origin_battery = pct.clamp(0.0, 100.0);
        self.ticks_since_reset = 0;
        self.snapshot.battery_pct = self.origin_battery;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sim(profile: DriftProfile, seed: u64) -> TelemetrySim<StdRng> {
        TelemetrySim::new(profile, StdRng::seed_from_u64(seed))
    }

    #[test]
    fn battery_follows_closed_form() {
        let p = DriftProfile::control();
        let mut s = sim(p.clone(), 7);
        for n in 1..=1200u64 {
            let snap = s.tick();
            let expected = (p.initial.battery_pct - n as f64 * p.battery_step).max(p.battery_floor);
            assert_eq!(snap.battery_pct, expected, "tick {n}");
        }
        assert_eq!(s.snapshot().battery_pct, p.battery_floor);
    }

    #[test]
    fn battery_never_increases_without_reset() {
        let mut s = sim(DriftProfile::control(), 11);
        let mut prev = s.snapshot().battery_pct;
        for _ in 0..2000 {
            let cur = s.tick().battery_pct;
            assert!(cur <= prev);
            prev = cur;
        }
    }

    #[test]
    fn reset_restarts_the_drain() {
        let mut s = sim(DriftProfile::control(), 3);
        for _ in 0..10 {
            s.tick();
        }
        s.reset_battery(100.0);
        assert_eq!(s.snapshot().battery_pct, 100.0);
        assert_eq!(s.tick().battery_pct, 100.0 - 0.1);
        assert_eq!(s.ticks(), 11);
    }

    #[test]
    fn origin_below_floor_does_not_rise() {
        let mut p = DriftProfile::control();
        p.initial.battery_pct = 0.5;
        let mut s = sim(p, 5);
        assert_eq!(s.tick().battery_pct, 0.5);
    }

    #[test]
    fn signal_stays_in_band() {
        for (profile, seed) in [(DriftProfile::control(), 1), (DriftProfile::video(), 2)] {
            let (lo, hi) = (profile.signal_min, profile.signal_max);
            let mut s = sim(profile, seed);
            for _ in 0..5000 {
                let sig = s.tick().signal_pct;
                assert!((lo..=hi).contains(&sig), "signal {sig} outside [{lo},{hi}]");
            }
        }
    }

    #[test]
    fn initial_signal_is_clamped_into_band() {
        let mut p = DriftProfile::video();
        p.initial.signal_pct = 10;
        let s = sim(p, 9);
        assert_eq!(s.snapshot().signal_pct, 75);
    }

    #[test]
    fn signal_moves_one_step_per_tick() {
        let mut s = sim(DriftProfile::control(), 42);
        let mut prev = s.snapshot().signal_pct as i16;
        for _ in 0..100 {
            let cur = s.tick().signal_pct as i16;
            assert!((cur - prev).abs() <= 1);
            prev = cur;
        }
    }

    #[test]
    fn empty_overrides_keep_the_preset() {
        let o = DriftOverrides::default();
        assert_eq!(o.apply(DriftProfile::video()), DriftProfile::video());
        assert_eq!(o.apply(DriftProfile::control()), DriftProfile::control());
    }

    #[test]
    fn overrides_replace_only_given_keys() {
        let o = DriftOverrides {
            period_ms: Some(4000),
            initial: SnapshotOverrides { altitude_m: Some(40.0), ..Default::default() },
            ..Default::default()
        };
        let p = o.apply(DriftProfile::video());
        assert_eq!(p.period_ms, 4000);
        assert_eq!((p.signal_min, p.signal_max), (75, 99));
        assert_eq!(p.battery_step, 0.0);
        assert_eq!(p.initial.signal_pct, 95);
        assert_eq!(p.initial.altitude_m, 40.0);
    }

    #[test]
    fn video_profile_does_not_drain() {
        let mut s = sim(DriftProfile::video(), 4);
        let start = s.snapshot().battery_pct;
        for _ in 0..50 {
            assert_eq!(s.tick().battery_pct, start);
        }
    }
}
