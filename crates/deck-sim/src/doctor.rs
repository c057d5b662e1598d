use anyhow::Result;

use crate::backend::OpsConfig;
use crate::telemetry::DriftProfile;

pub fn check_profile(name: &str, p: &DriftProfile) -> Result<()> {
    anyhow::ensure!(p.period_ms >= 100, "telemetry.{}.period_ms too small", name);
    anyhow::ensure!(p.battery_step >= 0.0, "telemetry.{}.battery_step must not be negative", name);
    anyhow::ensure!(
        (0.0..=100.0).contains(&p.battery_floor),
        "telemetry.{}.battery_floor should be 0..100",
        name
    );
    anyhow::ensure!(p.signal_min <= p.signal_max, "telemetry.{}: signal_min above signal_max", name);
    anyhow::ensure!(p.signal_max <= 100, "telemetry.{}.signal_max is a percentage", name);
    anyhow::ensure!(p.initial.altitude_m >= 0.0 && p.initial.speed_mps >= 0.0, "telemetry.{}.initial has negative altitude/speed", name);
    Ok(())
}

pub fn check_ops(cfg: &OpsConfig) -> Result<()> {
    anyhow::ensure!(cfg.timeout_ms > 0, "ops.timeout_ms must be positive");
    anyhow::ensure!(
        cfg.mapping_delay_ms < cfg.timeout_ms && cfg.save_delay_ms < cfg.timeout_ms,
        "ops delays must be shorter than ops.timeout_ms or every operation times out"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass() {
        check_profile("control", &DriftProfile::control()).unwrap();
        check_profile("video", &DriftProfile::video()).unwrap();
        check_ops(&OpsConfig::default()).unwrap();
    }

    #[test]
    fn inverted_band_fails() {
        let p = DriftProfile { signal_min: 90, signal_max: 80, ..DriftProfile::control() };
        assert!(check_profile("control", &p).is_err());
    }

    #[test]
    fn delay_longer_than_timeout_fails() {
        let cfg = OpsConfig { mapping_delay_ms: 20_000, ..OpsConfig::default() };
        assert!(check_ops(&cfg).is_err());
    }
}
