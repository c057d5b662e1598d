use anyhow::Result;

use crate::ControlConfig;

pub fn check_control(cfg: &ControlConfig) -> Result<()> {
    anyhow::ensure!(cfg.speed_min >= 1, "control.speed_min must be at least 1");
    anyhow::ensure!(cfg.speed_min <= cfg.speed_max, "control.speed_min above speed_max");
    anyhow::ensure!(cfg.speed_max <= 100, "control.speed_max is a percentage (<= 100)");
    anyhow::ensure!(cfg.speed_step >= 1, "control.speed_step must be at least 1");
    anyhow::ensure!(
        (cfg.speed_min..=cfg.speed_max).contains(&cfg.speed_default),
        "control.speed_default outside [speed_min, speed_max]"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass() {
        check_control(&ControlConfig::default()).unwrap();
    }

    #[test]
    fn inverted_range_fails() {
        let cfg = ControlConfig { speed_min: 90, speed_max: 20, ..ControlConfig::default() };
        assert!(check_control(&cfg).is_err());
    }
}
