use anyhow::Result;

use crate::session::SessionConfig;

pub fn check_session(cfg: &SessionConfig) -> Result<()> {
    anyhow::ensure!(!cfg.default_device_address.trim().is_empty(), "session.default_device_address is empty");
    anyhow::ensure!(cfg.splash_ms <= 60_000, "session.splash_ms should be at most 60000");
    if let Some(p) = &cfg.address_store {
        anyhow::ensure!(!p.as_os_str().is_empty(), "session.address_store is empty");
        anyhow::ensure!(!p.is_dir(), "session.address_store points at a directory");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass() {
        check_session(&SessionConfig::default()).unwrap();
    }

    #[test]
    fn blank_default_address_fails() {
        let cfg = SessionConfig { default_device_address: " ".into(), ..SessionConfig::default() };
        assert!(check_session(&cfg).is_err());
    }

    #[test]
    fn store_path_must_be_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SessionConfig { address_store: Some(dir.path().to_path_buf()), ..SessionConfig::default() };
        assert!(check_session(&cfg).is_err());
    }
}
