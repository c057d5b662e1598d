use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("controls locked: {0} refused")]
    Locked(&'static str),
    #[error("unknown quick action: {0}")]
    UnknownAction(String),
}

/// Control lock. While engaged every command that changes the drone's
/// behaviour is refused; unlocking is always allowed.
#[derive(Debug, Clone, Default)]
pub struct Interlock {
    locked: bool,
}

impl Interlock {
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn check(&self, what: &'static str) -> Result<(), ControlError> {
        if self.locked {
            warn!("{} refused: controls locked", what);
            return Err(ControlError::Locked(what));
        }
        Ok(())
    }
}
