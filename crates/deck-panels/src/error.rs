use deck_control::ControlError;
use deck_proto::draft::DraftError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("{0} needs an active video stream")]
    NotStreaming(&'static str),
    #[error("frame capture failed: {0}")]
    Capture(String),
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error(transparent)]
    Draft(#[from] DraftError),
}
