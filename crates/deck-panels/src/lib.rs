pub mod config;
pub mod control;
pub mod dashboard;
pub mod error;
pub mod frames;
pub mod mapping;
pub mod video;

pub use config::ConfigPanel;
pub use control::ControlPanel;
pub use dashboard::{Dashboard, DashboardConfig, SourceFactory};
pub use error::PanelError;
pub use frames::{Frame, FrameSource, TestPattern};
pub use mapping::MappingPanel;
pub use video::VideoPanel;
