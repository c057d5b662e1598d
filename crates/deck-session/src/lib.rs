pub mod doctor;
pub mod nav;
pub mod session;
pub mod store;

pub use nav::{NavError, Navigator, Panel, Screen};
pub use session::{LoginError, LoginForm, Session, SessionConfig, SessionContext};
pub use store::{AddressStore, FileStore, MemoryStore};
