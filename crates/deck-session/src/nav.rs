use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::session::{LoginError, LoginForm, Session, SessionContext};
use crate::store::AddressStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Panel {
    // dashboard index redirects here
    #[default]
    Config,
    Video,
    Mapping,
    Control,
}

impl Panel {
    /// Dashboard menu order.
    pub const ALL: [Panel; 4] = [Panel::Config, Panel::Video, Panel::Mapping, Panel::Control];

    pub fn path(self) -> &'static str {
        match self {
            Panel::Config => "config",
            Panel::Video => "video",
            Panel::Mapping => "mapping",
            Panel::Control => "control",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Panel::Config => "Drone Configuration",
            Panel::Video => "Video Feed",
            Panel::Mapping => "Mapping",
            Panel::Control => "Remote Control",
        }
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown panel: {0}")]
pub struct UnknownPanel(pub String);

impl FromStr for Panel {
    type Err = UnknownPanel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Panel::ALL
            .into_iter()
            .find(|p| p.path() == s)
            .ok_or_else(|| UnknownPanel(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Splash,
    Login,
    Dashboard(Panel),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavError {
    #[error("login required before opening {0}")]
    NotLoggedIn(Panel),
}

/// Top-level routing: splash, then login, then the dashboard panels.
#[derive(Debug)]
pub struct Navigator {
    screen: Screen,
    session: Option<Session>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self { screen: Screen::Splash, session: None }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Hold the splash screen for `delay`, then move to login.
    /// Dropping the future cancels the transition.
    pub async fn splash(&mut self, delay: Duration) {
        tokio::time::sleep(delay).await;
        self.splash_elapsed();
    }

    pub fn splash_elapsed(&mut self) {
        if self.screen == Screen::Splash {
            self.screen = Screen::Login;
            info!("splash done, showing login");
        }
    }

    /// Accept the login form and enter the dashboard. The address is written to
    /// `store`; a store failure is logged and does not block the login.
    pub fn submit_login(&mut self, form: LoginForm, store: &dyn AddressStore) -> Result<SessionContext, LoginError> {
        let session = form.into_session()?;
        if let Err(e) = store.save(&session.device_address) {
            warn!("could not persist device address: {:#}", e);
        }
        let ctx = SessionContext::from_session(&session);
        info!(user = %session.username, device = %session.device_address, "login accepted");
        self.session = Some(session);
        self.screen = Screen::Dashboard(Panel::default());
        Ok(ctx)
    }

    pub fn open(&mut self, panel: Panel) -> Result<(), NavError> {
        if self.session.is_none() {
            return Err(NavError::NotLoggedIn(panel));
        }
        if self.screen != Screen::Dashboard(panel) {
            info!(%panel, "panel opened");
        }
        self.screen = Screen::Dashboard(panel);
        Ok(())
    }

    pub fn current_panel(&self) -> Option<Panel> {
        match self.screen {
            Screen::Dashboard(p) => Some(p),
            _ => None,
        }
    }
}
