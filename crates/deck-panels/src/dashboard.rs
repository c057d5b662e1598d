use deck_control::ControlConfig;
use deck_proto::draft::ConfigDraft;
use deck_proto::ops::FlagKind;
use deck_session::{NavError, Navigator, Panel, SessionContext};
use deck_sim::{DeviceBackend, DriftProfile, OpsConfig, StartOutcome};
use tracing::info;

use crate::config::ConfigPanel;
use crate::control::ControlPanel;
use crate::frames::FrameSource;
use crate::mapping::MappingPanel;
use crate::video::VideoPanel;

/// Everything needed to mount any dashboard panel.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub control: ControlConfig,
    pub control_telemetry: DriftProfile,
    pub video_telemetry: DriftProfile,
    pub ops: OpsConfig,
    pub draft: ConfigDraft,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            control: ControlConfig::default(),
            control_telemetry: DriftProfile::control(),
            video_telemetry: DriftProfile::video(),
            ops: OpsConfig::default(),
            draft: ConfigDraft::default(),
        }
    }
}

/// Builds a frame source each time the video panel mounts.
pub type SourceFactory = Box<dyn Fn() -> Box<dyn FrameSource> + Send + Sync>;

// At most one slot is filled: the panel the navigator currently shows.
#[derive(Default)]
struct Mounted {
    config: Option<ConfigPanel>,
    video: Option<VideoPanel>,
    mapping: Option<MappingPanel>,
    control: Option<ControlPanel>,
}

impl Mounted {
    fn unmount_all_but(&mut self, keep: Panel) {
        if keep != Panel::Config {
            self.config = None;
        }
        if keep != Panel::Video {
            self.video = None;
        }
        if keep != Panel::Mapping {
            self.mapping = None;
        }
        if keep != Panel::Control {
            self.control = None;
        }
    }
}

/// Post-login dashboard. Owns the navigator, so the login gate and the panel
/// on screen are one state. Exactly one panel is mounted at a time; switching
/// drops the previous panel, which cancels its timers and operations.
pub struct Dashboard<B> {
    nav: Navigator,
    ctx: SessionContext,
    cfg: DashboardConfig,
    backend: B,
    sources: SourceFactory,
    mounted: Mounted,
}

impl<B: DeviceBackend> Dashboard<B> {
    /// Take over a navigator that has accepted a login. The index panel (config) is mounted.
    pub fn new(nav: Navigator, cfg: DashboardConfig, backend: B, sources: SourceFactory) -> Result<Self, NavError> {
        let session = nav.session().ok_or(NavError::NotLoggedIn(Panel::default()))?;
        let ctx = SessionContext::from_session(session);
        info!(user = ctx.username().unwrap_or("-"), "dashboard opened");
        let mut dash = Self { nav, ctx, cfg, backend, sources, mounted: Mounted::default() };
        dash.open(Panel::default())?;
        Ok(dash)
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn active(&self) -> Panel {
        self.nav.current_panel().unwrap_or_default()
    }

    /// Switch to `panel`, mounting it if it is not already on screen.
    pub fn open(&mut self, panel: Panel) -> Result<(), NavError> {
        match panel {
            Panel::Config => self.config_panel().map(drop),
            Panel::Video => self.video_panel().map(drop),
            Panel::Mapping => self.mapping_panel().map(drop),
            Panel::Control => self.control_panel().map(drop),
        }
    }

    fn switch(&mut self, panel: Panel) -> Result<(), NavError> {
        self.nav.open(panel)?;
        self.mounted.unmount_all_but(panel);
        Ok(())
    }

    pub fn config_panel(&mut self) -> Result<&mut ConfigPanel, NavError> {
        self.switch(Panel::Config)?;
        let cfg = &self.cfg;
        Ok(self.mounted.config.get_or_insert_with(|| ConfigPanel::mount(cfg.draft, &cfg.ops)))
    }

    pub fn video_panel(&mut self) -> Result<&mut VideoPanel, NavError> {
        self.switch(Panel::Video)?;
        let (ctx, cfg, sources) = (&self.ctx, &self.cfg, &self.sources);
        Ok(self
            .mounted
            .video
            .get_or_insert_with(|| VideoPanel::mount(ctx, cfg.video_telemetry.clone(), sources())))
    }

    pub fn mapping_panel(&mut self) -> Result<&mut MappingPanel, NavError> {
        self.switch(Panel::Mapping)?;
        let cfg = &self.cfg;
        Ok(self.mounted.mapping.get_or_insert_with(|| MappingPanel::mount(&cfg.ops)))
    }

    pub fn control_panel(&mut self) -> Result<&mut ControlPanel, NavError> {
        self.switch(Panel::Control)?;
        let cfg = &self.cfg;
        Ok(self
            .mounted
            .control
            .get_or_insert_with(|| ControlPanel::mount(cfg.control.clone(), cfg.control_telemetry.clone())))
    }

    /// Start the area survey on the mapping panel.
    pub fn start_mapping(&mut self) -> Result<StartOutcome, NavError> {
        self.switch(Panel::Mapping)?;
        let cfg = &self.cfg;
        let panel = self.mounted.mapping.get_or_insert_with(|| MappingPanel::mount(&cfg.ops));
        Ok(panel.start(&self.backend))
    }

    /// Submit the config panel's draft.
    pub fn submit_config(&mut self) -> Result<StartOutcome, NavError> {
        self.switch(Panel::Config)?;
        let cfg = &self.cfg;
        let panel = self.mounted.config.get_or_insert_with(|| ConfigPanel::mount(cfg.draft, &cfg.ops));
        Ok(panel.submit(&self.backend))
    }

    /// In-progress flags of the mounted panel.
    pub fn active_flags(&self) -> Vec<FlagKind> {
        let m = &self.mounted;
        m.config
            .as_ref()
            .map(ConfigPanel::flags)
            .or_else(|| m.video.as_ref().map(VideoPanel::flags))
            .or_else(|| m.mapping.as_ref().map(MappingPanel::flags))
            .or_else(|| m.control.as_ref().map(ControlPanel::flags))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::TestPattern;
    use deck_session::{LoginForm, MemoryStore, Screen};
    use deck_sim::SimulatedBackend;
    use std::time::Duration;

    fn logged_in() -> Navigator {
        let mut nav = Navigator::new();
        nav.splash_elapsed();
        nav.submit_login(LoginForm::new("pilot", "1.1.1.1"), &MemoryStore::default()).unwrap();
        nav
    }

    fn sources() -> SourceFactory {
        Box::new(|| Box::new(TestPattern::new(4, 4)) as Box<dyn FrameSource>)
    }

    fn dashboard() -> Dashboard<SimulatedBackend> {
        Dashboard::new(logged_in(), DashboardConfig::default(), SimulatedBackend::default(), sources()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn index_is_config() {
        let d = dashboard();
        assert_eq!(d.active(), Panel::Config);
        assert_eq!(d.navigator().screen(), Screen::Dashboard(Panel::Config));
        assert_eq!(d.context().username(), Some("pilot"));
    }

    #[test]
    fn refuses_a_navigator_without_login() {
        let mut nav = Navigator::new();
        nav.splash_elapsed();
        let res = Dashboard::new(nav, DashboardConfig::default(), SimulatedBackend::default(), sources());
        assert!(matches!(res, Err(NavError::NotLoggedIn(Panel::Config))));
    }

    #[tokio::test(start_paused = true)]
    async fn navigator_follows_every_switch() {
        let mut d = dashboard();
        for panel in [Panel::Video, Panel::Mapping, Panel::Control, Panel::Config, Panel::Control] {
            d.open(panel).unwrap();
            assert_eq!(d.active(), panel);
            assert_eq!(d.navigator().screen(), Screen::Dashboard(panel));
        }
        d.video_panel().unwrap();
        assert_eq!(d.navigator().current_panel(), Some(Panel::Video));
    }

    #[tokio::test(start_paused = true)]
    async fn switching_away_stops_control_telemetry() {
        let mut d = dashboard();
        let rx = d.control_panel().unwrap().subscribe();
        tokio::time::sleep(Duration::from_millis(3_100)).await;
        let last = *rx.borrow();
        assert_eq!(last.battery_pct, 87.0 - 0.1);

        d.open(Panel::Video).unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(*rx.borrow(), last);
    }

    #[tokio::test(start_paused = true)]
    async fn video_panel_reads_the_login_address() {
        let mut d = dashboard();
        assert_eq!(d.video_panel().unwrap().device_address(), "1.1.1.1");
    }

    #[tokio::test(start_paused = true)]
    async fn mapping_survives_while_mounted_and_dies_on_switch() {
        let mut d = dashboard();
        assert_eq!(d.start_mapping(), Ok(StartOutcome::Started));
        assert_eq!(d.start_mapping(), Ok(StartOutcome::AlreadyRunning));
        assert_eq!(d.active_flags(), vec![FlagKind::Mapping]);
        tokio::time::sleep(Duration::from_millis(3_100)).await;
        assert!(d.mapping_panel().unwrap().is_complete());
        assert!(d.active_flags().is_empty());

        assert_eq!(d.start_mapping(), Ok(StartOutcome::Started));
        d.open(Panel::Config).unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        // a freshly mounted mapping panel starts empty
        assert!(!d.mapping_panel().unwrap().is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn submit_config_saves() {
        let mut d = dashboard();
        d.config_panel().unwrap().set_field("alt", "75").unwrap();
        assert_eq!(d.submit_config(), Ok(StartOutcome::Started));
        assert_eq!(d.active_flags(), vec![FlagKind::Saving]);
        d.config_panel().unwrap().wait().await;
        assert_eq!(d.config_panel().unwrap().last_saved().map(|c| c.altitude_m), Some(75.0));
    }

    #[tokio::test(start_paused = true)]
    async fn flags_follow_the_mounted_panel() {
        let mut d = dashboard();
        let vp = d.video_panel().unwrap();
        vp.start_streaming();
        vp.toggle_recording().unwrap();
        assert_eq!(d.active_flags(), vec![FlagKind::Streaming, FlagKind::Recording]);

        d.control_panel().unwrap().toggle_lock();
        assert_eq!(d.active_flags(), vec![FlagKind::Locked]);
    }
}
