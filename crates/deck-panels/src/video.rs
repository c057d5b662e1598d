use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use deck_proto::ops::FlagKind;
use deck_session::SessionContext;
use deck_sim::{DriftProfile, TelemetryFeed};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{info, warn};

use crate::error::PanelError;
use crate::frames::{Frame, FrameSource};

#[derive(Debug, Default)]
struct ClockState {
    alive: bool,
    secs: u64,
}

/// Elapsed-seconds counter shown while recording.
struct RecordingClock {
    state: Arc<Mutex<ClockState>>,
    task: JoinHandle<()>,
}

impl RecordingClock {
    fn start() -> Self {
        let state = Arc::new(Mutex::new(ClockState { alive: true, secs: 0 }));
        let writer = state.clone();
        let period = Duration::from_secs(1);
        let first = Instant::now() + period;
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(first, period);
            loop {
                ticker.tick().await;
                let mut st = lock(&writer);
                if !st.alive {
                    break;
                }
                st.secs += 1;
            }
        });
        Self { state, task }
    }

    fn secs(&self) -> u64 {
        lock(&self.state).secs
    }
}

impl Drop for RecordingClock {
    fn drop(&mut self) {
        lock(&self.state).alive = false;
        self.task.abort();
    }
}

fn lock(m: &Mutex<ClockState>) -> MutexGuard<'_, ClockState> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Live video view of the drone at the session's device address.
pub struct VideoPanel {
    device_address: String,
    profile: DriftProfile,
    source: Box<dyn FrameSource>,
    // present only while streaming
    signal: Option<TelemetryFeed>,
    last_signal: u8,
    recording: Option<RecordingClock>,
    fullscreen: bool,
    captures: u64,
}

impl VideoPanel {
    pub fn mount(ctx: &SessionContext, profile: DriftProfile, source: Box<dyn FrameSource>) -> Self {
        info!(device = ctx.device_address(), "video panel mounted");
        Self {
            device_address: ctx.device_address().to_string(),
            last_signal: profile.initial.signal_pct.clamp(profile.signal_min, profile.signal_max),
            profile,
            source,
            signal: None,
            recording: None,
            fullscreen: false,
            captures: 0,
        }
    }

    pub fn device_address(&self) -> &str {
        &self.device_address
    }

    pub fn is_streaming(&self) -> bool {
        self.signal.is_some()
    }

    pub fn start_streaming(&mut self) {
        if self.signal.is_some() {
            return;
        }
        let mut profile = self.profile.clone();
        profile.initial.signal_pct = self.last_signal;
        self.signal = Some(TelemetryFeed::spawn("video", profile));
        info!(device = %self.device_address, "stream started");
    }

    /// Stopping the stream also stops any recording.
    pub fn stop_streaming(&mut self) {
        if let Some(feed) = self.signal.take() {
            self.last_signal = feed.latest().signal_pct;
            self.recording = None;
            info!(device = %self.device_address, "stream stopped");
        }
    }

    pub fn signal_pct(&self) -> u8 {
        self.signal.as_ref().map(|f| f.latest().signal_pct).unwrap_or(self.last_signal)
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn toggle_recording(&mut self) -> Result<bool, PanelError> {
        if !self.is_streaming() {
            return Err(PanelError::NotStreaming("recording"));
        }
        self.recording = match self.recording.take() {
            Some(_) => None,
            None => Some(RecordingClock::start()),
        };
        info!(recording = self.is_recording(), "video recording toggled");
        Ok(self.is_recording())
    }

    /// Seconds recorded so far; zero when not recording.
    pub fn elapsed_secs(&self) -> u64 {
        self.recording.as_ref().map(RecordingClock::secs).unwrap_or(0)
    }

    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed_secs())
    }

    pub fn capture_screenshot(&mut self) -> Result<Frame, PanelError> {
        if !self.is_streaming() {
            return Err(PanelError::NotStreaming("screenshot"));
        }
        match self.source.grab() {
            Ok(frame) => {
                self.captures += 1;
                info!(seq = frame.seq, w = frame.width, h = frame.height, "screenshot captured");
                Ok(frame)
            }
            Err(e) => {
                warn!("screenshot failed: {:#}", e);
                Err(PanelError::Capture(format!("{:#}", e)))
            }
        }
    }

    pub fn captures(&self) -> u64 {
        self.captures
    }

    pub fn flags(&self) -> Vec<FlagKind> {
        let mut flags = Vec::new();
        if self.is_streaming() {
            flags.push(FlagKind::Streaming);
        }
        if self.is_recording() {
            flags.push(FlagKind::Recording);
        }
        flags
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        self.fullscreen
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::TestPattern;
    use deck_session::{MemoryStore, SessionContext};

    struct Broken;

    impl FrameSource for Broken {
        fn grab(&mut self) -> anyhow::Result<Frame> {
            anyhow::bail!("camera unplugged")
        }
    }

    fn panel() -> VideoPanel {
        let ctx = SessionContext::restore(&MemoryStore::default(), "192.168.1.100");
        VideoPanel::mount(&ctx, DriftProfile::video(), Box::new(TestPattern::new(8, 8)))
    }

    #[test]
    fn elapsed_formats_as_minutes_and_seconds() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(75), "01:15");
        assert_eq!(format_elapsed(3_600), "60:00");
    }

    #[tokio::test(start_paused = true)]
    async fn uses_the_session_address() {
        let p = panel();
        assert_eq!(p.device_address(), "192.168.1.100");
        assert!(!p.is_streaming());
        assert_eq!(p.signal_pct(), 95);
    }

    #[tokio::test(start_paused = true)]
    async fn recording_needs_a_stream() {
        let mut p = panel();
        assert!(matches!(p.toggle_recording(), Err(PanelError::NotStreaming(_))));
        assert!(matches!(p.capture_screenshot(), Err(PanelError::NotStreaming(_))));

        p.start_streaming();
        assert_eq!(p.flags(), vec![FlagKind::Streaming]);
        assert!(p.toggle_recording().unwrap());
        assert_eq!(p.flags(), vec![FlagKind::Streaming, FlagKind::Recording]);
        time::sleep(Duration::from_millis(75_500)).await;
        assert_eq!(p.elapsed_display(), "01:15");

        p.stop_streaming();
        assert!(!p.is_recording());
        assert_eq!(p.elapsed_secs(), 0);
        assert!(p.flags().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn recording_restarts_from_zero() {
        let mut p = panel();
        p.start_streaming();
        p.toggle_recording().unwrap();
        time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(p.elapsed_secs(), 5);
        assert!(!p.toggle_recording().unwrap());
        assert_eq!(p.elapsed_secs(), 0);
        p.toggle_recording().unwrap();
        time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(p.elapsed_secs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn signal_stays_in_video_band_while_streaming() {
        let mut p = panel();
        p.start_streaming();
        for _ in 0..50 {
            time::sleep(Duration::from_secs(5)).await;
            assert!((75..=99).contains(&p.signal_pct()));
        }
        let seen = p.signal_pct();
        p.stop_streaming();
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(p.signal_pct(), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn screenshots_and_failures() {
        let mut p = panel();
        p.start_streaming();
        let f = p.capture_screenshot().unwrap();
        assert_eq!(f.pixels.len(), 64);
        assert_eq!(p.captures(), 1);

        let ctx = SessionContext::restore(&MemoryStore::default(), "10.0.0.1");
        let mut broken = VideoPanel::mount(&ctx, DriftProfile::video(), Box::new(Broken));
        broken.start_streaming();
        assert!(matches!(broken.capture_screenshot(), Err(PanelError::Capture(_))));
        assert_eq!(broken.captures(), 0);
    }

    #[test]
    fn fullscreen_toggles() {
        let ctx = SessionContext::restore(&MemoryStore::default(), "x");
        let mut p = VideoPanel::mount(&ctx, DriftProfile::video(), Box::new(TestPattern::default()));
        assert!(p.toggle_fullscreen());
        assert!(p.is_fullscreen());
        assert!(!p.toggle_fullscreen());
    }
}
