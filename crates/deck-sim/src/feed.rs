use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use deck_proto::telemetry::TelemetrySnapshot;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::telemetry::{DriftProfile, TelemetrySim};

struct FeedState {
    alive: bool,
    sim: TelemetrySim<StdRng>,
    tx: watch::Sender<TelemetrySnapshot>,
}

/// Single-writer telemetry store. One background task drives the simulator;
/// any number of readers observe it through [`watch::Receiver`]s.
///
/// Stopping (or dropping) the feed guarantees no snapshot is written afterwards:
/// the writer checks `alive` under the same lock `stop` takes.
pub struct TelemetryFeed {
    name: &'static str,
    shared: Arc<Mutex<FeedState>>,
    rx: watch::Receiver<TelemetrySnapshot>,
    task: Option<JoinHandle<()>>,
}

impl TelemetryFeed {
    /// Start a feed with an entropy-seeded rng. Must be called inside a tokio runtime.
    pub fn spawn(name: &'static str, profile: DriftProfile) -> Self {
        Self::with_rng(name, profile, StdRng::from_entropy())
    }

    pub fn with_rng(name: &'static str, profile: DriftProfile, rng: StdRng) -> Self {
        let period = profile.period();
        let sim = TelemetrySim::new(profile, rng);
        let (tx, rx) = watch::channel(sim.snapshot());
        let shared = Arc::new(Mutex::new(FeedState { alive: true, sim, tx }));

        let writer = shared.clone();
        let start = Instant::now() + period;
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let mut st = lock(&writer);
                if !st.alive {
                    break;
                }
                let snap = st.sim.tick();
                st.tx.send_replace(snap);
                debug!(feed = name, battery = snap.battery_pct, signal = snap.signal_pct, "telemetry tick");
            }
        });

        info!(feed = name, period_ms = period.as_millis() as u64, "telemetry feed started");
        Self { name, shared, rx, task: Some(task) }
    }

    pub fn subscribe(&self) -> watch::Receiver<TelemetrySnapshot> {
        self.rx.clone()
    }

    pub fn latest(&self) -> TelemetrySnapshot {
        *self.rx.borrow()
    }

    pub fn ticks(&self) -> u64 {
        lock(&self.shared).sim.ticks()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared).alive
    }

    pub fn reset_battery(&self, pct: f64) {
        let mut st = lock(&self.shared);
        if !st.alive {
            return;
        }
        st.sim.reset_battery(pct);
        let snap = st.sim.snapshot();
        st.tx.send_replace(snap);
    }

    pub fn stop(&mut self) {
        {
            let mut st = lock(&self.shared);
            if !st.alive {
                return;
            }
            st.alive = false;
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        info!(feed = self.name, "telemetry feed stopped");
    }
}

impl Drop for TelemetryFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock(m: &Mutex<FeedState>) -> MutexGuard<'_, FeedState> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
