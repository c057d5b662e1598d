use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use deck_proto::ops::FlagKind;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::OpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug)]
struct OpState<T> {
    active: bool,
    // bumped on every start and cancel; a completion only lands if it still matches
    epoch: u64,
    completions: u64,
    last: Option<Result<T, OpError>>,
}

/// An "in progress" flag backed by a device future.
///
/// At most one instance is in flight; starting while active is a no-op. The
/// future is bounded by `timeout`. Dropping the operation cancels it and no
/// completion is recorded afterwards.
#[derive(Debug)]
pub struct Operation<T> {
    kind: FlagKind,
    timeout: Duration,
    state: Arc<Mutex<OpState<T>>>,
    task: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Operation<T> {
    pub fn new(kind: FlagKind, timeout: Duration) -> Self {
        Self {
            kind,
            timeout,
            state: Arc::new(Mutex::new(OpState { active: false, epoch: 0, completions: 0, last: None })),
            task: None,
        }
    }

    pub fn kind(&self) -> FlagKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        lock(&self.state).active
    }

    /// Number of completions recorded (success or failure), cancellations excluded.
    pub fn completions(&self) -> u64 {
        lock(&self.state).completions
    }

    pub fn start<F>(&mut self, fut: F) -> StartOutcome
    where
        F: Future<Output = Result<T, OpError>> + Send + 'static,
    {
        let epoch = {
            let mut st = lock(&self.state);
            if st.active {
                debug!(op = %self.kind, "start ignored: already in progress");
                return StartOutcome::AlreadyRunning;
            }
            st.active = true;
            st.epoch += 1;
            st.epoch
        };

        let kind = self.kind;
        let timeout = self.timeout;
        let state = self.state.clone();
        info!(op = %kind, "operation started");

        self.task = Some(tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, fut).await {
                Ok(res) => res,
                Err(_) => Err(OpError::Timeout(timeout)),
            };
            let mut st = lock(&state);
            if st.epoch != epoch {
                return;
            }
            match &outcome {
                Ok(_) => info!(op = %kind, "operation complete"),
                Err(e) => warn!(op = %kind, "operation failed: {}", e),
            }
            st.active = false;
            st.completions += 1;
            st.last = Some(outcome);
        }));
        StartOutcome::Started
    }

    /// Abort the in-flight instance, if any, and record it as cancelled.
    pub fn cancel(&mut self) {
        {
            let mut st = lock(&self.state);
            if st.active {
                st.epoch += 1;
                st.active = false;
                st.last = Some(Err(OpError::Cancelled));
                info!(op = %self.kind, "operation cancelled");
            }
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Wait for the in-flight instance (if any) to finish.
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl<T: Clone + Send + 'static> Operation<T> {
    pub fn last_outcome(&self) -> Option<Result<T, OpError>> {
        lock(&self.state).last.clone()
    }

    pub fn last_ok(&self) -> Option<T> {
        self.last_outcome().and_then(Result::ok)
    }
}

impl<T> Drop for Operation<T> {
    fn drop(&mut self) {
        lock(&self.state).epoch += 1;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn lock<T>(m: &Mutex<OpState<T>>) -> MutexGuard<'_, OpState<T>> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time;

    const SLOW: Duration = Duration::from_secs(3);

    fn delayed(v: u32, runs: Arc<AtomicU32>) -> impl Future<Output = Result<u32, OpError>> + Send + 'static {
        async move {
            runs.fetch_add(1, Ordering::SeqCst);
            time::sleep(SLOW).await;
            Ok(v)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn completes_after_delay() {
        let mut op = Operation::new(FlagKind::Mapping, Duration::from_secs(10));
        let runs = Arc::new(AtomicU32::new(0));
        assert_eq!(op.start(delayed(7, runs.clone())), StartOutcome::Started);
        assert!(op.is_active());

        time::sleep(Duration::from_millis(2_900)).await;
        assert!(op.is_active());
        assert!(op.last_outcome().is_none());

        op.wait().await;
        assert!(!op.is_active());
        assert_eq!(op.last_ok(), Some(7));
        assert_eq!(op.completions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_a_no_op() {
        let mut op = Operation::new(FlagKind::Saving, Duration::from_secs(10));
        let runs = Arc::new(AtomicU32::new(0));
        assert_eq!(op.start(delayed(1, runs.clone())), StartOutcome::Started);
        time::sleep(Duration::from_millis(10)).await;
        assert_eq!(op.start(delayed(2, runs.clone())), StartOutcome::AlreadyRunning);
        assert_eq!(op.start(delayed(3, runs.clone())), StartOutcome::AlreadyRunning);

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(op.completions(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(op.last_ok(), Some(1));

        // restartable once complete
        assert_eq!(op.start(delayed(4, runs.clone())), StartOutcome::Started);
        op.wait().await;
        assert_eq!(op.completions(), 2);
        assert_eq!(op.last_ok(), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out() {
        let mut op = Operation::new(FlagKind::Mapping, Duration::from_secs(1));
        op.start(delayed(1, Arc::new(AtomicU32::new(0))));
        op.wait().await;
        assert_eq!(op.last_outcome(), Some(Err(OpError::Timeout(Duration::from_secs(1)))));
        assert!(!op.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_surfaced() {
        let mut op: Operation<u32> = Operation::new(FlagKind::Saving, Duration::from_secs(5));
        op.start(async { Err(OpError::Connection("link down".into())) });
        op.wait().await;
        assert_eq!(op.last_outcome(), Some(Err(OpError::Connection("link down".into()))));
        assert_eq!(op.completions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_the_completion() {
        let mut op = Operation::new(FlagKind::Mapping, Duration::from_secs(10));
        op.start(delayed(9, Arc::new(AtomicU32::new(0))));
        time::sleep(Duration::from_secs(1)).await;
        op.cancel();
        time::sleep(Duration::from_secs(10)).await;
        assert!(!op.is_active());
        assert_eq!(op.completions(), 0);
        assert_eq!(op.last_outcome(), Some(Err(OpError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_in_flight_work() {
        let finished = Arc::new(AtomicU32::new(0));
        let mut op = Operation::new(FlagKind::Mapping, Duration::from_secs(10));
        let flag = finished.clone();
        op.start(async move {
            time::sleep(SLOW).await;
            flag.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        drop(op);
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }
}
