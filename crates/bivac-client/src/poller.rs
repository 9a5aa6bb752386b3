//! Cancelable repeating task.
//!
//! [`autoreload`] runs a handler immediately, waits for it, sleeps for the
//! interval and starts over. Handler errors are logged and swallowed so a
//! single failed poll never ends the loop. Only [`PollHandle::cancel`] does.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Lifecycle of a [`PollHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Created, first invocation not started yet.
    Idle,
    /// Handler invocation in flight.
    Running,
    /// Waiting for the interval to elapse.
    Scheduled,
    /// Terminal.
    Canceled,
}

/// Handle to a loop started by [`autoreload`].
///
/// Dropping the handle does not stop the loop; call [`cancel`](Self::cancel).
#[derive(Debug, Clone)]
pub struct PollHandle {
    state: Arc<Mutex<PollState>>,
    cancellation_token: CancellationToken,
    stopped: CancellationToken,
}

impl PollHandle {
    /// Prevent any further invocation.
    ///
    /// An invocation already in flight runs to completion but does not
    /// reschedule itself.
    pub fn cancel(&self) {
        self.cancellation_token.cancel();
        let mut state = self.state.lock();
        if *state != PollState::Running {
            *state = PollState::Canceled;
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    pub fn state(&self) -> PollState {
        *self.state.lock()
    }

    /// Resolves once the loop has exited after cancellation.
    pub async fn stopped(&self) {
        self.stopped.cancelled().await;
    }
}

/// Start polling `handler` every `interval`.
///
/// Must be called from within a tokio runtime. The first invocation is
/// spawned right away, invocations never overlap, and the interval is
/// measured from the end of one invocation to the start of the next.
pub fn autoreload<F, Fut, E>(mut handler: F, interval: Duration) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let handle = PollHandle {
        state: Arc::new(Mutex::new(PollState::Idle)),
        cancellation_token: CancellationToken::new(),
        stopped: CancellationToken::new(),
    };

    let state = handle.state.clone();
    let cancellation_token = handle.cancellation_token.clone();
    let stopped = handle.stopped.clone();

    tokio::spawn(async move {
        loop {
            {
                let mut state = state.lock();
                if cancellation_token.is_cancelled() {
                    *state = PollState::Canceled;
                    break;
                }
                *state = PollState::Running;
            }

            if let Err(e) = handler().await {
                warn!(error = %e, "Autoreload handler failed; retrying after interval");
            }

            {
                let mut state = state.lock();
                if cancellation_token.is_cancelled() {
                    *state = PollState::Canceled;
                    break;
                }
                *state = PollState::Scheduled;
            }

            tokio::select! {
                biased;

                _ = cancellation_token.cancelled() => {
                    *state.lock() = PollState::Canceled;
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }

        debug!("Autoreload loop stopped");
        stopped.cancel();
    });

    handle
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use super::*;

    const INTERVAL: Duration = Duration::from_millis(5000);

    fn counting_handler(
        calls: Arc<AtomicUsize>,
    ) -> impl FnMut() -> std::future::Ready<Result<(), String>> + Send + 'static {
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(()))
        }
    }

    /// Let spawned tasks run without advancing the paused clock.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_immediately_then_every_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = autoreload(counting_handler(calls.clone()), INTERVAL);

        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.state(), PollState::Scheduled);

        tokio::time::sleep(INTERVAL - Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        tokio::time::sleep(INTERVAL).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_stop_the_loop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = autoreload(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err::<(), _>("connection refused"))
            },
            INTERVAL,
        );

        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(INTERVAL).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(handle.state(), PollState::Scheduled);

        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_timer_fires_stops_invocations() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = autoreload(counting_handler(calls.clone()), INTERVAL);

        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(handle.state(), PollState::Canceled);

        tokio::time::sleep(INTERVAL * 3).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        handle.stopped().await;
        assert_eq!(handle.state(), PollState::Canceled);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_invocation_completes_without_rescheduling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(Notify::new());

        let (c, f, r) = (calls.clone(), finished.clone(), release.clone());
        let handle = autoreload(
            move || {
                let (c, f, r) = (c.clone(), f.clone(), r.clone());
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    r.notified().await;
                    f.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), String>(())
                }
            },
            INTERVAL,
        );

        settle().await;
        assert_eq!(handle.state(), PollState::Running);

        handle.cancel();
        assert_eq!(handle.state(), PollState::Running);

        release.notify_one();
        handle.stopped().await;

        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(handle.state(), PollState::Canceled);

        tokio::time::sleep(INTERVAL * 2).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invocations_never_overlap() {
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let (a, m) = (active.clone(), max_active.clone());
        let handle = autoreload(
            move || {
                let (a, m) = (a.clone(), m.clone());
                async move {
                    let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                    m.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(INTERVAL * 2).await;
                    a.fetch_sub(1, Ordering::SeqCst);
                    Ok::<(), String>(())
                }
            },
            INTERVAL,
        );

        tokio::time::sleep(INTERVAL * 10).await;
        settle().await;
        assert_eq!(max_active.load(Ordering::SeqCst), 1);

        handle.cancel();
    }
}
