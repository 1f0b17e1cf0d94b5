//! Concurrency and request-rate ceiling for calls to the reasoning capability.
//!
//! A single [`RPMController`] is shared by every concurrent channel assessment
//! so that parallel runs never exceed one global limit. Callers depend on the
//! [`ConcurrencyCeiling`] trait so tests can inject their own ceiling.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Length of the request-rate window.
const RPM_WINDOW: Duration = Duration::from_secs(60);

/// A shared limit on in-flight requests.
#[async_trait]
pub trait ConcurrencyCeiling: Send + Sync + fmt::Debug {
    /// Wait for a slot. The slot is released when the guard is dropped.
    async fn acquire(&self) -> CeilingGuard;

    /// Requests currently holding a slot.
    fn in_flight(&self) -> usize;

    /// Highest number of simultaneous slots observed.
    fn peak(&self) -> usize;
}

/// RAII slot handed out by a [`ConcurrencyCeiling`].
#[derive(Debug)]
pub struct CeilingGuard {
    _permit: Option<OwnedSemaphorePermit>,
    in_flight: Option<Arc<AtomicUsize>>,
}

impl CeilingGuard {
    /// A guard that tracks nothing, for ceilings without a limit.
    pub fn untracked() -> Self {
        Self {
            _permit: None,
            in_flight: None,
        }
    }

    /// A guard holding `permit` that decrements `in_flight` on drop.
    pub fn tracked(permit: Option<OwnedSemaphorePermit>, in_flight: Arc<AtomicUsize>) -> Self {
        Self {
            _permit: permit,
            in_flight: Some(in_flight),
        }
    }
}

impl Drop for CeilingGuard {
    fn drop(&mut self) {
        if let Some(counter) = &self.in_flight {
            counter.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[derive(Debug)]
struct RpmWindow {
    started: Instant,
    count: u32,
}

/// Semaphore-backed ceiling with an optional requests-per-minute cap.
///
/// When `max_rpm` is set, the controller counts requests in the current
/// minute window and makes callers wait for the next window once the cap is
/// reached.
#[derive(Debug)]
pub struct RPMController {
    max_concurrency: usize,
    max_rpm: Option<u32>,
    semaphore: Arc<Semaphore>,
    window: Mutex<RpmWindow>,
    in_flight: Arc<AtomicUsize>,
    peak: AtomicUsize,
}

impl RPMController {
    /// Create a controller allowing `max_concurrency` simultaneous requests
    /// (at least one).
    pub fn new(max_concurrency: usize, max_rpm: Option<u32>) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            max_concurrency,
            max_rpm,
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            window: Mutex::new(RpmWindow {
                started: Instant::now(),
                count: 0,
            }),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Requests counted in the current minute window.
    pub fn current_rpm(&self) -> u32 {
        self.window.lock().count
    }

    /// Count one request against the minute window, returning how long to
    /// wait if the window is full.
    fn check_rpm(&self) -> Option<Duration> {
        let max = self.max_rpm?;
        let mut window = self.window.lock();
        let elapsed = window.started.elapsed();
        if elapsed >= RPM_WINDOW {
            window.started = Instant::now();
            window.count = 0;
        }
        if window.count < max {
            window.count += 1;
            None
        } else {
            Some(RPM_WINDOW.saturating_sub(elapsed))
        }
    }
}

#[async_trait]
impl ConcurrencyCeiling for RPMController {
    async fn acquire(&self) -> CeilingGuard {
        // The semaphore is never closed, so acquisition only fails if that
        // invariant is broken; fall back to an unlimited slot in that case.
        let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok();

        while let Some(wait) = self.check_rpm() {
            log::info!("Max RPM reached, waiting {:?} for the next window", wait);
            tokio::time::sleep(wait).await;
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        CeilingGuard::tracked(permit, Arc::clone(&self.in_flight))
    }

    fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}
