use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use tokio_util::sync::CancellationToken;

use super::events::LiveEvent;

pub const INITIAL_VIEWERS: u32 = 10;
pub const VIEWER_TICK: Duration = Duration::from_secs(2);
/// How long the count hovers around the target before it starts to decline.
pub const PEAK_WINDOW: Duration = Duration::from_secs(5 * 60);
pub const FLUCTUATION: i64 = 4;
pub const PEAK_BAND: u32 = 10;
pub const MAX_DECLINE: u32 = 5;
pub const DECLINE_FLOOR_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerPhase {
    Growing,
    PeakFluctuate,
    Declining,
}

fn growth_rate(current: u32, target: u32) -> f64 {
    let ratio = current as f64 / target as f64;
    if ratio < 0.3 {
        0.15
    } else if ratio < 0.7 {
        0.08
    } else {
        0.03
    }
}

#[derive(Debug, Clone)]
pub struct ViewerCountState {
    pub current: u32,
    pub target: u32,
    pub phase: ViewerPhase,
    pub started_at: Instant,
}

impl ViewerCountState {
    pub fn new(target: u32) -> Self {
        Self {
            current: INITIAL_VIEWERS.min(target),
            target,
            phase: ViewerPhase::Growing,
            started_at: Instant::now(),
        }
    }

    pub fn decline_floor(&self) -> u32 {
        (self.target as f64 * DECLINE_FLOOR_RATIO) as u32
    }

    /// Applies one tick, `elapsed` being the time since the stream started.
    pub fn advance<R: Rng + ?Sized>(&mut self, elapsed: Duration, rng: &mut R) -> u32 {
        match self.phase {
            ViewerPhase::Growing => {
                let rate = growth_rate(self.current, self.target);
                let increment = ((self.current as f64 * rate) as u32).max(1);
                self.current = self.current.saturating_add(increment);
                if self.current >= self.target {
                    self.current = self.target;
                    self.phase = ViewerPhase::PeakFluctuate;
                    debug!("Viewer count reached target {}", self.target);
                }
            }
            ViewerPhase::PeakFluctuate if elapsed < PEAK_WINDOW => {
                let low = self.target.saturating_sub(PEAK_BAND) as i64;
                let high = self.target.saturating_add(PEAK_BAND) as i64;
                let delta = rng.gen_range(-FLUCTUATION..=FLUCTUATION);
                self.current = (self.current as i64 + delta).clamp(low, high) as u32;
            }
            ViewerPhase::PeakFluctuate | ViewerPhase::Declining => {
                if self.phase != ViewerPhase::Declining {
                    self.phase = ViewerPhase::Declining;
                    debug!("Viewer count entering decline");
                }
                let floor = self.decline_floor();
                if self.current > floor {
                    let decline = rng.gen_range(1..=MAX_DECLINE);
                    self.current = self.current.saturating_sub(decline).max(floor);
                }
            }
        }
        self.current
    }
}

struct RunningTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodically recomputes the synthetic audience size and broadcasts it.
pub struct ViewerCountSimulator {
    target: u32,
    events: broadcast::Sender<LiveEvent>,
    latest: Arc<AtomicU32>,
    task: Mutex<Option<RunningTask>>,
}

impl ViewerCountSimulator {
    pub fn new(target: u32, events: broadcast::Sender<LiveEvent>) -> Self {
        Self {
            target,
            events,
            latest: Arc::new(AtomicU32::new(INITIAL_VIEWERS.min(target))),
            task: Mutex::new(None),
        }
    }

    /// Starts from scratch; a running simulation is replaced.
    pub fn start(&self) {
        self.stop();

        let token = CancellationToken::new();
        let task_token = token.clone();
        let events = self.events.clone();
        let latest = Arc::clone(&self.latest);
        let mut state = ViewerCountState::new(self.target);
        latest.store(state.current, Ordering::Relaxed);

        let handle = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let mut ticker = interval(VIEWER_TICK);
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                if task_token.is_cancelled() {
                    break;
                }
                let count = state.advance(state.started_at.elapsed(), &mut rng);
                latest.store(count, Ordering::Relaxed);
                let _ = events.send(LiveEvent::ViewerCountChanged(count));
            }
            debug!("Viewer count loop exited");
        });

        *self.task.lock() = Some(RunningTask { token, handle });
        info!("Viewer count simulation started (target {})", self.target);
    }

    /// Safe to call when not running, and more than once.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.token.cancel();
            task.handle.abort();
            info!("Viewer count simulation stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().is_some()
    }

    pub fn current(&self) -> u32 {
        self.latest.load(Ordering::Relaxed)
    }
}

impl Drop for ViewerCountSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}
