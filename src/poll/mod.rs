//! Fixed-interval snapshot polling with explicit cancellation

pub mod source;

pub use source::{SessionContext, SnapshotSource, SourceError};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::maze::{render, MazeSnapshot, RenderOutcome};

/// Default time between poll attempts
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// What a viewer currently sees
#[derive(Debug, Clone, Serialize)]
pub struct ViewState {
    pub active: bool,
    pub render: RenderOutcome,
    /// Advisory message from the latest failed poll
    pub error: Option<String>,
    /// When the last snapshot was accepted
    pub updated_at: Option<DateTime<Utc>>,
    /// Number of accepted snapshots
    pub polls: u64,
    /// Last accepted snapshot
    #[serde(skip)]
    pub snapshot: Option<Arc<MazeSnapshot>>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            active: false,
            render: RenderOutcome::NoData,
            error: None,
            updated_at: None,
            polls: 0,
            snapshot: None,
        }
    }
}

/// State shared between the loop handle and its task
struct Shared {
    view: RwLock<ViewState>,
    /// Bumped by every stop; a task only applies results for its own value
    generation: AtomicU64,
}

impl Shared {
    /// Apply a poll result. Returns false if the issuing run was stopped.
    fn apply(
        &self,
        generation: u64,
        session: &SessionContext,
        outcome: Result<MazeSnapshot, SourceError>,
    ) -> bool {
        let mut view = self.view.write();
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }

        match outcome {
            Ok(snapshot) => {
                view.render = render(&snapshot, &session.color);
                view.snapshot = Some(Arc::new(snapshot));
                view.error = None;
                view.updated_at = Some(Utc::now());
                view.polls += 1;
            }
            Err(e) => {
                warn!(game_id = %session.game_id, error = %e, "Snapshot poll failed");
                view.error = Some(e.to_string());
            }
        }
        true
    }
}

#[derive(Default)]
struct Control {
    session: Option<SessionContext>,
    task: Option<JoinHandle<()>>,
}

/// Drives a [`SnapshotSource`] on a fixed period while active.
///
/// At most one request is in flight: the next attempt is only issued after the
/// previous one resolved. [`PollLoop::stop`] aborts the in-flight request and
/// guarantees no result issued before it reaches the view state.
pub struct PollLoop {
    source: Arc<dyn SnapshotSource>,
    period: Duration,
    shared: Arc<Shared>,
    control: Mutex<Control>,
}

impl PollLoop {
    pub fn new(source: Arc<dyn SnapshotSource>, period: Duration) -> Self {
        Self {
            source,
            period: period.max(Duration::from_millis(1)),
            shared: Arc::new(Shared {
                view: RwLock::new(ViewState::default()),
                generation: AtomicU64::new(0),
            }),
            control: Mutex::new(Control::default()),
        }
    }

    /// Begin polling. Returns true if the loop went from idle to active.
    ///
    /// Incomplete sessions are refused; starting an active loop is a no-op.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, session: SessionContext) -> bool {
        let mut control = self.control.lock();
        self.start_locked(&mut control, session)
    }

    /// Start again with the last session given to [`PollLoop::start`]
    pub fn resume(&self) -> bool {
        let mut control = self.control.lock();
        match control.session.clone() {
            Some(session) => self.start_locked(&mut control, session),
            None => false,
        }
    }

    /// Stop polling. Returns true if the loop was active.
    pub fn stop(&self) -> bool {
        let mut control = self.control.lock();
        self.stop_locked(&mut control)
    }

    /// Replace the session; an active loop restarts with the new one
    pub fn update_session(&self, session: SessionContext) -> bool {
        let mut control = self.control.lock();
        if control.session.as_ref() == Some(&session) {
            return false;
        }

        if self.stop_locked(&mut control) {
            self.start_locked(&mut control, session)
        } else {
            control.session = Some(session);
            false
        }
    }

    pub fn is_active(&self) -> bool {
        self.control.lock().task.is_some()
    }

    pub fn session(&self) -> Option<SessionContext> {
        self.control.lock().session.clone()
    }

    /// Copy of the current view state
    pub fn state(&self) -> ViewState {
        self.shared.view.read().clone()
    }

    fn start_locked(&self, control: &mut Control, session: SessionContext) -> bool {
        if !session.is_complete() {
            warn!("Refusing to poll without both game id and token");
            return false;
        }
        if control.task.is_some() {
            debug!(game_id = %session.game_id, "Poll loop already active");
            return false;
        }

        let generation = {
            let mut view = self.shared.view.write();
            view.active = true;
            self.shared.generation.load(Ordering::SeqCst)
        };

        info!(game_id = %session.game_id, period_ms = self.period.as_millis() as u64, "Starting poll loop");

        control.task = Some(tokio::spawn(run(
            self.source.clone(),
            session.clone(),
            self.shared.clone(),
            generation,
            self.period,
        )));
        control.session = Some(session);
        true
    }

    fn stop_locked(&self, control: &mut Control) -> bool {
        let Some(task) = control.task.take() else {
            return false;
        };

        {
            let mut view = self.shared.view.write();
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
            view.active = false;
        }
        task.abort();

        info!("Poll loop stopped");
        true
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        if let Some(task) = self.control.get_mut().task.take() {
            task.abort();
        }
    }
}

async fn run(
    source: Arc<dyn SnapshotSource>,
    session: SessionContext,
    shared: Arc<Shared>,
    generation: u64,
    period: Duration,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let outcome = source.fetch(&session.game_id, &session.token).await;
        if !shared.apply(generation, &session, outcome) {
            debug!(game_id = %session.game_id, "Discarding response from stopped poll");
            break;
        }
    }
}
