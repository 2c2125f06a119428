//! Server-side viewer sessions, one poll loop each

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use crate::poll::{PollLoop, SessionContext, SnapshotSource, ViewState};

/// Registry of live viewers
pub struct ViewerRegistry {
    source: Arc<dyn SnapshotSource>,
    poll_interval: Duration,
    viewers: DashMap<Uuid, Arc<PollLoop>>,
}

impl ViewerRegistry {
    pub fn new(source: Arc<dyn SnapshotSource>, poll_interval: Duration) -> Self {
        Self {
            source,
            poll_interval,
            viewers: DashMap::new(),
        }
    }

    /// Create a viewer and start polling for it.
    ///
    /// Returns `None` when the session lacks a game id or token.
    pub fn open(&self, session: SessionContext) -> Option<Uuid> {
        if !session.is_complete() {
            return None;
        }

        let viewer_id = Uuid::new_v4();
        let poll = Arc::new(PollLoop::new(self.source.clone(), self.poll_interval));
        let game_id = session.game_id.clone();
        poll.start(session);
        self.viewers.insert(viewer_id, poll);

        info!(viewer_id = %viewer_id, game_id = %game_id, "Viewer opened");
        Some(viewer_id)
    }

    pub fn get(&self, viewer_id: &Uuid) -> Option<Arc<PollLoop>> {
        self.viewers.get(viewer_id).map(|entry| entry.value().clone())
    }

    pub fn state(&self, viewer_id: &Uuid) -> Option<ViewState> {
        self.get(viewer_id).map(|poll| poll.state())
    }

    /// Stop and forget a viewer
    pub fn close(&self, viewer_id: &Uuid) -> bool {
        match self.viewers.remove(viewer_id) {
            Some((_, poll)) => {
                poll.stop();
                info!(viewer_id = %viewer_id, "Viewer closed");
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.viewers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewers.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.viewers
            .iter()
            .filter(|entry| entry.value().is_active())
            .count()
    }
}
