// Section tracker - which named viewport section is currently in view
use crate::domain::section::{IntersectionEntry, SectionId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Any visible pixel counts as intersecting.
pub const VISIBILITY_THRESHOLD: f64 = 0.0;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("section {0} is already observed")]
    AlreadyObserved(SectionId),
    #[error("watcher rejected section {id}: {reason}")]
    Rejected { id: SectionId, reason: String },
}

pub type BatchCallback = Box<dyn FnMut(&[IntersectionEntry]) + Send>;

/// Passive visibility source, e.g. a host intersection observer.
///
/// Batches are delivered through the callback registered with `on_batch`,
/// entries in delivery order.
pub trait VisibilityWatcher {
    type Element;

    fn observe(&mut self, id: &SectionId, element: &Self::Element) -> Result<(), WatchError>;

    /// Stop watching `id`. Unknown ids are ignored.
    fn unobserve(&mut self, id: &SectionId);

    fn on_batch(&mut self, callback: BatchCallback);
}

#[derive(Debug)]
struct TrackerState {
    active: bool,
    // last-known intersection state per registered section
    sections: HashMap<SectionId, bool>,
}

/// Owns the "current section" for one page.
///
/// The last intersecting entry of a batch wins. There is no debounce, so a
/// fast scroll can flip the current section several times per batch.
pub struct SectionTracker<W: VisibilityWatcher> {
    watcher: W,
    state: Arc<Mutex<TrackerState>>,
    current: Arc<watch::Sender<Option<SectionId>>>,
}

impl<W: VisibilityWatcher> SectionTracker<W> {
    pub fn new(mut watcher: W, initial: Option<SectionId>) -> Self {
        let state = Arc::new(Mutex::new(TrackerState {
            active: true,
            sections: HashMap::new(),
        }));
        let (current, _) = watch::channel(initial);
        let current = Arc::new(current);

        let callback_state = state.clone();
        let callback_current = current.clone();
        watcher.on_batch(Box::new(move |entries| {
            apply_batch(&callback_state, &callback_current, entries);
        }));

        Self {
            watcher,
            state,
            current,
        }
    }

    /// Subscribe to every anchor that is present. Missing elements, ids that
    /// are already registered and ids the watcher refuses are skipped, so
    /// calling this again on a later render picks up late-mounted anchors.
    /// Returns how many sections were newly registered.
    pub fn register<'a, I>(&mut self, anchors: I) -> usize
    where
        I: IntoIterator<Item = (SectionId, Option<&'a W::Element>)>,
        W::Element: 'a,
    {
        if !lock(&self.state).active {
            tracing::debug!("Ignoring registration on a torn down section tracker");
            return 0;
        }

        // The state lock is never held across watcher calls: a watcher may
        // deliver a batch from inside observe/unobserve.
        let mut added = 0;
        for (id, element) in anchors {
            let Some(element) = element else {
                tracing::debug!("Section {} has no element yet, skipping", id);
                continue;
            };
            // Inserted before observing so a batch delivered during
            // observe already sees the section as registered.
            if lock(&self.state).sections.insert(id.clone(), false).is_some() {
                continue;
            }
            match self.watcher.observe(&id, element) {
                Ok(()) => added += 1,
                Err(e) => {
                    lock(&self.state).sections.remove(&id);
                    tracing::warn!("Could not observe section {}: {}", id, e);
                }
            }
        }
        added
    }

    /// Stop observing one section. Unknown ids are a no-op.
    pub fn unregister(&mut self, id: &SectionId) {
        let removed = lock(&self.state).sections.remove(id).is_some();
        if removed {
            self.watcher.unobserve(id);
        }
    }

    /// Unsubscribe everything and stop reacting to batches. Safe to call twice.
    pub fn teardown(&mut self) {
        let ids: Vec<SectionId> = {
            let mut state = lock(&self.state);
            if !state.active {
                return;
            }
            state.active = false;
            state.sections.drain().map(|(id, _)| id).collect()
        };
        for id in &ids {
            self.watcher.unobserve(id);
        }
        tracing::debug!("Section tracker torn down");
    }

    pub fn current(&self) -> Option<SectionId> {
        self.current.borrow().clone()
    }

    /// Reactive view of the current section.
    pub fn subscribe(&self) -> watch::Receiver<Option<SectionId>> {
        self.current.subscribe()
    }

    pub fn is_intersecting(&self, id: &SectionId) -> Option<bool> {
        lock(&self.state).sections.get(id).copied()
    }

    pub fn registered(&self) -> Vec<SectionId> {
        let mut ids: Vec<SectionId> = lock(&self.state).sections.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl<W: VisibilityWatcher> Drop for SectionTracker<W> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn lock(state: &Mutex<TrackerState>) -> MutexGuard<'_, TrackerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn apply_batch(
    state: &Mutex<TrackerState>,
    current: &watch::Sender<Option<SectionId>>,
    entries: &[IntersectionEntry],
) {
    let mut state = lock(state);
    if !state.active {
        return;
    }

    for entry in entries {
        let Some(last_known) = state.sections.get_mut(&entry.target) else {
            continue;
        };
        let visible = entry.is_intersecting || entry.intersection_ratio > VISIBILITY_THRESHOLD;
        *last_known = visible;
        if visible {
            tracing::trace!("Section {} entered the viewport", entry.target);
            current.send_replace(Some(entry.target.clone()));
        }
    }
}
