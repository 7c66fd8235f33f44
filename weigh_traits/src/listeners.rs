//! Listener registry shared by frame sources and their subscribers.
//!
//! A `Listeners` handle is cheap to clone; every clone refers to the same
//! registry. Sources call `emit_data`/`emit_error` from their pump thread,
//! subscribers register with `on_data`/`on_error` and unregister with
//! `remove`.
//!
//! A listener may remove itself, or any other listener, while it is being
//! invoked. The removal is recorded against the in-flight dispatch and applied
//! when the dispatch ends; a removed listener is never called again.
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Receives one delimited frame.
pub type DataListener = Box<dyn FnMut(&[u8]) + Send>;
/// Receives one stream-level error.
pub type ErrorListener = Box<dyn FnMut(&(dyn std::error::Error + 'static)) + Send>;

/// Handle returned by a subscription; pass it back to `remove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    data: Vec<(ListenerId, DataListener)>,
    error: Vec<(ListenerId, ErrorListener)>,
    /// Ids moved out of `data`/`error` by the dispatch in progress.
    in_flight: HashSet<ListenerId>,
    /// In-flight ids removed before the dispatch finished.
    removed: HashSet<ListenerId>,
}

impl Registry {
    fn next_id(&mut self) -> ListenerId {
        self.next_id = self.next_id.wrapping_add(1);
        ListenerId(self.next_id)
    }
}

fn data_slot(r: &mut Registry) -> &mut Vec<(ListenerId, DataListener)> {
    &mut r.data
}

fn error_slot(r: &mut Registry) -> &mut Vec<(ListenerId, ErrorListener)> {
    &mut r.error
}

#[derive(Clone, Default)]
pub struct Listeners {
    registry: Arc<Mutex<Registry>>,
    /// Serializes emitters so only one dispatch is in flight at a time.
    dispatch: Arc<Mutex<()>>,
}

impl core::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Listeners")
            .field("data", &self.data_count())
            .field("error", &self.error_count())
            .finish()
    }
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn on_data(&self, listener: DataListener) -> ListenerId {
        let mut reg = self.registry();
        let id = reg.next_id();
        reg.data.push((id, listener));
        id
    }

    pub fn on_error(&self, listener: ErrorListener) -> ListenerId {
        let mut reg = self.registry();
        let id = reg.next_id();
        reg.error.push((id, listener));
        id
    }

    /// Remove a listener. Returns `false` if it was already gone, so callers
    /// may remove the same id any number of times.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut reg = self.registry();
        if let Some(pos) = reg.data.iter().position(|(l, _)| *l == id) {
            reg.data.remove(pos);
            return true;
        }
        if let Some(pos) = reg.error.iter().position(|(l, _)| *l == id) {
            reg.error.remove(pos);
            return true;
        }
        if reg.in_flight.contains(&id) {
            return reg.removed.insert(id);
        }
        false
    }

    /// Number of registered data listeners. Only exact outside a dispatch.
    pub fn data_count(&self) -> usize {
        self.registry().data.len()
    }

    /// Number of registered error listeners. Only exact outside a dispatch.
    pub fn error_count(&self) -> usize {
        self.registry().error.len()
    }

    pub fn is_empty(&self) -> bool {
        let reg = self.registry();
        reg.data.is_empty() && reg.error.is_empty()
    }

    /// Deliver one frame to every data listener.
    pub fn emit_data(&self, frame: &[u8]) {
        self.dispatch(data_slot, |l| l(frame));
    }

    /// Deliver one stream error to every error listener.
    pub fn emit_error(&self, err: &(dyn std::error::Error + 'static)) {
        self.dispatch(error_slot, |l| l(err));
    }

    fn dispatch<L>(
        &self,
        slot: fn(&mut Registry) -> &mut Vec<(ListenerId, L)>,
        mut call: impl FnMut(&mut L),
    ) {
        let _serial = self.dispatch.lock().unwrap_or_else(PoisonError::into_inner);

        // Listeners run without the registry lock held so they can subscribe
        // and unsubscribe freely.
        let mut taken = {
            let mut reg = self.registry();
            let taken = std::mem::take(slot(&mut reg));
            let ids: Vec<ListenerId> = taken.iter().map(|(id, _)| *id).collect();
            reg.in_flight.extend(ids);
            taken
        };

        for (id, listener) in &mut taken {
            let removed = self.registry().removed.contains(id);
            if removed {
                continue;
            }
            call(listener);
        }

        let mut reg = self.registry();
        let removed = std::mem::take(&mut reg.removed);
        reg.in_flight.clear();
        taken.retain(|(id, _)| !removed.contains(id));
        let current = slot(&mut reg);
        // Listeners added during the dispatch keep their order after ours.
        taken.append(current);
        *current = taken;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn emits_to_all_data_listeners() {
        let hub = Listeners::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let h = hits.clone();
            hub.on_data(Box::new(move |_: &[u8]| {
                h.fetch_add(1, Ordering::Relaxed);
            }));
        }
        hub.emit_data(b"frame");
        assert_eq!(hits.load(Ordering::Relaxed), 3);
        assert_eq!(hub.data_count(), 3);
    }

    #[test]
    fn remove_is_idempotent() {
        let hub = Listeners::new();
        let id = hub.on_error(Box::new(|_: &(dyn std::error::Error + 'static)| {}));
        assert!(hub.remove(id));
        assert!(!hub.remove(id));
        assert!(hub.is_empty());
    }

    #[test]
    fn listener_can_remove_itself_during_dispatch() {
        let hub = Listeners::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let own_id: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

        let h = hits.clone();
        let hub2 = hub.clone();
        let slot = own_id.clone();
        let id = hub.on_data(Box::new(move |_: &[u8]| {
            h.fetch_add(1, Ordering::Relaxed);
            if let Some(id) = *slot.lock().unwrap() {
                assert!(hub2.remove(id));
            }
        }));
        *own_id.lock().unwrap() = Some(id);

        hub.emit_data(b"a");
        hub.emit_data(b"b");
        assert_eq!(hits.load(Ordering::Relaxed), 1);
        assert_eq!(hub.data_count(), 0);
    }

    #[test]
    fn removed_sibling_is_skipped_in_same_dispatch() {
        let hub = Listeners::new();
        let second_hits = Arc::new(AtomicUsize::new(0));
        let second: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

        let hub2 = hub.clone();
        let target = second.clone();
        hub.on_data(Box::new(move |_: &[u8]| {
            if let Some(id) = *target.lock().unwrap() {
                hub2.remove(id);
            }
        }));
        let h = second_hits.clone();
        let id = hub.on_data(Box::new(move |_: &[u8]| {
            h.fetch_add(1, Ordering::Relaxed);
        }));
        *second.lock().unwrap() = Some(id);

        hub.emit_data(b"x");
        assert_eq!(second_hits.load(Ordering::Relaxed), 0);
        assert_eq!(hub.data_count(), 1);
    }

    #[test]
    fn listener_added_during_dispatch_survives() {
        let hub = Listeners::new();
        let hub2 = hub.clone();
        let added = Arc::new(AtomicUsize::new(0));
        let a = added.clone();
        hub.on_data(Box::new(move |_: &[u8]| {
            if a.fetch_add(1, Ordering::Relaxed) == 0 {
                hub2.on_data(Box::new(|_: &[u8]| {}));
            }
        }));
        hub.emit_data(b"x");
        assert_eq!(hub.data_count(), 2);
    }

    #[test]
    fn error_listeners_see_the_error() {
        let hub = Listeners::new();
        let seen = Arc::new(Mutex::new(String::new()));
        let s = seen.clone();
        hub.on_error(Box::new(move |e: &(dyn std::error::Error + 'static)| {
            *s.lock().unwrap() = e.to_string();
        }));
        let err = std::io::Error::other("line noise");
        hub.emit_error(&err);
        assert_eq!(&*seen.lock().unwrap(), "line noise");
    }
}
