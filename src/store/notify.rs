//! Change notification for the tile store.
//!
//! Listeners come in two flavours. Immediate listeners run synchronously
//! inside every store mutation. Batched listeners only see the map when the
//! host calls [`Notifier::flush_frame`], which it does once per UI tick, so
//! a burst of mutations inside one frame is delivered as one update.
//!
//! While notifications are held (see [`Notifier::hold`]) immediate
//! listeners are not called. Releasing with `commit` delivers the final map
//! once; releasing without it drops the held change.

use std::fmt;

use crate::error::LayoutError;
use crate::store::TileMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&TileMap)>;
type ErrorListener = Box<dyn FnMut(&LayoutError)>;

#[derive(Default)]
pub struct Notifier {
    next_id: u64,
    immediate: Vec<(SubscriptionId, Listener)>,
    batched: Vec<(SubscriptionId, Listener)>,
    errors: Vec<(SubscriptionId, ErrorListener)>,
    frame_pending: bool,
    held: u32,
    held_change: bool,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("immediate", &self.immediate.len())
            .field("batched", &self.batched.len())
            .field("errors", &self.errors.len())
            .field("frame_pending", &self.frame_pending)
            .field("held", &self.held)
            .finish()
    }
}

impl Notifier {
    fn next_id(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&TileMap) + 'static) -> SubscriptionId {
        let id = self.next_id();
        self.immediate.push((id, Box::new(listener)));
        id
    }

    pub fn subscribe_batched(
        &mut self,
        listener: impl FnMut(&TileMap) + 'static,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.batched.push((id, Box::new(listener)));
        id
    }

    pub fn on_error(&mut self, listener: impl FnMut(&LayoutError) + 'static) -> SubscriptionId {
        let id = self.next_id();
        self.errors.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener of any kind. Returns false for unknown ids.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.immediate.len() + self.batched.len() + self.errors.len();
        self.immediate.retain(|(sub, _)| *sub != id);
        self.batched.retain(|(sub, _)| *sub != id);
        self.errors.retain(|(sub, _)| *sub != id);
        before != self.immediate.len() + self.batched.len() + self.errors.len()
    }

    pub fn notify(&mut self, tiles: &TileMap) {
        if self.held > 0 {
            self.held_change = true;
            return;
        }
        for (_, listener) in self.immediate.iter_mut() {
            listener(tiles);
        }
        self.frame_pending = true;
    }

    /// Defer notifications until the matching [`Notifier::release`]. Holds
    /// nest; only the outermost release delivers.
    pub fn hold(&mut self) {
        self.held += 1;
    }

    pub fn release(&mut self, tiles: &TileMap, commit: bool) {
        self.held = self.held.saturating_sub(1);
        if self.held > 0 {
            return;
        }
        let changed = std::mem::take(&mut self.held_change);
        if commit && changed {
            self.notify(tiles);
        }
    }

    pub fn is_frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Deliver the current map to batched listeners if anything changed
    /// since the last flush. Returns whether a delivery happened.
    pub fn flush_frame(&mut self, tiles: &TileMap) -> bool {
        if !self.frame_pending {
            return false;
        }
        self.frame_pending = false;
        for (_, listener) in self.batched.iter_mut() {
            listener(tiles);
        }
        true
    }

    pub fn report_error(&mut self, error: &LayoutError) {
        for (_, listener) in self.errors.iter_mut() {
            listener(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn batched_listeners_coalesce_until_flush() {
        let mut notifier = Notifier::default();
        let immediate = Rc::new(Cell::new(0));
        let batched = Rc::new(Cell::new(0));
        let i = immediate.clone();
        notifier.subscribe(move |_| i.set(i.get() + 1));
        let b = batched.clone();
        notifier.subscribe_batched(move |_| b.set(b.get() + 1));

        let map = TileMap::new();
        notifier.notify(&map);
        notifier.notify(&map);
        notifier.notify(&map);
        assert_eq!(immediate.get(), 3);
        assert_eq!(batched.get(), 0);

        assert!(notifier.flush_frame(&map));
        assert_eq!(batched.get(), 1);
        // nothing new -> no delivery
        assert!(!notifier.flush_frame(&map));
        assert_eq!(batched.get(), 1);
    }

    #[test]
    fn held_changes_deliver_once_on_commit() {
        let mut notifier = Notifier::default();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        notifier.subscribe(move |_| h.set(h.get() + 1));

        let map = TileMap::new();
        notifier.hold();
        notifier.hold();
        notifier.notify(&map);
        notifier.release(&map, true);
        notifier.notify(&map);
        assert_eq!(hits.get(), 0);
        assert!(!notifier.is_frame_pending());
        notifier.release(&map, true);
        assert_eq!(hits.get(), 1);
        assert!(notifier.is_frame_pending());
    }

    #[test]
    fn rolled_back_hold_is_silent() {
        let mut notifier = Notifier::default();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        notifier.subscribe(move |_| h.set(h.get() + 1));

        let map = TileMap::new();
        notifier.hold();
        notifier.notify(&map);
        notifier.release(&map, false);
        assert_eq!(hits.get(), 0);
        assert!(!notifier.flush_frame(&map));

        // nothing left over for the next hold
        notifier.hold();
        notifier.release(&map, true);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn unsubscribe_removes_listener() {
        let mut notifier = Notifier::default();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = notifier.subscribe(move |_| h.set(h.get() + 1));
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.notify(&TileMap::new());
        assert_eq!(hits.get(), 0);
    }
}
