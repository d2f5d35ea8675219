//! Typed publish/subscribe channels.
//!
//! Each event kind gets its own [`Channel`]; listeners run synchronously, in
//! registration order, on the caller's thread before `emit` returns. The
//! listener list is snapshotted before dispatch, so a listener may subscribe,
//! unsubscribe or emit again without tripping a `RefCell` borrow.

use crate::config::{Theme, ThemeData};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

pub struct Channel<E> {
    listeners: RefCell<Vec<(ListenerId, Rc<dyn Fn(&E)>)>>,
    next_id: Cell<u64>,
}

impl<E> Default for Channel<E> {
    fn default() -> Self {
        Self { listeners: RefCell::new(Vec::new()), next_id: Cell::new(0) }
    }
}

impl<E> Channel<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Delivers `event` to every current listener; returns how many were called.
    pub fn emit(&self, event: &E) -> usize {
        let snapshot: Vec<Rc<dyn Fn(&E)>> =
            self.listeners.borrow().iter().map(|(_, l)| Rc::clone(l)).collect();
        for listener in &snapshot {
            listener(event);
        }
        snapshot.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

/// Payload of the theme-changed notification: `{theme, themeData}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemeChanged {
    pub theme: Theme,
    #[serde(rename = "themeData")]
    pub theme_data: ThemeData,
}

impl ThemeChanged {
    pub fn new(theme: Theme) -> Self {
        Self { theme, theme_data: theme.data() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityChanged {
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resized {
    pub width: f64,
    pub height: f64,
}

/// The page's notification channels, one per event kind.
#[derive(Default)]
pub struct SiteBus {
    pub theme_changed: Channel<ThemeChanged>,
    pub visibility: Channel<VisibilityChanged>,
    pub resized: Channel<Resized>,
}

impl SiteBus {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listeners_run_in_registration_order() {
        let channel: Channel<u32> = Channel::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let seen = seen.clone();
            channel.subscribe(move |v: &u32| seen.borrow_mut().push(format!("{}{}", tag, v)));
        }

        assert_eq!(channel.emit(&7), 3);
        assert_eq!(*seen.borrow(), vec!["a7", "b7", "c7"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let channel: Channel<()> = Channel::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = channel.subscribe(move |_| h.set(h.get() + 1));

        channel.emit(&());
        assert!(channel.unsubscribe(id));
        assert!(!channel.unsubscribe(id));
        channel.emit(&());
        assert_eq!(hits.get(), 1);
        assert_eq!(channel.listener_count(), 0);
    }

    #[test]
    fn test_listener_may_subscribe_during_emit() {
        let channel: Rc<Channel<u8>> = Rc::new(Channel::new());
        let inner = channel.clone();
        channel.subscribe(move |_| {
            inner.subscribe(|_| {});
        });

        channel.emit(&1);
        assert_eq!(channel.listener_count(), 2);
    }

    #[test]
    fn test_theme_changed_payload_shape() {
        let json = serde_json::to_value(ThemeChanged::new(Theme::Dark)).unwrap();
        assert_eq!(json["theme"], "dark");
        assert_eq!(json["themeData"]["name"], "Evening Tea");
        assert_eq!(json["themeData"]["colors"]["cardBg"], "rgba(40, 30, 20, 0.25)");
    }
}
