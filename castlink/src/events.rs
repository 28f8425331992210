//! Named-event listener registry.
//!
//! Dispatch operates over a point-in-time snapshot of the listener list, so
//! listeners may register or remove listeners from inside a callback without
//! corrupting the iteration in progress. Listener callbacks run in
//! registration order. A crossbeam channel mirror is available for consumers
//! that prefer pulling events off a receiver.

use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, unbounded};

/// Token returned by [`EventBus::on`]; used to remove the listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<E> = Arc<Mutex<dyn FnMut(&E) + Send>>;

struct BusInner<E> {
    next_id: u64,
    listeners: Vec<(ListenerId, String, Listener<E>)>,
    taps: Vec<Sender<E>>,
}

pub struct EventBus<E> {
    inner: Arc<Mutex<BusInner<E>>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Default for EventBus<E>
where
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E>
where
    E: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                next_id: 0,
                listeners: Vec::new(),
                taps: Vec::new(),
            })),
        }
    }

    /// Register a callback for the named event.
    pub fn on<F>(&self, event: &str, cb: F) -> ListenerId
    where
        F: FnMut(&E) + Send + 'static,
    {
        let mut inner = self.inner.lock().unwrap();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner
            .listeners
            .push((id, event.to_string(), Arc::new(Mutex::new(cb))));
        id
    }

    /// Remove a listener previously registered with [`EventBus::on`].
    /// Returns false when no listener matched.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.listeners.len();
        inner
            .listeners
            .retain(|(lid, name, _)| !(*lid == id && name == event));
        inner.listeners.len() != before
    }

    /// Alias for [`EventBus::on`].
    pub fn add_listener<F>(&self, event: &str, cb: F) -> ListenerId
    where
        F: FnMut(&E) + Send + 'static,
    {
        self.on(event, cb)
    }

    /// Alias for [`EventBus::off`].
    pub fn remove_listener(&self, event: &str, id: ListenerId) -> bool {
        self.off(event, id)
    }

    /// Channel mirror: every emitted event is also sent to subscribers.
    pub fn subscribe(&self) -> Receiver<E> {
        let (tx, rx) = unbounded::<E>();
        self.inner.lock().unwrap().taps.push(tx);
        rx
    }

    /// Drop every listener and channel subscriber.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.listeners.clear();
        inner.taps.clear();
    }

    /// Deliver `payload` to every listener registered for `event`, in
    /// registration order, over a snapshot taken now. Listeners added during
    /// dispatch are not invoked for this emit; removed ones still are.
    pub fn emit(&self, event: &str, payload: &E) {
        let snapshot: Vec<Listener<E>> = {
            let mut inner = self.inner.lock().unwrap();
            inner.taps.retain(|tx| tx.send(payload.clone()).is_ok());
            inner
                .listeners
                .iter()
                .filter(|(_, name, _)| name == event)
                .map(|(_, _, cb)| Arc::clone(cb))
                .collect()
        };
        for cb in snapshot {
            (cb.lock().unwrap())(payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_fire_in_registration_order() {
        let bus: EventBus<u32> = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let seen = Arc::clone(&seen);
            bus.on("tick", move |v| seen.lock().unwrap().push(format!("{tag}{v}")));
        }
        bus.emit("tick", &1);
        assert_eq!(*seen.lock().unwrap(), vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn off_removes_only_the_matching_listener() {
        let bus: EventBus<u32> = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        let keep = bus.on("tick", move |v| log.lock().unwrap().push(*v));
        let log = Arc::clone(&seen);
        let drop_me = bus.on("tick", move |v| log.lock().unwrap().push(v + 100));

        assert!(bus.off("tick", drop_me));
        assert!(!bus.off("tick", drop_me));
        // Wrong event name does not remove.
        assert!(!bus.off("tock", keep));

        bus.emit("tick", &1);
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn registering_during_dispatch_does_not_affect_current_emit() {
        let bus: EventBus<u32> = EventBus::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let bus_clone = bus.clone();
        let log = Arc::clone(&calls);
        let outer_log = Arc::clone(&calls);
        bus.on("tick", move |_| {
            outer_log.lock().unwrap().push("outer");
            let log = Arc::clone(&log);
            bus_clone.on("tick", move |_| log.lock().unwrap().push("inner"));
        });

        bus.emit("tick", &1);
        assert_eq!(*calls.lock().unwrap(), vec!["outer"]);
        calls.lock().unwrap().clear();

        bus.emit("tick", &2);
        // Second emit sees outer plus the two inners registered so far.
        assert_eq!(*calls.lock().unwrap(), vec!["outer", "inner", "inner"]);
    }

    #[test]
    fn removing_during_dispatch_keeps_current_snapshot_intact() {
        let bus: EventBus<u32> = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));
        let bus_clone = bus.clone();
        let slot_clone = Arc::clone(&slot);
        let log = Arc::clone(&seen);
        bus.on("tick", move |_| {
            log.lock().unwrap().push("first");
            if let Some(id) = slot_clone.lock().unwrap().take() {
                bus_clone.off("tick", id);
            }
        });
        let log = Arc::clone(&seen);
        let second = bus.on("tick", move |_| log.lock().unwrap().push("second"));
        *slot.lock().unwrap() = Some(second);

        // The first listener removes the second mid-dispatch; the snapshot
        // taken at emit time still delivers to it.
        bus.emit("tick", &1);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
        seen.lock().unwrap().clear();

        bus.emit("tick", &2);
        assert_eq!(*seen.lock().unwrap(), vec!["first"]);
    }

    #[test]
    fn channel_subscribers_receive_every_emit() {
        let bus: EventBus<u32> = EventBus::new();
        let rx = bus.subscribe();
        bus.emit("tick", &1);
        bus.emit("tock", &2);
        assert_eq!(rx.try_recv(), Ok(1));
        assert_eq!(rx.try_recv(), Ok(2));
        assert!(rx.try_recv().is_err());
    }
}
