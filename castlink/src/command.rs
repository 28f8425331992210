//! Service command lifecycle.
//!
//! Every control operation returns a fresh [`ServiceCommand`]: a handle to one
//! outstanding asynchronous device request. The settle side is a
//! [`CommandResponder`] handed to the protocol transport. One-shot commands
//! deliver a single success (or error) and then complete; subscription
//! commands deliver a success per underlying state change and complete only
//! on teardown or error.
//!
//! Callbacks attached after settlement are replayed immediately with the
//! retained outcome, so registration never races completion. `complete`
//! fires exactly once per command, after the last success/error delivery.

use std::mem;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::errors::CastLinkError;

/// Payload carried by command results. Protocol transports report whatever
/// structure the underlying device returned.
pub type Payload = Value;

type SuccessFn = Box<dyn FnMut(&Payload) + Send>;
type ErrorFn = Box<dyn FnMut(&CastLinkError) + Send>;
type CompleteFn = Box<dyn FnMut(Option<&CastLinkError>, Option<&Payload>) + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    /// Exactly one success or error, then complete.
    OneShot,
    /// Zero or more successes; complete only on unsubscribe or error.
    Subscription,
}

struct CommandState {
    kind: CommandKind,
    success_cbs: Vec<SuccessFn>,
    error_cbs: Vec<ErrorFn>,
    complete_cbs: Vec<CompleteFn>,
    /// Most recent success payload, retained for replay.
    last_payload: Option<Payload>,
    /// True once at least one success has been delivered.
    delivered: bool,
    error: Option<CastLinkError>,
    completed: bool,
}

impl CommandState {
    fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            success_cbs: Vec::new(),
            error_cbs: Vec::new(),
            complete_cbs: Vec::new(),
            last_payload: None,
            delivered: false,
            error: None,
            completed: false,
        }
    }
}

/// Handle to one in-flight asynchronous device operation.
///
/// `success`, `error` and `complete` return `&Self` for fluent chaining;
/// multiple callbacks of the same kind run in attachment order.
#[derive(Clone)]
pub struct ServiceCommand {
    state: Arc<Mutex<CommandState>>,
}

/// Settle side of a [`ServiceCommand`], held by the protocol transport.
#[derive(Clone)]
pub struct CommandResponder {
    state: Arc<Mutex<CommandState>>,
}

impl ServiceCommand {
    pub fn new(kind: CommandKind) -> (ServiceCommand, CommandResponder) {
        let state = Arc::new(Mutex::new(CommandState::new(kind)));
        (
            ServiceCommand {
                state: Arc::clone(&state),
            },
            CommandResponder { state },
        )
    }

    /// One-shot command already settled with `err`. Used by control
    /// operations that fail fast (missing capability, device not ready);
    /// the error is still delivered through the normal callback path.
    pub fn settled_error(err: CastLinkError) -> ServiceCommand {
        let (command, responder) = ServiceCommand::new(CommandKind::OneShot);
        responder.reject(err);
        command
    }

    pub fn kind(&self) -> CommandKind {
        self.state.lock().unwrap().kind
    }

    pub fn is_completed(&self) -> bool {
        self.state.lock().unwrap().completed
    }

    /// Attach a success callback. Replays the most recent success delivery
    /// when one has already happened.
    pub fn success<F>(&self, mut cb: F) -> &Self
    where
        F: FnMut(&Payload) + Send + 'static,
    {
        let replay = {
            let st = self.state.lock().unwrap();
            if st.delivered {
                st.last_payload.clone()
            } else {
                None
            }
        };
        if let Some(payload) = replay {
            cb(&payload);
        }
        self.state.lock().unwrap().success_cbs.push(Box::new(cb));
        self
    }

    /// Attach an error callback. Replays immediately when the command has
    /// already errored.
    pub fn error<F>(&self, mut cb: F) -> &Self
    where
        F: FnMut(&CastLinkError) + Send + 'static,
    {
        let replay = {
            let st = self.state.lock().unwrap();
            st.error.clone()
        };
        if let Some(err) = replay {
            cb(&err);
        }
        self.state.lock().unwrap().error_cbs.push(Box::new(cb));
        self
    }

    /// Attach a completion callback: fires exactly once per command, after
    /// the last success/error delivery, with `(error, payload)`. Replays
    /// immediately when the command has already completed.
    pub fn complete<F>(&self, mut cb: F) -> &Self
    where
        F: FnMut(Option<&CastLinkError>, Option<&Payload>) + Send + 'static,
    {
        let replay = {
            let st = self.state.lock().unwrap();
            if st.completed {
                Some(completion_outcome(&st))
            } else {
                None
            }
        };
        if let Some((err, payload)) = replay {
            cb(err.as_ref(), payload.as_ref());
        }
        self.state.lock().unwrap().complete_cbs.push(Box::new(cb));
        self
    }
}

impl CommandResponder {
    /// Deliver a success. For one-shot commands the command completes right
    /// after the delivery; settling an already-settled one-shot is a no-op.
    /// Subscription commands stay open and may be resolved repeatedly.
    pub fn resolve(&self, payload: Payload) {
        let (callbacks, auto_complete) = {
            let mut st = self.state.lock().unwrap();
            if st.completed || (st.kind == CommandKind::OneShot && st.delivered) {
                return;
            }
            st.last_payload = Some(payload.clone());
            st.delivered = true;
            (mem::take(&mut st.success_cbs), st.kind == CommandKind::OneShot)
        };
        let mut callbacks = callbacks;
        for cb in callbacks.iter_mut() {
            cb(&payload);
        }
        merge_back(&self.state, callbacks, |st| &mut st.success_cbs);
        if auto_complete {
            complete_now(&self.state, None);
        }
    }

    /// Deliver an error and complete the command. No-op once completed.
    pub fn reject(&self, err: CastLinkError) {
        let callbacks = {
            let mut st = self.state.lock().unwrap();
            if st.completed {
                return;
            }
            st.error = Some(err.clone());
            mem::take(&mut st.error_cbs)
        };
        let mut callbacks = callbacks;
        for cb in callbacks.iter_mut() {
            cb(&err);
        }
        merge_back(&self.state, callbacks, |st| &mut st.error_cbs);
        complete_now(&self.state, Some(err));
    }

    /// Terminal teardown for subscription commands: completes without an
    /// error. No-op once completed.
    pub fn finish(&self) {
        complete_now(&self.state, None);
    }

    pub fn is_completed(&self) -> bool {
        self.state.lock().unwrap().completed
    }
}

fn completion_outcome(st: &CommandState) -> (Option<CastLinkError>, Option<Payload>) {
    match &st.error {
        Some(err) => (Some(err.clone()), None),
        None => (None, st.last_payload.clone()),
    }
}

/// Put invoked callbacks back in front of any attached during dispatch, so
/// attachment order is preserved for the next delivery. Callbacks are always
/// invoked outside the state lock so one may attach further callbacks or
/// settle re-entrantly without deadlocking.
fn merge_back<T>(
    state: &Arc<Mutex<CommandState>>,
    mut invoked: Vec<T>,
    field: impl Fn(&mut CommandState) -> &mut Vec<T>,
) {
    let mut st = state.lock().unwrap();
    let slot = field(&mut st);
    let mut added = mem::take(slot);
    invoked.append(&mut added);
    *slot = invoked;
}

fn complete_now(state: &Arc<Mutex<CommandState>>, err: Option<CastLinkError>) {
    let (callbacks, outcome) = {
        let mut st = state.lock().unwrap();
        if st.completed {
            return;
        }
        st.completed = true;
        if err.is_some() {
            st.error = err;
        }
        (mem::take(&mut st.complete_cbs), completion_outcome(&st))
    };
    let (err, payload) = outcome;
    let mut callbacks = callbacks;
    for cb in callbacks.iter_mut() {
        cb(err.as_ref(), payload.as_ref());
    }
    let mut st = state.lock().unwrap();
    let mut added = mem::take(&mut st.complete_cbs);
    callbacks.append(&mut added);
    st.complete_cbs = callbacks;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> usize) {
        let c = Arc::new(AtomicUsize::new(0));
        let reader = Arc::clone(&c);
        (c, move || reader.load(Ordering::SeqCst))
    }

    #[test]
    fn one_shot_success_then_complete() {
        let (cmd, responder) = ServiceCommand::new(CommandKind::OneShot);
        let (successes, read_successes) = counter();
        let (completes, read_completes) = counter();

        cmd.success(move |payload| {
            assert!(payload.is_null());
            successes.fetch_add(1, Ordering::SeqCst);
        })
        .complete(move |err, _| {
            assert!(err.is_none());
            completes.fetch_add(1, Ordering::SeqCst);
        });

        responder.resolve(Value::Null);
        assert_eq!(read_successes(), 1);
        assert_eq!(read_completes(), 1);

        // Settling twice is a no-op.
        responder.resolve(json!(42));
        responder.reject(CastLinkError::protocol("late"));
        assert_eq!(read_successes(), 1);
        assert_eq!(read_completes(), 1);
    }

    #[test]
    fn replay_after_settlement() {
        let (cmd, responder) = ServiceCommand::new(CommandKind::OneShot);
        responder.resolve(json!({"volume": 12}));

        let (successes, read_successes) = counter();
        let (completes, read_completes) = counter();
        cmd.success(move |payload| {
            assert_eq!(payload["volume"], 12);
            successes.fetch_add(1, Ordering::SeqCst);
        });
        cmd.complete(move |err, payload| {
            assert!(err.is_none());
            assert_eq!(payload.unwrap()["volume"], 12);
            completes.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(read_successes(), 1);
        assert_eq!(read_completes(), 1);
    }

    #[test]
    fn error_path_delivers_error_then_complete() {
        let (cmd, responder) = ServiceCommand::new(CommandKind::OneShot);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        cmd.error(move |err| log.lock().unwrap().push(format!("error:{err}")));
        let log = Arc::clone(&seen);
        cmd.complete(move |err, _| {
            log.lock()
                .unwrap()
                .push(format!("complete:{}", err.is_some()))
        });

        responder.reject(CastLinkError::protocol_with_code("refused", 503));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].starts_with("error:"));
        assert_eq!(seen[1], "complete:true");
    }

    #[test]
    fn unhandled_error_available_to_late_complete() {
        let (cmd, responder) = ServiceCommand::new(CommandKind::OneShot);
        responder.reject(CastLinkError::protocol("no handler attached"));

        let (completes, read_completes) = counter();
        cmd.complete(move |err, payload| {
            assert!(matches!(err, Some(CastLinkError::Protocol { .. })));
            assert!(payload.is_none());
            completes.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(read_completes(), 1);
    }

    #[test]
    fn callbacks_run_in_attachment_order() {
        let (cmd, responder) = ServiceCommand::new(CommandKind::OneShot);
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            cmd.success(move |_| order.lock().unwrap().push(tag));
        }
        responder.resolve(Value::Null);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn subscription_delivers_many_then_completes_once() {
        let (cmd, responder) = ServiceCommand::new(CommandKind::Subscription);
        let volumes = Arc::new(Mutex::new(Vec::new()));
        let (completes, read_completes) = counter();

        let log = Arc::clone(&volumes);
        cmd.success(move |payload| log.lock().unwrap().push(payload["volume"].as_i64().unwrap()));
        cmd.complete(move |err, _| {
            assert!(err.is_none());
            completes.fetch_add(1, Ordering::SeqCst);
        });

        for v in [10, 11, 12] {
            responder.resolve(json!({"volume": v}));
        }
        assert_eq!(read_completes(), 0);

        responder.finish();
        responder.finish();

        assert_eq!(*volumes.lock().unwrap(), vec![10, 11, 12]);
        assert_eq!(read_completes(), 1);
    }

    #[test]
    fn late_subscription_callback_replays_most_recent_delivery() {
        let (cmd, responder) = ServiceCommand::new(CommandKind::Subscription);
        responder.resolve(json!({"volume": 7}));

        let volumes = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&volumes);
        cmd.success(move |payload| log.lock().unwrap().push(payload["volume"].as_i64().unwrap()));

        responder.resolve(json!({"volume": 8}));
        assert_eq!(*volumes.lock().unwrap(), vec![7, 8]);
    }

    #[test]
    fn settled_error_replays_on_attach() {
        let cmd = ServiceCommand::settled_error(CastLinkError::capability_missing("VolumeControl"));
        let (errors, read_errors) = counter();
        cmd.error(move |err| {
            assert_eq!(err, &CastLinkError::capability_missing("VolumeControl"));
            errors.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(read_errors(), 1);
        assert!(cmd.is_completed());
    }

    #[test]
    fn attaching_during_dispatch_does_not_corrupt_delivery() {
        let (cmd, responder) = ServiceCommand::new(CommandKind::Subscription);
        let (inner_calls, read_inner) = counter();

        let cmd_clone = cmd.clone();
        let first = Arc::new(AtomicUsize::new(0));
        cmd.success(move |_| {
            if first.fetch_add(1, Ordering::SeqCst) == 0 {
                let inner = Arc::clone(&inner_calls);
                // Attaching from inside a success callback must not deadlock;
                // the new callback replays the in-flight delivery and then
                // sees subsequent ones.
                cmd_clone.success(move |_| {
                    inner.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        responder.resolve(json!(1));
        assert_eq!(read_inner(), 1);
        responder.resolve(json!(2));
        assert_eq!(read_inner(), 2);
    }
}
