//! Transient device picker.
//!
//! A picker surfaces discovery candidates to a selection UI and resolves to
//! exactly one device. It is terminal once resolved, errored or closed.
//! Success/error/complete callbacks follow the same attach-after-settle
//! replay rule as service commands; `close()` suppresses every later
//! delivery, even if a resolution was in flight.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::capability::CapabilityFilter;
use crate::device::ConnectableDevice;
use crate::errors::CastLinkError;

#[derive(Clone, Debug, Default)]
pub struct PickerOptions {
    /// UI hint for the rendering layer.
    pub title: Option<String>,
    /// Extra capability gate applied to candidates, on top of the discovery
    /// manager's active filters.
    pub capability_filter: Option<CapabilityFilter>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickerState {
    Open,
    Resolved,
    Errored,
    Closed,
}

type DeviceFn = Arc<Mutex<dyn FnMut(&ConnectableDevice) + Send>>;
type ErrorFn = Arc<Mutex<dyn FnMut(&CastLinkError) + Send>>;
type CompleteFn = Arc<Mutex<dyn FnMut(Option<&CastLinkError>, Option<&ConnectableDevice>) + Send>>;

struct PickerInner {
    state: PickerState,
    options: PickerOptions,
    candidates: Vec<ConnectableDevice>,
    device: Option<ConnectableDevice>,
    error: Option<CastLinkError>,
    success_cbs: Vec<DeviceFn>,
    error_cbs: Vec<ErrorFn>,
    complete_cbs: Vec<CompleteFn>,
    candidate_cbs: Vec<DeviceFn>,
}

#[derive(Clone)]
pub struct DevicePicker {
    inner: Arc<Mutex<PickerInner>>,
}

impl DevicePicker {
    pub(crate) fn new(options: PickerOptions, seed: Vec<ConnectableDevice>) -> Self {
        let picker = Self {
            inner: Arc::new(Mutex::new(PickerInner {
                state: PickerState::Open,
                options,
                candidates: Vec::new(),
                device: None,
                error: None,
                success_cbs: Vec::new(),
                error_cbs: Vec::new(),
                complete_cbs: Vec::new(),
                candidate_cbs: Vec::new(),
            })),
        };
        for device in seed {
            picker.offer(&device);
        }
        picker
    }

    pub fn state(&self) -> PickerState {
        self.inner.lock().unwrap().state
    }

    pub fn is_open(&self) -> bool {
        self.state() == PickerState::Open
    }

    /// Devices currently offered for selection, in arrival order.
    pub fn candidates(&self) -> Vec<ConnectableDevice> {
        self.inner.lock().unwrap().candidates.clone()
    }

    /// Attach a resolution callback; replays when already resolved.
    pub fn success<F>(&self, mut cb: F) -> &Self
    where
        F: FnMut(&ConnectableDevice) + Send + 'static,
    {
        let replay = {
            let st = self.inner.lock().unwrap();
            if st.state == PickerState::Resolved {
                st.device.clone()
            } else {
                None
            }
        };
        if let Some(device) = replay {
            cb(&device);
        }
        self.inner
            .lock()
            .unwrap()
            .success_cbs
            .push(Arc::new(Mutex::new(cb)));
        self
    }

    /// Attach an error callback; replays when already errored.
    pub fn error<F>(&self, mut cb: F) -> &Self
    where
        F: FnMut(&CastLinkError) + Send + 'static,
    {
        let replay = {
            let st = self.inner.lock().unwrap();
            if st.state == PickerState::Errored {
                st.error.clone()
            } else {
                None
            }
        };
        if let Some(err) = replay {
            cb(&err);
        }
        self.inner
            .lock()
            .unwrap()
            .error_cbs
            .push(Arc::new(Mutex::new(cb)));
        self
    }

    /// Attach a completion callback; replays on resolved/errored pickers.
    /// A closed picker never delivers.
    pub fn complete<F>(&self, mut cb: F) -> &Self
    where
        F: FnMut(Option<&CastLinkError>, Option<&ConnectableDevice>) + Send + 'static,
    {
        let replay = {
            let st = self.inner.lock().unwrap();
            match st.state {
                PickerState::Resolved | PickerState::Errored => {
                    Some((st.error.clone(), st.device.clone()))
                }
                PickerState::Open | PickerState::Closed => None,
            }
        };
        if let Some((err, device)) = replay {
            cb(err.as_ref(), device.as_ref());
        }
        self.inner
            .lock()
            .unwrap()
            .complete_cbs
            .push(Arc::new(Mutex::new(cb)));
        self
    }

    /// Watch candidates as discovery surfaces them. Already-known candidates
    /// are replayed immediately.
    pub fn on_candidate<F>(&self, mut cb: F) -> &Self
    where
        F: FnMut(&ConnectableDevice) + Send + 'static,
    {
        let existing = self.candidates();
        for device in &existing {
            cb(device);
        }
        self.inner
            .lock()
            .unwrap()
            .candidate_cbs
            .push(Arc::new(Mutex::new(cb)));
        self
    }

    /// Offer a newly-discovered device as a candidate. Ignored once the
    /// picker is terminal, when the device fails the picker's own capability
    /// filter, or when the device is already offered.
    pub(crate) fn offer(&self, device: &ConnectableDevice) {
        let callbacks: Vec<DeviceFn> = {
            let mut st = self.inner.lock().unwrap();
            if st.state != PickerState::Open {
                return;
            }
            if let Some(filter) = &st.options.capability_filter {
                if !filter.matches(&device.capabilities()) {
                    return;
                }
            }
            if st.candidates.iter().any(|d| d.id() == device.id()) {
                return;
            }
            st.candidates.push(device.clone());
            st.candidate_cbs.to_vec()
        };
        for cb in callbacks {
            (cb.lock().unwrap())(device);
        }
    }

    /// Resolve the pick. Called by the selection UI; no-op once terminal.
    pub fn select(&self, device: &ConnectableDevice) -> bool {
        let (success_cbs, complete_cbs) = {
            let mut st = self.inner.lock().unwrap();
            if st.state != PickerState::Open {
                return false;
            }
            st.state = PickerState::Resolved;
            st.device = Some(device.clone());
            (st.success_cbs.to_vec(), st.complete_cbs.to_vec())
        };
        debug!(device = %device.id(), "picker resolved");
        for cb in success_cbs {
            (cb.lock().unwrap())(device);
        }
        for cb in complete_cbs {
            (cb.lock().unwrap())(None, Some(device));
        }
        true
    }

    /// Error the pick; no-op once terminal.
    pub fn fail(&self, err: CastLinkError) -> bool {
        let (error_cbs, complete_cbs) = {
            let mut st = self.inner.lock().unwrap();
            if st.state != PickerState::Open {
                return false;
            }
            st.state = PickerState::Errored;
            st.error = Some(err.clone());
            (st.error_cbs.to_vec(), st.complete_cbs.to_vec())
        };
        for cb in error_cbs {
            (cb.lock().unwrap())(&err);
        }
        for cb in complete_cbs {
            (cb.lock().unwrap())(Some(&err), None);
        }
        true
    }

    /// Force the picker closed. Fires no callbacks and suppresses any later
    /// delivery; a close after resolution is a no-op.
    pub fn close(&self) {
        let mut st = self.inner.lock().unwrap();
        if st.state == PickerState::Open {
            st.state = PickerState::Closed;
            st.success_cbs.clear();
            st.error_cbs.clear();
            st.complete_cbs.clear();
            st.candidate_cbs.clear();
        }
    }
}
