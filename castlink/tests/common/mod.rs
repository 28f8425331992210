//! Scripted protocol transport used by the integration suite.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use castlink::{
    AirPlayServiceMode, CastLinkError, CommandResponder, DeviceDescriptor, DeviceHandle, DeviceId,
    DeviceService, DiscoverySink, PairingLevel, Payload,
};

#[derive(Default)]
pub struct MockState {
    pub sink: Option<DiscoverySink>,
    pub start_calls: usize,
    pub stop_calls: usize,
    /// (device id, action, args) per execute call, in order.
    pub executed: Vec<(String, String, Payload)>,
    pub subscriptions: HashMap<(String, String), CommandResponder>,
    pub handles: HashMap<String, DeviceHandle>,
    pub fail_actions: HashSet<String>,
    pub pairing_level: Option<PairingLevel>,
    pub airplay_mode: Option<AirPlayServiceMode>,
}

pub struct MockService {
    name: String,
    pub state: Arc<Mutex<MockState>>,
}

impl MockService {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            state: Arc::new(Mutex::new(MockState::default())),
        })
    }

    fn sink(&self) -> DiscoverySink {
        self.state
            .lock()
            .unwrap()
            .sink
            .clone()
            .expect("discovery not started on mock transport")
    }

    /// Script a sighting through the stored discovery sink.
    pub fn sight(&self, descriptor: DeviceDescriptor) {
        self.sink().device_sighted(descriptor);
    }

    /// Script a loss-of-sighting.
    pub fn lose(&self, id: &str) {
        self.sink().device_lost(&DeviceId(id.into()));
    }

    /// Make the named action reject with a protocol error.
    pub fn fail_action(&self, action: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_actions
            .insert(action.to_string());
    }

    /// Deliver one update on an open subscription.
    pub fn push_update(&self, device: &str, topic: &str, payload: Payload) {
        let responder = {
            let st = self.state.lock().unwrap();
            st.subscriptions
                .get(&(device.to_string(), topic.to_string()))
                .cloned()
                .expect("no open subscription for topic")
        };
        responder.resolve(payload);
    }

    pub fn executed_actions(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .executed
            .iter()
            .map(|(_, action, _)| action.clone())
            .collect()
    }
}

impl DeviceService for MockService {
    fn service_name(&self) -> &str {
        &self.name
    }

    fn start_discovery(&self, sink: DiscoverySink) -> anyhow::Result<()> {
        let mut st = self.state.lock().unwrap();
        st.start_calls += 1;
        st.sink = Some(sink);
        Ok(())
    }

    fn stop_discovery(&self) {
        self.state.lock().unwrap().stop_calls += 1;
    }

    fn connect(&self, device: &DeviceDescriptor, handle: DeviceHandle) {
        self.state
            .lock()
            .unwrap()
            .handles
            .insert(device.id.0.clone(), handle.clone());
        handle.mark_ready();
    }

    fn disconnect(&self, id: &DeviceId) {
        let handle = self.state.lock().unwrap().handles.get(&id.0).cloned();
        if let Some(handle) = handle {
            handle.mark_disconnected();
        }
    }

    fn execute(&self, id: &DeviceId, action: &str, args: Payload, responder: CommandResponder) {
        let fail = {
            let mut st = self.state.lock().unwrap();
            st.executed
                .push((id.0.clone(), action.to_string(), args));
            st.fail_actions.contains(action)
        };
        if fail {
            responder.reject(CastLinkError::protocol_with_code("scripted failure", 500));
        } else {
            responder.resolve(Value::Null);
        }
    }

    fn subscribe(&self, id: &DeviceId, topic: &str, responder: CommandResponder) {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .insert((id.0.clone(), topic.to_string()), responder);
    }

    fn unsubscribe(&self, id: &DeviceId, topic: &str) {
        let responder = self
            .state
            .lock()
            .unwrap()
            .subscriptions
            .remove(&(id.0.clone(), topic.to_string()));
        if let Some(responder) = responder {
            responder.finish();
        }
    }

    fn set_pairing_level(&self, level: PairingLevel) {
        self.state.lock().unwrap().pairing_level = Some(level);
    }

    fn set_airplay_mode(&self, mode: AirPlayServiceMode) {
        self.state.lock().unwrap().airplay_mode = Some(mode);
    }
}

pub fn descriptor(id: &str, name: &str, capabilities: &[&str]) -> DeviceDescriptor {
    DeviceDescriptor {
        id: DeviceId(id.into()),
        friendly_name: name.into(),
        ip_address: "192.168.1.20".into(),
        model_name: "TestPanel".into(),
        model_number: "TP-1".into(),
        capabilities: capabilities.iter().map(|s| s.to_string()).collect(),
        pairing_type: Default::default(),
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("castlink=debug")
        .with_test_writer()
        .try_init();
}
