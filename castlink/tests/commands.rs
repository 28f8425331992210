mod common;

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use castlink::{CastLinkError, DeviceEvent, DiscoveryManager, caps};

use common::{MockService, descriptor, init_tracing};

fn ready_device(
    service: &Arc<MockService>,
    capabilities: &[&str],
) -> (DiscoveryManager, castlink::ConnectableDevice) {
    init_tracing();
    let manager = DiscoveryManager::new();
    manager.register_service(service.clone());
    manager.start_discovery(None);
    service.sight(descriptor("tv", "Living Room TV", capabilities));
    let device = manager.device_list().remove(0);
    device.connect();
    assert!(device.is_ready());
    (manager, device)
}

#[test]
fn one_shot_command_delivers_success_then_complete() {
    let service = MockService::new("DLNA");
    let (_manager, device) = ready_device(&service, &[caps::VOLUME_CONTROL]);

    let log = Arc::new(Mutex::new(Vec::new()));
    let command = device.volume_control().volume_up();
    {
        let log = Arc::clone(&log);
        command.success(move |payload| {
            assert_eq!(*payload, Value::Null);
            log.lock().unwrap().push("success");
        });
    }
    {
        let log = Arc::clone(&log);
        command.complete(move |err, _| {
            assert!(err.is_none());
            log.lock().unwrap().push("complete");
        });
    }

    assert!(command.is_completed());
    assert_eq!(*log.lock().unwrap(), vec!["success", "complete"]);
    assert_eq!(service.executed_actions(), vec!["volume.up".to_string()]);
}

#[test]
fn command_arguments_reach_the_transport() {
    let service = MockService::new("DLNA");
    let (_manager, device) = ready_device(&service, &[caps::VOLUME_CONTROL]);

    device.volume_control().set_volume(42);

    let st = service.state.lock().unwrap();
    let (id, action, args) = &st.executed[0];
    assert_eq!(id, "tv");
    assert_eq!(action, "volume.set");
    assert_eq!(*args, json!({ "volume": 42 }));
}

#[test]
fn subscription_delivers_every_update_then_completes_on_teardown() {
    let service = MockService::new("Cast");
    let (_manager, device) = ready_device(&service, &[caps::VOLUME_CONTROL]);

    let volumes = Arc::new(Mutex::new(Vec::new()));
    let completions = Arc::new(Mutex::new(0usize));
    let volume = device.volume_control();

    let subscription = volume.subscribe_volume();
    {
        let volumes = Arc::clone(&volumes);
        subscription.success(move |payload| {
            volumes.lock().unwrap().push(payload["volume"].as_u64());
        });
    }
    {
        let completions = Arc::clone(&completions);
        subscription.complete(move |err, _| {
            assert!(err.is_none());
            *completions.lock().unwrap() += 1;
        });
    }

    service.push_update("tv", "volume", json!({ "volume": 10 }));
    service.push_update("tv", "volume", json!({ "volume": 11 }));
    service.push_update("tv", "volume", json!({ "volume": 12 }));
    assert_eq!(*completions.lock().unwrap(), 0);

    volume.unsubscribe_volume();

    assert_eq!(*volumes.lock().unwrap(), vec![Some(10), Some(11), Some(12)]);
    assert_eq!(*completions.lock().unwrap(), 1);
    assert!(subscription.is_completed());
}

#[test]
fn late_attachment_replays_the_last_delivery() {
    let service = MockService::new("DLNA");
    let (_manager, device) = ready_device(&service, &[caps::KEY_CONTROL]);

    let command = device.key_control().home();
    assert!(command.is_completed());

    let log = Arc::new(Mutex::new(Vec::new()));
    {
        let log = Arc::clone(&log);
        command.success(move |_| log.lock().unwrap().push("success"));
    }
    {
        let log = Arc::clone(&log);
        command.complete(move |_, _| log.lock().unwrap().push("complete"));
    }
    assert_eq!(*log.lock().unwrap(), vec!["success", "complete"]);
}

#[test]
fn missing_capability_settles_the_command_with_an_error() {
    let service = MockService::new("DIAL");
    let (_manager, device) = ready_device(&service, &[caps::KEY_CONTROL]);

    let errors = Arc::new(Mutex::new(Vec::new()));
    let command = device.volume_control().volume_up();
    {
        let errors = Arc::clone(&errors);
        command.error(move |err| errors.lock().unwrap().push(err.clone()));
    }

    assert!(command.is_completed());
    assert_eq!(
        *errors.lock().unwrap(),
        vec![CastLinkError::capability_missing(caps::VOLUME_CONTROL)]
    );
    // Nothing reached the transport.
    assert!(service.executed_actions().is_empty());
}

#[test]
fn capability_loss_on_resighting_gates_later_commands() {
    let service = MockService::new("SSDP");
    let (_manager, device) =
        ready_device(&service, &[caps::VOLUME_CONTROL, caps::KEY_CONTROL]);
    let volume = device.volume_control();
    volume.volume_up();
    assert_eq!(service.executed_actions().len(), 1);

    // The device re-announces without VolumeControl.
    service.sight(descriptor("tv", "Living Room TV", &[caps::KEY_CONTROL]));
    assert!(!device.has_capability(caps::VOLUME_CONTROL));

    let errors = Arc::new(Mutex::new(Vec::new()));
    let command = volume.volume_down();
    {
        let errors = Arc::clone(&errors);
        command.error(move |err| errors.lock().unwrap().push(err.clone()));
    }
    assert_eq!(
        *errors.lock().unwrap(),
        vec![CastLinkError::capability_missing(caps::VOLUME_CONTROL)]
    );
    assert_eq!(service.executed_actions(), vec!["volume.up".to_string()]);
}

#[test]
fn commands_before_connect_settle_with_device_not_ready() {
    init_tracing();
    let service = MockService::new("SSDP");
    let manager = DiscoveryManager::new();
    manager.register_service(service.clone());
    manager.start_discovery(None);
    service.sight(descriptor("tv", "TV", &[caps::VOLUME_CONTROL]));
    let device = manager.device_list().remove(0);
    assert!(!device.is_ready());

    let errors = Arc::new(Mutex::new(Vec::new()));
    let command = device.volume_control().volume_up();
    {
        let errors = Arc::clone(&errors);
        command.error(move |err| errors.lock().unwrap().push(err.clone()));
    }
    assert_eq!(
        *errors.lock().unwrap(),
        vec![CastLinkError::device_not_ready("TV")]
    );
}

#[test]
fn transport_rejection_flows_through_error_then_complete() {
    let service = MockService::new("Cast");
    service.fail_action("media.play");
    let (_manager, device) = ready_device(&service, &[caps::MEDIA_CONTROL]);

    let log = Arc::new(Mutex::new(Vec::new()));
    let command = device.media_control().play();
    {
        let log = Arc::clone(&log);
        command.error(move |err| {
            assert_eq!(
                *err,
                CastLinkError::protocol_with_code("scripted failure", 500)
            );
            log.lock().unwrap().push("error");
        });
    }
    {
        let log = Arc::clone(&log);
        command.complete(move |err, payload| {
            assert!(err.is_some());
            assert!(payload.is_none());
            log.lock().unwrap().push("complete");
        });
    }
    assert_eq!(*log.lock().unwrap(), vec!["error", "complete"]);
}

#[test]
fn connect_and_disconnect_emit_device_events() {
    init_tracing();
    let service = MockService::new("AirPlay");
    let manager = DiscoveryManager::new();
    manager.register_service(service.clone());
    manager.start_discovery(None);
    service.sight(descriptor("tv", "TV", &[caps::VOLUME_CONTROL]));
    let device = manager.device_list().remove(0);

    let log = Arc::new(Mutex::new(Vec::new()));
    for name in ["ready", "disconnect"] {
        let log = Arc::clone(&log);
        device.on(name, move |event: &DeviceEvent| {
            log.lock().unwrap().push(event.name());
        });
    }

    device.connect();
    device.disconnect();
    assert_eq!(*log.lock().unwrap(), vec!["ready", "disconnect"]);
}

#[test]
fn control_handles_are_cached_per_device() {
    let service = MockService::new("DLNA");
    let (_manager, device) = ready_device(&service, &[caps::LAUNCHER]);

    let a = device.launcher();
    let b = device.launcher();
    // Both handles drive the same device; commands from either reach the
    // transport identically.
    a.launch_app("netflix", None);
    b.launch_app("youtube", None);
    assert_eq!(
        service.executed_actions(),
        vec![
            "launcher.launchApp".to_string(),
            "launcher.launchApp".to_string(),
        ]
    );
}
