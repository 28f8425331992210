//! Canonical device registry owned by the discovery manager.
//!
//! Entries are created on first sighting, folded in place on re-sighting and
//! removed only on an explicit loss event. Insertion order is preserved so
//! `list()` snapshots are stable for UI consumption.

use std::collections::HashMap;
use std::sync::Arc;

use crate::device::ConnectableDevice;
use crate::model::{DeviceDescriptor, DeviceId};
use crate::service::DeviceService;

#[derive(Default)]
pub struct DeviceRegistry {
    devices: HashMap<DeviceId, ConnectableDevice>,
    order: Vec<DeviceId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistryOutcome {
    Added,
    /// Something observable changed; `capabilities_changed` is set when the
    /// capability set itself did.
    Updated { capabilities_changed: bool },
    Unchanged,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &DeviceId) -> bool {
        self.devices.contains_key(id)
    }

    pub fn get(&self, id: &DeviceId) -> Option<ConnectableDevice> {
        self.devices.get(id).cloned()
    }

    /// Snapshot of registry values in insertion order.
    pub fn list(&self) -> Vec<ConnectableDevice> {
        self.order
            .iter()
            .filter_map(|id| self.devices.get(id).cloned())
            .collect()
    }

    /// Create or fold in a sighting. Existing entries keep their position.
    pub fn upsert(
        &mut self,
        descriptor: &DeviceDescriptor,
        service: &Arc<dyn DeviceService>,
    ) -> (ConnectableDevice, RegistryOutcome) {
        if let Some(existing) = self.devices.get(&descriptor.id) {
            let device = existing.clone();
            let (changed, capabilities_changed) = device.apply_descriptor(descriptor, service);
            let outcome = if changed {
                RegistryOutcome::Updated {
                    capabilities_changed,
                }
            } else {
                RegistryOutcome::Unchanged
            };
            (device, outcome)
        } else {
            let device = ConnectableDevice::new(descriptor, Arc::clone(service));
            self.devices.insert(descriptor.id.clone(), device.clone());
            self.order.push(descriptor.id.clone());
            (device, RegistryOutcome::Added)
        }
    }

    pub fn remove(&mut self, id: &DeviceId) -> Option<ConnectableDevice> {
        let device = self.devices.remove(id)?;
        self.order.retain(|d| d != id);
        Some(device)
    }
}
