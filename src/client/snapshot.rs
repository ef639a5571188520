// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Nest device client serving data from a Nest REST API document.

use crate::client::model::{CameraData, CameraEvent, DeviceData, NestData, ThermostatData};
use crate::client::{
    ActivityZone, AttributeValue, DeviceKind, DeviceRef, NestApi, NestDevice, NestStructure,
    StructureRef, unsupported,
};
use crate::errors::ServiceError;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard};

/// Time source for camera event evaluation.
pub type Clock = fn() -> DateTime<Utc>;

/// Nest data shared between the client and all handles it created.
type SharedData = Arc<RwLock<NestData>>;

/// [`NestApi`] implementation on top of a Nest REST API data document.
///
/// The document has the same layout as the response of the Nest cloud root endpoint. Handles
/// returned by the enumeration functions read from the data of the client, so a
/// [`reload`](SnapshotClient::reload) is visible to all of them. Devices and structures removed
/// from the document report [`ServiceError::NotFound`].
pub struct SnapshotClient {
    source: Option<PathBuf>,
    clock: Clock,
    data: SharedData,
}

impl Default for SnapshotClient {
    fn default() -> Self {
        Self {
            source: None,
            clock: Utc::now,
            data: Arc::new(RwLock::new(NestData::default())),
        }
    }
}

impl SnapshotClient {
    /// Create a new client and load the given Nest data file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let mut client = Self::default();
        client.load_file(path)?;
        Ok(client)
    }

    /// Set the time source used to decide if a camera event is still ongoing.
    ///
    /// Only affects handles created afterwards.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Load a Nest data file, replacing all previously loaded data.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), ServiceError> {
        let path = path.as_ref();
        info!("Loading Nest data from {}", path.display());
        self.set_data(read_file(path)?)?;
        self.source = Some(path.to_path_buf());
        Ok(())
    }

    /// Load Nest data from a json value, replacing all previously loaded data.
    pub fn load_json(&self, value: serde_json::Value) -> Result<(), ServiceError> {
        self.set_data(serde_json::from_value(value)?)
    }

    /// Re-read the data file given in [`SnapshotClient::load_file`].
    pub fn reload(&self) -> Result<(), ServiceError> {
        match &self.source {
            Some(path) => {
                debug!("Reloading Nest data from {}", path.display());
                self.set_data(read_file(path)?)
            }
            None => Err(ServiceError::BadRequest(
                "Snapshot client was not loaded from a file".into(),
            )),
        }
    }

    fn set_data(&self, data: NestData) -> Result<(), ServiceError> {
        debug!(
            "Loaded {} structures, {} thermostats, {} smoke/CO alarms, {} cameras",
            data.structures.len(),
            data.devices.thermostats.len(),
            data.devices.smoke_co_alarms.len(),
            data.devices.cameras.len()
        );
        let mut guard = self
            .data
            .write()
            .map_err(|_| ServiceError::InternalServerError("Nest data lock poisoned".into()))?;
        *guard = data;
        Ok(())
    }

    /// Structure handles by structure id.
    fn structure_refs(&self, data: &NestData) -> BTreeMap<String, StructureRef> {
        data.structures
            .iter()
            .map(|(key, s)| {
                let structure = SnapshotStructure {
                    key: key.clone(),
                    structure_id: s.structure_id.clone(),
                    name: s.name.clone(),
                    data: self.data.clone(),
                };
                (s.structure_id.clone(), Arc::new(structure) as StructureRef)
            })
            .collect()
    }

    fn device_refs<T>(
        &self,
        kind: DeviceKind,
        devices: impl Fn(&NestData) -> &BTreeMap<String, T>,
        device: impl Fn(&T) -> &DeviceData,
    ) -> Result<Vec<(StructureRef, DeviceRef)>, ServiceError> {
        let data = read(&self.data)?;
        let structures = self.structure_refs(&data);

        Ok(devices(&data)
            .iter()
            .filter_map(|(key, d)| {
                let d = device(d);
                match structures.get(&d.structure_id) {
                    Some(s) => Some((s.clone(), self.device_ref(kind, key, d))),
                    None => {
                        warn!("Ignoring device {key}: unknown structure {}", d.structure_id);
                        None
                    }
                }
            })
            .collect())
    }

    fn device_ref(&self, kind: DeviceKind, key: &str, device: &DeviceData) -> DeviceRef {
        Arc::new(SnapshotDevice {
            kind,
            key: key.to_string(),
            device_id: device.device_id.clone(),
            name: device.display_name().to_string(),
            clock: self.clock,
            data: self.data.clone(),
        })
    }
}

fn read_file(path: &Path) -> Result<NestData, ServiceError> {
    let content = fs::read_to_string(path).map_err(|e| {
        ServiceError::ServiceUnavailable(format!("Error reading {}: {e}", path.display()))
    })?;
    Ok(serde_json::from_str(&content)?)
}

fn read(data: &SharedData) -> Result<RwLockReadGuard<'_, NestData>, ServiceError> {
    data.read()
        .map_err(|_| ServiceError::InternalServerError("Nest data lock poisoned".into()))
}

fn removed(id: &str) -> ServiceError {
    ServiceError::NotFound(format!("{id} is no longer available"))
}

impl NestApi for SnapshotClient {
    fn structures(&self) -> Result<Vec<StructureRef>, ServiceError> {
        let data = read(&self.data)?;
        Ok(self.structure_refs(&data).into_values().collect())
    }

    fn thermostats(&self) -> Result<Vec<(StructureRef, DeviceRef)>, ServiceError> {
        self.device_refs(
            DeviceKind::Thermostat,
            |data| &data.devices.thermostats,
            |t| &t.device,
        )
    }

    fn smoke_co_alarms(&self) -> Result<Vec<(StructureRef, DeviceRef)>, ServiceError> {
        self.device_refs(
            DeviceKind::SmokeCoAlarm,
            |data| &data.devices.smoke_co_alarms,
            |p| &p.device,
        )
    }

    fn cameras(&self) -> Result<Vec<(StructureRef, DeviceRef)>, ServiceError> {
        self.device_refs(DeviceKind::Camera, |data| &data.devices.cameras, |c| &c.device)
    }

    fn refresh(&self) -> Result<(), ServiceError> {
        match self.source {
            Some(_) => self.reload(),
            None => Ok(()),
        }
    }
}

fn required<T: Into<AttributeValue>>(
    value: Option<T>,
    id: &str,
    field: &str,
) -> Result<AttributeValue, ServiceError> {
    value
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound(format!("{id}: missing field {field}")))
}

struct SnapshotStructure {
    /// Key in the structures map of the document.
    key: String,
    structure_id: String,
    name: String,
    data: SharedData,
}

impl NestStructure for SnapshotStructure {
    fn structure_id(&self) -> &str {
        &self.structure_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn away(&self) -> Result<AttributeValue, ServiceError> {
        let data = read(&self.data)?;
        let structure = data
            .structures
            .get(&self.key)
            .ok_or_else(|| removed(&self.structure_id))?;
        required(structure.away.clone(), &self.structure_id, "away")
    }
}

/// Thermostat, smoke/CO alarm or camera of the document.
///
/// Identity and name are fixed when the handle is created, attributes are read from the current
/// data.
struct SnapshotDevice {
    kind: DeviceKind,
    /// Key in the device map of the document.
    key: String,
    device_id: String,
    name: String,
    clock: Clock,
    data: SharedData,
}

impl SnapshotDevice {
    fn device<R>(&self, f: impl FnOnce(&DeviceData) -> R) -> Result<R, ServiceError> {
        let data = read(&self.data)?;
        let devices = &data.devices;
        let device = match self.kind {
            DeviceKind::Thermostat => devices.thermostats.get(&self.key).map(|t| &t.device),
            DeviceKind::SmokeCoAlarm => devices.smoke_co_alarms.get(&self.key).map(|p| &p.device),
            DeviceKind::Camera => devices.cameras.get(&self.key).map(|c| &c.device),
        };
        device.map(f).ok_or_else(|| removed(&self.device_id))
    }

    fn thermostat<R>(
        &self,
        attribute: &str,
        f: impl FnOnce(&ThermostatData) -> R,
    ) -> Result<R, ServiceError> {
        if self.kind != DeviceKind::Thermostat {
            return Err(unsupported(&self.device_id, attribute));
        }
        let data = read(&self.data)?;
        let thermostat = data.devices.thermostats.get(&self.key);
        thermostat.map(f).ok_or_else(|| removed(&self.device_id))
    }

    fn camera<R>(
        &self,
        attribute: &str,
        f: impl FnOnce(&CameraData) -> R,
    ) -> Result<R, ServiceError> {
        if self.kind != DeviceKind::Camera {
            return Err(unsupported(&self.device_id, attribute));
        }
        let data = read(&self.data)?;
        let camera = data.devices.cameras.get(&self.key);
        camera.map(f).ok_or_else(|| removed(&self.device_id))
    }

    fn thermostat_flag(
        &self,
        attribute: &str,
        field: fn(&ThermostatData) -> Option<bool>,
    ) -> Result<AttributeValue, ServiceError> {
        required(self.thermostat(attribute, field)?, &self.device_id, attribute)
    }

    /// Evaluate a flag of the last camera event. Only an ongoing event counts.
    fn ongoing_event_flag(
        &self,
        attribute: &str,
        flag: fn(&CameraEvent) -> bool,
    ) -> Result<AttributeValue, ServiceError> {
        let now = (self.clock)();
        let value = self.camera(attribute, |c| {
            c.last_event
                .as_ref()
                .is_some_and(|e| e.is_ongoing(now) && flag(e))
        })?;
        Ok(value.into())
    }
}

impl NestDevice for SnapshotDevice {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DeviceKind {
        self.kind
    }

    fn online(&self) -> Result<AttributeValue, ServiceError> {
        required(self.device(|d| d.is_online)?, &self.device_id, "is_online")
    }

    fn fan(&self) -> Result<AttributeValue, ServiceError> {
        required(
            self.thermostat("fan", |t| t.fan_timer_active)?,
            &self.device_id,
            "fan_timer_active",
        )
    }

    fn is_using_emergency_heat(&self) -> Result<AttributeValue, ServiceError> {
        self.thermostat_flag("is_using_emergency_heat", |t| t.is_using_emergency_heat)
    }

    fn is_locked(&self) -> Result<AttributeValue, ServiceError> {
        self.thermostat_flag("is_locked", |t| t.is_locked)
    }

    fn has_leaf(&self) -> Result<AttributeValue, ServiceError> {
        self.thermostat_flag("has_leaf", |t| t.has_leaf)
    }

    fn motion_detected(&self) -> Result<AttributeValue, ServiceError> {
        self.ongoing_event_flag("motion_detected", |e| e.has_motion)
    }

    fn sound_detected(&self) -> Result<AttributeValue, ServiceError> {
        self.ongoing_event_flag("sound_detected", |e| e.has_sound)
    }

    fn person_detected(&self) -> Result<AttributeValue, ServiceError> {
        self.ongoing_event_flag("person_detected", |e| e.has_person)
    }

    fn activity_zones(&self) -> Result<Vec<ActivityZone>, ServiceError> {
        if self.kind != DeviceKind::Camera {
            return Ok(Vec::new());
        }
        self.camera("activity_zones", |c| {
            c.activity_zones
                .iter()
                .map(|z| ActivityZone::new(z.id, z.name.clone()))
                .collect()
        })
    }

    fn has_ongoing_motion_in_zone(&self, zone_id: u64) -> Result<bool, ServiceError> {
        let now = (self.clock)();
        self.camera("activity_zones", |c| {
            if !c.activity_zones.iter().any(|z| z.id == zone_id) {
                return Err(ServiceError::NotFound(format!(
                    "{}: unknown activity zone {zone_id}",
                    self.device_id
                )));
            }
            Ok(c.last_event.as_ref().is_some_and(|e| {
                e.is_ongoing(now) && e.has_motion && e.activity_zone_ids.contains(&zone_id)
            }))
        })?
    }
}
