// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Nest binary sensors.
//!
//! A [`BinarySensor`] normalizes one attribute of a Nest device or structure to an on/off state.
//! Sensors are created with [`discover`] and polled by calling [`BinarySensor::update`].

use crate::client::{ActivityZone, DeviceRef, StructureRef};
use crate::errors::ServiceError;
use log::debug;

mod conditions;
mod diagnostics;
mod discovery;
mod entity;
mod types;

pub use conditions::MonitoredConditions;
pub use diagnostics::{Diagnostic, DiagnosticSink, LogSink};
pub use discovery::{discover, discover_from_api};
pub use types::{
    AttributeReader, BinarySensorType, DEPRECATED_BINARY_SENSOR_TYPES, DeviceClass, SensorGroup,
    is_deprecated,
};

/// What a binary sensor is bound to.
#[derive(Clone)]
pub enum SensorKind {
    /// A device or structure attribute.
    Attribute {
        sensor_type: BinarySensorType,
        reader: AttributeReader,
    },
    /// Ongoing motion in a camera activity zone.
    ActivityZone(ActivityZone),
}

pub struct BinarySensor {
    structure: StructureRef,
    /// `None` for structure sensors.
    device: Option<DeviceRef>,
    kind: SensorKind,
    name: String,
    unique_id: String,
    state: Option<bool>,
}

impl BinarySensor {
    /// Create a structure level sensor, e.g. `away`.
    pub fn for_structure(structure: StructureRef, sensor_type: BinarySensorType) -> Self {
        let name = format!("{} {}", structure.name(), sensor_type.label());
        let unique_id = format!("{}-{}", structure.structure_id(), sensor_type);
        Self {
            structure,
            device: None,
            kind: SensorKind::Attribute {
                sensor_type,
                reader: sensor_type.reader(),
            },
            name,
            unique_id,
            state: None,
        }
    }

    /// Create a device attribute sensor.
    pub fn for_device(
        structure: StructureRef,
        device: DeviceRef,
        sensor_type: BinarySensorType,
    ) -> Self {
        let name = format!("{} {}", device.name(), sensor_type.label());
        let unique_id = format!("{}-{}", device.device_id(), sensor_type);
        Self {
            structure,
            device: Some(device),
            kind: SensorKind::Attribute {
                sensor_type,
                reader: sensor_type.reader(),
            },
            name,
            unique_id,
            state: None,
        }
    }

    /// Create a motion sensor for a camera activity zone.
    pub fn for_activity_zone(
        structure: StructureRef,
        device: DeviceRef,
        zone: ActivityZone,
    ) -> Self {
        let name = format!("{} {} activity", device.name(), zone.name);
        let unique_id = format!("{}-zone-{}", device.device_id(), zone.zone_id);
        Self {
            structure,
            device: Some(device),
            kind: SensorKind::ActivityZone(zone),
            name,
            unique_id,
            state: None,
        }
    }

    /// Retrieve the latest state from the bound device or structure.
    ///
    /// Read errors are returned as is and leave the last known state untouched.
    pub fn update(&mut self) -> Result<(), ServiceError> {
        let state = match &self.kind {
            SensorKind::Attribute {
                sensor_type,
                reader,
            } => {
                let value = match reader {
                    AttributeReader::Structure(read) => read(self.structure.as_ref())?,
                    AttributeReader::Device(read) => read(self.bound_device()?.as_ref())?,
                };
                sensor_type.to_state(&value)
            }
            SensorKind::ActivityZone(zone) => self
                .bound_device()?
                .has_ongoing_motion_in_zone(zone.zone_id)?,
        };

        if self.state != Some(state) {
            debug!("[{}] state: {:?} -> {}", self.unique_id, self.state, state);
        }
        self.state = Some(state);
        Ok(())
    }

    fn bound_device(&self) -> Result<&DeviceRef, ServiceError> {
        self.device.as_ref().ok_or_else(|| {
            ServiceError::InternalServerError(format!("{}: sensor without device", self.unique_id))
        })
    }

    /// Current state. Off until the first successful update.
    pub fn is_on(&self) -> bool {
        self.state.unwrap_or_default()
    }

    /// Current state, `None` until the first successful update.
    pub fn state(&self) -> Option<bool> {
        self.state
    }

    pub fn device_class(&self) -> Option<DeviceClass> {
        match &self.kind {
            SensorKind::Attribute { sensor_type, .. } => sensor_type.device_class(),
            SensorKind::ActivityZone(_) => Some(DeviceClass::Motion),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Bound attribute. `None` for activity zone sensors.
    pub fn sensor_type(&self) -> Option<BinarySensorType> {
        match &self.kind {
            SensorKind::Attribute { sensor_type, .. } => Some(*sensor_type),
            SensorKind::ActivityZone(_) => None,
        }
    }

    pub fn zone(&self) -> Option<&ActivityZone> {
        match &self.kind {
            SensorKind::ActivityZone(zone) => Some(zone),
            SensorKind::Attribute { .. } => None,
        }
    }
}

impl std::fmt::Debug for BinarySensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinarySensor")
            .field("unique_id", &self.unique_id)
            .field("name", &self.name)
            .field("state", &self.state)
            .finish()
    }
}
