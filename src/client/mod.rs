// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Nest device client interface.
//!
//! The binary sensors don't talk to the Nest cloud themselves. They read already fetched data
//! through the traits defined here. [`SnapshotClient`] implements them on top of a Nest REST API
//! data document.

use crate::errors::ServiceError;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

mod model;
mod snapshot;

pub use snapshot::{Clock, SnapshotClient};

/// Shared handle of a structure owned by the device client.
pub type StructureRef = Arc<dyn NestStructure>;
/// Shared handle of a device owned by the device client.
pub type DeviceRef = Arc<dyn NestDevice>;

/// Raw attribute value as delivered by the device client.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Boolean coercion of the raw value.
    ///
    /// Null, `false`, zero and an empty string are false, everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            AttributeValue::Null => false,
            AttributeValue::Bool(v) => *v,
            AttributeValue::Number(v) => *v != 0.0,
            AttributeValue::Text(v) => !v.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Number(value as f64)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.into())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttributeValue::Null)
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Null => write!(f, "null"),
            AttributeValue::Bool(v) => write!(f, "{v}"),
            AttributeValue::Number(v) => write!(f, "{v}"),
            AttributeValue::Text(v) => write!(f, "{v}"),
        }
    }
}

/// Camera defined region for zone-scoped motion detection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityZone {
    pub zone_id: u64,
    pub name: String,
}

impl ActivityZone {
    pub fn new(zone_id: u64, name: impl Into<String>) -> Self {
        Self {
            zone_id,
            name: name.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DeviceKind {
    Thermostat,
    SmokeCoAlarm,
    Camera,
}

fn unsupported(device_id: &str, attribute: &str) -> ServiceError {
    ServiceError::NotFound(format!("{device_id} has no attribute {attribute}"))
}

/// A top-level grouping of devices, e.g. a home.
pub trait NestStructure: Send + Sync {
    fn structure_id(&self) -> &str;

    fn name(&self) -> &str;

    /// Raw away state, e.g. `home` or `away`.
    fn away(&self) -> Result<AttributeValue, ServiceError>;
}

/// A thermostat, smoke/CO alarm or camera.
///
/// Attribute accessors which don't apply to the device kind return [`ServiceError::NotFound`].
pub trait NestDevice: Send + Sync {
    fn device_id(&self) -> &str;

    /// Long, human readable device name including the location.
    fn name(&self) -> &str;

    fn kind(&self) -> DeviceKind;

    fn is_thermostat(&self) -> bool {
        self.kind() == DeviceKind::Thermostat
    }

    fn is_camera(&self) -> bool {
        self.kind() == DeviceKind::Camera
    }

    fn online(&self) -> Result<AttributeValue, ServiceError>;

    fn fan(&self) -> Result<AttributeValue, ServiceError> {
        Err(unsupported(self.device_id(), "fan"))
    }

    fn is_using_emergency_heat(&self) -> Result<AttributeValue, ServiceError> {
        Err(unsupported(self.device_id(), "is_using_emergency_heat"))
    }

    fn is_locked(&self) -> Result<AttributeValue, ServiceError> {
        Err(unsupported(self.device_id(), "is_locked"))
    }

    fn has_leaf(&self) -> Result<AttributeValue, ServiceError> {
        Err(unsupported(self.device_id(), "has_leaf"))
    }

    fn motion_detected(&self) -> Result<AttributeValue, ServiceError> {
        Err(unsupported(self.device_id(), "motion_detected"))
    }

    fn sound_detected(&self) -> Result<AttributeValue, ServiceError> {
        Err(unsupported(self.device_id(), "sound_detected"))
    }

    fn person_detected(&self) -> Result<AttributeValue, ServiceError> {
        Err(unsupported(self.device_id(), "person_detected"))
    }

    /// Activity zones of a camera. Other devices don't have any.
    fn activity_zones(&self) -> Result<Vec<ActivityZone>, ServiceError> {
        Ok(Vec::new())
    }

    fn has_ongoing_motion_in_zone(&self, _zone_id: u64) -> Result<bool, ServiceError> {
        Err(unsupported(self.device_id(), "activity_zones"))
    }
}

/// Device enumeration of an authenticated Nest client.
pub trait NestApi {
    fn structures(&self) -> Result<Vec<StructureRef>, ServiceError>;

    fn thermostats(&self) -> Result<Vec<(StructureRef, DeviceRef)>, ServiceError>;

    fn smoke_co_alarms(&self) -> Result<Vec<(StructureRef, DeviceRef)>, ServiceError>;

    fn cameras(&self) -> Result<Vec<(StructureRef, DeviceRef)>, ServiceError>;

    /// Bring the device data of all handles up to date. Called before every sensor poll.
    fn refresh(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}
