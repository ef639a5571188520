// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Supported binary sensor attributes and their device classes.

use crate::client::{AttributeValue, NestDevice, NestStructure};
use crate::errors::ServiceError;

/// Monitored attribute names which are no longer supported.
pub const DEPRECATED_BINARY_SENSOR_TYPES: [&str; 8] = [
    "hvac_ac_state",
    "hvac_aux_heater_state",
    "hvac_heater_state",
    "hvac_heat_x2_state",
    "hvac_heat_x3_state",
    "hvac_alt_heat_state",
    "hvac_alt_heat_x2_state",
    "hvac_emer_heat_state",
];

/// Device kind a binary sensor attribute applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorGroup {
    /// Applies to all devices.
    Connectivity,
    /// Thermostats only.
    Climate,
    /// Cameras only.
    Camera,
    /// Structure level sensors.
    Structure,
}

/// Semantic category of a binary sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DeviceClass {
    Connectivity,
    Heat,
    Motion,
    Sound,
    Occupancy,
}

impl DeviceClass {
    /// Display label shown in the UI.
    pub fn label(&self) -> &'static str {
        match self {
            DeviceClass::Connectivity => "Connectivity",
            DeviceClass::Heat => "Heat",
            DeviceClass::Motion => "Motion",
            DeviceClass::Sound => "Sound",
            DeviceClass::Occupancy => "Occupancy",
        }
    }
}

/// All supported binary sensor attributes.
///
/// The string representation is the monitored condition name used in the configuration.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
    strum_macros::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum BinarySensorType {
    // connectivity
    Online,
    // climate
    Fan,
    IsUsingEmergencyHeat,
    IsLocked,
    HasLeaf,
    // camera
    MotionDetected,
    SoundDetected,
    PersonDetected,
    // structure
    Away,
}

/// Typed attribute accessor, resolved once when a sensor is created.
#[derive(Clone, Copy)]
pub enum AttributeReader {
    Structure(fn(&dyn NestStructure) -> Result<AttributeValue, ServiceError>),
    Device(fn(&dyn NestDevice) -> Result<AttributeValue, ServiceError>),
}

impl BinarySensorType {
    pub fn group(&self) -> SensorGroup {
        match self {
            BinarySensorType::Online => SensorGroup::Connectivity,
            BinarySensorType::Fan
            | BinarySensorType::IsUsingEmergencyHeat
            | BinarySensorType::IsLocked
            | BinarySensorType::HasLeaf => SensorGroup::Climate,
            BinarySensorType::MotionDetected
            | BinarySensorType::SoundDetected
            | BinarySensorType::PersonDetected => SensorGroup::Camera,
            BinarySensorType::Away => SensorGroup::Structure,
        }
    }

    pub fn device_class(&self) -> Option<DeviceClass> {
        match self {
            BinarySensorType::Online => Some(DeviceClass::Connectivity),
            BinarySensorType::IsUsingEmergencyHeat => Some(DeviceClass::Heat),
            BinarySensorType::MotionDetected => Some(DeviceClass::Motion),
            BinarySensorType::SoundDetected => Some(DeviceClass::Sound),
            BinarySensorType::PersonDetected => Some(DeviceClass::Occupancy),
            BinarySensorType::Fan
            | BinarySensorType::IsLocked
            | BinarySensorType::HasLeaf
            | BinarySensorType::Away => None,
        }
    }

    /// Raw value to state mapping for attributes which aren't boolean-like.
    pub fn state_map(&self) -> Option<&'static [(&'static str, bool)]> {
        match self {
            BinarySensorType::Away => Some(&[("away", true), ("home", false)]),
            _ => None,
        }
    }

    /// Convert a raw attribute value to the binary sensor state.
    ///
    /// Attributes with a [state map](Self::state_map) are off for every value not in the map,
    /// all other attributes use the truthiness of the raw value.
    pub fn to_state(&self, value: &AttributeValue) -> bool {
        match self.state_map() {
            Some(map) => value
                .as_str()
                .and_then(|v| map.iter().find(|(raw, _)| *raw == v))
                .map(|(_, state)| *state)
                .unwrap_or_default(),
            None => value.is_truthy(),
        }
    }

    /// Human readable attribute name, e.g. `motion detected`.
    pub fn label(&self) -> String {
        self.as_ref().replace('_', " ")
    }

    pub fn reader(&self) -> AttributeReader {
        match self {
            BinarySensorType::Online => AttributeReader::Device(|d| d.online()),
            BinarySensorType::Fan => AttributeReader::Device(|d| d.fan()),
            BinarySensorType::IsUsingEmergencyHeat => {
                AttributeReader::Device(|d| d.is_using_emergency_heat())
            }
            BinarySensorType::IsLocked => AttributeReader::Device(|d| d.is_locked()),
            BinarySensorType::HasLeaf => AttributeReader::Device(|d| d.has_leaf()),
            BinarySensorType::MotionDetected => AttributeReader::Device(|d| d.motion_detected()),
            BinarySensorType::SoundDetected => AttributeReader::Device(|d| d.sound_detected()),
            BinarySensorType::PersonDetected => AttributeReader::Device(|d| d.person_detected()),
            BinarySensorType::Away => AttributeReader::Structure(|s| s.away()),
        }
    }
}

pub fn is_deprecated(name: &str) -> bool {
    DEPRECATED_BINARY_SENSOR_TYPES.contains(&name)
}
