// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Nest REST API data structure definitions for JSON deserialization.
//!
//! Only the fields required for the binary sensors are mapped. See
//! <https://developers.nest.com/reference/api-overview> for the full data model.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NestData {
    #[serde(default)]
    pub devices: Devices,
    #[serde(default)]
    pub structures: BTreeMap<String, StructureData>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Devices {
    #[serde(default)]
    pub thermostats: BTreeMap<String, ThermostatData>,
    #[serde(default)]
    pub smoke_co_alarms: BTreeMap<String, SmokeCoAlarmData>,
    #[serde(default)]
    pub cameras: BTreeMap<String, CameraData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StructureData {
    pub structure_id: String,
    pub name: String,
    pub away: Option<String>,
}

/// Fields shared by all device types.
#[derive(Debug, Deserialize)]
pub(crate) struct DeviceData {
    pub device_id: String,
    pub structure_id: String,
    pub name: Option<String>,
    pub name_long: Option<String>,
    pub is_online: Option<bool>,
}

impl DeviceData {
    pub fn display_name(&self) -> &str {
        self.name_long
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(&self.device_id)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ThermostatData {
    #[serde(flatten)]
    pub device: DeviceData,
    pub fan_timer_active: Option<bool>,
    pub is_using_emergency_heat: Option<bool>,
    pub is_locked: Option<bool>,
    pub has_leaf: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SmokeCoAlarmData {
    #[serde(flatten)]
    pub device: DeviceData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CameraData {
    #[serde(flatten)]
    pub device: DeviceData,
    #[serde(default)]
    pub activity_zones: Vec<ActivityZoneData>,
    pub last_event: Option<CameraEvent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActivityZoneData {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CameraEvent {
    #[serde(default)]
    pub has_motion: bool,
    #[serde(default)]
    pub has_sound: bool,
    #[serde(default)]
    pub has_person: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub activity_zone_ids: Vec<u64>,
}

impl CameraEvent {
    /// Checks if the event is still in progress at the given time.
    ///
    /// An event without end time is ongoing. Nest updates the start time of an existing event when
    /// new activity is detected, so a start time after the end time is ongoing as well.
    pub fn is_ongoing(&self, now: DateTime<Utc>) -> bool {
        match (self.start_time, self.end_time) {
            (_, None) => true,
            (Some(start), Some(end)) if start > end => true,
            (_, Some(end)) => end > now,
        }
    }
}
