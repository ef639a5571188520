// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Binary sensor discovery.

use crate::client::{DeviceRef, NestApi, StructureRef};
use crate::errors::ServiceError;
use crate::sensor::conditions::MonitoredConditions;
use crate::sensor::diagnostics::DiagnosticSink;
use crate::sensor::types::SensorGroup;
use crate::sensor::BinarySensor;
use log::{debug, info};

/// Create the binary sensors for the given structures and devices.
///
/// Structure sensors come first, followed by the device sensors in device order. Per device the
/// connectivity sensors come before the climate and camera sensors, each group in the requested
/// order. Climate sensors are only created for thermostats, camera and activity zone sensors only
/// for cameras.
///
/// Deprecated or unknown monitored conditions are reported to `sink` and don't abort discovery.
/// Errors while enumerating activity zones are returned.
pub fn discover(
    structures: &[StructureRef],
    devices: &[(StructureRef, DeviceRef)],
    conditions: &MonitoredConditions,
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<BinarySensor>, ServiceError> {
    let types = conditions.resolve(sink);
    let mut sensors = Vec::new();

    for structure in structures {
        sensors.extend(
            types
                .iter()
                .filter(|t| t.group() == SensorGroup::Structure)
                .map(|t| BinarySensor::for_structure(structure.clone(), *t)),
        );
    }

    for (structure, device) in devices {
        let is_thermostat = device.is_thermostat();
        let is_camera = device.is_camera();
        let groups = [
            (SensorGroup::Connectivity, true),
            (SensorGroup::Climate, is_thermostat),
            (SensorGroup::Camera, is_camera),
        ];
        for (group, _) in groups.iter().filter(|(_, applies)| *applies) {
            sensors.extend(
                types
                    .iter()
                    .filter(|t| t.group() == *group)
                    .map(|t| BinarySensor::for_device(structure.clone(), device.clone(), *t)),
            );
        }

        if is_camera {
            for zone in device.activity_zones()? {
                debug!("[{}] activity zone: {}", device.device_id(), zone.name);
                sensors.push(BinarySensor::for_activity_zone(
                    structure.clone(),
                    device.clone(),
                    zone,
                ));
            }
        }
    }

    Ok(sensors)
}

/// Enumerate structures, thermostats, smoke/CO alarms and cameras of the client and create their
/// binary sensors with [`discover`].
///
/// This may block on the client's I/O and should not run on an event loop thread.
pub fn discover_from_api(
    api: &dyn NestApi,
    conditions: &MonitoredConditions,
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<BinarySensor>, ServiceError> {
    let structures = api.structures()?;
    let mut devices = api.thermostats()?;
    devices.extend(api.smoke_co_alarms()?);
    devices.extend(api.cameras()?);

    let sensors = discover(&structures, &devices, conditions, sink)?;
    info!(
        "Discovered {} binary sensors for {} structures and {} devices",
        sensors.len(),
        structures.len(),
        devices.len()
    );
    Ok(sensors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ActivityZone, DeviceKind, SnapshotClient};
    use crate::sensor::tests::{FakeDevice, FakeStructure};
    use crate::sensor::{BinarySensorType, DEPRECATED_BINARY_SENSOR_TYPES, Diagnostic, DeviceClass};
    use rstest::rstest;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn selected(names: &[&str]) -> MonitoredConditions {
        MonitoredConditions::from_names(Some(names.iter().copied()))
    }

    fn unique_ids(sensors: &[BinarySensor]) -> Vec<&str> {
        sensors.iter().map(|s| s.unique_id()).collect()
    }

    fn device(id: &str, kind: DeviceKind) -> (StructureRef, DeviceRef) {
        (
            FakeStructure::new("home", "home"),
            Arc::new(FakeDevice::new(id, kind)),
        )
    }

    #[rstest]
    #[case(DeviceKind::Thermostat, vec!["dev-online", "dev-fan", "dev-has_leaf"])]
    #[case(DeviceKind::SmokeCoAlarm, vec!["dev-online"])]
    #[case(DeviceKind::Camera, vec!["dev-online", "dev-motion_detected"])]
    fn device_sensors_depend_on_device_kind(
        #[case] kind: DeviceKind,
        #[case] expected: Vec<&str>,
    ) {
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let sensors = discover(
            &[],
            &[device("dev", kind)],
            &selected(&["online", "fan", "has_leaf", "motion_detected", "away"]),
            &mut diagnostics,
        )
        .expect("discovery");
        assert_eq!(expected, unique_ids(&sensors));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn non_thermostat_never_gets_climate_sensors() {
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let sensors = discover(
            &[],
            &[
                device("protect", DeviceKind::SmokeCoAlarm),
                device("cam", DeviceKind::Camera),
            ],
            &selected(&["fan", "is_using_emergency_heat", "is_locked", "has_leaf"]),
            &mut diagnostics,
        )
        .unwrap();
        assert!(sensors.is_empty(), "Got: {sensors:?}");
    }

    #[test]
    fn structure_sensors_come_first() {
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let structures: Vec<StructureRef> = vec![
            FakeStructure::new("home", "away") as StructureRef,
            FakeStructure::new("cabin", "home") as StructureRef,
        ];
        let sensors = discover(
            &structures,
            &[device("t", DeviceKind::Thermostat)],
            &selected(&["online", "away"]),
            &mut diagnostics,
        )
        .unwrap();
        assert_eq!(vec!["home-away", "cabin-away", "t-online"], unique_ids(&sensors));
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(3)]
    fn camera_gets_one_motion_sensor_per_activity_zone(#[case] zones: u64) {
        let camera = FakeDevice::new("cam", DeviceKind::Camera).with_zones(
            (1..=zones)
                .map(|id| ActivityZone::new(id, format!("Zone {id}")))
                .collect(),
        );
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        // no camera attributes requested: zone sensors don't depend on the catalog
        let sensors = discover(
            &[],
            &[(
                FakeStructure::new("home", "home") as StructureRef,
                Arc::new(camera) as DeviceRef,
            )],
            &selected(&["online"]),
            &mut diagnostics,
        )
        .unwrap();

        let zone_sensors: Vec<_> = sensors.iter().filter(|s| s.zone().is_some()).collect();
        assert_eq!(zones as usize, zone_sensors.len());
        assert!(
            zone_sensors
                .iter()
                .all(|s| s.device_class() == Some(DeviceClass::Motion))
        );
        assert_eq!(zones as usize + 1, sensors.len());
    }

    #[test]
    fn zone_sensors_only_for_cameras() {
        let thermostat = FakeDevice::new("t", DeviceKind::Thermostat)
            .with_zones(vec![ActivityZone::new(1, "Bogus")]);
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let sensors = discover(
            &[],
            &[(
                FakeStructure::new("home", "home") as StructureRef,
                Arc::new(thermostat) as DeviceRef,
            )],
            &selected(&["online"]),
            &mut diagnostics,
        )
        .unwrap();
        assert_eq!(vec!["t-online"], unique_ids(&sensors));
    }

    #[test]
    fn deprecated_condition_is_reported_and_others_discovered() {
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let sensors = discover(
            &[FakeStructure::new("home", "away") as StructureRef],
            &[device("t", DeviceKind::Thermostat)],
            &selected(&["hvac_heater_state", "online", "away"]),
            &mut diagnostics,
        )
        .unwrap();
        assert_eq!(vec!["home-away", "t-online"], unique_ids(&sensors));
        assert_eq!(
            vec![Diagnostic::DeprecatedCondition("hvac_heater_state".into())],
            diagnostics
        );
    }

    #[test]
    fn unknown_condition_is_reported_and_others_discovered() {
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let sensors = discover(
            &[FakeStructure::new("home", "away") as StructureRef],
            &[device("t", DeviceKind::Thermostat)],
            &selected(&["online", "battery_health", "away"]),
            &mut diagnostics,
        )
        .unwrap();
        assert_eq!(vec!["home-away", "t-online"], unique_ids(&sensors));
        assert_eq!(
            vec![Diagnostic::UnknownCondition("battery_health".into())],
            diagnostics
        );
    }

    #[test]
    fn every_deprecated_condition_yields_no_sensor() {
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let sensors = discover(
            &[FakeStructure::new("home", "away") as StructureRef],
            &[device("t", DeviceKind::Thermostat)],
            &selected(&DEPRECATED_BINARY_SENSOR_TYPES),
            &mut diagnostics,
        )
        .unwrap();
        assert!(sensors.is_empty());
        assert_eq!(DEPRECATED_BINARY_SENSOR_TYPES.len(), diagnostics.len());
    }

    #[test]
    fn duplicate_conditions_create_one_sensor() {
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let sensors = discover(
            &[],
            &[device("t", DeviceKind::Thermostat)],
            &selected(&["online", "online"]),
            &mut diagnostics,
        )
        .unwrap();
        assert_eq!(vec!["t-online"], unique_ids(&sensors));
    }

    #[rstest]
    #[case(
        DeviceKind::Camera,
        &["motion_detected", "online"],
        vec!["dev-online", "dev-motion_detected"]
    )]
    #[case(
        DeviceKind::Thermostat,
        &["has_leaf", "online", "fan"],
        vec!["dev-online", "dev-has_leaf", "dev-fan"]
    )]
    fn device_sensors_are_grouped_by_catalog(
        #[case] kind: DeviceKind,
        #[case] requested: &[&str],
        #[case] expected: Vec<&str>,
    ) {
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let sensors = discover(
            &[],
            &[device("dev", kind)],
            &selected(requested),
            &mut diagnostics,
        )
        .unwrap();
        assert_eq!(expected, unique_ids(&sensors));
    }

    fn nest_data() -> serde_json::Value {
        json!({
            "devices": {
                "thermostats": {
                    "t-1": {
                        "device_id": "t-1", "structure_id": "s-1",
                        "name_long": "Hallway Thermostat", "is_online": true,
                        "fan_timer_active": false, "is_using_emergency_heat": false,
                        "is_locked": false, "has_leaf": true
                    }
                },
                "smoke_co_alarms": {
                    "p-1": {
                        "device_id": "p-1", "structure_id": "s-1",
                        "name_long": "Kitchen Protect", "is_online": true
                    }
                },
                "cameras": {
                    "c-1": {
                        "device_id": "c-1", "structure_id": "s-1",
                        "name_long": "Porch Camera", "is_online": false,
                        "activity_zones": [{"id": 11, "name": "Steps"}]
                    }
                }
            },
            "structures": {
                "s-1": {"structure_id": "s-1", "name": "Home", "away": "away"}
            }
        })
    }

    #[test]
    fn absent_and_empty_configuration_discover_every_attribute() {
        let client = SnapshotClient::default();
        client.load_json(nest_data()).unwrap();

        for conditions in [
            MonitoredConditions::from_names(None::<Vec<String>>),
            MonitoredConditions::from_names(Some(Vec::<String>::new())),
        ] {
            let mut diagnostics: Vec<Diagnostic> = Vec::new();
            let sensors = discover_from_api(&client, &conditions, &mut diagnostics).unwrap();
            let types: HashSet<BinarySensorType> =
                sensors.iter().filter_map(|s| s.sensor_type()).collect();
            assert_eq!(9, types.len(), "No attribute may be excluded");
            assert_eq!(
                vec![
                    "s-1-away",
                    "t-1-online",
                    "t-1-fan",
                    "t-1-is_using_emergency_heat",
                    "t-1-is_locked",
                    "t-1-has_leaf",
                    "p-1-online",
                    "c-1-online",
                    "c-1-motion_detected",
                    "c-1-sound_detected",
                    "c-1-person_detected",
                    "c-1-zone-11",
                ],
                unique_ids(&sensors)
            );
        }
    }

    #[test]
    fn discovered_sensors_update_from_client() {
        let client = SnapshotClient::default();
        client.load_json(nest_data()).unwrap();
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let mut sensors =
            discover_from_api(&client, &MonitoredConditions::All, &mut diagnostics).unwrap();

        for sensor in sensors.iter_mut() {
            sensor.update().expect("update");
        }
        let on: Vec<&str> = sensors
            .iter()
            .filter(|s| s.is_on())
            .map(|s| s.unique_id())
            .collect();
        assert_eq!(vec!["s-1-away", "t-1-online", "t-1-has_leaf", "p-1-online"], on);
    }
}
