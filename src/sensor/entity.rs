// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Conversion of binary sensors to Unfolded Circle integration API entities.
//!
//! The integration API doesn't have a binary sensor entity. Binary sensors are exposed as custom
//! sensors with a boolean value, a textual `ON` / `OFF` state and the device class as label.

use crate::sensor::BinarySensor;
use serde_json::{Map, Value};
use std::collections::HashMap;
use uc_api::intg::{AvailableIntgEntity, EntityChange};
use uc_api::{EntityType, SensorOptionField};

impl BinarySensor {
    /// Entity attributes of the current state.
    pub fn entity_attributes(&self) -> Map<String, Value> {
        let mut attributes = serde_json::Map::with_capacity(3);
        let state = match self.state() {
            Some(true) => "ON",
            Some(false) => "OFF",
            None => "UNKNOWN",
        };

        attributes.insert("value".into(), self.is_on().into());
        attributes.insert("state".into(), state.into());
        attributes.insert("unit".into(), "boolean".into());
        attributes
    }

    pub fn to_available_entity(&self) -> AvailableIntgEntity {
        let name = HashMap::from([("en".into(), self.name().into())]);

        let mut options = serde_json::Map::new();
        if let Some(class) = self.device_class() {
            options.insert(
                SensorOptionField::CustomLabel.to_string(),
                class.label().into(),
            );
        }

        AvailableIntgEntity {
            entity_id: self.unique_id().into(),
            device_id: None, // prepared for device_id handling
            entity_type: EntityType::Sensor,
            device_class: Some("custom".into()),
            name,
            features: None,
            area: None,
            options: if options.is_empty() {
                None
            } else {
                Some(options)
            },
            attributes: Some(self.entity_attributes()),
        }
    }

    pub fn to_entity_change(&self) -> EntityChange {
        EntityChange {
            device_id: None,
            entity_type: EntityType::Sensor,
            entity_id: self.unique_id().into(),
            attributes: self.entity_attributes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ActivityZone, DeviceKind};
    use crate::sensor::BinarySensorType;
    use crate::sensor::tests::{FakeDevice, FakeStructure};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn unknown_state_before_first_update() {
        let sensor =
            BinarySensor::for_structure(FakeStructure::new("home", "away"), BinarySensorType::Away);
        let attributes = sensor.entity_attributes();
        assert_eq!(Some(&json!("UNKNOWN")), attributes.get("state"));
        assert_eq!(Some(&json!(false)), attributes.get("value"));
        assert_eq!(Some(&json!("boolean")), attributes.get("unit"));
    }

    #[test]
    fn entity_change_reflects_state() {
        let mut sensor =
            BinarySensor::for_structure(FakeStructure::new("home", "away"), BinarySensorType::Away);
        sensor.update().unwrap();

        let change = sensor.to_entity_change();
        assert_eq!("home-away", change.entity_id);
        assert!(matches!(change.entity_type, EntityType::Sensor));
        assert_eq!(Some(&json!("ON")), change.attributes.get("state"));
        assert_eq!(Some(&json!(true)), change.attributes.get("value"));
    }

    #[test]
    fn available_entity_uses_device_class_as_label() {
        let camera = Arc::new(FakeDevice::new("cam", DeviceKind::Camera));
        let sensor = BinarySensor::for_activity_zone(
            FakeStructure::new("home", "home"),
            camera,
            ActivityZone::new(2, "Porch"),
        );

        let entity = sensor.to_available_entity();
        assert_eq!("cam-zone-2", entity.entity_id);
        assert_eq!(Some("custom".to_string()), entity.device_class);
        assert_eq!(Some(&"cam Porch activity".to_string()), entity.name.get("en"));
        let options = entity.options.expect("options with custom label");
        assert_eq!(
            Some(&json!("Motion")),
            options.get(&SensorOptionField::CustomLabel.to_string())
        );
    }

    #[test]
    fn available_entity_without_device_class_has_no_options() {
        let sensor =
            BinarySensor::for_structure(FakeStructure::new("home", "away"), BinarySensorType::Away);
        assert!(sensor.to_available_entity().options.is_none());
    }
}
