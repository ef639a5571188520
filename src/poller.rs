// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix actor polling the binary sensors.
//!
//! The poller takes the role of the host framework: it runs discovery on a blocking worker
//! thread, refreshes the device client and updates all sensors in a fixed interval and publishes
//! state changes.

use crate::client::NestApi;
use crate::configuration::PollSettings;
use crate::errors::ServiceError;
use crate::sensor::{BinarySensor, LogSink, MonitoredConditions, discover_from_api};
use actix::prelude::Message;
use actix::{Actor, Addr, AsyncContext, Context, Handler, Recipient};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uc_api::intg::{AvailableIntgEntity, EntityChange};

/// Binary sensor state change notification.
#[derive(Message)]
#[rtype(result = "()")]
pub struct SensorStateChanged {
    pub entity_change: EntityChange,
}

/// Retrieve all binary sensors as integration API entities.
#[derive(Message)]
#[rtype(result = "Vec<AvailableIntgEntity>")]
pub struct GetAvailableEntities;

/// Update all binary sensors immediately, without waiting for the next poll interval.
#[derive(Message)]
#[rtype(result = "()")]
pub struct PollSensors;

/// Shared device client of the poller.
pub type NestApiRef = Arc<dyn NestApi + Send + Sync>;

pub struct SensorPoller {
    api: NestApiRef,
    sensors: Vec<BinarySensor>,
    /// Last published state per sensor unique id.
    published: HashMap<String, Option<bool>>,
    interval: Duration,
    recipient: Recipient<SensorStateChanged>,
}

impl SensorPoller {
    pub fn new(
        api: NestApiRef,
        sensors: Vec<BinarySensor>,
        settings: PollSettings,
        recipient: Recipient<SensorStateChanged>,
    ) -> Self {
        Self {
            api,
            published: HashMap::with_capacity(sensors.len()),
            sensors,
            interval: settings.interval,
            recipient,
        }
    }

    /// Discover the binary sensors of the device client and start polling them.
    ///
    /// Discovery is executed on a blocking worker thread.
    pub async fn start_with_discovery(
        api: NestApiRef,
        conditions: MonitoredConditions,
        settings: PollSettings,
        recipient: Recipient<SensorStateChanged>,
    ) -> Result<Addr<Self>, ServiceError> {
        let discovery_api = api.clone();
        let sensors = tokio::task::spawn_blocking(move || {
            discover_from_api(discovery_api.as_ref(), &conditions, &mut LogSink)
        })
        .await
        .map_err(|e| ServiceError::InternalServerError(format!("Discovery task failed: {e}")))??;

        Ok(SensorPoller::new(api, sensors, settings, recipient).start())
    }

    /// Refresh the device client, update all sensors and return the entity changes of sensors
    /// with a new state.
    ///
    /// A failed refresh or update is logged and retried in the next poll. Sensors are updated
    /// from the previous data if the refresh fails.
    fn poll(&mut self) -> Vec<EntityChange> {
        if let Err(e) = self.api.refresh() {
            warn!("Error refreshing Nest data: {e}");
        }

        let mut changes = Vec::new();
        for sensor in self.sensors.iter_mut() {
            if let Err(e) = sensor.update() {
                warn!("[{}] Error updating binary sensor: {e}", sensor.unique_id());
                continue;
            }
            let state = sensor.state();
            if self.published.get(sensor.unique_id()) != Some(&state) {
                self.published.insert(sensor.unique_id().to_string(), state);
                changes.push(sensor.to_entity_change());
            }
        }
        changes
    }

    fn poll_and_publish(&mut self) {
        let changes = self.poll();
        debug!("Polled {} binary sensors, {} changed", self.sensors.len(), changes.len());
        for entity_change in changes {
            if let Err(e) = self.recipient.try_send(SensorStateChanged { entity_change }) {
                warn!("Error publishing binary sensor change: {e:?}");
            }
        }
    }
}

impl Actor for SensorPoller {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(
            "Polling {} binary sensors. Poll interval={:?}",
            self.sensors.len(),
            self.interval
        );
        self.poll_and_publish();
        ctx.run_interval(self.interval, |act, _ctx| act.poll_and_publish());
    }
}

impl Handler<GetAvailableEntities> for SensorPoller {
    type Result = Vec<AvailableIntgEntity>;

    fn handle(&mut self, _: GetAvailableEntities, _ctx: &mut Self::Context) -> Self::Result {
        self.sensors
            .iter()
            .map(BinarySensor::to_available_entity)
            .collect()
    }
}

impl Handler<PollSensors> for SensorPoller {
    type Result = ();

    fn handle(&mut self, _: PollSensors, _ctx: &mut Self::Context) -> Self::Result {
        self.poll_and_publish();
    }
}
