// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

#![forbid(non_ascii_idents)]
#![deny(unsafe_code)]

use std::path::Path;
use std::sync::Arc;

use actix::{Actor, Context, Handler};
use clap::{Command, arg};
use log::{error, info};
use nest_binary_sensors::client::SnapshotClient;
use nest_binary_sensors::configuration::{DEF_CONFIG_FILE, get_configuration};
use nest_binary_sensors::poller::{SensorPoller, SensorStateChanged};
use nest_binary_sensors::sensor::{LogSink, discover_from_api};
use nest_binary_sensors::{API_VERSION, APP_VERSION, built_info};

/// Prints binary sensor changes as json lines to stdout.
struct StdoutPublisher;

impl Actor for StdoutPublisher {
    type Context = Context<Self>;
}

impl Handler<SensorStateChanged> for StdoutPublisher {
    type Result = ();

    fn handle(&mut self, msg: SensorStateChanged, _ctx: &mut Self::Context) -> Self::Result {
        match serde_json::to_string(&msg.entity_change) {
            Ok(json) => println!("{json}"),
            Err(e) => error!("Error serializing entity change: {e}"),
        }
    }
}

#[actix::main]
async fn main() -> anyhow::Result<()> {
    let args = Command::new(built_info::PKG_NAME)
        .author("Unfolded Circle ApS")
        .version(APP_VERSION)
        .about("Nest binary sensors for Remote Two")
        .arg(arg!(-c --config <FILE> "Configuration file").required(false))
        .arg(
            arg!(-s --snapshot <FILE> "Nest data file (overrides configuration)").required(false),
        )
        .arg(arg!(-l --list "Print the available binary sensor entities and exit"))
        .get_matches();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg_file = match args.get_one::<String>("config") {
        None => {
            if Path::new(DEF_CONFIG_FILE).exists() {
                info!("Loading default configuration file: {}", DEF_CONFIG_FILE);
                Some(DEF_CONFIG_FILE)
            } else {
                None
            }
        }
        Some(c) => Some(c.as_str()),
    };
    let mut cfg = get_configuration(cfg_file)?;
    if let Some(snapshot) = args.get_one::<String>("snapshot") {
        cfg.nest.snapshot = snapshot.into();
    }

    info!(
        "{} {} (API model {})",
        built_info::PKG_NAME,
        APP_VERSION,
        *API_VERSION
    );

    let client = SnapshotClient::from_file(&cfg.nest.snapshot)?;
    let conditions = cfg.binary_sensors.monitored_conditions();

    if args.get_flag("list") {
        let mut sensors = discover_from_api(&client, &conditions, &mut LogSink)?;
        let entities: Vec<_> = sensors
            .iter_mut()
            .map(|s| {
                if let Err(e) = s.update() {
                    error!("[{}] Error updating binary sensor: {e}", s.unique_id());
                }
                s.to_available_entity()
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entities)?);
        return Ok(());
    }

    let publisher = StdoutPublisher.start();
    let _poller = SensorPoller::start_with_discovery(
        Arc::new(client),
        conditions,
        cfg.poll,
        publisher.recipient(),
    )
    .await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    Ok(())
}
