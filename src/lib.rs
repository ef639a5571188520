// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

pub mod client;
pub mod poller;
pub mod sensor;

pub mod configuration;
pub mod errors;
pub mod startup;

pub use startup::*;
