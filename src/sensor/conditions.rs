// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Monitored conditions selection from the configuration.

use crate::sensor::diagnostics::{Diagnostic, DiagnosticSink};
use crate::sensor::types::{BinarySensorType, is_deprecated};
use std::str::FromStr;
use strum::IntoEnumIterator;

/// Binary sensor attributes requested by the configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MonitoredConditions {
    /// Every known attribute.
    #[default]
    All,
    /// Only the given attribute names. May contain unknown or deprecated names.
    Selected(Vec<String>),
}

impl MonitoredConditions {
    /// Create the selection from an optional list of configured names.
    ///
    /// A missing and an empty list both select all attributes.
    pub fn from_names<I, S>(names: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names
            .map(|n| n.into_iter().map(Into::into).collect())
            .unwrap_or_default();
        if names.is_empty() {
            MonitoredConditions::All
        } else {
            MonitoredConditions::Selected(names)
        }
    }

    /// Resolve the selection to a list of sensor types without duplicates.
    ///
    /// Configuration order is kept. Deprecated and unknown names are reported to the `sink` and
    /// skipped.
    pub fn resolve(&self, sink: &mut dyn DiagnosticSink) -> Vec<BinarySensorType> {
        match self {
            MonitoredConditions::All => BinarySensorType::iter().collect(),
            MonitoredConditions::Selected(names) => {
                let mut types = Vec::with_capacity(names.len());
                for name in names {
                    match BinarySensorType::from_str(name) {
                        Ok(t) => {
                            if !types.contains(&t) {
                                types.push(t);
                            }
                        }
                        Err(_) if is_deprecated(name) => {
                            sink.report(Diagnostic::DeprecatedCondition(name.clone()))
                        }
                        Err(_) => sink.report(Diagnostic::UnknownCondition(name.clone())),
                    }
                }
                types
            }
        }
    }
}
