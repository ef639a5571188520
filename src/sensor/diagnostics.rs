// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Non-fatal discovery findings.

use derive_more::Display;
use log::warn;

#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum Diagnostic {
    #[display(
        "{_0} is no longer a supported monitored condition. See the binary sensor documentation for valid options."
    )]
    DeprecatedCondition(String),
    #[display("{_0} is not a known monitored condition, ignoring it")]
    UnknownCondition(String),
}

/// Receiver of discovery diagnostics.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Forwards all diagnostics to the `log` facade as warnings.
#[derive(Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        warn!("{diagnostic}");
    }
}

/// Collects diagnostics, e.g. for showing them in a setup flow.
impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}
