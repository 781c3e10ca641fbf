//! Fire-and-forget exception reporting.
//!
//! Every swallowed or escalated failure passes through here before being
//! handled, so nothing disappears silently. Reporting itself can never fail
//! or block the caller; events land in the structured log stream where the
//! ops tooling picks them up.

use std::fmt::Display;

/// Report an exception-worthy event with its detail.
pub fn capture(event: &str, detail: impl Display) {
    tracing::error!(target: "telemetry", event, detail = %detail, "captured exception");
}
