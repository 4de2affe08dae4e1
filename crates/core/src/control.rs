// SPDX-FileCopyrightText: © 2025 Cadence Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Control messages for component lifecycle management.
//!
//! Dynamic graph mutation (adding/removing/rewiring components at runtime)
//! belongs to the graph loader this crate treats as an external collaborator;
//! what remains here is the per-component control channel every harness
//! listens on alongside its data inputs.

use serde::{Deserialize, Serialize};

/// A message sent to a specific, running component to tune its parameters or
/// control its lifecycle.
#[derive(Debug, Deserialize, Serialize)]
pub enum ComponentControlMessage {
    UpdateParams(serde_json::Value),
    /// Tells the component to begin consuming from its inputs.
    Start,
    /// Requests graceful shutdown; the component finishes its in-flight
    /// block and exits its run loop.
    Shutdown,
}
