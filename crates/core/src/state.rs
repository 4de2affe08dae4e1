// SPDX-FileCopyrightText: © 2025 Cadence Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Component state management and lifecycle tracking.
//!
//! This module defines the state machine a running `LoopProcessor` moves
//! through, and helpers for emitting state updates. It is ambient
//! observability, not a pipeline feature: it's carried over from the
//! teacher's node runtime because the substrate's Non-goals exclude pipeline
//! *features*, not lifecycle reporting.
//!
//! ## State Machine
//!
//! ```text
//!     Initializing
//!          ↓
//!       Running
//!          ↓
//!       Stopped / Failed
//! ```

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Why a component entered the `Stopped` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The conversation drained (`last_chunk_in_convo` propagated through).
    Completed,
    /// An input channel closed with no upstream left to serve it.
    InputClosed,
    /// An output channel closed; nothing downstream to deliver to.
    OutputClosed,
    /// Shutdown was requested via a control message.
    Shutdown,
    /// A reason not recognized by this client/version.
    Unknown,
}

impl<'de> Deserialize<'de> for StopReason {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from(value.as_str()))
    }
}

impl From<&str> for StopReason {
    fn from(value: &str) -> Self {
        match value {
            "completed" => Self::Completed,
            "input_closed" => Self::InputClosed,
            "output_closed" => Self::OutputClosed,
            "shutdown" | "shutdown_requested" => Self::Shutdown,
            _ => Self::Unknown,
        }
    }
}

impl From<String> for StopReason {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

/// The runtime state of a component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ComponentState {
    /// Parsing config, constructing accumulators.
    Initializing,
    /// Harness loop is running, waiting on input/alignment.
    Running,
    /// Running but a transient condition is degrading it (falls short of a
    /// contract violation, otherwise the pipeline would abort outright).
    Degraded { reason: String },
    /// A fatal contract violation or configuration error stopped the component.
    Failed { reason: String },
    /// Stopped normally.
    Stopped { reason: StopReason },
}

/// A state update message a component sends to report its current state.
#[derive(Debug, Clone)]
pub struct ComponentStateUpdate {
    pub component_id: String,
    pub state: ComponentState,
    pub timestamp: SystemTime,
}

impl ComponentStateUpdate {
    #[inline]
    #[must_use]
    pub fn new(component_id: String, state: ComponentState) -> Self {
        Self {
            component_id,
            state,
            timestamp: SystemTime::now(),
        }
    }
}

/// Helper functions for emitting component state updates with minimal
/// boilerplate at call sites. All sends are best-effort (`try_send`): state
/// reporting must never block the pipeline.
pub mod state_helpers {
    use super::{ComponentState, ComponentStateUpdate, StopReason};
    use tokio::sync::mpsc;

    #[inline]
    pub fn emit_state(state_tx: &mpsc::Sender<ComponentStateUpdate>, component_id: &str, state: ComponentState) {
        let _ = state_tx.try_send(ComponentStateUpdate::new(component_id.to_string(), state));
    }

    #[inline]
    pub fn emit_initializing(state_tx: &mpsc::Sender<ComponentStateUpdate>, component_id: &str) {
        emit_state(state_tx, component_id, ComponentState::Initializing);
    }

    #[inline]
    pub fn emit_running(state_tx: &mpsc::Sender<ComponentStateUpdate>, component_id: &str) {
        emit_state(state_tx, component_id, ComponentState::Running);
    }

    #[inline]
    pub fn emit_stopped(
        state_tx: &mpsc::Sender<ComponentStateUpdate>,
        component_id: &str,
        reason: impl Into<StopReason>,
    ) {
        emit_state(
            state_tx,
            component_id,
            ComponentState::Stopped { reason: reason.into() },
        );
    }

    #[inline]
    pub fn emit_failed(state_tx: &mpsc::Sender<ComponentStateUpdate>, component_id: &str, error: impl Into<String>) {
        emit_state(
            state_tx,
            component_id,
            ComponentState::Failed { reason: error.into() },
        );
    }

    #[inline]
    pub fn emit_degraded(state_tx: &mpsc::Sender<ComponentStateUpdate>, component_id: &str, reason: impl Into<String>) {
        emit_state(
            state_tx,
            component_id,
            ComponentState::Degraded { reason: reason.into() },
        );
    }
}
