// SPDX-FileCopyrightText: © 2025 Cadence Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The loop processor harness: drives a single [`cadence_core::LoopProcessor`]
//! from its wired input/output channels. Wiring components into a graph
//! (choosing channel capacities, connecting one component's outputs to
//! another's inputs) is left to an external graph loader; this crate only
//! owns the per-component run loop.

pub mod harness;

pub use harness::{ComponentHarness, Inputs, Outputs};
