// SPDX-FileCopyrightText: © 2025 Cadence Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Built-in `LoopProcessor` components: the `Router` (stream splitting with
//! time-map renumbering) and the `Window` (audio framer).
//!
//! This crate carries no registry of its own — wiring a component into a
//! running graph (choosing its slot names, connecting channels) belongs to
//! the graph loader, which this crate treats as an external collaborator.

pub mod router;
pub mod window;

pub(crate) use cadence_core::helpers::config_helpers;

/// Leaks a small table of `"<prefix>_<i>"` slot names for `i in 0..n`. Slot
/// names are `&'static str` by contract (component.rs), but a Router's or
/// similar fan-out component's route count is only known at construction
/// time; leaking a handful of short strings once per component instance
/// (which then lives for the process's lifetime) is the standard way to
/// bridge a runtime count into that `'static` contract.
pub(crate) fn leak_numbered_slots(prefix: &str, n: usize) -> &'static [cadence_core::SlotName] {
    let names: Vec<cadence_core::SlotName> = (0..n).map(|i| -> cadence_core::SlotName {
        Box::leak(format!("{prefix}_{i}").into_boxed_str())
    }).collect();
    Box::leak(names.into_boxed_slice())
}
