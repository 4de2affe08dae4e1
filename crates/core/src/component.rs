// SPDX-FileCopyrightText: © 2025 Cadence Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The `LoopProcessor` contract: what a component implements to receive
//! time-aligned blocks and publish outputs, independent of how the harness
//! wires its channels (that's `cadence-engine`'s job).

use std::collections::HashMap;

use crate::error::CadenceError;
use crate::message::{Message, Tick};

/// Name of an input or output slot. `'static` because slot names are always
/// declared as part of a component's fixed construction-time contract.
pub type SlotName = &'static str;

/// One time-aligned block: exactly one message per required input slot, all
/// sharing the same end-time `T`.
#[derive(Debug, Default)]
pub struct MessageBlock {
    messages: HashMap<SlotName, Message>,
    time: Option<Tick>,
}

impl MessageBlock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts one slot's message. Called by the harness while assembling an
    /// aligned block; exposed publicly so this crate's own components and
    /// their tests can build blocks without going through a running harness.
    pub fn insert(&mut self, slot: SlotName, msg: Message) {
        self.time.get_or_insert(msg.time());
        self.messages.insert(slot, msg);
    }

    #[must_use]
    pub fn get(&self, slot: SlotName) -> Option<&Message> {
        self.messages.get(slot)
    }

    /// The common end-time shared by every message in this block.
    #[must_use]
    pub fn time(&self) -> Option<Tick> {
        self.time
    }
}

/// Outputs a `process_message` call produces, before the harness enforces
/// per-slot monotonicity and publishes them.
#[derive(Debug, Default)]
pub struct OutputBatch {
    pending: Vec<(SlotName, Message)>,
}

impl OutputBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, slot: SlotName, msg: Message) {
        self.pending.push((slot, msg));
    }

    /// Takes every pushed `(slot, message)` pair, leaving the batch empty.
    /// Called by the harness after `process_message` returns, and by tests
    /// inspecting what a component published.
    pub fn drain(&mut self) -> Vec<(SlotName, Message)> {
        std::mem::take(&mut self.pending)
    }
}

/// A loop processor: a component that consumes time-aligned blocks and
/// produces zero or more output messages per block.
///
/// `process_message` is deliberately not `async` — per the concurrency model,
/// it runs to completion without yielding; all suspension happens in the
/// harness around it (waiting for input data, waiting for output space).
pub trait LoopProcessor: Send {
    /// Slots that must be present in every block before `process_message` is
    /// called. One of these must be a `ConversationState` slot.
    fn required_inputs(&self) -> &'static [SlotName];

    /// Slots that participate in alignment but don't drive the initial
    /// candidate time (e.g. a Matrix-only "current state" stream).
    fn advisory_inputs(&self) -> &'static [SlotName] {
        &[]
    }

    /// The `ConversationState` slot among `required_inputs`.
    fn clock_slot(&self) -> SlotName;

    /// Slots this component may publish to.
    fn output_slots(&self) -> &'static [SlotName];

    /// Processes one time-aligned block, pushing zero or more messages (each
    /// with time `<= block.time()`) onto `out`.
    fn process_message(&mut self, block: MessageBlock, out: &mut OutputBatch) -> Result<(), CadenceError>;
}
