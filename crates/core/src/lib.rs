// SPDX-FileCopyrightText: © 2025 Cadence Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Cadence Core — the streaming time-aligned message substrate.
//!
//! This crate defines the core abstractions every `cadence` component is
//! built on:
//!
//! ## Core Modules
//!
//! - [`message`]: the message algebra — eight kinds, five operations
//! - [`accumulator`]: per-input stream accumulator (FIFO + slice bookkeeping)
//! - [`aligner`]: picks the next common slice boundary across input slots
//! - [`component`]: the `LoopProcessor` trait, `MessageBlock`, `OutputBatch`
//! - [`state`]: component state machine and lifecycle tracking
//! - [`stats`]: component statistics collection and reporting
//! - [`control`]: control messages for component lifecycle management
//! - [`error`]: error types and handling
//! - [`helpers`]: utility functions for configuration parsing
//!
//! ## Quick start
//!
//! ```ignore
//! use cadence_core::component::{LoopProcessor, MessageBlock, OutputBatch, SlotName};
//! use cadence_core::error::CadenceError;
//!
//! struct Passthrough;
//!
//! impl LoopProcessor for Passthrough {
//!     fn required_inputs(&self) -> &'static [SlotName] { &["conversation_state", "in"] }
//!     fn clock_slot(&self) -> SlotName { "conversation_state" }
//!     fn output_slots(&self) -> &'static [SlotName] { &["out"] }
//!     fn process_message(&mut self, block: MessageBlock, out: &mut OutputBatch) -> Result<(), CadenceError> {
//!         if let Some(msg) = block.get("in") {
//!             out.push("out", msg.clone());
//!         }
//!         Ok(())
//!     }
//! }
//! ```

pub mod accumulator;
pub mod aligner;
pub mod component;
pub mod control;
pub mod error;
pub mod helpers;
pub mod message;
pub mod state;
pub mod stats;

// Convenience re-exports for commonly used types.
pub use accumulator::StreamAccumulator;
pub use aligner::{find_alignment, AlignerSlot};
pub use component::{LoopProcessor, MessageBlock, OutputBatch, SlotName};
pub use control::ComponentControlMessage;
pub use error::{CadenceError, Result};
pub use helpers::config_helpers;
pub use message::{
    AudioMsg, BinaryMsg, ConversationStateMsg, Descriptors, FeaturesMsg, FrameMatrix, JsonMsg, Message, MessageKind,
    MessageKindId, MatrixMsg, NbestEntry, NbestMsg, SliceOutcome, TimeMapMsg, Tick,
};
pub use state::{state_helpers, ComponentState, ComponentStateUpdate, StopReason};
pub use stats::{ComponentStats, ComponentStatsTracker, ComponentStatsUpdate};
