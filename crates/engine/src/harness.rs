// SPDX-FileCopyrightText: © 2025 Cadence Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Drives one `LoopProcessor` to completion: accumulates its named input
//! channels, asks the aligner for the next common boundary, calls
//! `process_message` synchronously, then publishes its outputs with
//! per-slot monotonicity and opportunistic coalescing.

use std::collections::HashMap;

use cadence_core::{
    find_alignment, AlignerSlot, CadenceError, LoopProcessor, Message, MessageBlock, OutputBatch, SlotName,
    StreamAccumulator, Tick,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Inbound channels for one component instance, keyed by slot name.
pub type Inputs = HashMap<SlotName, mpsc::Receiver<Message>>;
/// Outbound channels for one component instance, keyed by slot name.
pub type Outputs = HashMap<SlotName, mpsc::Sender<Message>>;

/// Capacity of the harness's internal fan-in inbox. One incoming message sits
/// here at most as long as it takes the harness loop to drain it into its
/// slot's accumulator, so this rarely needs to be large.
const INBOX_CAPACITY: usize = 64;

/// Wires a [`LoopProcessor`] to its channels and owns the aligned-dispatch
/// loop around it. One harness instance corresponds to "one loop per
/// component" from the concurrency model: it runs as a single Tokio task,
/// suspending only while waiting for input data or output channel space.
pub struct ComponentHarness<P: LoopProcessor> {
    processor: P,
    accumulators: HashMap<SlotName, StreamAccumulator>,
    advisory: std::collections::HashSet<SlotName>,
    outputs: Outputs,
    /// The most recently emitted (and already sent) message per output slot,
    /// used only to enforce monotone end-times.
    last_sent_time: HashMap<SlotName, Tick>,
    /// A message held back from sending in case the next push onto the same
    /// slot can still be folded into it via `merge_with`.
    pending: HashMap<SlotName, Message>,
    inbox: mpsc::Receiver<(SlotName, Message)>,
    _forwarders: Vec<JoinHandle<()>>,
}

impl<P: LoopProcessor> ComponentHarness<P> {
    /// # Errors
    ///
    /// Returns `CadenceError::Configuration` if `inputs` is missing a slot
    /// the processor requires, or if the clock slot isn't among them.
    pub fn new(processor: P, inputs: Inputs, outputs: Outputs) -> Result<Self, CadenceError> {
        let required = processor.required_inputs();
        let advisory_slots = processor.advisory_inputs();

        for slot in required.iter().chain(advisory_slots.iter()) {
            if !inputs.contains_key(slot) {
                return Err(CadenceError::Configuration(format!("missing required input slot '{slot}'")));
            }
        }
        if !required.contains(&processor.clock_slot()) {
            return Err(CadenceError::Configuration(format!(
                "clock slot '{}' is not among required_inputs",
                processor.clock_slot()
            )));
        }
        for slot in inputs.keys() {
            if !required.contains(slot) && !advisory_slots.contains(slot) {
                return Err(CadenceError::Configuration(format!("unexpected input slot '{slot}' wired to this processor")));
            }
        }
        let output_slots = processor.output_slots();
        for slot in outputs.keys() {
            if !output_slots.contains(slot) {
                return Err(CadenceError::Configuration(format!("unexpected output slot '{slot}' wired to this processor")));
            }
        }

        let mut accumulators = HashMap::new();
        let (inbox_tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        let mut forwarders = Vec::with_capacity(inputs.len());

        for (slot, mut rx) in inputs {
            accumulators.insert(slot, StreamAccumulator::new(0));
            let tx = inbox_tx.clone();
            forwarders.push(tokio::spawn(async move {
                while let Some(msg) = rx.recv().await {
                    if tx.send((slot, msg)).await.is_err() {
                        break;
                    }
                }
            }));
        }
        drop(inbox_tx);

        Ok(Self {
            processor,
            accumulators,
            advisory: advisory_slots.iter().copied().collect(),
            outputs,
            last_sent_time: HashMap::new(),
            pending: HashMap::new(),
            inbox,
            _forwarders: forwarders,
        })
    }

    /// Runs until every input channel has closed and all buffered data has
    /// been aligned, processed, and flushed.
    ///
    /// # Errors
    ///
    /// Propagates any `CadenceError` raised by the aligner's accumulators,
    /// `process_message`, or a monotonicity violation on an output slot.
    pub async fn run(mut self) -> Result<(), CadenceError> {
        loop {
            if let Some(t) = self.try_align() {
                self.dispatch(t).await?;
                continue;
            }
            match self.inbox.recv().await {
                Some((slot, msg)) => {
                    self.accumulators
                        .get_mut(slot)
                        .expect("accumulator exists for every slot accepted in new()")
                        .push(msg)?;
                }
                None => break,
            }
        }
        self.flush_pending().await
    }

    fn try_align(&self) -> Option<Tick> {
        let slots: Vec<AlignerSlot<'_>> = self
            .accumulators
            .iter()
            .map(|(&name, accumulator)| AlignerSlot {
                name,
                accumulator,
                advisory: self.advisory.contains(&name),
            })
            .collect();
        find_alignment(&slots)
    }

    async fn dispatch(&mut self, t: Tick) -> Result<(), CadenceError> {
        let mut block = MessageBlock::new();
        for (&slot, accumulator) in &mut self.accumulators {
            block.insert(slot, accumulator.take_block_up_to(t)?);
        }

        let mut out = OutputBatch::new();
        self.processor.process_message(block, &mut out)?;

        for (slot, msg) in out.drain() {
            self.publish(slot, msg).await?;
        }
        Ok(())
    }

    /// Buffers `msg` for `slot`, opportunistically merging it with whatever
    /// is already pending there; a merge rejection finalizes and sends the
    /// previously-pending message before the rejected remainder takes its
    /// place.
    async fn publish(&mut self, slot: SlotName, msg: Message) -> Result<(), CadenceError> {
        match self.pending.remove(slot) {
            None => {
                self.pending.insert(slot, msg);
            }
            Some(mut held) => match held.merge_with(msg)? {
                None => {
                    self.pending.insert(slot, held);
                }
                Some(rejected) => {
                    self.send_now(slot, held).await?;
                    self.pending.insert(slot, rejected);
                }
            },
        }
        Ok(())
    }

    async fn send_now(&mut self, slot: SlotName, msg: Message) -> Result<(), CadenceError> {
        if let Some(&prev) = self.last_sent_time.get(slot) {
            if msg.time() <= prev {
                return Err(CadenceError::contract(
                    "ComponentHarness",
                    format!("non-monotone output on slot '{slot}': {} <= {prev}", msg.time()),
                ));
            }
        }
        self.last_sent_time.insert(slot, msg.time());

        if let Some(tx) = self.outputs.get(slot) {
            if tx.send(msg).await.is_err() {
                tracing::debug!(slot, "output slot's receiver dropped, discarding message");
            }
        } else {
            tracing::trace!(slot, "output slot has no wired sender, dropping message");
        }
        Ok(())
    }

    async fn flush_pending(&mut self) -> Result<(), CadenceError> {
        let pending = std::mem::take(&mut self.pending);
        for (slot, msg) in pending {
            self.send_now(slot, msg).await?;
        }
        Ok(())
    }
}
