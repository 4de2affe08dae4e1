// SPDX-FileCopyrightText: © 2025 Cadence Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The Router: splits one `stream_to_route` stream into `N` renumbered
//! output streams, alongside a `time_map` a companion Merger could use to
//! reconstruct the original time axis.
//!
//! Two modes share one state machine (offsets, per-route utterance ids,
//! time-map emission) and differ only in how a slice decision is produced:
//! `sad_nbest` reads route/alignment pairs out of an Nbest routing message,
//! `utterance_round_robin` assigns whole utterances to `next_route` in turn.

use std::collections::VecDeque;
use std::sync::Arc;

use cadence_core::{CadenceError, LoopProcessor, Message, MessageBlock, NbestMsg, OutputBatch, SlotName, Tick};
use serde::Deserialize;

use crate::{config_helpers, leak_numbered_slots};

const SLOT_CONVERSATION_STATE: SlotName = "conversation_state";
const SLOT_ROUTING_STREAM: SlotName = "routing_stream";
const SLOT_STREAM_TO_ROUTE: SlotName = "stream_to_route";
const SLOT_TIME_MAP: SlotName = "time_map";

const REQUIRED_INPUTS: [SlotName; 3] = [SLOT_CONVERSATION_STATE, SLOT_ROUTING_STREAM, SLOT_STREAM_TO_ROUTE];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouterMode {
    SadNbest,
    UtteranceRoundRobin,
}

#[derive(Debug, Deserialize)]
struct RouterConfig {
    router_type: String,
    #[serde(default)]
    num_outputs: Option<usize>,
}

/// One not-yet-distributed routing decision: a route and the original-time
/// point at which the to-route stream should be sliced for it.
struct PendingEntry {
    route: usize,
    slice_time: Tick,
    end_of_utt: bool,
    utt_id: Arc<str>,
    end_of_convo: bool,
    convo_id: Arc<str>,
}

/// A still-being-sliced chunk of the `stream_to_route` stream, shared by
/// every pending entry produced from the same incoming block. `remaining`
/// counts how many pending entries still reference it; the batch is dropped
/// once its last entry is distributed.
struct Batch {
    msg: Message,
    remaining: usize,
}

pub struct Router {
    mode: RouterMode,
    num_routes: usize,
    to_route_stream_offset: i64,
    routed_stream_offsets: Vec<i64>,
    current_utt_id: Vec<Option<Arc<str>>>,
    next_route: usize,
    entries: VecDeque<PendingEntry>,
    batches: VecDeque<Batch>,
    output_slots: &'static [SlotName],
}

impl Router {
    /// # Errors
    ///
    /// Returns `CadenceError::Configuration` if `router_type` is missing,
    /// unrecognized, or `num_outputs` is missing/invalid for
    /// `utterance_round_robin`.
    pub fn new(params: Option<&serde_json::Value>) -> Result<Self, CadenceError> {
        let config: RouterConfig = config_helpers::parse_config_required(params, "Router")?;
        let (mode, num_routes) = match config.router_type.as_str() {
            "sad_nbest" => (RouterMode::SadNbest, 2),
            "utterance_round_robin" => {
                let num_outputs = config
                    .num_outputs
                    .ok_or_else(|| CadenceError::Configuration("num_outputs is required for utterance_round_robin".into()))?;
                if num_outputs == 0 {
                    return Err(CadenceError::Configuration("num_outputs must be greater than 0".into()));
                }
                (RouterMode::UtteranceRoundRobin, num_outputs)
            }
            other => return Err(CadenceError::Configuration(format!("unknown router_type '{other}'"))),
        };

        let output_slots = leak_numbered_slots("output_stream", num_routes);
        let conversation_state_slots = leak_numbered_slots("conversation_state", num_routes);
        let mut all_outputs: Vec<SlotName> = Vec::with_capacity(num_routes * 2 + 1);
        all_outputs.extend_from_slice(output_slots);
        all_outputs.extend_from_slice(conversation_state_slots);
        all_outputs.push(SLOT_TIME_MAP);

        Ok(Self {
            mode,
            num_routes,
            to_route_stream_offset: -1,
            routed_stream_offsets: vec![-1; num_routes],
            current_utt_id: vec![None; num_routes],
            next_route: 0,
            entries: VecDeque::new(),
            batches: VecDeque::new(),
            output_slots: Box::leak(all_outputs.into_boxed_slice()),
        })
    }

    fn output_stream_slot(&self, route: usize) -> SlotName {
        self.output_slots[route]
    }

    fn conversation_state_slot(&self, route: usize) -> SlotName {
        self.output_slots[self.num_routes + route]
    }

    /// `sad_nbest`: copies the incoming Nbest routing pairs onto the pending
    /// accumulators, injecting a synthetic end-of-convo pair on the other
    /// route when this block carries the conversation's final pair — the
    /// opposite route otherwise never sees a natural `last_chunk_in_convo`.
    fn accumulate_sad_nbest(
        &mut self,
        to_route: Message,
        nbest: &NbestMsg,
        cs_time: Tick,
        utt_id: &Arc<str>,
        convo_id: &Arc<str>,
        last_chunk_in_utt: bool,
        last_chunk_in_convo: bool,
    ) -> Result<(), CadenceError> {
        let Some(entry) = nbest.entries.first() else {
            return Err(CadenceError::contract("Router", "sad_nbest routing message has no entries"));
        };
        let n = entry.alignment.len();
        if n == 0 {
            return Ok(());
        }

        let routes: Vec<usize> = entry
            .words
            .iter()
            .map(|w| w.parse::<usize>().unwrap_or(0).min(1))
            .collect();
        let batch_start = self.batches.len();
        self.batches.push_back(Batch {
            msg: to_route,
            remaining: 0,
        });

        for idx in 0..n {
            let last = idx == n - 1;
            let route = routes.get(idx).copied().unwrap_or(0);
            self.entries.push_back(PendingEntry {
                route,
                slice_time: entry.alignment[idx],
                end_of_utt: last_chunk_in_utt && last,
                utt_id: utt_id.clone(),
                end_of_convo: last_chunk_in_convo && last,
                convo_id: convo_id.clone(),
            });
            self.batches[batch_start].remaining += 1;
        }

        if last_chunk_in_convo {
            let last_idx = self.entries.len() - 1;
            let opposite_route = 1 - self.entries[last_idx].route;
            let mut slice_time = cs_time.saturating_sub(1);
            loop {
                let feasible = self.batches[batch_start]
                    .msg
                    .can_slice_at(slice_time, 0);
                if feasible {
                    break;
                }
                if slice_time == 0 {
                    return Err(CadenceError::contract(
                        "Router",
                        "could not find a slice point to inject a dummy end-of-convo signal",
                    ));
                }
                slice_time -= 1;
            }
            let dummy_utt_id: Arc<str> = format!("{}_dummy", self.entries[last_idx].utt_id).into();
            self.entries.insert(
                last_idx,
                PendingEntry {
                    route: opposite_route,
                    slice_time,
                    end_of_utt: true,
                    utt_id: dummy_utt_id,
                    end_of_convo: true,
                    convo_id: convo_id.clone(),
                },
            );
            self.batches[batch_start].remaining += 1;
        }

        Ok(())
    }

    /// `utterance_round_robin`: the whole incoming block is one pending
    /// entry on the current route; the route only advances on
    /// `last_chunk_in_utt`.
    fn accumulate_round_robin(
        &mut self,
        to_route: Message,
        cs_time: Tick,
        utt_id: &Arc<str>,
        convo_id: &Arc<str>,
        last_chunk_in_utt: bool,
        last_chunk_in_convo: bool,
    ) {
        self.batches.push_back(Batch {
            msg: to_route,
            remaining: 1,
        });
        self.entries.push_back(PendingEntry {
            route: self.next_route,
            slice_time: cs_time,
            end_of_utt: last_chunk_in_utt,
            utt_id: utt_id.clone(),
            end_of_convo: last_chunk_in_convo,
            convo_id: convo_id.clone(),
        });
        if last_chunk_in_utt {
            self.next_route = (self.next_route + 1) % self.num_routes;
        }
    }

    /// Drains every fully-decided pending entry, emitting `time_map`,
    /// per-route payload, and per-route `ConversationState` messages.
    fn distribute(&mut self, out: &mut OutputBatch) -> Result<(), CadenceError> {
        while !self.entries.is_empty() && (self.entries.len() >= 2 || self.entries[0].end_of_utt) {
            let entry = self.entries.pop_front().expect("checked non-empty above");

            let slice_length = entry.slice_time as i64 - self.to_route_stream_offset;
            let start_orig = (self.to_route_stream_offset + 1).max(0) as Tick;
            let start_mapped = (self.routed_stream_offsets[entry.route] + 1).max(0) as Tick;
            let end_mapped = (self.routed_stream_offsets[entry.route] + slice_length).max(0) as Tick;
            self.routed_stream_offsets[entry.route] = end_mapped as i64;

            out.push(
                SLOT_TIME_MAP,
                Message::TimeMap(cadence_core::TimeMapMsg {
                    time: entry.slice_time,
                    start_orig,
                    end_orig: entry.slice_time,
                    start_mapped,
                    end_mapped,
                    route_index: entry.route,
                }),
            );

            let batch = self
                .batches
                .front_mut()
                .ok_or_else(|| CadenceError::contract("Router", "pending entry has no matching batch"))?;
            let outcome = batch.msg.slice_out(entry.slice_time, self.to_route_stream_offset.max(0) as Tick)?;
            let mut slice = outcome.slice;
            slice.shift_in_time(end_mapped as i64 - entry.slice_time as i64);
            out.push(self.output_stream_slot(entry.route), slice);

            batch.remaining -= 1;
            if batch.remaining == 0 {
                self.batches.pop_front();
            }

            if self.current_utt_id[entry.route].is_none() {
                self.current_utt_id[entry.route] = Some(format!("{}_{start_orig}", entry.utt_id).into());
            }
            let route_utt_id = self.current_utt_id[entry.route].clone().expect("just assigned above");

            out.push(
                self.conversation_state_slot(entry.route),
                Message::ConversationState(cadence_core::ConversationStateMsg::new(
                    end_mapped,
                    route_utt_id,
                    entry.end_of_utt,
                    entry.convo_id,
                    entry.end_of_convo,
                )?),
            );

            self.to_route_stream_offset = entry.slice_time as i64;
            if entry.end_of_utt {
                self.current_utt_id[entry.route] = None;
            }
        }
        Ok(())
    }
}

impl LoopProcessor for Router {
    fn required_inputs(&self) -> &'static [SlotName] {
        &REQUIRED_INPUTS
    }

    fn clock_slot(&self) -> SlotName {
        SLOT_CONVERSATION_STATE
    }

    fn output_slots(&self) -> &'static [SlotName] {
        self.output_slots
    }

    fn process_message(&mut self, block: MessageBlock, out: &mut OutputBatch) -> Result<(), CadenceError> {
        let cs = match block.get(SLOT_CONVERSATION_STATE) {
            Some(Message::ConversationState(m)) => m.clone(),
            _ => return Err(CadenceError::contract("Router", "conversation_state slot missing or wrong kind")),
        };
        let to_route = block
            .get(SLOT_STREAM_TO_ROUTE)
            .cloned()
            .ok_or_else(|| CadenceError::contract("Router", "stream_to_route slot missing"))?;

        match self.mode {
            RouterMode::SadNbest => {
                let routing = match block.get(SLOT_ROUTING_STREAM) {
                    Some(Message::Nbest(m)) => m.clone(),
                    _ => return Err(CadenceError::contract("Router", "routing_stream slot missing or wrong kind")),
                };
                self.accumulate_sad_nbest(
                    to_route,
                    &routing,
                    cs.time,
                    &cs.utterance_id,
                    &cs.convo_id,
                    cs.last_chunk_in_utt,
                    cs.last_chunk_in_convo,
                )?;
            }
            RouterMode::UtteranceRoundRobin => {
                self.accumulate_round_robin(
                    to_route,
                    cs.time,
                    &cs.utterance_id,
                    &cs.convo_id,
                    cs.last_chunk_in_utt,
                    cs.last_chunk_in_convo,
                );
            }
        }

        self.distribute(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{AudioMsg, ConversationStateMsg, Descriptors, NbestEntry};

    fn block_for_tests(entries: Vec<(SlotName, Message)>) -> MessageBlock {
        let mut block = MessageBlock::new();
        for (slot, msg) in entries {
            block.insert(slot, msg);
        }
        block
    }

    fn audio(time: Tick, n: usize) -> Message {
        Message::Audio(AudioMsg {
            time,
            samples: Arc::new(vec![0.0; n]),
            sample_rate: 16000.0,
            ticks_per_sample: 1.0,
            descriptors: Descriptors::new(),
        })
    }

    fn cs(time: Tick, utt: &str, last_utt: bool, convo: &str, last_convo: bool) -> Message {
        Message::ConversationState(ConversationStateMsg::new(time, utt, last_utt, convo, last_convo).unwrap())
    }

    fn nbest(time: Tick, words: &[&str], alignment: &[Tick]) -> Message {
        Message::Nbest(NbestMsg {
            time,
            entries: vec![NbestEntry {
                words: words.iter().map(|w| Arc::from(*w)).collect(),
                alignment: alignment.to_vec(),
                text: Arc::from(""),
                confidences: vec![],
            }],
        })
    }

    fn sad_nbest_router() -> Router {
        Router::new(Some(&serde_json::json!({ "router_type": "sad_nbest" }))).unwrap()
    }

    #[test]
    fn s5_router_end_of_convo_injection() {
        let mut router = sad_nbest_router();
        let mut out = OutputBatch::new();
        let block = block_for_tests(vec![
            (SLOT_CONVERSATION_STATE, cs(500, "u1", true, "c1", true)),
            (SLOT_ROUTING_STREAM, nbest(500, &["1"], &[500])),
            (SLOT_STREAM_TO_ROUTE, audio(500, 500)),
        ]);
        router.process_message(block, &mut out).unwrap();

        let pushed = out.drain();
        let conv_states: Vec<_> = pushed
            .iter()
            .filter(|(slot, _)| slot.starts_with("conversation_state_"))
            .collect();
        assert_eq!(conv_states.len(), 2);
        for (_, msg) in &conv_states {
            match msg {
                Message::ConversationState(m) => assert!(m.last_chunk_in_convo),
                _ => unreachable!(),
            }
        }

        let output_streams: Vec<_> = pushed.iter().filter(|(slot, _)| slot.starts_with("output_stream_")).collect();
        assert_eq!(output_streams.len(), 2);
    }

    #[test]
    fn invariant_5_router_conservation() {
        let mut router = sad_nbest_router();
        let mut out = OutputBatch::new();
        let block = block_for_tests(vec![
            (SLOT_CONVERSATION_STATE, cs(300, "u1", false, "c1", false)),
            (SLOT_ROUTING_STREAM, nbest(300, &["0", "1"], &[100, 300])),
            (SLOT_STREAM_TO_ROUTE, audio(300, 300)),
        ]);
        router.process_message(block, &mut out).unwrap();

        let sum_routed: i64 = router.routed_stream_offsets.iter().map(|o| o + 1).sum();
        assert_eq!(sum_routed, router.to_route_stream_offset + 1);
    }

    #[test]
    fn utterance_round_robin_rotates_routes() {
        let mut router = Router::new(Some(&serde_json::json!({
            "router_type": "utterance_round_robin",
            "num_outputs": 3
        })))
        .unwrap();
        let mut out = OutputBatch::new();

        for (i, _) in (0..3).enumerate() {
            let block = block_for_tests(vec![
                (SLOT_CONVERSATION_STATE, cs(100 * (i as Tick + 1), "u", true, "c1", false)),
                (SLOT_ROUTING_STREAM, cs(100 * (i as Tick + 1), "u", true, "c1", false)),
                (SLOT_STREAM_TO_ROUTE, audio(100 * (i as Tick + 1), 100)),
            ]);
            router.process_message(block, &mut out).unwrap();
        }

        let pushed = out.drain();
        let routes_seen: std::collections::BTreeSet<_> =
            pushed.iter().filter(|(slot, _)| slot.starts_with("output_stream_")).map(|(s, _)| *s).collect();
        assert_eq!(routes_seen.len(), 3);
    }
}
