// SPDX-FileCopyrightText: © 2025 Cadence Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The per-input stream accumulator: a FIFO of messages with strictly
//! increasing end-times, plus the `stream_start_offset` that anchors the
//! first message's coverage.

use std::collections::VecDeque;

use crate::error::CadenceError;
use crate::message::{Message, Tick};

/// A single input slot's backlog: messages in monotone time, waiting to be
/// sliced into a block once the time aligner picks a common boundary.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    queue: VecDeque<Message>,
    stream_start_offset: Tick,
}

impl StreamAccumulator {
    #[must_use]
    pub fn new(stream_start_offset: Tick) -> Self {
        Self {
            queue: VecDeque::new(),
            stream_start_offset,
        }
    }

    #[must_use]
    pub const fn stream_start_offset(&self) -> Tick {
        self.stream_start_offset
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pushes a newly-arrived message, merging it onto the current back entry
    /// when the kind's policy allows it.
    pub fn push(&mut self, msg: Message) -> Result<(), CadenceError> {
        let floor = self.queue.back().map_or(self.stream_start_offset, Message::time);
        if msg.time() <= floor {
            return Err(CadenceError::contract(
                "StreamAccumulator",
                format!("non-monotone push: {} <= {floor}", msg.time()),
            ));
        }
        if let Some(back) = self.queue.back_mut() {
            if let Some(rejected) = back.merge_with(msg)? {
                tracing::trace!(new_head = %rejected.describe(), "merge rejected, starting a new queue entry");
                self.queue.push_back(rejected);
            }
        } else {
            self.queue.push_back(msg);
        }
        Ok(())
    }

    /// The end-time of the oldest unsliced message, if any.
    #[must_use]
    pub fn earliest_end_time(&self) -> Option<Tick> {
        self.queue.front().map(Message::time)
    }

    /// Whether a block ending at `t` can be assembled from this accumulator
    /// right now: `t` must not exceed the backlog's coverage, and the message
    /// spanning `t` must accept a slice boundary there.
    #[must_use]
    pub fn can_form_block_up_to(&self, t: Tick) -> bool {
        let Some(back) = self.queue.back() else {
            return false;
        };
        if back.time() < t {
            return false;
        }
        for msg in &self.queue {
            if msg.time() >= t {
                return msg.time() == t || msg.can_slice_at(t, self.stream_start_offset);
            }
        }
        false
    }

    /// Assembles a single output message covering `(stream_start_offset, t]`
    /// by repeatedly consuming/slicing the head of the queue, merging the
    /// results in order, and advancing `stream_start_offset` to `t`.
    pub fn take_block_up_to(&mut self, t: Tick) -> Result<Message, CadenceError> {
        let mut result: Option<Message> = None;

        loop {
            let front_time = self
                .queue
                .front()
                .ok_or_else(|| CadenceError::contract("StreamAccumulator", "take_block_up_to on an empty queue"))?
                .time();

            if front_time <= t {
                let msg = self.queue.pop_front().expect("front just peeked");
                result = Some(Self::fold(result, msg)?);
                if front_time == t {
                    break;
                }
                continue;
            }

            let mut front = self.queue.pop_front().expect("front just peeked");
            let outcome = front.slice_out(t, self.stream_start_offset)?;
            if !outcome.head_consumed {
                self.queue.push_front(front);
            }
            result = Some(Self::fold(result, outcome.slice)?);
            break;
        }

        self.stream_start_offset = t;
        Ok(result.expect("loop always assigns result before breaking"))
    }

    fn fold(acc: Option<Message>, next: Message) -> Result<Message, CadenceError> {
        match acc {
            None => Ok(next),
            Some(mut acc) => match acc.merge_with(next)? {
                None => Ok(acc),
                Some(rejected) => Err(CadenceError::contract(
                    "StreamAccumulator",
                    format!(
                        "cannot assemble a single block: incompatible messages ({} vs {})",
                        acc.describe(),
                        rejected.describe()
                    ),
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::message::{AudioMsg, Descriptors};

    fn audio(time: Tick, samples: &[f32]) -> Message {
        Message::Audio(AudioMsg {
            time,
            samples: Arc::new(samples.to_vec()),
            sample_rate: 4.0,
            ticks_per_sample: 25.0,
            descriptors: Descriptors::new(),
        })
    }

    #[test]
    fn merges_on_push_and_slices_a_block() {
        let mut acc = StreamAccumulator::new(0);
        acc.push(audio(100, &[1.0, 2.0, 3.0, 4.0])).unwrap();
        acc.push(audio(200, &[5.0, 6.0, 7.0, 8.0])).unwrap();
        assert_eq!(acc.earliest_end_time(), Some(200));
        assert!(acc.can_form_block_up_to(100));

        let block = acc.take_block_up_to(100).unwrap();
        match block {
            Message::Audio(m) => {
                assert_eq!(m.time, 100);
                assert_eq!(*m.samples, vec![1.0, 2.0, 3.0, 4.0]);
            }
            _ => unreachable!(),
        }
        assert_eq!(acc.stream_start_offset(), 100);
        assert_eq!(acc.earliest_end_time(), Some(200));
    }

    #[test]
    fn invariant_2_monotone_after_take() {
        let mut acc = StreamAccumulator::new(0);
        acc.push(audio(100, &[1.0, 2.0, 3.0, 4.0])).unwrap();
        acc.push(audio(200, &[5.0, 6.0, 7.0, 8.0])).unwrap();
        acc.push(audio(300, &[9.0, 10.0, 11.0, 12.0])).unwrap();

        let mut last = 0;
        for t in [100, 200, 300] {
            acc.take_block_up_to(t).unwrap();
            let next = acc.earliest_end_time().unwrap_or(t);
            assert!(next >= last);
            last = next;
        }
    }

    #[test]
    fn rejects_non_monotone_push() {
        let mut acc = StreamAccumulator::new(0);
        acc.push(audio(100, &[1.0])).unwrap();
        assert!(acc.push(audio(100, &[2.0])).is_err());
    }
}
