// SPDX-FileCopyrightText: © 2025 Cadence Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The message algebra: a closed sum type over the eight payload kinds the
//! substrate understands, and the five operations (`describe`, `clone`,
//! `merge_with`, `can_slice_at`, `slice_out`, `shift_in_time`) every kind
//! implements.
//!
//! The original implementation dispatches these operations through a base
//! class with per-kind virtual overrides. Here they are exhaustive matches
//! over a closed `enum`, which is both cheaper and lets the compiler catch a
//! missing kind the moment a new operation is added.

use std::sync::Arc;

use crate::error::CadenceError;

/// Monotone 64-bit tick, the shared time axis for every channel.
pub type Tick = u64;

/// Opaque key/value metadata attached to every message. Two messages can only
/// be merged if their descriptors are equal — the map itself, not a serialized
/// form of it, is the unit of comparison, which is equivalent but avoids
/// depending on key ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptors(std::collections::BTreeMap<Arc<str>, Arc<str>>);

impl Descriptors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(std::convert::AsRef::as_ref)
    }

    pub fn insert(&mut self, key: impl Into<Arc<str>>, value: impl Into<Arc<str>>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Stable identifier for a message kind, used to type-check slot connections
/// at graph construction time. The original source kept a process-global
/// identifier map populated at startup; here it's a `const` per kind instead,
/// so there is no mutable global and no initialization order to get wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageKindId(pub u128);

/// The eight message kinds described by the substrate's data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    ConversationState,
    Audio,
    Features,
    Matrix,
    Nbest,
    TimeMap,
    Binary,
    Json,
}

impl MessageKind {
    /// Compile-time-stable identifier for this kind.
    #[must_use]
    pub const fn id(self) -> MessageKindId {
        // Hand-assigned constants rather than a runtime hash: stable across
        // builds and toolchains, which a hash-of-type-name would not be.
        MessageKindId(match self {
            Self::ConversationState => 0x4350_4F53_5345_5153_5441_5445_0000_0001,
            Self::Audio => 0x4150_4F53_5155_4449_4F00_0000_0000_0002,
            Self::Features => 0x4650_4F53_4645_4154_5552_4553_0000_0003,
            Self::Matrix => 0x4D50_4F53_4D41_5452_4958_0000_0000_0004,
            Self::Nbest => 0x4E50_4F53_4E42_4553_5400_0000_0000_0005,
            Self::TimeMap => 0x5450_4F53_5449_4D45_4D41_5000_0000_0006,
            Self::Binary => 0x4250_4F53_4249_4E41_5259_0000_0000_0007,
            Self::Json => 0x4A50_4F53_4A53_4F4E_0000_0000_0000_0008,
        })
    }
}

/// `ConversationState`: the clock of the utterance/convo envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationStateMsg {
    pub time: Tick,
    pub utterance_id: Arc<str>,
    pub last_chunk_in_utt: bool,
    pub convo_id: Arc<str>,
    pub last_chunk_in_convo: bool,
}

impl ConversationStateMsg {
    /// Constructs a new message, enforcing `last_chunk_in_convo => last_chunk_in_utt`.
    pub fn new(
        time: Tick,
        utterance_id: impl Into<Arc<str>>,
        last_chunk_in_utt: bool,
        convo_id: impl Into<Arc<str>>,
        last_chunk_in_convo: bool,
    ) -> Result<Self, CadenceError> {
        if last_chunk_in_convo && !last_chunk_in_utt {
            return Err(CadenceError::contract(
                "ConversationState",
                "last_chunk_in_convo implies last_chunk_in_utt",
            ));
        }
        Ok(Self {
            time,
            utterance_id: utterance_id.into(),
            last_chunk_in_utt,
            convo_id: convo_id.into(),
            last_chunk_in_convo,
        })
    }
}

/// `Audio`: a run of samples at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioMsg {
    pub time: Tick,
    pub samples: Arc<Vec<f32>>,
    pub sample_rate: f32,
    pub ticks_per_sample: f32,
    pub descriptors: Descriptors,
}

/// A single analysis-frame matrix, stored column-major (`cols` columns of
/// `rows` samples each) so that slicing a contiguous column range is a cheap
/// slice of the backing `Vec`, matching the original's Eigen column-major
/// convention.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMatrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl FrameMatrix {
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    #[must_use]
    pub fn col(&self, i: usize) -> &[f32] {
        &self.data[i * self.rows..(i + 1) * self.rows]
    }

    pub fn col_mut(&mut self, i: usize) -> &mut [f32] {
        &mut self.data[i * self.rows..(i + 1) * self.rows]
    }

    /// Returns the sub-matrix covering columns `[start, end)`.
    #[must_use]
    pub fn cols_range(&self, start: usize, end: usize) -> Self {
        Self {
            rows: self.rows,
            cols: end - start,
            data: self.data[start * self.rows..end * self.rows].to_vec(),
        }
    }

    /// Concatenates `other`'s columns after `self`'s.
    pub fn concat(&mut self, other: &Self) {
        self.data.extend_from_slice(&other.data);
        self.cols += other.cols;
    }
}

/// `Features`: a timestamped analysis-frame matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturesMsg {
    pub time: Tick,
    pub utterance_id: Arc<str>,
    pub matrix: FrameMatrix,
    pub feature_names: Arc<str>,
    pub timestamps: Vec<Tick>,
    pub descriptors: Descriptors,
}

/// `Matrix`: timeless, applies to any T (e.g. a running CMVN statistics matrix).
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixMsg {
    pub time: Tick,
    pub matrix: FrameMatrix,
}

/// One recognition hypothesis within an `Nbest` message.
#[derive(Debug, Clone, PartialEq)]
pub struct NbestEntry {
    pub words: Vec<Arc<str>>,
    pub alignment: Vec<Tick>,
    pub text: Arc<str>,
    pub confidences: Vec<f32>,
}

/// `Nbest`: a list of recognition hypotheses, atomic at its end time.
#[derive(Debug, Clone, PartialEq)]
pub struct NbestMsg {
    pub time: Tick,
    pub entries: Vec<NbestEntry>,
}

/// `TimeMap`: a record associating an original-time interval with a
/// per-route mapped-time interval, emitted by the Router.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeMapMsg {
    pub time: Tick,
    pub start_orig: Tick,
    pub end_orig: Tick,
    pub start_mapped: Tick,
    pub end_mapped: Tick,
    pub route_index: usize,
}

/// `Binary`: an opaque byte payload, atomic.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMsg {
    pub time: Tick,
    pub bytes: Arc<Vec<u8>>,
    pub format: Arc<str>,
}

/// `Json`: an opaque document, atomic.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonMsg {
    pub time: Tick,
    pub document: serde_json::Value,
}

/// The closed sum type over all eight message kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    ConversationState(ConversationStateMsg),
    Audio(AudioMsg),
    Features(FeaturesMsg),
    Matrix(MatrixMsg),
    Nbest(NbestMsg),
    TimeMap(TimeMapMsg),
    Binary(BinaryMsg),
    Json(JsonMsg),
}

/// Result of a successful [`Message::slice_out`]: the slice to publish, and
/// whether the accumulator's head should be dropped entirely.
pub struct SliceOutcome {
    pub slice: Message,
    pub head_consumed: bool,
}

impl Message {
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::ConversationState(_) => MessageKind::ConversationState,
            Self::Audio(_) => MessageKind::Audio,
            Self::Features(_) => MessageKind::Features,
            Self::Matrix(_) => MessageKind::Matrix,
            Self::Nbest(_) => MessageKind::Nbest,
            Self::TimeMap(_) => MessageKind::TimeMap,
            Self::Binary(_) => MessageKind::Binary,
            Self::Json(_) => MessageKind::Json,
        }
    }

    #[must_use]
    pub const fn time(&self) -> Tick {
        match self {
            Self::ConversationState(m) => m.time,
            Self::Audio(m) => m.time,
            Self::Features(m) => m.time,
            Self::Matrix(m) => m.time,
            Self::Nbest(m) => m.time,
            Self::TimeMap(m) => m.time,
            Self::Binary(m) => m.time,
            Self::Json(m) => m.time,
        }
    }

    /// Human-readable diagnostic. No side effects.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::ConversationState(m) => format!(
                "ConversationState[t={} utt={} last_utt={} convo={} last_convo={}]",
                m.time, m.utterance_id, m.last_chunk_in_utt, m.convo_id, m.last_chunk_in_convo
            ),
            Self::Audio(m) => format!(
                "Audio[t={} samples={} sr={} tps={}]",
                m.time,
                m.samples.len(),
                m.sample_rate,
                m.ticks_per_sample
            ),
            Self::Features(m) => format!(
                "Features[t={} utt={} rows={} cols={} names={}]",
                m.time, m.utterance_id, m.matrix.rows, m.matrix.cols, m.feature_names
            ),
            Self::Matrix(m) => format!("Matrix[t={} rows={} cols={}]", m.time, m.matrix.rows, m.matrix.cols),
            Self::Nbest(m) => format!("Nbest[t={} entries={}]", m.time, m.entries.len()),
            Self::TimeMap(m) => format!(
                "TimeMap[t={} orig=({},{}] mapped=({},{}] route={}]",
                m.time, m.start_orig, m.end_orig, m.start_mapped, m.end_mapped, m.route_index
            ),
            Self::Binary(m) => format!("Binary[t={} bytes={} format={}]", m.time, m.bytes.len(), m.format),
            Self::Json(m) => format!("Json[t={}]", m.time),
        }
    }

    /// Attempts to merge `other` onto `self` in place.
    ///
    /// Pre: `other.time() > self.time()`. Returns `Ok(None)` when `other` was
    /// absorbed into `self`; returns `Ok(Some(other))` unchanged when the kind's
    /// policy rejects the merge (atomic kinds always reject); returns `Err` on
    /// a contract violation (mismatched Features row count, or an inconsistent
    /// ConversationState transition).
    pub fn merge_with(&mut self, other: Self) -> Result<Option<Self>, CadenceError> {
        debug_assert!(other.time() > self.time(), "merge_with requires monotone time");
        match (self, other) {
            (Self::Audio(head), Self::Audio(tail)) => {
                if (head.sample_rate - tail.sample_rate).abs() > f32::EPSILON
                    || (head.ticks_per_sample - tail.ticks_per_sample).abs() > f32::EPSILON
                    || head.descriptors != tail.descriptors
                {
                    return Ok(Some(Self::Audio(tail)));
                }
                let samples = Arc::make_mut(&mut head.samples);
                samples.extend_from_slice(&tail.samples);
                head.time = tail.time;
                Ok(None)
            }
            (Self::Features(head), Self::Features(tail)) => {
                if head.utterance_id != tail.utterance_id {
                    return Ok(Some(Self::Features(tail)));
                }
                if head.matrix.rows != tail.matrix.rows {
                    return Err(CadenceError::contract(
                        "Features",
                        format!(
                            "cannot merge incompatible features: {} rows vs {} rows",
                            head.matrix.rows, tail.matrix.rows
                        ),
                    ));
                }
                head.matrix.concat(&tail.matrix);
                head.timestamps.extend_from_slice(&tail.timestamps);
                head.time = tail.time;
                Ok(None)
            }
            (Self::ConversationState(head), Self::ConversationState(tail)) => {
                if head.last_chunk_in_utt && head.utterance_id == tail.utterance_id {
                    return Err(CadenceError::contract(
                        "ConversationState",
                        "utterance already closed but utterance_id unchanged",
                    ));
                }
                if !head.last_chunk_in_utt && head.utterance_id != tail.utterance_id {
                    return Err(CadenceError::contract(
                        "ConversationState",
                        "utterance_id changed without closing the previous utterance",
                    ));
                }
                if head.last_chunk_in_convo && head.convo_id == tail.convo_id {
                    return Err(CadenceError::contract(
                        "ConversationState",
                        "convo already closed but convo_id unchanged",
                    ));
                }
                if !head.last_chunk_in_convo && head.convo_id != tail.convo_id {
                    return Err(CadenceError::contract(
                        "ConversationState",
                        "convo_id changed without closing the previous convo",
                    ));
                }
                if head.last_chunk_in_utt {
                    return Ok(Some(Self::ConversationState(tail)));
                }
                head.last_chunk_in_utt = tail.last_chunk_in_utt;
                head.last_chunk_in_convo = tail.last_chunk_in_convo;
                head.time = tail.time;
                Ok(None)
            }
            (_, other) => Ok(Some(other)),
        }
    }

    /// Whether the head message can be split at `T`. `stream_start_offset` is
    /// the tick immediately preceding the first sample/frame this message
    /// covers.
    #[must_use]
    pub fn can_slice_at(&self, t: Tick, stream_start_offset: Tick) -> bool {
        let _ = stream_start_offset;
        match self {
            Self::Audio(m) => {
                let tps = m.ticks_per_sample.round() as i64;
                if tps <= 0 {
                    return m.time == t;
                }
                let delta = m.time as i64 - t as i64;
                delta % tps == 0
            }
            Self::Features(m) => m.timestamps.binary_search(&t).is_ok(),
            Self::ConversationState(_) | Self::Matrix(_) => true,
            Self::Nbest(m) => m.time == t,
            Self::Binary(m) => m.time == t,
            Self::Json(m) => m.time == t,
        }
    }

    /// Splits the message at `T`, mutating `self` in place to become the
    /// retained remainder (when applicable) and returning the slice to
    /// publish plus whether the caller should drop `self` from its queue.
    ///
    /// Pre: `can_slice_at(t, stream_start_offset)`.
    pub fn slice_out(&mut self, t: Tick, stream_start_offset: Tick) -> Result<SliceOutcome, CadenceError> {
        match self {
            Self::Audio(m) => {
                if m.time == t {
                    return Ok(SliceOutcome {
                        slice: Self::Audio(m.clone()),
                        head_consumed: true,
                    });
                }
                let msg_len = m.time.saturating_sub(stream_start_offset);
                let to_slice = t.saturating_sub(stream_start_offset);
                if msg_len == 0 {
                    return Err(CadenceError::contract("Audio", "cannot slice a zero-length message"));
                }
                #[allow(clippy::cast_precision_loss)]
                let n = ((to_slice as f64 / msg_len as f64) * m.samples.len() as f64).round() as usize;
                let n = n.min(m.samples.len());
                let slice_samples: Vec<f32> = m.samples[..n].to_vec();
                let remainder: Vec<f32> = m.samples[n..].to_vec();
                let slice = Self::Audio(AudioMsg {
                    time: t,
                    samples: Arc::new(slice_samples),
                    sample_rate: m.sample_rate,
                    ticks_per_sample: m.ticks_per_sample,
                    descriptors: m.descriptors.clone(),
                });
                m.samples = Arc::new(remainder);
                Ok(SliceOutcome {
                    slice,
                    head_consumed: false,
                })
            }
            Self::Features(m) => {
                let idx = m
                    .timestamps
                    .binary_search(&t)
                    .map_err(|_| CadenceError::contract("Features", format!("{t} is not a slice boundary")))?;
                let k = idx + 1;
                let slice = Self::Features(FeaturesMsg {
                    time: t,
                    utterance_id: m.utterance_id.clone(),
                    matrix: m.matrix.cols_range(0, k),
                    feature_names: m.feature_names.clone(),
                    timestamps: m.timestamps[..k].to_vec(),
                    descriptors: m.descriptors.clone(),
                });
                let remaining_cols = m.matrix.cols - k;
                m.matrix = m.matrix.cols_range(k, m.matrix.cols);
                m.timestamps.drain(..k);
                Ok(SliceOutcome {
                    slice,
                    head_consumed: remaining_cols == 0,
                })
            }
            Self::ConversationState(m) => {
                if m.time == t {
                    return Ok(SliceOutcome {
                        slice: Self::ConversationState(m.clone()),
                        head_consumed: true,
                    });
                }
                let synthesized = ConversationStateMsg {
                    time: t,
                    utterance_id: m.utterance_id.clone(),
                    last_chunk_in_utt: false,
                    convo_id: m.convo_id.clone(),
                    last_chunk_in_convo: false,
                };
                Ok(SliceOutcome {
                    slice: Self::ConversationState(synthesized),
                    head_consumed: false,
                })
            }
            Self::Matrix(m) => {
                if m.time == t {
                    return Ok(SliceOutcome {
                        slice: Self::Matrix(m.clone()),
                        head_consumed: true,
                    });
                }
                let mut retimed = m.clone();
                retimed.time = t;
                Ok(SliceOutcome {
                    slice: Self::Matrix(retimed),
                    head_consumed: false,
                })
            }
            Self::Nbest(m) => {
                if m.time != t {
                    return Err(CadenceError::contract("Nbest", format!("{t} is not this message's end time")));
                }
                Ok(SliceOutcome {
                    slice: Self::Nbest(m.clone()),
                    head_consumed: true,
                })
            }
            Self::Binary(m) => {
                if m.time != t {
                    return Err(CadenceError::contract("Binary", format!("{t} is not this message's end time")));
                }
                Ok(SliceOutcome {
                    slice: Self::Binary(m.clone()),
                    head_consumed: true,
                })
            }
            Self::Json(m) => {
                if m.time != t {
                    return Err(CadenceError::contract("Json", format!("{t} is not this message's end time")));
                }
                Ok(SliceOutcome {
                    slice: Self::Json(m.clone()),
                    head_consumed: true,
                })
            }
        }
    }

    /// Shifts `t` and any embedded per-element timestamps by `delta`. Other
    /// fields are untouched.
    pub fn shift_in_time(&mut self, delta: i64) {
        fn shift(t: Tick, delta: i64) -> Tick {
            (i64::try_from(t).unwrap_or(i64::MAX) + delta).max(0) as Tick
        }
        match self {
            Self::ConversationState(m) => m.time = shift(m.time, delta),
            Self::Audio(m) => m.time = shift(m.time, delta),
            Self::Features(m) => {
                m.time = shift(m.time, delta);
                for ts in &mut m.timestamps {
                    *ts = shift(*ts, delta);
                }
            }
            Self::Matrix(m) => m.time = shift(m.time, delta),
            Self::Nbest(m) => {
                m.time = shift(m.time, delta);
                for entry in &mut m.entries {
                    for a in &mut entry.alignment {
                        *a = shift(*a, delta);
                    }
                }
            }
            Self::TimeMap(m) => m.time = shift(m.time, delta),
            Self::Binary(m) => m.time = shift(m.time, delta),
            Self::Json(m) => m.time = shift(m.time, delta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn s1_audio_merge() {
        let mut head = audio(100, &[1.0, 2.0, 3.0, 4.0]);
        let tail = audio(200, &[5.0, 6.0, 7.0, 8.0]);
        let rejected = head.merge_with(tail).unwrap();
        assert!(rejected.is_none());
        match &head {
            Message::Audio(m) => {
                assert_eq!(m.time, 200);
                assert_eq!(*m.samples, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn s2_audio_slice() {
        let mut head = audio(100, &[1.0, 2.0, 3.0, 4.0]);
        let tail = audio(200, &[5.0, 6.0, 7.0, 8.0]);
        head.merge_with(tail).unwrap();
        assert!(head.can_slice_at(100, 0));
        let outcome = head.slice_out(100, 0).unwrap();
        assert!(!outcome.head_consumed);
        match &outcome.slice {
            Message::Audio(m) => {
                assert_eq!(m.time, 100);
                assert_eq!(*m.samples, vec![1.0, 2.0, 3.0, 4.0]);
            }
            _ => unreachable!(),
        }
        match &head {
            Message::Audio(m) => {
                assert_eq!(m.time, 200);
                assert_eq!(*m.samples, vec![5.0, 6.0, 7.0, 8.0]);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn s3_features_slice_internal_timestamp() {
        let matrix = FrameMatrix {
            rows: 1,
            cols: 3,
            data: vec![0.0, 1.0, 2.0],
        };
        let mut head = Message::Features(FeaturesMsg {
            time: 30,
            utterance_id: "u1".into(),
            matrix,
            feature_names: "f".into(),
            timestamps: vec![10, 20, 30],
            descriptors: Descriptors::new(),
        });
        assert!(head.can_slice_at(20, 0));
        let outcome = head.slice_out(20, 0).unwrap();
        assert!(!outcome.head_consumed);
        match &outcome.slice {
            Message::Features(m) => {
                assert_eq!(m.matrix.cols, 2);
                assert_eq!(m.timestamps, vec![10, 20]);
            }
            _ => unreachable!(),
        }
        match &head {
            Message::Features(m) => {
                assert_eq!(m.matrix.cols, 1);
                assert_eq!(m.timestamps, vec![30]);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn s4_conversation_state_synthesize() {
        let mut head = Message::ConversationState(
            ConversationStateMsg::new(100, "A", false, "X", false).unwrap(),
        );
        let outcome = head.slice_out(70, 0).unwrap();
        assert!(!outcome.head_consumed);
        match outcome.slice {
            Message::ConversationState(m) => {
                assert_eq!(m.time, 70);
                assert_eq!(&*m.utterance_id, "A");
                assert!(!m.last_chunk_in_utt);
                assert!(!m.last_chunk_in_convo);
            }
            _ => unreachable!(),
        }
        match head {
            Message::ConversationState(m) => assert_eq!(m.time, 100),
            _ => unreachable!(),
        }
    }

    #[test]
    fn conversation_state_invariant_enforced() {
        assert!(ConversationStateMsg::new(10, "A", false, "X", true).is_err());
    }

    #[test]
    fn conversation_state_merge_fatal_on_unchanged_id_after_close() {
        let mut head = Message::ConversationState(
            ConversationStateMsg::new(10, "A", true, "X", false).unwrap(),
        );
        let tail = Message::ConversationState(
            ConversationStateMsg::new(20, "A", false, "X", false).unwrap(),
        );
        assert!(head.merge_with(tail).is_err());
    }

    #[test]
    fn matrix_slice_does_not_consume_head_unless_exact() {
        let mut head = Message::Matrix(MatrixMsg {
            time: 50,
            matrix: FrameMatrix::new(2, 2),
        });
        let outcome = head.slice_out(40, 0).unwrap();
        assert!(!outcome.head_consumed);
        assert_eq!(outcome.slice.time(), 40);
        assert_eq!(head.time(), 50);

        let outcome = head.slice_out(50, 0).unwrap();
        assert!(outcome.head_consumed);
    }

    #[test]
    fn nbest_atomic_rejects_non_exact_slice() {
        let mut head = Message::Nbest(NbestMsg {
            time: 500,
            entries: vec![],
        });
        assert!(!head.can_slice_at(400, 0));
        assert!(head.slice_out(400, 0).is_err());
        assert!(head.slice_out(500, 0).is_ok());
    }

    #[test]
    fn shift_idempotence() {
        let mut a = audio(100, &[1.0, 2.0]);
        let mut b = a.clone();
        a.shift_in_time(5);
        a.shift_in_time(7);
        b.shift_in_time(12);
        assert_eq!(a.time(), b.time());
    }
}
