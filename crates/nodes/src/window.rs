// SPDX-FileCopyrightText: © 2025 Cadence Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The Window: chops an incoming audio stream into overlapping, windowed
//! analysis frames (a `Features` message per aligned block).

use std::f64::consts::PI;
use std::sync::Arc;

use cadence_core::{
    CadenceError, Descriptors, FeaturesMsg, FrameMatrix, LoopProcessor, Message, MessageBlock, OutputBatch, SlotName,
    Tick,
};
use serde::Deserialize;

use crate::config_helpers;

const SLOT_CONVERSATION_STATE: SlotName = "conversation_state";
const SLOT_STREAMED_AUDIO: SlotName = "streamed_audio";
const SLOT_WINDOWED_AUDIO: SlotName = "windowed_audio";

const REQUIRED_INPUTS: [SlotName; 2] = [SLOT_CONVERSATION_STATE, SLOT_STREAMED_AUDIO];
const OUTPUT_SLOTS: [SlotName; 1] = [SLOT_WINDOWED_AUDIO];

#[derive(Debug, Deserialize)]
struct WindowConfig {
    low_latency: bool,
    sampling_frequency: f32,
    analysis_frame_size: f32,
    analysis_frame_step_size: f32,
    windowing_function: String,
}

pub struct Window {
    sampling_frequency: f32,
    low_latency: bool,
    window_size: usize,
    step_size: usize,
    coefficients: Vec<f32>,
    accum_audio: Vec<f32>,
    process_ptr: i64,
    accum_offset_in_utt: i64,
    utt_start_stream_offset: Tick,
}

impl Window {
    /// # Errors
    ///
    /// Returns `CadenceError::Configuration` if any required field is
    /// missing, `windowing_function` is unrecognized, or the derived window
    /// or step size is zero.
    pub fn new(params: Option<&serde_json::Value>) -> Result<Self, CadenceError> {
        let config: WindowConfig = config_helpers::parse_config_required(params, "Window")?;

        let window_size = (0.001 * f64::from(config.sampling_frequency) * f64::from(config.analysis_frame_size))
            .round() as usize;
        let step_size = (0.001 * f64::from(config.sampling_frequency) * f64::from(config.analysis_frame_step_size))
            .round() as usize;
        if window_size == 0 || step_size == 0 {
            return Err(CadenceError::Configuration(
                "analysis_frame_size / analysis_frame_step_size must yield a positive number of samples".into(),
            ));
        }

        let coefficients = match config.windowing_function.as_str() {
            "hamming" => hamming_coefficients(window_size),
            "rectangle" => vec![1.0; window_size],
            other => return Err(CadenceError::Configuration(format!("unknown windowing_function '{other}'"))),
        };

        Ok(Self {
            sampling_frequency: config.sampling_frequency,
            low_latency: config.low_latency,
            window_size,
            step_size,
            coefficients,
            accum_audio: Vec::new(),
            process_ptr: -1,
            accum_offset_in_utt: 0,
            utt_start_stream_offset: 0,
        })
    }

    fn reset_for_next_utterance(&mut self, last_published_time: Tick) {
        self.utt_start_stream_offset = last_published_time + 1;
        self.process_ptr = -1;
        self.accum_offset_in_utt = 0;
        self.accum_audio.clear();
    }

    /// Extracts the `window_size`-long frame ending at the current
    /// `process_ptr`, left-zero-padded when fewer than `window_size` samples
    /// are available, then subtracts the frame's own mean and applies the
    /// windowing coefficients.
    fn pickup_frame(&self) -> Vec<f32> {
        let pickup_start = (self.process_ptr - self.window_size as i64 + 1).max(0);
        let pickup_size = (self.process_ptr - pickup_start + 1) as usize;
        let mut frame = vec![0.0f32; self.window_size];
        let tail_start = self.window_size - pickup_size;
        frame[tail_start..].copy_from_slice(&self.accum_audio[pickup_start as usize..pickup_start as usize + pickup_size]);

        #[allow(clippy::cast_precision_loss)]
        let mean = frame.iter().sum::<f32>() / self.window_size as f32;
        for (v, w) in frame.iter_mut().zip(self.coefficients.iter()) {
            *v = (*v - mean) * w;
        }
        frame
    }

    fn frame_timestamp(&self, ticks_per_sample: f64) -> Tick {
        let sample_index = self.process_ptr + self.accum_offset_in_utt;
        #[allow(clippy::cast_possible_truncation)]
        let shift = (ticks_per_sample * sample_index as f64).round() as i64;
        (self.utt_start_stream_offset as i64 + shift).max(0) as Tick
    }
}

fn hamming_coefficients(window_size: usize) -> Vec<f32> {
    if window_size == 1 {
        return vec![1.0];
    }
    (0..window_size)
        .map(|idx| (0.54 - 0.46 * (2.0 * PI * idx as f64 / (window_size - 1) as f64).cos()) as f32)
        .collect()
}

impl LoopProcessor for Window {
    fn required_inputs(&self) -> &'static [SlotName] {
        &REQUIRED_INPUTS
    }

    fn clock_slot(&self) -> SlotName {
        SLOT_CONVERSATION_STATE
    }

    fn output_slots(&self) -> &'static [SlotName] {
        &OUTPUT_SLOTS
    }

    fn process_message(&mut self, block: MessageBlock, out: &mut OutputBatch) -> Result<(), CadenceError> {
        let cs = match block.get(SLOT_CONVERSATION_STATE) {
            Some(Message::ConversationState(m)) => m.clone(),
            _ => return Err(CadenceError::contract("Window", "conversation_state slot missing or wrong kind")),
        };
        let audio = match block.get(SLOT_STREAMED_AUDIO) {
            Some(Message::Audio(m)) => m.clone(),
            _ => return Err(CadenceError::contract("Window", "streamed_audio slot missing or wrong kind")),
        };

        if self.low_latency && cs.last_chunk_in_utt {
            return Err(CadenceError::contract("Window", "low_latency mode cannot process a closing utterance"));
        }
        if (audio.sample_rate - self.sampling_frequency).abs() > f32::EPSILON {
            return Err(CadenceError::contract(
                "Window",
                format!("expected sample rate {}, got {}", self.sampling_frequency, audio.sample_rate),
            ));
        }

        self.accum_audio.extend_from_slice(&audio.samples);

        let hold_off = if self.low_latency || cs.last_chunk_in_utt { 0 } else { self.step_size };
        let ticks_per_sample = f64::from(audio.ticks_per_sample);

        let mut timestamps: Vec<Tick> = Vec::new();
        let mut frames: Vec<Vec<f32>> = Vec::new();
        while (self.process_ptr + self.step_size as i64) < (self.accum_audio.len() as i64 - hold_off as i64) {
            self.process_ptr += self.step_size as i64;
            frames.push(self.pickup_frame());
            timestamps.push(self.frame_timestamp(ticks_per_sample));
        }

        if frames.is_empty() && !cs.last_chunk_in_utt {
            return Ok(());
        }

        if cs.last_chunk_in_utt {
            if let Some(last) = timestamps.last_mut() {
                *last = cs.time;
            }
        }

        // An utterance can close exactly on a prior frame boundary, leaving
        // nothing new to frame; there is then no frame to retag with cs.time,
        // so just reset for the next utterance without publishing.
        if frames.is_empty() {
            self.reset_for_next_utterance(cs.time);
            return Ok(());
        }

        let n_frames = frames.len();
        let mut matrix = FrameMatrix::new(self.window_size, n_frames);
        for (i, frame) in frames.into_iter().enumerate() {
            matrix.col_mut(i).copy_from_slice(&frame);
        }

        let mut descriptors = Descriptors::new();
        if let Some(stretch) = audio.descriptors.get("vtl_stretch") {
            descriptors.insert("vtl_stretch", stretch.to_string());
        }

        let last_time = *timestamps.last().expect("non-empty frames implies non-empty timestamps");
        let feature_names: Arc<str> = format!("WINAUDIO[0:{}]%f", self.window_size - 1).into();

        out.push(
            SLOT_WINDOWED_AUDIO,
            Message::Features(FeaturesMsg {
                time: last_time,
                utterance_id: cs.utterance_id.clone(),
                matrix,
                feature_names,
                timestamps,
                descriptors,
            }),
        );

        #[allow(clippy::cast_possible_wrap)]
        let frames_to_remove = n_frames as i64 - (self.window_size / self.step_size) as i64 - 1;
        if frames_to_remove > 0 {
            let remove_samples = (frames_to_remove as usize * self.step_size).min(self.accum_audio.len());
            self.accum_audio.drain(..remove_samples);
            self.accum_offset_in_utt += frames_to_remove * self.step_size as i64;
            self.process_ptr -= frames_to_remove * self.step_size as i64;
        }

        if cs.last_chunk_in_utt {
            self.reset_for_next_utterance(last_time);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{AudioMsg, ConversationStateMsg};

    fn window(sr: f32, frame_ms: f32, step_ms: f32, low_latency: bool) -> Window {
        Window::new(Some(&serde_json::json!({
            "low_latency": low_latency,
            "sampling_frequency": sr,
            "analysis_frame_size": frame_ms,
            "analysis_frame_step_size": step_ms,
            "windowing_function": "rectangle",
        })))
        .unwrap()
    }

    fn block(time: Tick, last_utt: bool, samples: Vec<f32>, sr: f32) -> MessageBlock {
        let mut b = MessageBlock::new();
        b.insert(
            "conversation_state",
            Message::ConversationState(ConversationStateMsg::new(time, "u1", last_utt, "c1", last_utt).unwrap()),
        );
        b.insert(
            "streamed_audio",
            Message::Audio(AudioMsg {
                time,
                samples: Arc::new(samples),
                sample_rate: sr,
                ticks_per_sample: 1.0,
                descriptors: Descriptors::new(),
            }),
        );
        b
    }

    #[test]
    fn s6_window_frame_count() {
        let mut win = window(16000.0, 25.0, 10.0, true);
        assert_eq!(win.window_size, 400);
        assert_eq!(win.step_size, 160);

        let mut out = OutputBatch::new();
        let samples = vec![0.0f32; 1600];
        win.process_message(block(1600, false, samples, 16000.0), &mut out).unwrap();

        let pushed = out.drain();
        assert_eq!(pushed.len(), 1);
        match &pushed[0].1 {
            Message::Features(m) => {
                assert_eq!(m.matrix.cols, 10);
                assert_eq!(m.timestamps.len(), 10);
                // process_ptr starts at -1, so the k-th frame's raw pointer is
                // 160*k - 1, one tick behind the round-number boundary.
                for (k, ts) in m.timestamps.iter().enumerate() {
                    assert_eq!(*ts, 160 * (k as Tick + 1) - 1);
                }
            }
            _ => unreachable!(),
        }
        assert_eq!(win.process_ptr, 1599);
    }

    #[test]
    fn last_chunk_retags_final_timestamp_and_resets_state() {
        let mut win = window(16000.0, 25.0, 10.0, false);
        let mut out = OutputBatch::new();
        win.process_message(block(999, true, vec![0.0f32; 500], 16000.0), &mut out)
            .unwrap();

        let pushed = out.drain();
        match &pushed[0].1 {
            Message::Features(m) => {
                assert_eq!(*m.timestamps.last().unwrap(), 999);
            }
            _ => unreachable!(),
        }
        assert_eq!(win.process_ptr, -1);
        assert_eq!(win.accum_offset_in_utt, 0);
        assert!(win.accum_audio.is_empty());
    }

    #[test]
    fn low_latency_and_last_chunk_in_utt_is_fatal() {
        let mut win = window(16000.0, 25.0, 10.0, true);
        let mut out = OutputBatch::new();
        let err = win.process_message(block(999, true, vec![0.0f32; 500], 16000.0), &mut out);
        assert!(err.is_err());
    }

    #[test]
    fn vtl_stretch_descriptor_propagates() {
        let mut win = window(16000.0, 25.0, 10.0, true);
        let mut out = OutputBatch::new();
        let mut b = MessageBlock::new();
        b.insert(
            "conversation_state",
            Message::ConversationState(ConversationStateMsg::new(1600, "u1", false, "c1", false).unwrap()),
        );
        let mut descriptors = Descriptors::new();
        descriptors.insert("vtl_stretch", "1.05");
        b.insert(
            "streamed_audio",
            Message::Audio(AudioMsg {
                time: 1600,
                samples: Arc::new(vec![0.0f32; 1600]),
                sample_rate: 16000.0,
                ticks_per_sample: 1.0,
                descriptors,
            }),
        );
        win.process_message(b, &mut out).unwrap();
        let pushed = out.drain();
        match &pushed[0].1 {
            Message::Features(m) => assert_eq!(m.descriptors.get("vtl_stretch"), Some("1.05")),
            _ => unreachable!(),
        }
    }

    #[test]
    fn hamming_window_is_per_sample_not_constant() {
        let coeffs = hamming_coefficients(400);
        assert_ne!(coeffs[0], coeffs[200]);
        assert!((coeffs[0] - 0.08).abs() < 0.01);
    }
}
