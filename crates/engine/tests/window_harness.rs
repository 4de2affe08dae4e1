// SPDX-FileCopyrightText: © 2025 Cadence Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! End-to-end test driving a `Window` through `ComponentHarness`: real
//! channels, a real background task, real aligned dispatch.
//!
//! Both chunks below land on the same `utterance_id`, so the harness's
//! opportunistic `merge_with` coalesces them into a single `Features`
//! message that only reaches the output channel once the input channels
//! close and the harness flushes on shutdown.

use std::sync::Arc;

use cadence_core::{AudioMsg, ConversationStateMsg, Descriptors, Message};
use cadence_engine::ComponentHarness;
use cadence_nodes::window::Window;
use tokio::sync::mpsc;

#[tokio::test]
async fn window_harness_frames_two_chunks_end_to_end() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let window = Window::new(Some(&serde_json::json!({
        "low_latency": false,
        "sampling_frequency": 16000.0,
        "analysis_frame_size": 25.0,
        "analysis_frame_step_size": 10.0,
        "windowing_function": "hamming",
    })))
    .unwrap();

    let (cs_tx, cs_rx) = mpsc::channel(8);
    let (audio_tx, audio_rx) = mpsc::channel(8);
    let (windowed_tx, mut windowed_rx) = mpsc::channel(8);

    let mut inputs = cadence_engine::Inputs::new();
    inputs.insert("conversation_state", cs_rx);
    inputs.insert("streamed_audio", audio_rx);
    let mut outputs = cadence_engine::Outputs::new();
    outputs.insert("windowed_audio", windowed_tx);

    let harness = ComponentHarness::new(window, inputs, outputs).unwrap();
    let run_handle = tokio::spawn(harness.run());

    cs_tx.send(Message::ConversationState(ConversationStateMsg::new(1600, "u1", false, "c1", false).unwrap()))
        .await
        .unwrap();
    audio_tx
        .send(Message::Audio(AudioMsg {
            time: 1600,
            samples: Arc::new(vec![0.0f32; 1600]),
            sample_rate: 16000.0,
            ticks_per_sample: 1.0,
            descriptors: Descriptors::new(),
        }))
        .await
        .unwrap();

    cs_tx.send(Message::ConversationState(ConversationStateMsg::new(2000, "u1", true, "c1", true).unwrap()))
        .await
        .unwrap();
    audio_tx
        .send(Message::Audio(AudioMsg {
            time: 2000,
            samples: Arc::new(vec![0.0f32; 200]),
            sample_rate: 16000.0,
            ticks_per_sample: 1.0,
            descriptors: Descriptors::new(),
        }))
        .await
        .unwrap();

    drop(cs_tx);
    drop(audio_tx);
    run_handle.await.unwrap().unwrap();

    let merged = windowed_rx.recv().await.unwrap();
    let Message::Features(merged) = merged else { panic!("expected Features") };
    assert_eq!(merged.matrix.cols, 11);
    assert_eq!(merged.timestamps.len(), 11);
    assert_eq!(*merged.timestamps.last().unwrap(), 2000);
    assert!(windowed_rx.recv().await.is_none());
}
