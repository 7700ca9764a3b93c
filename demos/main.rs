//! Drives a `PipelineOrchestrator` with a scripted ASR transport and a
//! canned translation model, printing every outbound event as it fires.
//!
//! Run with `cargo run --bin demo`.

use std::sync::Arc;
use std::time::Duration;

use lingorelay::asr::transport::mock::MockTransport;
use lingorelay::asr::types::{AsrConnectOptions, ProviderEvent};
use lingorelay::llm::mock::MockModel;
use lingorelay::{PipelineConfig, PipelineOrchestrator};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let model = Arc::new(MockModel::new(vec!["Bon", "jour", " le monde"]));
    let (orchestrator, mut events) = PipelineOrchestrator::new(PipelineConfig::default(), model);

    tokio::spawn(async move {
        while let Some(envelope) = events.recv().await {
            println!("{}", serde_json::to_string(&envelope).unwrap_or_default());
        }
    });

    let transport = MockTransport::new();
    let scripted = transport.events_tx.clone();

    let options = AsrConnectOptions {
        model: "demo-model".into(),
        language: "en".into(),
        sample_rate: 16_000,
        channels: 1,
        interim_results: true,
        endpointing_ms: 300,
        utterance_end_ms: 1_000,
        smart_format: true,
        encoding: "linear16",
        bearer_token: "demo-token".into(),
    };

    orchestrator
        .start_listening(Box::new(transport), options, "en".into(), "fr".into(), "demo-correlation".into())
        .await
        .expect("start_listening");

    let _ = scripted.send(ProviderEvent::Interim {
        text: "hello".into(),
        confidence: Some(0.8),
        start_ms: Some(0),
        end_ms: Some(200),
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    let _ = scripted.send(ProviderEvent::Final {
        text: "Hello, world.".into(),
        confidence: Some(0.95),
        start_ms: Some(0),
        end_ms: Some(400),
    });

    tokio::time::sleep(Duration::from_millis(500)).await;

    orchestrator.stop_listening().await.expect("stop_listening");

    let report = orchestrator.generate_final_report().await.expect("final report");
    println!("--- final report ---\n{report}");
}
