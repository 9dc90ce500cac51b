//! Two-phase orchestration tests
//!
//! Stub agents stand in for the remote services so status precedence,
//! phase ordering and fault handling can be checked deterministically.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use autolist_ai::models::{AnalysisStatus, ConfidenceLevel, DAMAGE_UNDETERMINED};
use autolist_ai::types::{AgentError, ImageSet, PerceptionReport};
use helpers::*;
use serde_json::{json, Map};
use tokio::sync::Barrier;

fn images(n: usize) -> ImageSet {
    (0..n).map(|i| format!("aW1hZ2U{}", i)).collect()
}

fn position(log: &[&str], event: &str) -> usize {
    log.iter()
        .position(|e| *e == event)
        .unwrap_or_else(|| panic!("{} not in {:?}", event, log))
}

#[tokio::test]
async fn test_clean_analysis_is_ok() {
    let writer = Arc::new(StubWriter::text("Продаётся Toyota Camry в хорошем состоянии."));
    let generator = ScriptedGenerator::silent();
    let orchestrator = orchestrator(
        StubInspector::new(Ok(clean_perception())),
        StubClassifier::new(Ok(camry_classification())),
        writer.clone(),
        generator.clone(),
    );

    let response = orchestrator.analyze_encoded(images(2)).await;

    assert_eq!(response.status, AnalysisStatus::Ok);
    assert_eq!(response.car_identity.brand, "Toyota");
    assert_eq!(response.car_identity.year, None);
    assert_eq!(response.car_identity.damage_flag, "не битый");
    assert!(!response.technical_assumptions.accident_signs);
    assert_eq!(response.visual_condition.overall_score, 0.82);
    assert_eq!(response.visual_condition.defects.len(), 1);
    assert_eq!(
        response.generated_description,
        "Продаётся Toyota Camry в хорошем состоянии."
    );
    assert_eq!(response.vision_result["damage_flag"], json!("не битый"));

    // Year, engine, drive type and mileage are never visible in photos
    assert!(response.price_estimation.suggested_price.is_none());
    assert!(response.price_estimation.missing_fields.contains(&"mileage".to_string()));
    assert_eq!(generator.calls(), 0);
    assert_eq!(response.confidence_warnings.len(), 1);
    assert_eq!(response.confidence_warnings[0].field, "price_estimation");

    let requests = writer.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].images.len(), 2);
    assert_eq!(requests[0].details["brand"], json!("Toyota"));
    assert_eq!(requests[0].details["defects_cnt"], json!(1));
}

#[tokio::test]
async fn test_raw_bytes_are_base64_encoded() {
    let writer = Arc::new(StubWriter::text(""));
    let orchestrator = orchestrator(
        StubInspector::new(Ok(clean_perception())),
        StubClassifier::new(Ok(camry_classification())),
        writer.clone(),
        ScriptedGenerator::silent(),
    );

    orchestrator.analyze(vec![b"hello".to_vec()]).await;

    let requests = writer.requests();
    assert_eq!(&requests[0].images[..], &["aGVsbG8=".to_string()]);
}

#[tokio::test]
async fn test_rejection_phrase_needs_user_input() {
    let perception = PerceptionReport::from_value(json!({
        "raw_text_description": "На фото документ. Анализ невозможен."
    }))
    .unwrap();
    let orchestrator = orchestrator(
        StubInspector::new(Ok(perception)),
        StubClassifier::new(Ok(camry_classification())),
        Arc::new(StubWriter::text("")),
        ScriptedGenerator::silent(),
    );

    let response = orchestrator.analyze_encoded(images(1)).await;

    assert_eq!(response.status, AnalysisStatus::NeedsUserInput);
    assert_eq!(response.car_identity.damage_flag, DAMAGE_UNDETERMINED);
}

#[tokio::test]
async fn test_agent_error_outranks_rejection() {
    let perception = PerceptionReport::from_value(json!({
        "raw_text_description": "Изображение не содержит автомобиль"
    }))
    .unwrap();
    let writer = Arc::new(StubWriter::text("text"));
    let orchestrator = orchestrator(
        StubInspector::new(Ok(perception)),
        StubClassifier::new(Err(AgentError::Api {
            status: 500,
            message: "upstream".to_string(),
        })),
        writer.clone(),
        ScriptedGenerator::silent(),
    );

    let response = orchestrator.analyze_encoded(images(1)).await;

    assert_eq!(response.status, AnalysisStatus::Error);
    assert_eq!(response.car_identity.brand, "");
    let fields: Vec<&str> = response
        .confidence_warnings
        .iter()
        .map(|w| w.field.as_str())
        .collect();
    assert_eq!(fields, vec!["model", "price_estimation"]);
    // Phase 2 still runs on what phase 1 produced
    assert_eq!(writer.requests().len(), 1);
}

#[tokio::test]
async fn test_low_reliability_warns_about_visibility() {
    let perception = PerceptionReport::from_value(json!({
        "visual_condition_score": "0.6",
        "inspection_reliability_score": 0.35,
        "damage_flag": "битый"
    }))
    .unwrap();
    let orchestrator = orchestrator(
        StubInspector::new(Ok(perception)),
        StubClassifier::new(Ok(camry_classification())),
        Arc::new(StubWriter::text("")),
        ScriptedGenerator::silent(),
    );

    let response = orchestrator.analyze_encoded(images(1)).await;

    assert_eq!(response.status, AnalysisStatus::Ok);
    assert!(response.technical_assumptions.accident_signs);
    assert!(response
        .confidence_warnings
        .iter()
        .any(|w| w.field == "visual_condition" && w.confidence == ConfidenceLevel::Medium));
}

#[tokio::test]
async fn test_phase_one_agents_run_concurrently() {
    // Each agent waits for the other; sequential execution would deadlock
    let barrier = Arc::new(Barrier::new(2));
    let orchestrator = orchestrator(
        StubInspector::new(Ok(clean_perception())).with_gate(barrier.clone()),
        StubClassifier::new(Ok(camry_classification())).with_gate(barrier),
        Arc::new(StubWriter::text("")),
        ScriptedGenerator::silent(),
    );

    let response = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator.analyze_encoded(images(1)),
    )
    .await
    .expect("phase 1 agents did not run concurrently");

    assert_eq!(response.status, AnalysisStatus::Ok);
}

#[tokio::test]
async fn test_phase_two_starts_after_phase_one_joins() {
    let log = event_log();
    let orchestrator = orchestrator(
        StubInspector::new(Ok(clean_perception())).with_log(log.clone()),
        StubClassifier::new(Ok(camry_classification())).with_log(log.clone()),
        Arc::new(StubWriter::text("").with_log(log.clone())),
        ScriptedGenerator::silent(),
    );

    orchestrator.analyze_encoded(images(1)).await;

    let log = log.lock().unwrap().clone();
    let describe = position(&log, "describe:start");
    assert!(position(&log, "inspect:end") < describe);
    assert!(position(&log, "classify:end") < describe);
}

#[tokio::test]
async fn test_phase_one_panic_is_fatal() {
    let writer = Arc::new(StubWriter::text("never"));
    let orchestrator = orchestrator(
        StubInspector::panicking(),
        StubClassifier::new(Ok(camry_classification())),
        writer.clone(),
        ScriptedGenerator::silent(),
    );

    let response = orchestrator.analyze_encoded(images(1)).await;

    assert_eq!(response.status, AnalysisStatus::Error);
    assert_eq!(response.confidence_warnings.len(), 1);
    assert_eq!(response.confidence_warnings[0].field, "agents");
    assert!(response.generated_description.is_empty());
    assert!(writer.requests().is_empty());
}

#[tokio::test]
async fn test_phase_two_panic_degrades() {
    let orchestrator = orchestrator(
        StubInspector::new(Ok(clean_perception())),
        StubClassifier::new(Ok(camry_classification())),
        Arc::new(StubWriter::panicking()),
        ScriptedGenerator::silent(),
    );

    let response = orchestrator.analyze_encoded(images(1)).await;

    assert_eq!(response.status, AnalysisStatus::Ok);
    assert_eq!(response.car_identity.brand, "Toyota");
    assert!(response.generated_description.is_empty());
    assert!(response.price_estimation.suggested_price.is_none());
    assert!(response.price_estimation.missing_fields.is_empty());
    let message = response.price_estimation.error_message.unwrap_or_default();
    assert!(message.starts_with("price estimation task failed"), "{}", message);
}

#[tokio::test]
async fn test_description_failure_leaves_empty_text() {
    let orchestrator = orchestrator(
        StubInspector::new(Ok(clean_perception())),
        StubClassifier::new(Ok(camry_classification())),
        Arc::new(StubWriter::new(Err(AgentError::Network("timeout".to_string())))),
        ScriptedGenerator::silent(),
    );

    let response = orchestrator.analyze_encoded(images(1)).await;

    assert_eq!(response.status, AnalysisStatus::Ok);
    assert!(response.generated_description.is_empty());
}

#[tokio::test]
async fn test_no_images_needs_user_input() {
    let log = event_log();
    let orchestrator = orchestrator(
        StubInspector::new(Ok(clean_perception())).with_log(log.clone()),
        StubClassifier::new(Ok(camry_classification())).with_log(log.clone()),
        Arc::new(StubWriter::text("").with_log(log.clone())),
        ScriptedGenerator::silent(),
    );

    let response = orchestrator.analyze(Vec::new()).await;

    assert_eq!(response.status, AnalysisStatus::NeedsUserInput);
    assert_eq!(response.confidence_warnings[0].field, "images");
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_regenerate_merges_extra_params() {
    let writer = Arc::new(StubWriter::text("Новый текст"));
    let orchestrator = orchestrator(
        StubInspector::new(Ok(clean_perception())),
        StubClassifier::new(Ok(camry_classification())),
        writer.clone(),
        ScriptedGenerator::silent(),
    );
    let mut extra = Map::new();
    extra.insert("mileage".to_string(), json!(120000));
    extra.insert("color".to_string(), json!("red"));

    let text = orchestrator
        .regenerate_description(
            vec!["aGVsbG8=".to_string()],
            camry_identity(),
            json!({"damage_flag": "не битый"}),
            extra,
        )
        .await
        .unwrap();

    assert_eq!(text, "Новый текст");
    let request = &writer.requests()[0];
    assert_eq!(request.details["brand"], json!("Toyota"));
    assert_eq!(request.details["year"], json!(2018));
    assert_eq!(request.details["mileage"], json!(120000));
    assert_eq!(request.details["color"], json!("red"));
    assert_eq!(request.perception["damage_flag"], json!("не битый"));
    assert_eq!(request.images.len(), 1);
}

#[tokio::test]
async fn test_regenerate_propagates_agent_error() {
    let orchestrator = orchestrator(
        StubInspector::new(Ok(clean_perception())),
        StubClassifier::new(Ok(camry_classification())),
        Arc::new(StubWriter::new(Err(AgentError::NotConfigured(
            "OPENAI_API_KEY".to_string(),
        )))),
        ScriptedGenerator::silent(),
    );

    let result = orchestrator
        .regenerate_description(Vec::new(), camry_identity(), json!(null), Map::new())
        .await;

    assert!(matches!(result, Err(AgentError::NotConfigured(_))));
}
