//! Test doubles and fixtures shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use autolist_ai::models::{CarIdentity, PhotoRecommendations};
use autolist_ai::pricing::PriceEstimator;
use autolist_ai::types::{
    AgentError, ClassificationReport, CompletionRequest, DescriptionRequest, DescriptionWriter,
    GenerationCatalog, ImageEditRequest, ImageEditor, ImageSet, PerceptionReport, PhotoAdvisor,
    TextGenerator, VehicleClassifier, VisualInspector,
};
use autolist_ai::workflow::AnalysisOrchestrator;
use autolist_common::config::PricingConfig;
use serde_json::{json, Value};
use tokio::sync::Barrier;

/// Ordered record of what the stubs did
pub type EventLog = Arc<Mutex<Vec<&'static str>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

// ============================================================================
// Phase-1 stubs
// ============================================================================

pub struct StubInspector {
    reply: Result<PerceptionReport, AgentError>,
    gate: Option<Arc<Barrier>>,
    panics: bool,
    log: EventLog,
}

impl StubInspector {
    pub fn new(reply: Result<PerceptionReport, AgentError>) -> Self {
        Self {
            reply,
            gate: None,
            panics: false,
            log: event_log(),
        }
    }

    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::new(Ok(PerceptionReport::default()))
        }
    }

    pub fn with_gate(mut self, gate: Arc<Barrier>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }
}

#[async_trait::async_trait]
impl VisualInspector for StubInspector {
    fn name(&self) -> &'static str {
        "StubInspector"
    }

    async fn inspect(&self, _images: ImageSet) -> Result<PerceptionReport, AgentError> {
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        if self.panics {
            panic!("inspector crashed");
        }
        tokio::task::yield_now().await;
        self.log.lock().unwrap().push("inspect:end");
        self.reply.clone()
    }
}

pub struct StubClassifier {
    reply: Result<ClassificationReport, AgentError>,
    gate: Option<Arc<Barrier>>,
    log: EventLog,
}

impl StubClassifier {
    pub fn new(reply: Result<ClassificationReport, AgentError>) -> Self {
        Self {
            reply,
            gate: None,
            log: event_log(),
        }
    }

    pub fn with_gate(mut self, gate: Arc<Barrier>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }
}

#[async_trait::async_trait]
impl VehicleClassifier for StubClassifier {
    fn name(&self) -> &'static str {
        "StubClassifier"
    }

    async fn classify(&self, _images: ImageSet) -> Result<ClassificationReport, AgentError> {
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        tokio::task::yield_now().await;
        self.log.lock().unwrap().push("classify:end");
        self.reply.clone()
    }
}

// ============================================================================
// Phase-2 stubs
// ============================================================================

pub struct StubWriter {
    reply: Result<String, AgentError>,
    panics: bool,
    log: EventLog,
    requests: Mutex<Vec<DescriptionRequest>>,
}

impl StubWriter {
    pub fn new(reply: Result<String, AgentError>) -> Self {
        Self {
            reply,
            panics: false,
            log: event_log(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::new(Ok(text.to_string()))
    }

    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::text("")
        }
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }

    pub fn requests(&self) -> Vec<DescriptionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DescriptionWriter for StubWriter {
    fn name(&self) -> &'static str {
        "StubWriter"
    }

    async fn describe(&self, request: DescriptionRequest) -> Result<String, AgentError> {
        self.log.lock().unwrap().push("describe:start");
        if self.panics {
            panic!("writer crashed");
        }
        self.requests.lock().unwrap().push(request);
        self.reply.clone()
    }
}

/// Text generator replaying canned replies in order
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, AgentError>>>,
    calls: AtomicUsize,
    temperatures: Mutex<Vec<Option<f32>>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<String, AgentError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            temperatures: Mutex::new(Vec::new()),
        })
    }

    pub fn silent() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn temperatures(&self) -> Vec<Option<f32>> {
        self.temperatures.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &'static str {
        "ScriptedGenerator"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.temperatures.lock().unwrap().push(request.temperature);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::Network("script exhausted".to_string())))
    }
}

// ============================================================================
// Advisor stubs
// ============================================================================

pub struct StubAdvisor {
    reply: Result<PhotoRecommendations, AgentError>,
    calls: AtomicUsize,
}

impl StubAdvisor {
    pub fn new(reply: Result<PhotoRecommendations, AgentError>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PhotoAdvisor for StubAdvisor {
    fn name(&self) -> &'static str {
        "StubAdvisor"
    }

    async fn recommend(
        &self,
        _images: ImageSet,
        _car_context: Option<String>,
    ) -> Result<PhotoRecommendations, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

pub struct StubCatalog {
    reply: Result<Vec<String>, AgentError>,
    calls: AtomicUsize,
}

impl StubCatalog {
    pub fn new(reply: Result<Vec<String>, AgentError>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GenerationCatalog for StubCatalog {
    fn name(&self) -> &'static str {
        "StubCatalog"
    }

    async fn generations(&self, _brand: &str, _model: &str) -> Result<Vec<String>, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

/// Image editor returning a canned base64 result
pub struct StubEditor {
    reply: Result<String, AgentError>,
    requests: Mutex<Vec<ImageEditRequest>>,
}

impl StubEditor {
    pub fn new(reply: Result<String, AgentError>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ImageEditRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ImageEditor for StubEditor {
    fn name(&self) -> &'static str {
        "StubEditor"
    }

    async fn edit(&self, request: ImageEditRequest) -> Result<String, AgentError> {
        self.requests.lock().unwrap().push(request);
        self.reply.clone()
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn orchestrator(
    inspector: StubInspector,
    classifier: StubClassifier,
    writer: Arc<StubWriter>,
    generator: Arc<ScriptedGenerator>,
) -> AnalysisOrchestrator {
    AnalysisOrchestrator::from_parts(
        Arc::new(inspector),
        Arc::new(classifier),
        writer,
        PriceEstimator::new(generator, &PricingConfig::default()),
    )
}

pub fn clean_perception() -> PerceptionReport {
    PerceptionReport::from_value(json!({
        "visual_condition_score": 0.82,
        "inspection_reliability_score": 0.9,
        "damage_flag": "не битый",
        "defects": [
            {"type": "царапина", "severity": "слабая", "location": "задний бампер"}
        ],
        "raw_text_description": "Белый седан в хорошем состоянии."
    }))
    .unwrap()
}

pub fn camry_classification() -> ClassificationReport {
    serde_json::from_value(json!({
        "brand": "Toyota",
        "model": "Camry",
        "body_type": "sedan",
        "color": "white",
        "steering_wheel_position": "left",
        "transmission": "automatic",
        "status": "success",
        "classification_confidence": {"category": "high", "subcategory": "high"}
    }))
    .unwrap()
}

/// Identity with every pricing field filled
pub fn camry_identity() -> CarIdentity {
    CarIdentity {
        brand: "Toyota".to_string(),
        model: "Camry".to_string(),
        year: Some(2018),
        body_type: "sedan".to_string(),
        color: "white".to_string(),
        steering_wheel_position: "left".to_string(),
        engine_capacity: Some(2.5),
        transmission: "automatic".to_string(),
        drive_type: "fwd".to_string(),
        mileage: Some(85_000),
        damage_flag: "не битый".to_string(),
        ..CarIdentity::default()
    }
}

/// Small valid PNG photo
pub fn tiny_png() -> Vec<u8> {
    let mut out = Vec::new();
    image::RgbImage::from_pixel(8, 6, image::Rgb([240, 240, 240]))
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

/// One synthetic Camry listing with a deterministic price
pub fn camry_row(i: usize) -> Value {
    let year = 2012 + (i % 11) as i64;
    let mileage = 20_000 + ((i * 37) % 180) as i64 * 1_000;
    let damaged = i % 7 == 0;
    let color = ["white", "black", "silver"][i % 3];
    let price = 900_000 + (year - 2012) * 180_000 - mileage * 2 - if damaged { 250_000 } else { 0 };
    json!({
        "brand": "Toyota",
        "model": "Camry",
        "body_type": "sedan",
        "color": color,
        "steering_wheel_position": "left",
        "year": year,
        "engine_capacity": if i % 2 == 0 { 2.5 } else { 3.5 },
        "transmission": "automatic",
        "drive_type": "fwd",
        "mileage": mileage,
        "damage_flag": if damaged { "битый" } else { "не битый" },
        "visual_condition_score": 0.8,
        "inspection_reliability_score": 0.7,
        "defects_cnt": 1,
        "defects_severity_weak_cnt": 1,
        "defects_severity_moderate_cnt": 0,
        "defects_severity_strong_cnt": 0,
        "price": price
    })
}

/// Generator reply carrying `n` Camry rows, fenced the way chat models do
pub fn camry_reply(n: usize) -> String {
    let rows: Vec<Value> = (0..n).map(camry_row).collect();
    format!("```json\n{}\n```", Value::Array(rows))
}
