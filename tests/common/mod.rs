#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use tokio::sync::Notify;

use nutrition_lens::{AppError, NutritionItem, PredictionResult, Predictor, Result, SelectedFile};

pub const MEAL_JSON: &str = r#"{"timestamp":"2024-01-01T00:00:00Z","original_image":"uploads/meal.jpg","categorized_image":"results/meal_out.jpg","items":"apple, rice","nutrition":[{"name":"calories","value":"350"},{"name":"protein","value":"12g"}]}"#;

pub fn meal_result() -> PredictionResult {
    PredictionResult {
        timestamp: "2024-01-01T00:00:00Z".into(),
        original_image: "uploads/meal.jpg".into(),
        categorized_image: "results/meal_out.jpg".into(),
        items: "apple, rice".into(),
        nutrition: vec![
            NutritionItem { name: "calories".into(), value: "350".into() },
            NutritionItem { name: "protein".into(), value: "12g".into() },
        ],
    }
}

pub fn result_named(name: &str) -> PredictionResult {
    PredictionResult {
        timestamp: name.to_string(),
        original_image: format!("saved_images/{name}"),
        categorized_image: format!("categorized_images/{name}"),
        items: name.to_string(),
        nutrition: vec![],
    }
}

/// Answers each call with the next scripted outcome, or echoes the file
/// name once the script runs out.
#[derive(Default)]
pub struct FakePredictor {
    script: Mutex<VecDeque<Result<PredictionResult>>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
    pub gate_file: Option<String>,
    pub started: Notify,
    pub release: Notify,
}

impl FakePredictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated_on(file_name: &str) -> Self {
        Self {
            gate_file: Some(file_name.to_string()),
            ..Self::default()
        }
    }

    pub fn push(&self, outcome: Result<PredictionResult>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Predictor for FakePredictor {
    async fn predict(&self, file: &SelectedFile) -> Result<PredictionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(file.file_name.clone());

        if self.gate_file.as_deref() == Some(file.file_name.as_str()) {
            self.started.notify_one();
            self.release.notified().await;
        }

        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(result_named(&file.file_name)))
    }
}

pub fn upstream_error() -> AppError {
    AppError::UpstreamStatus {
        status: 500,
        body: "Internal Server Error".to_string(),
    }
}

/// Serves `router` on an ephemeral local port and returns its origin.
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
