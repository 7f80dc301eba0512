//! Upload an image, forward it to the nutrition prediction backend and keep
//! a running, newest-first history of the results.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod proxy;
pub mod render;
pub mod routes;
pub mod view;

use std::sync::Arc;

use axum::Router;

pub use client::{HttpPredictor, Predictor};
pub use config::AppConfig;
pub use error::{AppError, Result};
pub use model::{NutritionItem, PredictionResult, SelectedFile};
pub use view::{SubmitOutcome, UploadView};

/// Builds the whole application around `predictor`.
pub fn app(config: AppConfig, predictor: Arc<dyn Predictor>) -> Result<Router> {
    config::validate_rewrites(&config.rewrites)?;
    let view = UploadView::new(Arc::new(config), predictor);
    let state = routes::AppState::new(view)?;
    Ok(routes::router(state, reqwest::Client::new()))
}
