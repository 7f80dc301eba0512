use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::client::Predictor;
use crate::config::AppConfig;
use crate::error::Result;
use crate::model::{PredictionResult, SelectedFile};
use crate::render::HistoryRow;

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Nothing was selected; no request was made.
    NothingSelected,
    Recorded(PredictionResult),
}

#[derive(Default)]
struct ViewState {
    selection: Option<SelectedFile>,
    /// Newest first.
    history: VecDeque<PredictionResult>,
}

/// Upload-and-history view: the pending selection plus every prediction
/// received since the view was created.
pub struct UploadView {
    config: Arc<AppConfig>,
    predictor: Arc<dyn Predictor>,
    state: Mutex<ViewState>,
}

impl UploadView {
    pub fn new(config: Arc<AppConfig>, predictor: Arc<dyn Predictor>) -> Self {
        Self {
            config,
            predictor,
            state: Mutex::new(ViewState::default()),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Replaces the pending selection. `None` clears it.
    pub async fn select(&self, file: Option<SelectedFile>) {
        match &file {
            Some(f) => info!(file_name = %f.file_name, size = f.data.len(), "file selected"),
            None => info!("selection cleared"),
        }
        self.state.lock().await.selection = file;
    }

    pub async fn selection(&self) -> Option<SelectedFile> {
        self.state.lock().await.selection.clone()
    }

    /// Sends the selected file for prediction and records the result.
    ///
    /// The state lock is released while the request is in flight, so
    /// overlapping submissions each land in history in completion order.
    /// Success always clears the selection, including a file picked while
    /// the request was in flight. On failure neither the selection nor the
    /// history changes.
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        let Some(file) = self.state.lock().await.selection.clone() else {
            return Ok(SubmitOutcome::NothingSelected);
        };

        let result = match self.predictor.predict(&file).await {
            Ok(result) => result,
            Err(e) => {
                warn!(file_name = %file.file_name, error = %e, "submission failed");
                return Err(e);
            }
        };

        let mut state = self.state.lock().await;
        state.history.push_front(result.clone());
        state.selection = None;
        info!(history_len = state.history.len(), "prediction recorded");
        Ok(SubmitOutcome::Recorded(result))
    }

    pub async fn history(&self) -> Vec<PredictionResult> {
        self.state.lock().await.history.iter().cloned().collect()
    }

    /// History resolved for display, newest first.
    pub async fn rows(&self) -> Vec<HistoryRow> {
        let state = self.state.lock().await;
        state
            .history
            .iter()
            .map(|result| HistoryRow::resolve(&self.config, result))
            .collect()
    }
}
