use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One `name: value` line of the nutrition facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionItem {
    pub name: String,
    pub value: String,
}

/// Outcome of one analysis request, exactly as the prediction backend
/// returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub timestamp: String,
    pub original_image: String,
    pub categorized_image: String,
    pub items: String,
    pub nutrition: Vec<NutritionItem>,
}

impl PredictionResult {
    /// Decodes a backend response body. Every field is required and every
    /// nutrition entry must be a `{name, value}` pair of strings.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }
}

/// A file picked by the user and held until it is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}
