use serde::Serialize;
use tera::{Context, Tera};
use tracing::warn;

use crate::config::AppConfig;
use crate::error::Result;
use crate::model::{NutritionItem, PredictionResult};

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

/// `{origin}/{path}` with every path segment percent-encoded.
pub fn image_url(origin: &str, path: &str) -> String {
    let encoded = path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", origin.trim_end_matches('/'), encoded)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageView {
    pub src: String,
    /// False when the host is not on the remote-image allow-list.
    pub allowed: bool,
}

impl ImageView {
    fn resolve(config: &AppConfig, path: &str) -> Self {
        let src = image_url(&config.backend_origin, path);
        let allowed = config.is_image_allowed(&src);
        if !allowed {
            warn!(%src, "image host not in remote pattern allow-list");
        }
        Self { src, allowed }
    }
}

/// One table row, fields passed through untouched apart from image URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    pub timestamp: String,
    pub original: ImageView,
    pub categorized: ImageView,
    pub items: String,
    pub nutrition: Vec<NutritionItem>,
}

impl HistoryRow {
    pub fn resolve(config: &AppConfig, result: &PredictionResult) -> Self {
        Self {
            timestamp: result.timestamp.clone(),
            original: ImageView::resolve(config, &result.original_image),
            categorized: ImageView::resolve(config, &result.categorized_image),
            items: result.items.clone(),
            nutrition: result.nutrition.clone(),
        }
    }
}

/// What the page shows besides the history table.
#[derive(Debug, Default)]
pub struct PageStatus<'a> {
    pub selected_file: Option<&'a str>,
    pub error: Option<&'a str>,
}

pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template("index.html", INDEX_TEMPLATE)?;
        Ok(Self { tera })
    }

    pub fn render(&self, rows: &[HistoryRow], status: &PageStatus<'_>) -> Result<String> {
        let mut context = Context::new();
        context.insert("rows", rows);
        context.insert("selected_file", &status.selected_file);
        context.insert("error", &status.error);
        Ok(self.tera.render("index.html", &context)?)
    }
}
