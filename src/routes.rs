use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::Result;
use crate::model::{PredictionResult, SelectedFile};
use crate::proxy;
use crate::render::{PageRenderer, PageStatus};
use crate::view::{SubmitOutcome, UploadView};

#[derive(Clone)]
pub struct AppState {
    pub view: Arc<UploadView>,
    pub renderer: Arc<PageRenderer>,
}

impl AppState {
    pub fn new(view: UploadView) -> Result<Self> {
        Ok(Self {
            view: Arc::new(view),
            renderer: Arc::new(PageRenderer::new()?),
        })
    }
}

pub fn router(state: AppState, client: reqwest::Client) -> Router {
    let rewrites = proxy::rewrite_routes(&state.view.config().rewrites, client);

    Router::new()
        .route("/", get(index))
        .route("/selection", post(select_file).delete(clear_selection))
        .route("/submit", post(submit))
        .route("/upload", post(upload))
        .route("/history", get(history))
        .merge(rewrites)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::disable()),
        )
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Result<Html<String>> {
    render_page(&state, None).await.map(Html)
}

async fn render_page(state: &AppState, error: Option<&str>) -> Result<String> {
    let selection = state.view.selection().await;
    let rows = state.view.rows().await;
    state.renderer.render(
        &rows,
        &PageStatus {
            selected_file: selection.as_ref().map(|f| f.file_name.as_str()),
            error,
        },
    )
}

/// Reads the `file` part of an upload form. A part with neither a name nor
/// content is what browsers send for an empty file input.
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<SelectedFile>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;

        if file_name.is_empty() && data.is_empty() {
            return Ok(None);
        }
        return Ok(Some(SelectedFile {
            file_name,
            content_type,
            data,
        }));
    }
    Ok(None)
}

async fn select_file(State(state): State<AppState>, mut multipart: Multipart) -> Result<StatusCode> {
    let file = read_file_field(&mut multipart).await?;
    state.view.select(file).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_selection(State(state): State<AppState>) -> StatusCode {
    state.view.select(None).await;
    StatusCode::NO_CONTENT
}

async fn submit(State(state): State<AppState>) -> Result<Response> {
    Ok(match state.view.submit().await? {
        SubmitOutcome::Recorded(result) => Json(result).into_response(),
        SubmitOutcome::NothingSelected => StatusCode::NO_CONTENT.into_response(),
    })
}

/// Form fallback: select and submit in one request, then back to the page.
async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Response> {
    let file = read_file_field(&mut multipart).await?;
    state.view.select(file).await;

    match state.view.submit().await {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(e) => {
            let status = e.status_code();
            let page = render_page(&state, Some(&e.to_string())).await?;
            Ok((status, Html(page)).into_response())
        }
    }
}

async fn history(State(state): State<AppState>) -> Json<Vec<PredictionResult>> {
    Json(state.view.history().await)
}
