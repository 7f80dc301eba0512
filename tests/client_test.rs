mod common;

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Multipart, State},
    http::{header::CONTENT_LENGTH, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use common::{meal_result, spawn_backend, MEAL_JSON};
use nutrition_lens::{AppError, HttpPredictor, Predictor, SelectedFile};

#[derive(Debug, Clone, PartialEq)]
struct ReceivedPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

type Received = Arc<Mutex<Vec<ReceivedPart>>>;

async fn record_upload(
    State(received): State<Received>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> impl IntoResponse {
    // the form is sent with a known length, not chunked
    assert!(headers.contains_key(CONTENT_LENGTH));
    while let Some(field) = multipart.next_field().await.unwrap() {
        let part = ReceivedPart {
            name: field.name().unwrap_or_default().to_string(),
            file_name: field.file_name().map(str::to_string),
            content_type: field.content_type().map(str::to_string),
            data: field.bytes().await.unwrap().to_vec(),
        };
        received.lock().unwrap().push(part);
    }
    ([("content-type", "application/json")], MEAL_JSON)
}

async fn backend_with(router: Router) -> HttpPredictor {
    let origin = spawn_backend(router).await;
    HttpPredictor::new(format!("{origin}/predict-image"))
}

#[tokio::test]
async fn posts_file_as_multipart_field() {
    let received: Received = Arc::default();
    let predictor = backend_with(
        Router::new()
            .route("/predict-image", post(record_upload))
            .with_state(received.clone()),
    )
    .await;

    let file = SelectedFile::new("meal.jpg", b"\xff\xd8\xff".to_vec()).with_content_type("image/jpeg");
    let result = predictor.predict(&file).await.unwrap();

    assert_eq!(result, meal_result());
    let parts = received.lock().unwrap().clone();
    assert_eq!(
        parts,
        vec![ReceivedPart {
            name: "file".into(),
            file_name: Some("meal.jpg".into()),
            content_type: Some("image/jpeg".into()),
            data: b"\xff\xd8\xff".to_vec(),
        }]
    );
}

#[tokio::test]
async fn large_upload_arrives_intact() {
    let received: Received = Arc::default();
    let predictor = backend_with(
        Router::new()
            .route("/predict-image", post(record_upload))
            .layer(axum::extract::DefaultBodyLimit::disable())
            .with_state(received.clone()),
    )
    .await;

    let data: Vec<u8> = (0..3 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    let file = SelectedFile::new("big.jpg", data.clone());
    predictor.predict(&file).await.unwrap();

    let parts = received.lock().unwrap().clone();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].data, data);
    assert_eq!(file.data.len(), data.len());
}

#[tokio::test]
async fn non_success_status_is_an_error_even_with_json_body() {
    let predictor = backend_with(Router::new().route(
        "/predict-image",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "application/json")],
                MEAL_JSON,
            )
        }),
    ))
    .await;

    let err = predictor
        .predict(&SelectedFile::new("meal.jpg", vec![1, 2, 3]))
        .await
        .unwrap_err();

    match err {
        AppError::UpstreamStatus { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("apple, rice"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn non_json_body_is_invalid_response() {
    let predictor = backend_with(Router::new().route(
        "/predict-image",
        post(|| async { "<html>oops</html>" }),
    ))
    .await;

    let err = predictor
        .predict(&SelectedFile::new("meal.jpg", vec![0]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidResponse(_)));
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let predictor = HttpPredictor::new(format!("http://{addr}/predict-image"));
    let err = predictor
        .predict(&SelectedFile::new("meal.jpg", vec![0]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Network(_)));
}
