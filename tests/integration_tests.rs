//! Integration tests for the MailSense HTTP API and the Gemini client

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mailsense::{
    config::{Config, GeminiConfig},
    create_router,
    models::{Category, ClassificationResult, CLASSIFICATION_ERROR_REPLY},
    services::{
        classify_email_and_respond, ClassifierError, EmailClassifier, GeminiClassifier,
    },
    AppState,
};

const BOUNDARY: &str = "mailsense-test-boundary";

struct FakeClassifier {
    outcome: Option<ClassificationResult>,
    configured: bool,
    seen: Mutex<Vec<String>>,
}

impl FakeClassifier {
    fn answering(category: Category, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Some(ClassificationResult::new(category, reply)),
            configured: true,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            outcome: None,
            configured: false,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailClassifier for FakeClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifierError> {
        self.seen.lock().unwrap().push(text.to_string());
        self.outcome
            .clone()
            .ok_or_else(|| ClassifierError::InvalidPayload("upstream exploded".to_string()))
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

fn test_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 8080,
        max_file_size_mb: 1,
        google_api_key: None,
        gemini_model: "fake-model".to_string(),
        gemini_base_url: "http://127.0.0.1:9".to_string(),
        classifier_timeout_seconds: 5,
    }
}

fn app(classifier: Arc<FakeClassifier>) -> Router {
    create_router(AppState::new(test_config(), classifier))
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload_request(field: &str, file_name: &str, content_type: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/classify-email-file-content/")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page_text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*page_text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

#[tokio::test]
async fn test_classify_text_returns_result() {
    let classifier = FakeClassifier::answering(Category::Produtivo, "Recebemos sua solicitação.");
    let (status, body) = send(
        app(classifier.clone()),
        json_request(
            "/classify-email-content/",
            json!({ "text": "Preciso da segunda via do boleto." }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "category": "Produtivo", "reply": "Recebemos sua solicitação." })
    );
    assert_eq!(classifier.seen(), vec!["Preciso da segunda via do boleto."]);
}

#[tokio::test]
async fn test_classify_text_without_trailing_slash() {
    let classifier = FakeClassifier::answering(Category::Improdutivo, "Obrigado!");
    let (status, body) = send(
        app(classifier),
        json_request("/classify-email-content", json!({ "text": "Feliz Natal!" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "Improdutivo");
}

#[tokio::test]
async fn test_classify_text_failure_maps_to_server_error() {
    let (status, body) = send(
        app(FakeClassifier::failing()),
        json_request("/classify-email-content/", json!({ "text": "Olá" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "CLASSIFICATION_FAILURE");
    assert_eq!(body["error"]["message"], CLASSIFICATION_ERROR_REPLY);
    assert!(!body.to_string().contains("upstream exploded"));
}

#[tokio::test]
async fn test_classify_text_rejects_blank_and_malformed_payloads() {
    let classifier = FakeClassifier::answering(Category::Produtivo, "ok");

    let (status, body) = send(
        app(classifier.clone()),
        json_request("/classify-email-content/", json!({ "text": "   \n" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");

    let (status, _) = send(
        app(classifier.clone()),
        json_request("/classify-email-content/", json!({ "body": "wrong field" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(classifier.seen().is_empty());
}

#[tokio::test]
async fn test_upload_text_file_is_normalized_before_classification() {
    let classifier = FakeClassifier::answering(Category::Produtivo, "Recebido.");
    let (status, body) = send(
        app(classifier.clone()),
        upload_request("file", "email.txt", "text/plain", b"hello\nworld"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "Produtivo");
    assert_eq!(classifier.seen(), vec!["hello world"]);
}

#[tokio::test]
async fn test_upload_pdf_pages_are_concatenated() {
    let classifier = FakeClassifier::answering(Category::Improdutivo, "Obrigado.");
    let pdf = pdf_with_pages(&["Hi ", "there"]);
    let (status, _) = send(
        app(classifier.clone()),
        upload_request("file", "email.pdf", "application/pdf", &pdf),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(classifier.seen(), vec!["Hi there"]);
}

#[tokio::test]
async fn test_upload_ignores_declared_type_and_file_name() {
    let classifier = FakeClassifier::answering(Category::Produtivo, "ok");
    let png = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01";
    let (status, body) = send(
        app(classifier.clone()),
        upload_request("file", "email.txt", "text/plain", png),
    )
    .await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");
    assert!(classifier.seen().is_empty());
}

#[tokio::test]
async fn test_upload_empty_file_is_unsupported() {
    let classifier = FakeClassifier::answering(Category::Produtivo, "ok");
    let (status, _) = send(
        app(classifier.clone()),
        upload_request("file", "empty.txt", "text/plain", b""),
    )
    .await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(classifier.seen().is_empty());
}

#[tokio::test]
async fn test_upload_whitespace_file_is_empty_content() {
    let classifier = FakeClassifier::answering(Category::Produtivo, "ok");
    let (status, body) = send(
        app(classifier.clone()),
        upload_request("file", "blank.txt", "text/plain", b"  \n\n \t"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "EMPTY_CONTENT");
    assert_eq!(
        body["error"]["message"],
        "file is empty or has no extractable text"
    );
    assert!(classifier.seen().is_empty());
}

#[tokio::test]
async fn test_upload_corrupted_pdf_is_unprocessable() {
    let classifier = FakeClassifier::answering(Category::Produtivo, "ok");
    let (status, body) = send(
        app(classifier.clone()),
        upload_request(
            "file",
            "email.pdf",
            "application/pdf",
            b"%PDF-1.4\n%this is not really a pdf\n",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "UNPROCESSABLE_CONTENT");
    assert!(classifier.seen().is_empty());
}

#[tokio::test]
async fn test_upload_classification_failure_maps_to_server_error() {
    let (status, body) = send(
        app(FakeClassifier::failing()),
        upload_request("file", "email.txt", "text/plain", b"Bom dia, equipe"),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], CLASSIFICATION_ERROR_REPLY);
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let (status, body) = send(
        app(FakeClassifier::answering(Category::Produtivo, "ok")),
        upload_request("attachment", "email.txt", "text/plain", b"hello"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MISSING_FILE");
}

#[tokio::test]
async fn test_upload_over_size_limit() {
    let classifier = FakeClassifier::answering(Category::Produtivo, "ok");
    let content = vec![b'a'; 1024 * 1024 + 10];
    let (status, body) = send(
        app(classifier.clone()),
        upload_request("file", "big.txt", "text/plain", &content),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"]["code"], "FILE_TOO_LARGE");
    assert_eq!(body["error"]["message"], "File too large: the upload limit is 1MB");
    assert!(classifier.seen().is_empty());
}

#[tokio::test]
async fn test_upload_requires_multipart() {
    let (status, _) = send(
        app(FakeClassifier::answering(Category::Produtivo, "ok")),
        Request::builder()
            .method("POST")
            .uri("/classify-email-file-content")
            .header("content-type", "text/plain")
            .body(Body::from("hello"))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_readiness() {
    let (status, body) = send(
        app(FakeClassifier::answering(Category::Produtivo, "ok")),
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model"], "fake-model");

    let (status, _) = send(
        app(FakeClassifier::failing()),
        Request::builder().uri("/ready").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let response = app(FakeClassifier::answering(Category::Produtivo, "ok"))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let request_id = response.headers().get("x-request-id").unwrap();
    assert_eq!(request_id.len(), 8);
}

#[tokio::test]
async fn test_error_body_reuses_request_id_header() {
    let response = app(FakeClassifier::answering(Category::Produtivo, "ok"))
        .oneshot(json_request("/classify-email-content/", json!({ "text": "  " })))
        .await
        .unwrap();

    let header = response
        .headers()
        .get("x-request-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
    assert_eq!(body["error"]["request_id"], header.as_str());
}

fn gemini_config(base_url: String) -> GeminiConfig {
    GeminiConfig {
        api_key: "test-key".to_string(),
        model: "gemini-test".to_string(),
        base_url,
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_gemini_client_parses_structured_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{
                        "text": "{\"category\": \"Produtivo\", \"reply\": \"Sua solicitação foi recebida.\"}"
                    }]
                },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let classifier = GeminiClassifier::new(gemini_config(server.uri())).unwrap();
    let result = classifier
        .classify("Qual o status do meu chamado?")
        .await
        .unwrap();

    assert_eq!(result.category, Category::Produtivo);
    assert_eq!(result.reply, "Sua solicitação foi recebida.");
}

#[tokio::test]
async fn test_gemini_api_error_becomes_error_sentinel() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model overloaded"))
        .mount(&server)
        .await;

    let classifier = GeminiClassifier::new(gemini_config(server.uri())).unwrap();

    match classifier.classify("Olá").await {
        Err(ClassifierError::Api { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "model overloaded");
        }
        other => panic!("expected Api error, got {:?}", other),
    }

    let result = classify_email_and_respond(&classifier, "Olá").await;
    assert_eq!(result, ClassificationResult::error());
}
