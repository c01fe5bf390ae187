//! Shared test helpers: a scripted stand-in for LM Studio and a bridge wired to it.

#![allow(dead_code)]

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use di::Ref;
use di_axum::RouterServiceProviderExtensions;
use futures_util::stream::{self, StreamExt};
use lmstudio_chat_bridge::api;
use lmstudio_chat_bridge::infrastructure::inference::InferenceClient;
use lmstudio_chat_bridge::infrastructure::settings::BridgeSettings;
use lmstudio_chat_bridge::infrastructure::traits::{EndpointLocator, SessionRepository};
use serde_json::Value;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Nothing listens on port 1, so connecting fails immediately.
pub const UNREACHABLE: &str = "http://127.0.0.1:1";

pub const HELLO_FRAMES: [&str; 3] = [
    "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
    "data: [DONE]\n\n",
];

#[derive(Clone)]
pub enum ChatReply {
    /// Body chunks sent as they are.
    Chunks(Vec<&'static str>),
    /// Body chunks followed by an aborted connection.
    BreakAfter(Vec<&'static str>),
    /// Body chunks, then the connection stays open without sending anything more.
    Hang(Vec<&'static str>),
    Status(StatusCode),
}

#[derive(Clone)]
struct MockState {
    reply: ChatReply,
    models_status: Arc<AtomicU16>,
    probes: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Value>>>,
}

pub struct MockLmStudio {
    pub base_url: String,
    models_status: Arc<AtomicU16>,
    probes: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl MockLmStudio {
    pub async fn start(reply: ChatReply) -> MockLmStudio {
        let state = MockState {
            reply,
            models_status: Arc::new(AtomicU16::new(200)),
            probes: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        };

        let app = axum::Router::new()
            .route("/v1/models", get(models))
            .route("/v1/chat/completions", post(chat_completions))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockLmStudio {
            base_url: format!("http://{addr}"),
            models_status: state.models_status,
            probes: state.probes,
            requests: state.requests,
        }
    }

    pub async fn hello() -> MockLmStudio {
        MockLmStudio::start(ChatReply::Chunks(HELLO_FRAMES.to_vec())).await
    }

    pub fn set_models_status(&self, status: StatusCode) {
        self.models_status.store(status.as_u16(), Ordering::SeqCst);
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Bodies of every chat-completions request received so far.
    pub fn chat_requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

async fn models(State(state): State<MockState>) -> StatusCode {
    state.probes.fetch_add(1, Ordering::SeqCst);
    StatusCode::from_u16(state.models_status.load(Ordering::SeqCst)).unwrap()
}

async fn chat_completions(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    state.requests.lock().unwrap().push(body);

    let chunks = |parts: Vec<&'static str>| {
        stream::iter(parts).map(|chunk| Ok::<_, std::io::Error>(Bytes::from(chunk)))
    };

    let body = match state.reply {
        ChatReply::Chunks(parts) => Body::from_stream(chunks(parts)),
        ChatReply::BreakAfter(parts) => Body::from_stream(
            chunks(parts).chain(stream::once(async {
                Err(std::io::Error::other("model crashed"))
            })),
        ),
        ChatReply::Hang(parts) => Body::from_stream(chunks(parts).chain(stream::pending())),
        ChatReply::Status(status) => return status.into_response(),
    };

    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

/// A server that passes exactly one liveness probe and then stops listening.
pub async fn start_vanishing_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
            .await
            .unwrap();
        // dropping the listener closes the port
    });

    format!("http://{addr}")
}

/// Points discovery at `candidates` instead of the local machine.
pub fn use_candidates(candidates: &[&str]) {
    // SAFETY: every test touching the environment runs under #[serial]
    unsafe { std::env::set_var("LM_STUDIO_CANDIDATES", candidates.join(",")) };
}

pub struct TestBridge {
    pub app: axum::Router,
    pub sessions: Ref<dyn SessionRepository>,
    pub locator: Ref<dyn EndpointLocator>,
    pub client: Ref<InferenceClient>,
}

impl TestBridge {
    pub fn new(candidates: &[&str]) -> TestBridge {
        use_candidates(candidates);
        let provider = lmstudio_chat_bridge::service_provider().unwrap();

        let settings = provider.get_required::<BridgeSettings>();
        let sessions = provider.get_required::<dyn SessionRepository>();
        let locator = provider.get_required::<dyn EndpointLocator>();
        let client = provider.get_required::<InferenceClient>();

        TestBridge {
            app: api::router(&settings).with_provider(provider),
            sessions,
            locator,
            client,
        }
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_chat(&self, body: &str) -> Response {
        self.app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_owned()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

pub async fn body_text(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub fn content_type(response: &Response) -> String {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

pub fn chat_body(session_id: Option<&str>, content: &str) -> String {
    let mut body = serde_json::json!({
        "messages": [{ "role": "user", "content": content }],
    });
    if let Some(session_id) = session_id {
        body["session_id"] = session_id.into();
    }
    body.to_string()
}
