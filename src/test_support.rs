//! In-process mock backend for HTTP tests

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::{Json, Router};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use crate::api::{ApiClient, HistoryNavigator};
use crate::config::ApiConfig;
use crate::session::SessionHandle;
use crate::storage::{keys, MemoryStorage, Storage, StorageLayer};

/// A request as the mock backend saw it
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    pub fn is(&self, method: &str, path: &str) -> bool {
        self.method == method && self.path == path
    }
}

/// Requests received so far, in arrival order
#[derive(Debug, Clone, Default)]
pub(crate) struct Recorder(Arc<Mutex<Vec<RecordedRequest>>>);

impl Recorder {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, request: RecordedRequest) {
        self.0.lock().unwrap().push(request);
    }
}

/// Router answering every request through `respond`
pub(crate) fn scripted<F>(respond: F) -> (Router, Recorder)
where
    F: Fn(&RecordedRequest) -> (StatusCode, Value) + Send + Sync + 'static,
{
    let recorder = Recorder::default();
    let respond = Arc::new(respond);
    let rec = recorder.clone();

    let router = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
            let rec = rec.clone();
            let respond = respond.clone();
            async move {
                let request = RecordedRequest {
                    method: method.to_string(),
                    path: uri.path().to_string(),
                    headers,
                    body,
                };
                let (status, value) = respond(&request);
                rec.push(request);
                (status, Json(value))
            }
        },
    );

    (router, recorder)
}

/// Serve `router` on an ephemeral port and return its base URL
pub(crate) async fn spawn_backend(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// API client wired to a mock backend, with in-memory storage
pub(crate) struct TestClient {
    pub api: ApiClient,
    pub session: Arc<SessionHandle>,
    pub navigator: Arc<HistoryNavigator>,
    pub storage: Arc<Storage>,
}

pub(crate) async fn connect(router: Router) -> TestClient {
    connect_with_token(router, None).await
}

pub(crate) async fn connect_with_token(router: Router, token: Option<&str>) -> TestClient {
    let base_url = spawn_backend(router).await;

    let storage = Arc::new(Storage::Memory(MemoryStorage::new()));
    if let Some(token) = token {
        storage.set(keys::TOKEN, token).await.unwrap();
    }

    let session = Arc::new(SessionHandle::new(storage.clone()));
    let navigator = Arc::new(HistoryNavigator::new());
    let config = ApiConfig {
        base_url,
        timeout_seconds: 5,
    };
    let api = ApiClient::new(&config, session.clone(), navigator.clone()).unwrap();

    TestClient {
        api,
        session,
        navigator,
        storage,
    }
}
