#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tokio::sync::Notify;

use tokenward::auth::{AuthError, CredentialPair, CredentialStore, RefreshExchange};
use tokenward::client::ApiClient;
use tokenward::error::ClientError;
use tokenward::http::{classify, ApiResponse, RequestDescriptor, RequestExecutor};

/// One call seen by [`FakeBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenCall {
    pub path: String,
    pub token: Option<String>,
}

/// In-process backend accepting exactly one access token at a time.
///
/// Requests carrying any other token get a 401. A path can be held so its
/// first response is delayed until the test releases it.
pub struct FakeBackend {
    valid: Mutex<String>,
    calls: Mutex<Vec<SeenCall>>,
    reject_all: AtomicBool,
    held: Mutex<HashMap<String, Arc<Notify>>>,
}

impl FakeBackend {
    pub fn new(valid: &str) -> Arc<Self> {
        Arc::new(Self {
            valid: Mutex::new(valid.to_string()),
            calls: Mutex::new(Vec::new()),
            reject_all: AtomicBool::new(false),
            held: Mutex::new(HashMap::new()),
        })
    }

    pub fn accept(&self, token: &str) {
        *self.valid.lock().expect("backend lock poisoned") = token.to_string();
    }

    /// Answer 401 no matter which token is presented.
    pub fn reject_everything(&self) {
        self.reject_all.store(true, Ordering::SeqCst);
    }

    /// Delay the first response for `path` until the returned handle fires.
    pub fn hold(&self, path: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.held
            .lock()
            .expect("backend lock poisoned")
            .insert(path.to_string(), notify.clone());
        notify
    }

    pub fn calls(&self) -> Vec<SeenCall> {
        self.calls.lock().expect("backend lock poisoned").clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<Option<String>> {
        self.calls()
            .into_iter()
            .filter(|call| call.path == path)
            .map(|call| call.token)
            .collect()
    }
}

#[async_trait]
impl RequestExecutor for FakeBackend {
    async fn execute(
        &self,
        request: &RequestDescriptor,
        access_token: Option<&str>,
    ) -> Result<ApiResponse, ClientError> {
        self.calls
            .lock()
            .expect("backend lock poisoned")
            .push(SeenCall {
                path: request.path.clone(),
                token: access_token.map(str::to_string),
            });

        let held = self
            .held
            .lock()
            .expect("backend lock poisoned")
            .remove(&request.path);
        if let Some(notify) = held {
            notify.notified().await;
        }
        tokio::task::yield_now().await;

        let accepted = !self.reject_all.load(Ordering::SeqCst)
            && access_token == Some(self.valid.lock().expect("backend lock poisoned").as_str());
        let response = if accepted {
            ApiResponse {
                status: 200,
                headers: HeaderMap::new(),
                body: serde_json::json!({
                    "path": request.path,
                    "token": access_token,
                })
                .to_string(),
            }
        } else {
            ApiResponse {
                status: 401,
                headers: HeaderMap::new(),
                body: r#"{"detail":"Given token not valid for any token type"}"#.to_string(),
            }
        };
        classify(response)
    }
}

/// Refresh exchange with a scripted outcome and call counter.
///
/// When gated, every call blocks until [`ScriptedExchange::release`]. A
/// successful exchange also makes `backend` accept the new access token.
pub struct ScriptedExchange {
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
    outcome: Mutex<Result<CredentialPair, AuthError>>,
    gate: Option<Notify>,
    delay: Option<Duration>,
    backend: Option<Arc<FakeBackend>>,
}

impl ScriptedExchange {
    pub fn succeeding(pair: CredentialPair) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            outcome: Mutex::new(Ok(pair)),
            gate: None,
            delay: None,
            backend: None,
        }
    }

    pub fn failing(error: AuthError) -> Self {
        Self {
            outcome: Mutex::new(Err(error)),
            ..Self::succeeding(CredentialPair::access_only("unused"))
        }
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Notify::new());
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn rotating(mut self, backend: Arc<FakeBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn set_outcome(&self, outcome: Result<CredentialPair, AuthError>) {
        *self.outcome.lock().expect("exchange lock poisoned") = outcome;
    }

    /// Let the blocked exchange finish.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Refresh tokens presented to the exchange, in call order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().expect("exchange lock poisoned").clone()
    }
}

#[async_trait]
impl RefreshExchange for ScriptedExchange {
    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .expect("exchange lock poisoned")
            .push(refresh_token.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let outcome = self.outcome.lock().expect("exchange lock poisoned").clone();
        if let (Ok(pair), Some(backend)) = (&outcome, &self.backend) {
            backend.accept(&pair.access);
        }
        outcome
    }
}

/// Wire a client over the fakes, seeding the store with `pair`.
pub fn client_over(
    backend: Arc<FakeBackend>,
    exchange: Arc<ScriptedExchange>,
    pair: Option<CredentialPair>,
) -> (Arc<ApiClient>, Arc<CredentialStore>) {
    let credentials = Arc::new(CredentialStore::in_memory());
    if let Some(pair) = pair {
        credentials.set(pair).expect("seed credentials");
    }
    let client = Arc::new(ApiClient::new(backend, exchange, credentials.clone()));
    (client, credentials)
}

/// Yield until `count` requests are parked behind the in-flight refresh.
pub async fn wait_for_waiters(client: &ApiClient, count: usize) {
    while client.coordinator().pending_waiters() < count {
        tokio::task::yield_now().await;
    }
}

pub async fn wait_for_refresh(client: &ApiClient) {
    while !client.coordinator().is_refreshing() {
        tokio::task::yield_now().await;
    }
}

/// Spawn `count` concurrent GETs to `/items/{n}/`.
pub fn spawn_requests(
    client: &Arc<ApiClient>,
    count: usize,
) -> Vec<tokio::task::JoinHandle<Result<ApiResponse, ClientError>>> {
    (0..count)
        .map(|n| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .request(&RequestDescriptor::get(format!("/items/{n}/")))
                    .await
            })
        })
        .collect()
}
