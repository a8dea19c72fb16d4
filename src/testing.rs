//! Test doubles shared by the unit tests

use crate::api::{ApiRequest, Transport};
use crate::error::{CoreError, Result};
use crate::notify::Notifier;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

enum Reply {
    Now(Result<Value>),
    Later(oneshot::Receiver<Result<Value>>),
}

/// Transport answering from a FIFO script and recording every request
#[derive(Default)]
pub struct FakeTransport {
    requests: Mutex<Vec<ApiRequest>>,
    replies: Mutex<VecDeque<Reply>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, body: Value) {
        self.replies.lock().unwrap().push_back(Reply::Now(Ok(body)));
    }

    pub fn fail(&self, error: CoreError) {
        self.replies.lock().unwrap().push_back(Reply::Now(Err(error)));
    }

    /// Queue a reply the test resolves later through the returned sender
    pub fn deferred(&self) -> oneshot::Sender<Result<Value>> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push_back(Reply::Later(rx));
        tx
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        self.requests.lock().unwrap().push(request);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Now(result)) => result,
            Some(Reply::Later(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(CoreError::Transport("reply dropped".to_string()))),
            None => Err(CoreError::Transport("no scripted reply".to_string())),
        }
    }
}

/// Notifier that keeps every toast
#[derive(Default)]
pub struct RecordingNotifier {
    pub successes: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

pub fn app_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "is_active": true,
        "total_memories_created": 0,
        "total_memories_accessed": 0
    })
}

pub fn apps_page(apps: Vec<Value>, total: u64) -> Value {
    json!({ "total": total, "page": 1, "page_size": 10, "apps": apps })
}
