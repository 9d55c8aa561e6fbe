//! Hand-written fakes for scenario tests.
//!
//! `RecordingAuthority` answers by route path and records every request, so a
//! test can assert both what was called and how often. `ScriptedChannel` hands
//! out subscriptions fed from a sender the test keeps.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;

use delver_shared::{AuthorityRequest, RequestError, ResponseResult};

use crate::ports::outbound::{AuthorityPort, ChannelError, FrameStream, NotificationChannelPort};

type Reply = Result<ResponseResult, RequestError>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fake authority keyed by route path. Unscripted paths answer with an empty success.
#[derive(Default)]
pub struct RecordingAuthority {
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    sticky: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<AuthorityRequest>>,
}

impl RecordingAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call to `path` with `result`.
    pub fn respond(&self, path: &str, result: ResponseResult) -> &Self {
        lock(&self.sticky).insert(path.to_string(), Ok(result));
        self
    }

    /// Answer the next call to `path` with `result`, ahead of any sticky reply.
    pub fn respond_once(&self, path: &str, result: ResponseResult) -> &Self {
        lock(&self.queued)
            .entry(path.to_string())
            .or_default()
            .push_back(Ok(result));
        self
    }

    /// Fail every call to `path` at the transport level.
    pub fn fail(&self, path: &str, error: RequestError) -> &Self {
        lock(&self.sticky).insert(path.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> Vec<AuthorityRequest> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self, path: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|r| r.route().path == path)
            .count()
    }

    fn reply(&self, request: AuthorityRequest) -> Reply {
        let path = request.route().path;
        lock(&self.calls).push(request);

        if let Some(reply) = lock(&self.queued)
            .get_mut(&path)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        lock(&self.sticky)
            .get(&path)
            .cloned()
            .unwrap_or_else(|| Ok(ResponseResult::success_empty()))
    }
}

#[async_trait]
impl AuthorityPort for RecordingAuthority {
    async fn request(&self, request: AuthorityRequest) -> Result<ResponseResult, RequestError> {
        self.reply(request)
    }

    async fn request_with_timeout(
        &self,
        request: AuthorityRequest,
        _timeout_ms: u64,
    ) -> Result<ResponseResult, RequestError> {
        self.reply(request)
    }
}

/// Wrap a payload in the push-channel envelope.
pub fn frame(kind: &str, payload: serde_json::Value) -> String {
    serde_json::json!({ "type": kind, "payload": payload }).to_string()
}

/// Fake push channel. Each `subscribe` takes the next scripted receiver;
/// once they run out, subscribing fails.
#[derive(Default)]
pub struct ScriptedChannel {
    pending: Mutex<VecDeque<mpsc::UnboundedReceiver<Result<String, ChannelError>>>>,
    subscriptions: Mutex<usize>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a subscription and return the sender that feeds it.
    /// Dropping the sender ends that subscription's stream.
    pub fn script(&self) -> mpsc::UnboundedSender<Result<String, ChannelError>> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.pending).push_back(rx);
        tx
    }

    pub fn subscriptions(&self) -> usize {
        *lock(&self.subscriptions)
    }
}

#[async_trait]
impl NotificationChannelPort for ScriptedChannel {
    async fn subscribe(&self) -> Result<FrameStream, ChannelError> {
        *lock(&self.subscriptions) += 1;
        let rx = lock(&self.pending)
            .pop_front()
            .ok_or_else(|| ChannelError::Connect("no scripted subscription".to_string()))?;
        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(Box::pin(stream))
    }
}
