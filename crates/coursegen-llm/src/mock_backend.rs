//! Scripted backend for tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::LlmError;
use crate::types::{LlmBackend, LlmInvocation, LlmResult};

/// Scripted response for one model identifier.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Quota,
    BadRequest,
    Outage,
    /// Never completes within any reasonable test timeout
    Hang,
}

/// Backend that answers per model from a script and records every call.
///
/// Models without a script entry fail with `LlmError::Transport`.
#[derive(Debug, Default)]
pub struct MockBackend {
    script: Mutex<HashMap<String, VecDeque<MockReply>>>,
    calls: Mutex<Vec<String>>,
    call_count: AtomicU32,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `model`. Replies for the same model are consumed in order;
    /// the last one repeats.
    #[must_use]
    pub fn with_reply(self, model: &str, reply: MockReply) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.entry(model.to_string()).or_default().push_back(reply);
        }
        self
    }

    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Models invoked, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn next_reply(&self, model: &str) -> Option<MockReply> {
        let mut script = self.script.lock().ok()?;
        let queue = script.get_mut(model)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(inv.model.clone());
        }

        match self.next_reply(&inv.model) {
            Some(MockReply::Text(text)) => Ok(LlmResult::new(text, "mock", inv.model)),
            Some(MockReply::Quota) => Err(LlmError::ProviderQuota(
                "mock rate limit exceeded: 429 Too Many Requests".to_string(),
            )),
            Some(MockReply::BadRequest) => Err(LlmError::BadRequest(
                "mock rejected request: 400 Bad Request".to_string(),
            )),
            Some(MockReply::Outage) => Err(LlmError::ProviderOutage(
                "mock returned server error: 503 Service Unavailable".to_string(),
            )),
            Some(MockReply::Hang) => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Err(LlmError::Timeout {
                    duration: Duration::from_secs(24 * 60 * 60),
                })
            }
            None => Err(LlmError::Transport(format!(
                "mock has no reply for {}",
                inv.model
            ))),
        }
    }
}
