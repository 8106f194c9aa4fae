//! Scripted backend for tests
//!
//! Replays a queue of canned replies and records every invocation it sees.

use crate::LlmError;
use crate::types::{LlmBackend, LlmInvocation, LlmResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One canned reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Succeed with this text.
    Text(String),
    /// Fail with this error.
    Fail(LlmError),
    /// Never answer; the caller's timeout decides.
    Hang,
}

impl ScriptedReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn transport_error(message: impl Into<String>) -> Self {
        Self::Fail(LlmError::Transport(message.into()))
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    replies: VecDeque<ScriptedReply>,
    fallback: Option<ScriptedReply>,
    seen: Vec<LlmInvocation>,
}

/// Backend that answers from a script.
///
/// Replies are consumed in order. Once the queue is empty the fallback reply
/// (if any) is repeated forever; without a fallback the call fails with a
/// transport error naming the exhausted script.
///
/// Clones share the same script and invocation log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        let backend = Self::default();
        backend.lock().replies.extend(replies);
        backend
    }

    /// Backend that gives the same reply to every call.
    #[must_use]
    pub fn always(reply: ScriptedReply) -> Self {
        Self::default().with_fallback(reply)
    }

    /// Backend whose every call fails with a transport error.
    #[must_use]
    pub fn always_failing() -> Self {
        Self::always(ScriptedReply::transport_error("connection refused"))
    }

    #[must_use]
    pub fn with_fallback(self, reply: ScriptedReply) -> Self {
        self.lock().fallback = Some(reply);
        self
    }

    /// Append a reply to the end of the queue.
    pub fn push(&self, reply: ScriptedReply) {
        self.lock().replies.push_back(reply);
    }

    /// Every invocation received so far, in order.
    #[must_use]
    pub fn invocations(&self) -> Vec<LlmInvocation> {
        self.lock().seen.clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().seen.len()
    }

    /// Stage labels of every invocation received so far.
    #[must_use]
    pub fn stages(&self) -> Vec<String> {
        self.lock().seen.iter().map(|inv| inv.stage.clone()).collect()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.lock().replies.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        // A panicking test thread must not hide the log from other assertions.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = inv.model.clone();
        let reply = {
            let mut state = self.lock();
            state.seen.push(inv);
            state.replies.pop_front().or_else(|| state.fallback.clone())
        };

        match reply {
            Some(ScriptedReply::Text(text)) => Ok(LlmResult::new(text, "scripted", model)),
            Some(ScriptedReply::Fail(err)) => Err(err),
            Some(ScriptedReply::Hang) => {
                std::future::pending::<()>().await;
                Err(LlmError::Transport("scripted hang resumed".to_string()))
            }
            None => Err(LlmError::Transport("script exhausted".to_string())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
