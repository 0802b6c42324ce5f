//! Fake Text Generator

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::application::ports::{ChatCompletion, ChatRequest, TextGenerationPort, UpstreamError};

/// 按顺序返回预设回复；回复用完后重复最后一个
pub struct FakeTextGenerator {
    replies: Mutex<VecDeque<Result<String, UpstreamError>>>,
    last: Mutex<Option<Result<String, UpstreamError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl FakeTextGenerator {
    pub fn new(replies: Vec<Result<String, UpstreamError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(content: impl Into<String>) -> Self {
        Self::new(vec![Ok(content.into())])
    }

    /// 已收到的请求
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerationPort for FakeTextGenerator {
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, UpstreamError> {
        let model = request.model.clone();
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let next = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        let reply = match next {
            Some(reply) => {
                if let Ok(mut last) = self.last.lock() {
                    *last = Some(reply.clone());
                }
                reply
            }
            None => self
                .last
                .lock()
                .ok()
                .and_then(|l| l.clone())
                .unwrap_or_else(|| Ok(String::new())),
        };

        reply.map(|content| ChatCompletion { content, model })
    }
}
