use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::ProviderClient;
use crate::conversation::Conversation;
use crate::error::ProviderError;

/// Scripted outcome for a single `complete` call.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success(String),
    Unavailable,
}

/// Shared control surface for a `MockClient`: scripts responses and records
/// every conversation the client received, in call order.
#[derive(Debug, Default)]
pub struct MockHandle {
    responses: Mutex<VecDeque<MockResponse>>,
    calls: Mutex<Vec<Conversation>>,
}

impl MockHandle {
    pub fn add_response(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<Conversation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

/// Mock provider driven by a shared handle. An exhausted script reports
/// unavailability, same as a provider that went away mid-test.
#[derive(Debug, Clone)]
pub struct MockClient {
    handle: Arc<MockHandle>,
}

impl MockClient {
    pub fn new() -> (Self, Arc<MockHandle>) {
        let handle = Arc::new(MockHandle::default());
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }

    pub fn with_responses(responses: Vec<MockResponse>) -> (Self, Arc<MockHandle>) {
        let (client, handle) = Self::new();
        for response in responses {
            handle.add_response(response);
        }
        (client, handle)
    }
}

#[async_trait]
impl ProviderClient for MockClient {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn complete(&self, conversation: &Conversation) -> Result<String, ProviderError> {
        self.handle.calls.lock().unwrap().push(conversation.clone());
        let next = self.handle.responses.lock().unwrap().pop_front();
        match next {
            Some(MockResponse::Success(text)) => Ok(text),
            Some(MockResponse::Unavailable) => {
                Err(ProviderError::Mock("scripted unavailable".to_string()))
            }
            None => Err(ProviderError::Mock("no scripted responses left".to_string())),
        }
    }

    fn clone_box(&self) -> Box<dyn ProviderClient> {
        Box::new(self.clone())
    }
}

/// Mock provider that is permanently unconfigured.
#[derive(Debug, Clone, Default)]
pub struct MockVoid;

#[async_trait]
impl ProviderClient for MockVoid {
    fn name(&self) -> &'static str {
        "mock-void"
    }

    async fn complete(&self, _conversation: &Conversation) -> Result<String, ProviderError> {
        Err(ProviderError::NotConfigured)
    }

    fn clone_box(&self) -> Box<dyn ProviderClient> {
        Box::new(self.clone())
    }
}
