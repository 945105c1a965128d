use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::{FragmentGenerator, GenerationRequest, GeneratorError};

/// Generator that answers with pre-recorded responses, in order.
///
/// Requests are kept so callers can inspect what the store sent.
#[derive(Debug, Default)]
pub struct ReplayGenerator {
    responses: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ReplayGenerator {
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let generator = Self::default();
        for response in responses {
            generator.push_response(response);
        }
        generator
    }

    /// Queue a successful response
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses.lock().push_back(Ok(response.into()));
    }

    /// Queue a transport failure
    pub fn push_failure(&self, message: impl Into<String>) {
        self.responses.lock().push_back(Err(message.into()));
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl FragmentGenerator for ReplayGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GeneratorError> {
        debug!(nodes = request.context().nodes.len(), "replaying generator response");
        self.requests.lock().push(request);

        match self.responses.lock().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(GeneratorError::Transport(message)),
            None => Err(GeneratorError::Exhausted),
        }
    }
}
