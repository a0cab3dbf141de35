//! Mock extractor for tests and offline development.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::ports::{Extraction, ExtractionError, ExtractionRequest, ParameterExtractor};

/// Scripted extractor: pops queued results in order, then keeps returning
/// the fallback.
pub struct MockExtractor {
    queue: Mutex<VecDeque<Result<Extraction, ExtractionError>>>,
    fallback: Extraction,
    calls: Mutex<Vec<ExtractionRequest>>,
}

impl MockExtractor {
    /// A mock that always returns an empty extraction.
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Extraction::empty(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queues one result.
    pub fn push(&self, result: Result<Extraction, ExtractionError>) {
        self.queue.lock().unwrap().push_back(result);
    }

    /// Sets the result returned once the queue is drained.
    pub fn with_fallback(mut self, fallback: Extraction) -> Self {
        self.fallback = fallback;
        self
    }

    /// Requests seen so far.
    pub fn requests(&self) -> Vec<ExtractionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ParameterExtractor for MockExtractor {
    async fn extract(&self, request: ExtractionRequest) -> Result<Extraction, ExtractionError> {
        self.calls.lock().unwrap().push(request);
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::configurator::ConfiguratorState;

    #[tokio::test]
    async fn pops_queued_results_then_falls_back() {
        let mock = MockExtractor::new();
        mock.push(Err(ExtractionError::ProviderUnavailable("down".into())));

        let request = ExtractionRequest::new("hi", ConfiguratorState::PowerSourceSelection);
        assert!(mock.extract(request.clone()).await.is_err());
        assert!(mock.extract(request).await.is_ok());
        assert_eq!(mock.requests().len(), 2);
    }
}
