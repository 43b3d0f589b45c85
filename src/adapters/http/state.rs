use std::sync::Arc;
use crate::application::services::DetectionService;

/// Shared state for the Axum handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Runs uploads through provider, pipeline and summarizer.
    pub detection: Arc<DetectionService>,
}
