pub mod adapters;
pub mod app_config;
pub mod application;
pub mod domain;

use std::sync::Arc;

use axum::Router;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::adapters::{
    http::{router, state::HttpState},
    onnx::model_catalog::OnnxModelCatalog,
    render::annotator::BoxAnnotator,
};
use crate::app_config::AppConfig;
use crate::application::{
    model_provider::{DetectorCache, ModelProvider},
    ports::{Annotator, DetectorLoader},
    services::DetectionService,
};

/// Wires the ONNX catalog, the detector cache and the annotator into the HTTP state.
pub fn build_state(config: &AppConfig) -> HttpState {
    let loader: Arc<dyn DetectorLoader> = Arc::new(OnnxModelCatalog::new(
        config.models.dir.clone(),
        config.models.yolo_params(),
        config.models.intra_threads,
    ));

    let annotator: Arc<dyn Annotator> = match &config.render.font_path {
        Some(path) => match BoxAnnotator::with_font_file(path) {
            Ok(a) => Arc::new(a),
            Err(e) => {
                warn!("label font unavailable, drawing boxes only: {e:#}");
                Arc::new(BoxAnnotator::without_font())
            }
        },
        None => Arc::new(BoxAnnotator::without_font()),
    };

    let provider = ModelProvider::new(loader, Arc::new(DetectorCache::new()));
    state_from_parts(provider, annotator)
}

pub fn state_from_parts(provider: ModelProvider, annotator: Arc<dyn Annotator>) -> HttpState {
    HttpState { detection: Arc::new(DetectionService::new(provider, annotator)) }
}

/// API routes plus the single page served from `static_dir`.
pub fn app(state: HttpState, config: &AppConfig) -> Router {
    info!(dir = %config.server.static_dir.display(), "serving static page");
    router(state).fallback_service(ServeDir::new(&config.server.static_dir))
}
