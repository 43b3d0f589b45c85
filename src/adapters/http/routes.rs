use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::QueryRejection,
        Multipart, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::adapters::http::state::HttpState;
use crate::application::dto::{
    ConfigResponse, DetectResponse, ErrorResponse, StrictnessQuery, StrictnessResponse,
};
use crate::domain::{
    errors::{DomainError, DomainResult},
    model::{ConfidenceThreshold, ModelTier, Settings},
};

pub async fn get_config() -> impl IntoResponse {
    Json(ConfigResponse::default())
}

pub async fn get_strictness(query: Result<Query<StrictnessQuery>, QueryRejection>) -> Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(rejection) => {
            warn!("rejected strictness query: {rejection}");
            return error_response(&DomainError::config(rejection.body_text()));
        }
    };
    match ConfidenceThreshold::new(q.threshold) {
        Ok(t) => Json(StrictnessResponse::from(t.band())).into_response(),
        Err(e) => error_response(&e),
    }
}

pub async fn detect(
    State(st): State<HttpState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            warn!("rejected detect request: {rejection}");
            return error_response(&DomainError::config(rejection.body_text()));
        }
    };
    let settings = match read_settings(multipart).await {
        Ok(s) => s,
        Err(e) => {
            warn!("rejected detect request: {e}");
            return error_response(&e);
        }
    };

    let service = st.detection.clone();
    let joined = tokio::task::spawn_blocking(move || {
        service
            .run(&settings)
            .and_then(|report| DetectResponse::try_from(&report))
    })
    .await;

    match joined {
        Ok(Ok(body)) => Json(body).into_response(),
        Ok(Err(e)) => error_response(&e),
        Err(join_err) => {
            error!("detection task failed: {join_err}");
            error_response(&DomainError::detection("inference task aborted"))
        }
    }
}

/// Collects the panel fields. Missing fields fall back to the panel defaults.
async fn read_settings(mut multipart: Multipart) -> DomainResult<Settings> {
    let mut settings = Settings::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DomainError::config(format!("malformed upload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "model" => {
                let text = field.text().await.map_err(|e| DomainError::config(e.to_string()))?;
                settings.model_tier = text.parse::<ModelTier>()?;
            }
            "threshold" => {
                let text = field.text().await.map_err(|e| DomainError::config(e.to_string()))?;
                let value = text
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| DomainError::config(format!("threshold '{text}' is not a number")))?;
                settings.confidence_threshold = ConfidenceThreshold::new(value)?;
            }
            "image" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| DomainError::config(format!("malformed upload: {e}")))?;
                settings.source_image = Some(bytes.to_vec());
            }
            _ => {}
        }
    }
    Ok(settings)
}

pub fn status_for(e: &DomainError) -> StatusCode {
    match e {
        DomainError::ConfigurationViolation(_) => StatusCode::BAD_REQUEST,
        DomainError::Detection(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::Load { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(e: &DomainError) -> Response {
    (status_for(e), Json(ErrorResponse::from(e))).into_response()
}
