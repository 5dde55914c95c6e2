use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use common::helper::error_chain_fmt;
use serde_json::json;

use crate::{
    domain::use_cases::load_canvas::LoadCanvasUseCase,
    ports::artifact_repository::ArtifactRepositoryError,
};

#[tracing::instrument(name = "Canvas handler", skip(use_case))]
pub async fn canvas(
    use_case: web::Data<LoadCanvasUseCase>,
    room_id: web::Path<String>,
) -> Result<HttpResponse, CanvasError> {
    let cards = use_case.execute(&room_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "cards": cards })))
}

#[derive(thiserror::Error)]
pub enum CanvasError {
    #[error("Failed to load canvas: {0}")]
    ArtifactRepositoryError(#[from] ArtifactRepositoryError),
}

impl std::fmt::Debug for CanvasError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for CanvasError {
    fn status_code(&self) -> StatusCode {
        match self {
            CanvasError::ArtifactRepositoryError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(json!({ "error": self.to_string() }))
    }
}
