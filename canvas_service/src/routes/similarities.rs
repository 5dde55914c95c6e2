use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use common::helper::error_chain_fmt;
use serde_json::json;

use crate::domain::use_cases::compute_similarities::{
    ComputeSimilaritiesError, ComputeSimilaritiesUseCase,
};

#[tracing::instrument(name = "Similarities handler", skip(use_case))]
pub async fn similarities(
    use_case: web::Data<ComputeSimilaritiesUseCase>,
    query: web::Query<SimilaritiesQuery>,
) -> Result<HttpResponse, SimilaritiesError> {
    let room_id = match query.into_inner().room_id {
        Some(room_id) if !room_id.is_empty() => room_id,
        _ => return Err(SimilaritiesError::MissingRoomId),
    };

    let pairs = use_case.execute(&room_id).await?;

    Ok(HttpResponse::Ok().json(pairs))
}

#[derive(Debug, serde::Deserialize)]
pub struct SimilaritiesQuery {
    #[serde(rename = "roomId")]
    room_id: Option<String>,
}

#[derive(thiserror::Error)]
pub enum SimilaritiesError {
    #[error("roomId is required")]
    MissingRoomId,
    #[error("Failed to compute similarities: {0}")]
    ComputeSimilaritiesError(#[from] ComputeSimilaritiesError),
}

impl std::fmt::Debug for SimilaritiesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SimilaritiesError {
    fn status_code(&self) -> StatusCode {
        match self {
            SimilaritiesError::MissingRoomId => StatusCode::BAD_REQUEST,
            SimilaritiesError::ComputeSimilaritiesError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(json!({ "error": self.to_string() }))
    }
}
