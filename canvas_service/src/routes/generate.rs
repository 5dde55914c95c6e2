use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use common::helper::error_chain_fmt;
use serde_json::json;
use tracing::info;

use crate::domain::use_cases::generate_components::{
    GenerateComponentsError, GenerateComponentsRequest, GenerateComponentsUseCase,
};

/// Appends a generated batch to a room and responds with its whole timeline
#[tracing::instrument(name = "Generate handler", skip(use_case, body))]
pub async fn generate(
    use_case: web::Data<GenerateComponentsUseCase>,
    body: web::Json<GenerateBodyData>,
) -> Result<HttpResponse, GenerateError> {
    let body = body.into_inner();
    let room_id = match body.room_id {
        Some(room_id) if !room_id.trim().is_empty() => room_id,
        _ => return Err(GenerateError::MissingRoomId),
    };
    info!(%room_id, prompt = %body.prompt, "Generating components");

    let timeline = use_case
        .execute(&GenerateComponentsRequest {
            prompt: body.prompt,
            room_id,
        })
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "components": timeline })))
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBodyData {
    #[serde(default)]
    prompt: String,
    room_id: Option<String>,
}

#[derive(thiserror::Error)]
pub enum GenerateError {
    #[error("roomId is required")]
    MissingRoomId,
    #[error("Failed to generate canvas: {0}")]
    GenerateComponentsError(#[from] GenerateComponentsError),
}

impl std::fmt::Debug for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for GenerateError {
    fn status_code(&self) -> StatusCode {
        match self {
            GenerateError::MissingRoomId => StatusCode::BAD_REQUEST,
            GenerateError::GenerateComponentsError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[tracing::instrument(name = "Response error from generate handler", skip(self), fields(error = %self))]
    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(json!({ "error": self.to_string() }))
    }
}
