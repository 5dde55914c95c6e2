use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use common::helper::error_chain_fmt;
use serde_json::json;
use tracing::info;

use crate::domain::use_cases::search_magnet::{
    SearchMagnetError, SearchMagnetRequest, SearchMagnetUseCase,
};

/// Partitions a room between the artifacts matching a free-text query and the others
#[tracing::instrument(name = "Magnet handler", skip(use_case, body))]
pub async fn magnet(
    use_case: web::Data<SearchMagnetUseCase>,
    body: web::Json<MagnetBodyData>,
) -> Result<HttpResponse, MagnetError> {
    let body = body.into_inner();
    let room_id = match body.room_id {
        Some(room_id) if !room_id.trim().is_empty() => room_id,
        _ => return Err(MagnetError::MissingRoomId),
    };
    info!(%room_id, query = %body.query, "Applying magnet");

    let partition = use_case
        .execute(&SearchMagnetRequest {
            query: body.query,
            room_id,
        })
        .await?;

    Ok(HttpResponse::Ok().json(partition))
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagnetBodyData {
    #[serde(default)]
    query: String,
    room_id: Option<String>,
}

#[derive(thiserror::Error)]
pub enum MagnetError {
    #[error("roomId is required")]
    MissingRoomId,
    #[error("Failed to apply magnet: {0}")]
    SearchMagnetError(#[from] SearchMagnetError),
}

impl std::fmt::Debug for MagnetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for MagnetError {
    fn status_code(&self) -> StatusCode {
        match self {
            MagnetError::MissingRoomId => StatusCode::BAD_REQUEST,
            MagnetError::SearchMagnetError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(json!({ "error": self.to_string() }))
    }
}
