use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use common::helper::error_chain_fmt;
use serde_json::json;

use crate::domain::use_cases::create_card::{CreateCardError, CreateCardRequest, CreateCardUseCase};

#[tracing::instrument(name = "Create card handler", skip(use_case, body))]
pub async fn create_card(
    use_case: web::Data<CreateCardUseCase>,
    body: web::Json<CreateCardBodyData>,
) -> Result<HttpResponse, CreateCardRouteError> {
    let body = body.into_inner();
    if body.text.trim().is_empty() {
        return Err(CreateCardRouteError::EmptyText);
    }
    let room_id = match body.room_id {
        Some(room_id) if !room_id.trim().is_empty() => room_id,
        _ => return Err(CreateCardRouteError::MissingRoomId),
    };

    let card = use_case
        .execute(&CreateCardRequest {
            text: body.text,
            room_id,
            user_id: body.user_id.unwrap_or_default(),
        })
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "card": card })))
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardBodyData {
    #[serde(default)]
    text: String,
    room_id: Option<String>,
    user_id: Option<String>,
}

#[derive(thiserror::Error)]
pub enum CreateCardRouteError {
    #[error("text must not be empty")]
    EmptyText,
    #[error("roomId is required")]
    MissingRoomId,
    #[error("Failed to create card: {0}")]
    CreateCardError(#[from] CreateCardError),
}

impl std::fmt::Debug for CreateCardRouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for CreateCardRouteError {
    fn status_code(&self) -> StatusCode {
        match self {
            CreateCardRouteError::EmptyText | CreateCardRouteError::MissingRoomId => {
                StatusCode::BAD_REQUEST
            }
            CreateCardRouteError::CreateCardError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(json!({ "error": self.to_string() }))
    }
}
