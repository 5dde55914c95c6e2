use common::dtos::realtime_event::{CardCreatedPayload, CardMovePayload, ServerEventDto};

use crate::domain::{entities::artifact::Artifact, services::gravity::Position};

/// Announces a newly stored artifact to its room
pub fn card_created(artifact: &Artifact) -> Result<ServerEventDto, serde_json::Error> {
    Ok(ServerEventDto::CardCreated(CardCreatedPayload {
        card: serde_json::to_value(artifact)?,
    }))
}

pub fn card_moved(card_id: &str, position: Position) -> ServerEventDto {
    ServerEventDto::CardMove(CardMovePayload {
        card_id: card_id.to_string(),
        x: position.x,
        y: position.y,
    })
}
