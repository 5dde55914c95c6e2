use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{dtos::magnet_partition::MagnetPartitionDto, helper::error_chain_fmt};

/// Events sent by a client on the realtime channel.
///
/// Frames are JSON text: `{"event": "card-move", "data": {"cardId": "..", "x": 1.0, "y": 2.0}}`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEventDto {
    #[serde(alias = "join-room")]
    Join(JoinPayload),
    CardMove(CardMovePayload),
    CursorMove(CursorMovePayload),
    MagnetApplied(MagnetAppliedPayload),
}

/// Events pushed by the server to the members of a room.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEventDto {
    CardMove(CardMovePayload),
    CursorMove(PeerCursorPayload),
    MagnetApplied(MagnetPartitionDto),
    CardCreated(CardCreatedPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub room_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMovePayload {
    pub card_id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CursorMovePayload {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub color: Option<String>,
}

/// A cursor position, tagged with the user who moved it
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerCursorPayload {
    pub user_id: String,
    pub x: f64,
    pub y: f64,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MagnetAppliedPayload {
    pub room_id: String,
    #[serde(rename = "match")]
    pub matched: Vec<String>,
    pub no_match: Vec<String>,
}

/// A newly created artifact, as stored
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CardCreatedPayload {
    pub card: JsonValue,
}

impl ClientEventDto {
    pub fn try_parsing(data: &str) -> Result<Self, RealtimeEventDtoError> {
        serde_json::from_str(data)
            .map_err(|e| RealtimeEventDtoError::InvalidJsonData(e, data.to_string()))
    }
}

impl ServerEventDto {
    /// Events superseded by the next one of the same kind, they can be lost
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, ServerEventDto::CursorMove(_))
    }

    pub fn try_serializing(&self) -> Result<String, RealtimeEventDtoError> {
        serde_json::to_string(self).map_err(RealtimeEventDtoError::InvalidEvent)
    }
}

#[derive(thiserror::Error)]
pub enum RealtimeEventDtoError {
    #[error("Data did not represent a valid realtime event: {0}. Data: {1}")]
    InvalidJsonData(serde_json::Error, String),

    #[error("Event could not be serialized to JSON: {0}")]
    InvalidEvent(serde_json::Error),
}

impl std::fmt::Debug for RealtimeEventDtoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::{assert_err, assert_ok};
    use serde_json::json;

    #[test]
    fn join_room_is_accepted_as_an_alias_of_join() {
        let frame = r#"{"event": "join-room", "data": {"roomId": "r1", "userId": "u1"}}"#;

        let event = assert_ok!(ClientEventDto::try_parsing(frame));

        assert_eq!(
            event,
            ClientEventDto::Join(JoinPayload {
                room_id: "r1".into(),
                user_id: "u1".into()
            })
        );
    }

    #[test]
    fn cursor_move_without_color_is_parsed() {
        let frame = r#"{"event": "cursor-move", "data": {"x": 10.5, "y": -3}}"#;

        let event = assert_ok!(ClientEventDto::try_parsing(frame));

        assert_eq!(
            event,
            ClientEventDto::CursorMove(CursorMovePayload {
                x: 10.5,
                y: -3.0,
                color: None
            })
        );
    }

    #[test]
    fn unknown_events_and_missing_fields_are_rejected() {
        assert_err!(ClientEventDto::try_parsing(
            r#"{"event": "delete-room", "data": {}}"#
        ));
        assert_err!(ClientEventDto::try_parsing(
            r#"{"event": "card-move", "data": {"x": 1, "y": 2}}"#
        ));
        assert_err!(ClientEventDto::try_parsing("not json"));
    }

    #[test]
    fn magnet_partition_uses_the_match_and_no_match_keys() {
        let event = ServerEventDto::MagnetApplied(MagnetPartitionDto {
            matched: vec!["a".into()],
            no_match: vec!["b".into(), "c".into()],
        });

        let frame = assert_ok!(event.try_serializing());
        let frame: JsonValue = serde_json::from_str(&frame).unwrap();

        assert_eq!(
            frame,
            json!({"event": "magnet-applied", "data": {"match": ["a"], "noMatch": ["b", "c"]}})
        );
    }
}
