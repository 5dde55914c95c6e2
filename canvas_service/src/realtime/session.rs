use std::{sync::Arc, time::Duration};

use common::dtos::{
    magnet_partition::MagnetPartitionDto,
    realtime_event::{
        CardMovePayload, ClientEventDto, CursorMovePayload, MagnetAppliedPayload,
        PeerCursorPayload, ServerEventDto,
    },
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    domain::use_cases::relax_room::RelaxRoomUseCase,
    ports::artifact_repository::{ArtifactField, ArtifactRepository},
    realtime::{
        gravity_loop::spawn_gravity_loop,
        room_registry::{RoomRegistry, SessionId, SessionOutbound},
    },
};

/// Everything a realtime session needs, shared by all connections
pub struct RealtimeContext {
    pub room_registry: Arc<RoomRegistry>,
    pub artifact_repository: Arc<dyn ArtifactRepository>,
    /// `None` when gravity is disabled
    pub relax_room: Option<Arc<RelaxRoomUseCase>>,
    pub gravity_interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    Joined { room_id: String, user_id: String },
    Disconnected,
}

/// Server side of one realtime connection.
///
/// Events are handled one at a time in arrival order. Whatever is sent to the
/// client goes through `outbound`, drained by the connection writer.
pub struct RealtimeSession {
    id: SessionId,
    state: SessionState,
    context: Arc<RealtimeContext>,
    outbound: SessionOutbound,
}

impl RealtimeSession {
    pub fn new(context: Arc<RealtimeContext>, outbound: SessionOutbound) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Connected,
            context,
            outbound,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Handles a raw text frame, frames that are not a known event are ignored
    pub async fn handle_frame(&mut self, frame: &str) {
        match ClientEventDto::try_parsing(frame) {
            Ok(event) => self.handle(event).await,
            Err(error) => debug!(session_id = %self.id, ?error, "Ignoring malformed frame"),
        }
    }

    pub async fn handle(&mut self, event: ClientEventDto) {
        match event {
            ClientEventDto::Join(payload) => match self.state {
                SessionState::Connected => self.join(payload.room_id, payload.user_id),
                SessionState::Joined { .. } => {
                    debug!(session_id = %self.id, "Session already joined a room, ignoring join")
                }
                SessionState::Disconnected => {}
            },
            event => self.handle_room_event(event).await,
        }
    }

    fn join(&mut self, room_id: String, user_id: String) {
        let joined = self.context.room_registry.join(
            &room_id,
            self.id,
            &user_id,
            self.outbound.clone(),
        );
        info!(session_id = %self.id, %room_id, %user_id, "User joined room");

        if joined.first_member {
            if let Some(relax_room) = &self.context.relax_room {
                spawn_gravity_loop(
                    room_id.clone(),
                    relax_room.clone(),
                    self.context.gravity_interval,
                    joined.shutdown,
                );
            }
        }

        self.state = SessionState::Joined { room_id, user_id };
    }

    async fn handle_room_event(&self, event: ClientEventDto) {
        let SessionState::Joined { room_id, user_id } = &self.state else {
            debug!(session_id = %self.id, "Ignoring event from a session outside of any room");
            return;
        };

        match event {
            ClientEventDto::Join(_) => {}
            ClientEventDto::CardMove(payload) => self.move_card(room_id, payload).await,
            ClientEventDto::CursorMove(CursorMovePayload { x, y, color }) => {
                let event = ServerEventDto::CursorMove(PeerCursorPayload {
                    user_id: user_id.clone(),
                    x,
                    y,
                    color,
                });
                self.context
                    .room_registry
                    .broadcast_except(room_id, self.id, &event);
            }
            ClientEventDto::MagnetApplied(MagnetAppliedPayload {
                room_id: target_room_id,
                matched,
                no_match,
            }) => {
                if &target_room_id != room_id {
                    warn!(
                        session_id = %self.id,
                        %room_id,
                        %target_room_id,
                        "Ignoring magnet for another room"
                    );
                    return;
                }
                let event = ServerEventDto::MagnetApplied(MagnetPartitionDto { matched, no_match });
                self.context.room_registry.broadcast(room_id, &event);
            }
        }
    }

    async fn move_card(&self, room_id: &str, payload: CardMovePayload) {
        let repository = &self.context.artifact_repository;
        let persisted = match repository
            .set_field(room_id, &payload.card_id, ArtifactField::X, payload.x.into())
            .await
        {
            Ok(()) => {
                repository
                    .set_field(room_id, &payload.card_id, ArtifactField::Y, payload.y.into())
                    .await
            }
            Err(error) => Err(error),
        };

        if let Err(error) = persisted {
            warn!(?error, card_id = %payload.card_id, "Could not move card");
            return;
        }

        self.context
            .room_registry
            .broadcast_except(room_id, self.id, &ServerEventDto::CardMove(payload));
    }

    /// Leaves the room, the session then ignores every event
    pub fn disconnect(&mut self) {
        if let SessionState::Joined { room_id, .. } = &self.state {
            self.context.room_registry.leave(room_id, self.id);
            info!(session_id = %self.id, %room_id, "User left room");
        }
        self.state = SessionState::Disconnected;
    }
}

impl Drop for RealtimeSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}
