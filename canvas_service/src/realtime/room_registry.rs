use std::collections::HashMap;

use common::dtos::realtime_event::ServerEventDto;
use dashmap::{mapref::entry::Entry, DashMap};
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

/// Identifies one realtime connection
pub type SessionId = Uuid;

/// Number of events waiting for a client before it is considered too slow
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// How the registry reaches one session
#[derive(Debug, Clone)]
pub struct SessionOutbound {
    pub events: Sender<ServerEventDto>,
    /// Cancelled when the client did not keep up with its events,
    /// the connection is then closed
    pub overflow: CancellationToken,
}

/// A bounded queue of events for one session, and the receiving end the connection writer drains
pub fn session_channel() -> (SessionOutbound, Receiver<ServerEventDto>) {
    let (events, receiver) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
    (
        SessionOutbound {
            events,
            overflow: CancellationToken::new(),
        },
        receiver,
    )
}

struct Member {
    user_id: String,
    outbound: SessionOutbound,
}

struct Room {
    members: HashMap<SessionId, Member>,
    /// Cancelled once the last member leaves, stops the room background tasks
    shutdown: CancellationToken,
}

/// Result of a session joining a room
#[derive(Debug, Clone)]
pub struct JoinedRoom {
    /// `true` only for the session that opened the room, which starts its background tasks
    pub first_member: bool,
    pub shutdown: CancellationToken,
}

/// Process-wide registry of the sessions joined to each room.
///
/// A room exists exactly while it has members: it is created by the first join
/// and removed, in the same locked step, by the last leave.
/// Only synchronous work is done while a room entry is locked.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(
        &self,
        room_id: &str,
        session_id: SessionId,
        user_id: &str,
        outbound: SessionOutbound,
    ) -> JoinedRoom {
        let member = Member {
            user_id: user_id.to_string(),
            outbound,
        };

        match self.rooms.entry(room_id.to_string()) {
            Entry::Occupied(mut room) => {
                room.get_mut().members.insert(session_id, member);
                JoinedRoom {
                    first_member: false,
                    shutdown: room.get().shutdown.clone(),
                }
            }
            Entry::Vacant(vacant) => {
                let shutdown = CancellationToken::new();
                vacant.insert(Room {
                    members: HashMap::from([(session_id, member)]),
                    shutdown: shutdown.clone(),
                });
                JoinedRoom {
                    first_member: true,
                    shutdown,
                }
            }
        }
    }

    /// Removes a session. Returns `true` if it was the last member:
    /// the room is then dropped and its tasks cancelled.
    pub fn leave(&self, room_id: &str, session_id: SessionId) -> bool {
        let closed = self.rooms.remove_if_mut(room_id, |_, room| {
            room.members.remove(&session_id);
            room.members.is_empty()
        });

        match closed {
            Some((_, room)) => {
                debug!(room_id, "Last member left the room");
                room.shutdown.cancel();
                true
            }
            None => false,
        }
    }

    /// Sends an event to every member of the room, returns the number of members reached
    pub fn broadcast(&self, room_id: &str, event: &ServerEventDto) -> usize {
        self.send_to_members(room_id, event, None)
    }

    /// Sends an event to every member of the room but one
    pub fn broadcast_except(
        &self,
        room_id: &str,
        except: SessionId,
        event: &ServerEventDto,
    ) -> usize {
        self.send_to_members(room_id, event, Some(except))
    }

    /// Queues the event for the members without waiting on any of them.
    ///
    /// A full queue drops an ephemeral event. For any other event the member
    /// is evicted and its connection told to close.
    fn send_to_members(
        &self,
        room_id: &str,
        event: &ServerEventDto,
        except: Option<SessionId>,
    ) -> usize {
        let mut reached = 0;
        let mut overflowed = vec![];

        {
            let Some(room) = self.rooms.get(room_id) else {
                return 0;
            };

            for (session_id, member) in room
                .members
                .iter()
                .filter(|(session_id, _)| Some(**session_id) != except)
            {
                match member.outbound.events.try_send(event.clone()) {
                    Ok(()) => reached += 1,
                    Err(TrySendError::Full(_)) if event.is_ephemeral() => {
                        debug!(%session_id, user_id = %member.user_id, "Dropping an ephemeral event for a slow session");
                    }
                    Err(TrySendError::Full(_)) => {
                        warn!(%session_id, user_id = %member.user_id, "Session can not keep up with its events, evicting it");
                        member.outbound.overflow.cancel();
                        overflowed.push(*session_id);
                    }
                    Err(TrySendError::Closed(_)) => {
                        // The writer of this session is gone, it is about to leave
                        debug!(%session_id, user_id = %member.user_id, "Dropping event for a closed session");
                    }
                }
            }
        }

        for session_id in overflowed {
            self.leave(room_id, session_id);
        }

        reached
    }

    pub fn member_count(&self, room_id: &str) -> usize {
        self.rooms
            .get(room_id)
            .map(|room| room.members.len())
            .unwrap_or(0)
    }

    pub fn is_active(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }
}
