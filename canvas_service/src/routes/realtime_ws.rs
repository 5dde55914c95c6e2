use actix_web::{rt, web, HttpRequest, HttpResponse};
use actix_ws::{CloseCode, CloseReason, Message, MessageStream, Session};
use common::dtos::realtime_event::ServerEventDto;
use futures::StreamExt;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::realtime::{
    room_registry::session_channel,
    session::{RealtimeContext, RealtimeSession},
};

/// Upgrades the connection to a websocket carrying the realtime events of a room
#[tracing::instrument(name = "Realtime websocket handler", skip(request, body, context))]
pub async fn realtime_ws(
    request: HttpRequest,
    body: web::Payload,
    context: web::Data<RealtimeContext>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, ws_session, frames) = actix_ws::handle(&request, body)?;

    let (outbound, outbound_rx) = session_channel();
    let overflow = outbound.overflow.clone();
    let session = RealtimeSession::new(context.into_inner(), outbound);
    info!(session_id = %session.id(), "Realtime connection opened");

    rt::spawn(write_events(ws_session.clone(), outbound_rx, overflow.clone()));
    rt::spawn(read_frames(session, ws_session, frames, overflow));

    Ok(response)
}

/// Processes the client frames in arrival order until the connection closes
/// or the client is evicted for being too slow
async fn read_frames(
    mut session: RealtimeSession,
    mut ws_session: Session,
    mut frames: MessageStream,
    overflow: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            _ = overflow.cancelled() => break,
            frame = frames.next() => frame,
        };
        let Some(frame) = frame else {
            break;
        };

        match frame {
            Ok(Message::Text(text)) => session.handle_frame(&text).await,
            Ok(Message::Ping(bytes)) => {
                if ws_session.pong(&bytes).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(reason)) => {
                debug!(session_id = %session.id(), ?reason, "Client closed the connection");
                let _ = ws_session.close(reason).await;
                break;
            }
            Ok(_) => {}
            Err(error) => {
                warn!(session_id = %session.id(), %error, "Realtime protocol error");
                break;
            }
        }
    }

    info!(session_id = %session.id(), "Realtime connection closed");
    session.disconnect();
}

/// Forwards the events meant for this client, until every sender is gone or the socket closes.
/// A client that let its queue fill up is disconnected.
async fn write_events(
    mut ws_session: Session,
    mut outbound: Receiver<ServerEventDto>,
    overflow: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = overflow.cancelled() => {
                let reason = CloseReason {
                    code: CloseCode::Policy,
                    description: Some("Too many pending events".to_string()),
                };
                let _ = ws_session.close(Some(reason)).await;
                return;
            }
            event = outbound.recv() => event,
        };
        let Some(event) = event else {
            break;
        };

        let frame = match event.try_serializing() {
            Ok(frame) => frame,
            Err(error) => {
                warn!(?error, "Dropping an event that could not be serialized");
                continue;
            }
        };

        if ws_session.text(frame).await.is_err() {
            break;
        }
    }
}
