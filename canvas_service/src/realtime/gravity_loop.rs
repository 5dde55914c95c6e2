use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::domain::use_cases::relax_room::RelaxRoomUseCase;

/// Starts the periodic relaxation of a room layout, until `shutdown` is cancelled.
///
/// A tick that runs late is skipped rather than replayed, ticks never overlap.
/// Cancellation is only observed between ticks, a running tick always completes.
pub fn spawn_gravity_loop(
    room_id: String,
    relax_room: Arc<RelaxRoomUseCase>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let span = info_span!("Gravity loop", room_id = %room_id);

    tokio::spawn(
        async move {
            info!("Starting gravity loop");

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                if let Err(error) = relax_room.execute(&room_id).await {
                    warn!(?error, "Gravity tick failed");
                }
            }

            info!("Gravity loop stopped");
        }
        .instrument(span),
    )
}
