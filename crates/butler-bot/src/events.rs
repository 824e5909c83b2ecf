//! Gateway event pump feeding the spam detector

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use butler_platform::GatewayEvent;
use butler_service::{ServiceResult, SpamDetector, SpamVerdict};

/// Route one event to the detector; `None` for events it does not handle
pub async fn dispatch(
    detector: &SpamDetector,
    event: GatewayEvent,
) -> ServiceResult<Option<SpamVerdict>> {
    let verdict = match event {
        GatewayEvent::MessageCreate(message) => detector.on_message(&message).await?,
        GatewayEvent::MessageUpdate(message) => {
            detector
                .on_message_edit(message.channel_id, message.id, message.guild_id)
                .await?
        }
        GatewayEvent::MessageDelete(message) => {
            detector
                .on_message_delete(message.channel_id, message.id, message.guild_id)
                .await?;
            return Ok(None);
        }
        GatewayEvent::Ready { session_id, user_id } => {
            info!(session_id = %session_id, user_id = %user_id, "Gateway session ready");
            return Ok(None);
        }
        GatewayEvent::Resumed => {
            info!("Gateway session resumed");
            return Ok(None);
        }
    };

    Ok(Some(verdict))
}

/// Drain `events` until cancelled or the gateway hangs up
///
/// Without a detector, message events are dropped. A failing event is logged
/// and never stops the pump.
pub async fn pump_events(
    mut events: mpsc::Receiver<GatewayEvent>,
    detector: Option<Arc<SpamDetector>>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        let kind = event.kind();
        let Some(detector) = &detector else {
            debug!(event = %kind, "Spam detection disabled, event dropped");
            continue;
        };

        match dispatch(detector, event).await {
            Ok(Some(verdict)) => debug!(event = %kind, ?verdict, "Message handled"),
            Ok(None) => {}
            Err(e) => warn!(event = %kind, error = %e, "Failed to handle gateway event"),
        }
    }

    debug!("Event pump stopped");
}
