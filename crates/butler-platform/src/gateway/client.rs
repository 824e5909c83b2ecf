//! Gateway connection loop
//!
//! Keeps one session alive: identify or resume, heartbeat, decode dispatches
//! into [`GatewayEvent`]s, reconnect with backoff.

use std::fmt::Display;
use std::time::Duration;

use futures::{Sink, SinkExt, StreamExt};
use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use butler_common::DiscordConfig;
use butler_core::{PlatformError, PlatformResult};

use crate::events::GatewayEvent;
use crate::protocol::{
    CloseCode, GatewayMessage, HelloPayload, IdentifyPayload, Intents, OpCode, ReadyPayload,
    ResumePayload,
};

use super::session::{Session, SessionState};

/// Time allowed between connecting and receiving Hello
const HELLO_TIMEOUT: Duration = Duration::from_secs(20);

/// First reconnect delay; doubled per consecutive failure
const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Upper bound of the reconnect delay
const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(60);

/// How a connection ended
#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionEnd {
    /// Cancelled, or nobody listens for events any more
    Shutdown,
    /// Connect again, resuming when the session allows it
    Reconnect,
    /// The gateway refused the session for good
    Fatal(String),
}

/// Client side of the gateway for a single bot session
pub struct GatewayClient {
    url: String,
    token: String,
    intents: Intents,
    events: mpsc::Sender<GatewayEvent>,
    ready: watch::Sender<bool>,
    state: SessionState,
}

impl GatewayClient {
    /// Create a client delivering events to `events`
    ///
    /// The returned receiver flips to `true` on the first READY and stays there.
    pub fn new(
        config: &DiscordConfig,
        intents: Intents,
        events: mpsc::Sender<GatewayEvent>,
    ) -> (Self, watch::Receiver<bool>) {
        let (ready, ready_rx) = watch::channel(false);
        let client = Self {
            url: config.gateway_url.clone(),
            token: config.token.clone(),
            intents,
            events,
            ready,
            state: SessionState::default(),
        };
        (client, ready_rx)
    }

    /// Run until cancelled or the gateway rejects the session permanently
    pub async fn run(mut self, cancel: CancellationToken) -> PlatformResult<()> {
        let mut failures: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            match self.run_session(&cancel).await {
                Ok(SessionEnd::Shutdown) => {
                    info!("Gateway session closed");
                    return Ok(());
                }
                Ok(SessionEnd::Fatal(reason)) => {
                    error!(reason = %reason, "Gateway rejected the session");
                    return Err(PlatformError::Gateway(reason));
                }
                Ok(SessionEnd::Reconnect) => {
                    failures = 0;
                    info!(resumable = self.state.resumable().is_some(), "Gateway reconnecting");
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    warn!(error = %e, failures, "Gateway connection failed");
                }
            }

            let delay = reconnect_delay(failures);
            tokio::select! {
                () = cancel.cancelled() => return Ok(()),
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn run_session(&mut self, cancel: &CancellationToken) -> PlatformResult<SessionEnd> {
        let url = self.state.connect_url(&self.url);
        debug!(url = %url, "Connecting to gateway");

        let (socket, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(gateway_error)?;
        let (mut sink, mut stream) = socket.split();

        // Hello comes first and carries the heartbeat interval
        let hello = timeout(HELLO_TIMEOUT, async {
            while let Some(frame) = stream.next().await {
                match frame.map_err(gateway_error)? {
                    Message::Text(text) => {
                        let message = GatewayMessage::from_json(&text).map_err(decode_error)?;
                        if message.op == OpCode::Hello {
                            return message.data::<HelloPayload>().map_err(decode_error);
                        }
                    }
                    Message::Close(frame) => {
                        return Err(PlatformError::Gateway(describe_close(frame.as_ref())));
                    }
                    _ => {}
                }
            }
            Err::<HelloPayload, _>(PlatformError::Gateway(
                "connection closed before Hello".to_string(),
            ))
        })
        .await
        .map_err(|_| PlatformError::Gateway("timed out waiting for Hello".to_string()))??;

        let period = Duration::from_millis(hello.heartbeat_interval.max(1));
        let jitter = period.mul_f64(rand::thread_rng().gen_range(0.0..1.0));
        let mut heartbeat = interval_at(Instant::now() + jitter, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let handshake = match self.state.resumable() {
            Some((session, seq)) => {
                info!(session_id = %session.id, seq, "Resuming gateway session");
                GatewayMessage::resume(&ResumePayload {
                    token: self.token.clone(),
                    session_id: session.id.clone(),
                    seq,
                })
            }
            None => {
                info!(intents = self.intents.bits(), "Identifying with gateway");
                GatewayMessage::identify(&IdentifyPayload::new(self.token.clone(), self.intents))
            }
        }
        .map_err(decode_error)?;
        send_frame(&mut sink, &handshake).await?;

        let mut acked = true;
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return Ok(SessionEnd::Shutdown);
                }
                _ = heartbeat.tick() => {
                    if !acked {
                        warn!("Heartbeat not acknowledged, dropping connection");
                        return Ok(SessionEnd::Reconnect);
                    }
                    acked = false;
                    send_frame(&mut sink, &GatewayMessage::heartbeat(self.state.sequence)).await?;
                }
                frame = stream.next() => {
                    let Some(frame) = frame else {
                        return Ok(SessionEnd::Reconnect);
                    };
                    match frame.map_err(gateway_error)? {
                        Message::Text(text) => {
                            let message = match GatewayMessage::from_json(&text) {
                                Ok(message) => message,
                                Err(e) => {
                                    warn!(error = %e, "Skipping undecodable gateway frame");
                                    continue;
                                }
                            };
                            match message.op {
                                OpCode::Dispatch => {
                                    if let Some(end) = self.on_dispatch(message).await {
                                        return Ok(end);
                                    }
                                }
                                OpCode::Heartbeat => {
                                    send_frame(&mut sink, &GatewayMessage::heartbeat(self.state.sequence)).await?;
                                }
                                OpCode::HeartbeatAck => acked = true,
                                OpCode::Reconnect => {
                                    info!("Gateway requested reconnect");
                                    return Ok(SessionEnd::Reconnect);
                                }
                                OpCode::InvalidSession => {
                                    let resumable = message.d.as_bool().unwrap_or(false);
                                    warn!(resumable, "Gateway invalidated the session");
                                    if !resumable {
                                        self.state.invalidate();
                                    }
                                    return Ok(SessionEnd::Reconnect);
                                }
                                OpCode::Hello | OpCode::Identify | OpCode::Resume => {}
                            }
                        }
                        Message::Close(frame) => {
                            return Ok(self.on_close(frame.as_ref()));
                        }
                        Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_) => {}
                    }
                }
            }
        }
    }

    /// Track session state and forward the event; `Some` ends the session
    async fn on_dispatch(&mut self, message: GatewayMessage) -> Option<SessionEnd> {
        self.state.observe(message.s);
        let name = message.t.as_deref()?;

        if name == "READY" {
            match message.data::<ReadyPayload>() {
                Ok(ready) => {
                    info!(session_id = %ready.session_id, user = %ready.user.username, "Gateway ready");
                    self.state.session = Some(Session {
                        id: ready.session_id,
                        resume_url: ready.resume_gateway_url,
                    });
                }
                Err(e) => warn!(error = %e, "Malformed READY payload"),
            }
        }

        let event = match GatewayEvent::from_dispatch(name, &message.d) {
            Ok(Some(event)) => event,
            Ok(None) => return None,
            Err(e) => {
                warn!(event = name, error = %e, "Skipping malformed dispatch");
                return None;
            }
        };

        if matches!(event, GatewayEvent::Ready { .. } | GatewayEvent::Resumed) {
            self.ready.send_replace(true);
        }

        if self.events.send(event).await.is_err() {
            debug!("Event receiver dropped");
            return Some(SessionEnd::Shutdown);
        }
        None
    }

    fn on_close(&mut self, frame: Option<&CloseFrame<'_>>) -> SessionEnd {
        let code = frame.map(|f| u16::from(f.code));
        warn!(close = %describe_close(frame), "Gateway closed the connection");

        match code.and_then(CloseCode::from_u16) {
            Some(code) if !code.should_reconnect() => SessionEnd::Fatal(code.to_string()),
            Some(code) if !code.can_resume() => {
                self.state.invalidate();
                SessionEnd::Reconnect
            }
            _ => SessionEnd::Reconnect,
        }
    }
}

async fn send_frame<S>(sink: &mut S, message: &GatewayMessage) -> PlatformResult<()>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let json = message.to_json().map_err(decode_error)?;
    sink.send(Message::Text(json)).await.map_err(gateway_error)
}

/// Exponential backoff with up to a second of jitter
fn reconnect_delay(failures: u32) -> Duration {
    let exponent = failures.min(6);
    let base = RECONNECT_BASE_DELAY
        .saturating_mul(1 << exponent)
        .min(RECONNECT_MAX_DELAY);
    base + Duration::from_millis(rand::thread_rng().gen_range(0..1000))
}

fn describe_close(frame: Option<&CloseFrame<'_>>) -> String {
    match frame {
        Some(frame) => format!("{} {}", u16::from(frame.code), frame.reason),
        None => "no close frame".to_string(),
    }
}

fn gateway_error(err: impl Display) -> PlatformError {
    PlatformError::Gateway(err.to_string())
}

fn decode_error(err: serde_json::Error) -> PlatformError {
    PlatformError::Decode(err.to_string())
}
