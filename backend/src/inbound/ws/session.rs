//! Per-connection feed loop.
//!
//! Pushes each presented batch to the client as a text frame, pings every 5s,
//! and treats a client as gone after 10s without traffic. Clients only
//! listen; any data frame from them closes the socket with a policy error.
//!
//! The feed's subscription handle is released once when the loop ends,
//! whatever ended it.

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, warn};

use crate::domain::ports::{ListingFeed, SubscriptionHandle};
use crate::domain::{Error, ListingView};
use crate::inbound::ws::messages::FeedFrame;

/// Time between heartbeats to the client (5s in production, shorter in tests).
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client (10s in production, shorter in tests).
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

type Batch = Result<Vec<ListingView>, Error>;

pub(super) async fn run_feed_session(feed: ListingFeed, session: Session, stream: MessageStream) {
    FeedSession::new(feed).run(session, stream).await;
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    UnexpectedPayload,
    FeedEnded,
    Network(Closed),
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

struct FeedSession {
    batches: mpsc::Receiver<Batch>,
    handle: SubscriptionHandle,
}

impl FeedSession {
    fn new(feed: ListingFeed) -> Self {
        let (batches, handle) = feed.into_parts();
        Self { batches, handle }
    }

    async fn run(self, mut session: Session, mut stream: MessageStream) {
        let Self {
            mut batches,
            handle,
        } = self;
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        let error = loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                message = stream.recv() => {
                    handle_stream_message(&mut session, &mut last_heartbeat, message).await
                }
                batch = batches.recv() => match batch {
                    Some(batch) => send_frame(&mut session, FeedFrame::from(batch)).await,
                    None => Err(SessionError::FeedEnded),
                },
            };
            if let Err(error) = result {
                break error;
            }
        };

        handle.cancel();
        drop(batches);
        debug!("listing feed released");

        log_shutdown_reason(&error);
        if let CloseAction::Close(reason) = close_action_for(error) {
            if let Err(error) = session.close(reason).await {
                warn!(error = %error, "Failed to close WebSocket session");
            }
        }
    }
}

async fn handle_heartbeat_tick(
    session: &mut Session,
    last_heartbeat: &Instant,
) -> Result<(), SessionError> {
    if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
        return Err(SessionError::HeartbeatTimeout);
    }
    session.ping(b"").await.map_err(SessionError::Network)
}

async fn handle_stream_message(
    session: &mut Session,
    last_heartbeat: &mut Instant,
    message: Option<Result<Message, ProtocolError>>,
) -> Result<(), SessionError> {
    let Some(message) = message else {
        return Err(SessionError::StreamClosed);
    };
    match message.map_err(SessionError::Protocol)? {
        Message::Ping(payload) => {
            *last_heartbeat = Instant::now();
            session.pong(&payload).await.map_err(SessionError::Network)
        }
        Message::Pong(_) | Message::Nop => {
            *last_heartbeat = Instant::now();
            Ok(())
        }
        Message::Text(_) | Message::Binary(_) | Message::Continuation(_) => {
            warn!("Rejected client payload on listing feed");
            Err(SessionError::UnexpectedPayload)
        }
        Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
    }
}

async fn send_frame(session: &mut Session, frame: FeedFrame) -> Result<(), SessionError> {
    match serde_json::to_string(&frame) {
        Ok(body) => session.text(body).await.map_err(SessionError::Network),
        Err(error) => {
            warn!(error = %error, "Failed to serialize feed frame");
            Ok(())
        }
    }
}

fn log_shutdown_reason(error: &SessionError) {
    match error {
        SessionError::HeartbeatTimeout => {
            warn!("WebSocket heartbeat timeout; closing connection");
        }
        SessionError::Protocol(error) => {
            warn!(error = %error, "WebSocket protocol error");
        }
        SessionError::Network(error) => {
            warn!(error = %error, "WebSocket send failed; closing connection");
        }
        SessionError::FeedEnded => {
            debug!("listing feed ended; closing connection");
        }
        SessionError::UnexpectedPayload
        | SessionError::ClientClosed(_)
        | SessionError::StreamClosed => {}
    }
}

fn close_action_for(error: SessionError) -> CloseAction {
    let close = |code, description: &str| {
        CloseAction::Close(Some(CloseReason {
            code,
            description: Some(description.to_owned()),
        }))
    };
    match error {
        SessionError::HeartbeatTimeout => close(CloseCode::Normal, "heartbeat timeout"),
        SessionError::Protocol(_) => close(CloseCode::Protocol, "protocol error"),
        SessionError::UnexpectedPayload => close(CloseCode::Policy, "feed is read-only"),
        SessionError::FeedEnded => close(CloseCode::Away, "feed ended"),
        SessionError::ClientClosed(reason) => CloseAction::Close(reason),
        SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
