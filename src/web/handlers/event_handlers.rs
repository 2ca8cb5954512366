// src/web/handlers/event_handlers.rs
//! Server-sent status streams.

use rocket::response::stream::{Event, EventStream};
use rocket::Shutdown;
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::sync::broadcast::error::RecvError;

use crate::events::{StatusHub, KIND_JOB_POSTING, KIND_RESUME_VERSION};

const HEARTBEAT: Duration = Duration::from_secs(15);

fn is_known_kind(kind: &str) -> bool {
    matches!(kind, KIND_JOB_POSTING | KIND_RESUME_VERSION)
}

/// Stream status events for one entity until a terminal event or server
/// shutdown. Events published before the subscription are not replayed;
/// clients fetch current status first, then follow the stream. An unknown
/// kind answers with a single error event and closes.
pub fn status_stream(
    hub: Arc<StatusHub>,
    kind: String,
    entity_id: String,
    mut shutdown: Shutdown,
) -> EventStream![] {
    let rx = is_known_kind(&kind).then(|| hub.subscribe(&kind, &entity_id));

    let stream = EventStream! {
        match rx {
            None => {
                yield Event::data(format!("unknown stream kind: {}", kind)).event("error");
            }
            Some(mut rx) => loop {
                let event = select! {
                    received = rx.recv() => match received {
                        Ok(event) => event,
                        Err(RecvError::Closed) => break,
                        // A lagged subscriber skips events rather than
                        // blocking the publisher.
                        Err(RecvError::Lagged(_)) => continue,
                    },
                    _ = &mut shutdown => break,
                };

                let terminal = event.is_terminal();
                yield Event::json(&event).event(event.status.clone());
                if terminal {
                    break;
                }
            },
        }
    };

    stream.heartbeat(HEARTBEAT)
}
