//! Channel event pump
//!
//! Forwards events from the realtime channel service's account-global
//! stream onto the controller's event surfaces. Two gates apply before
//! anything is forwarded:
//!
//! - events whose `session_id` does not match the active session are
//!   dropped, so cross-session events on the shared stream never leak
//!   into this call's handlers
//! - once the session has reached a terminal status nothing further is
//!   dispatched; late arrivals are dropped silently and the pump exits

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::channel::ChannelEvent;
use crate::events::{ControllerEvent, TranscriptSegment};

use super::CallController;

impl CallController {
    /// Start the pump task for the session identified by `session_id`.
    /// Replaces any pump left over from a previous session.
    pub(crate) async fn spawn_event_pump(
        &self,
        mut receiver: broadcast::Receiver<ChannelEvent>,
        session_id: String,
    ) {
        self.stop_pump().await;

        let session = self.session.clone();
        let event_handler = self.event_handler.clone();
        let emitter = self.emitter.clone();

        let handle = tokio::spawn(async move {
            loop {
                let event = match receiver.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "channel event stream lagged, resuming");
                        continue;
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("channel event stream closed, stopping pump");
                        break;
                    }
                };

                // Gate on the session still being live
                let status = session.read().await.as_ref().map(|s| s.status);
                match status {
                    Some(status) if !status.is_terminal() => {}
                    _ => {
                        tracing::debug!(
                            session_id = %session_id,
                            "dropping channel event after terminal status"
                        );
                        break;
                    }
                }

                // The stream is account-global; scope to this session
                if event.session_id() != session_id {
                    tracing::debug!(
                        event_session = %event.session_id(),
                        active_session = %session_id,
                        "dropping cross-session channel event"
                    );
                    continue;
                }

                match event {
                    ChannelEvent::Transcript {
                        session_id,
                        speaker,
                        text,
                        is_final,
                    } => {
                        let segment = TranscriptSegment {
                            session_id,
                            speaker,
                            text,
                            is_final,
                            timestamp: Utc::now(),
                        };
                        if let Some(handler) = event_handler.read().await.clone() {
                            handler.on_transcript(segment.clone()).await;
                        }
                        emitter.emit(ControllerEvent::Transcript(segment));
                    }
                    ChannelEvent::StatusUpdate { session_id, state } => {
                        tracing::debug!(session_id = %session_id, state = %state, "provider status update");
                        emitter.emit(ControllerEvent::ProviderStatus { session_id, state });
                    }
                }
            }
        });

        *self.pump.write().await = Some(handle);
    }
}
