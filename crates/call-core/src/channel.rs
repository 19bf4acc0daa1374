//! Realtime channel membership
//!
//! Each call has a room on the realtime channel service, keyed by the
//! `(call_id, session_id)` pair, over which streaming transcription and
//! status events arrive. This module owns the membership lifecycle:
//! join when the session starts connecting, leave exactly once when the
//! session ends, no matter whether the normal hangup path or the
//! forced teardown path gets there first.
//!
//! The event stream exposed by the service is global to the account,
//! not room-scoped; consumers are expected to filter by `session_id`
//! (the controller's event pump does).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::{ClientError, ClientResult};

/// An event published on the realtime channel stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChannelEvent {
    /// A transcription segment for an in-flight call
    Transcript {
        /// Session the segment belongs to
        session_id: String,
        /// Speaker label assigned by the transcription service
        speaker: String,
        /// Transcribed text
        text: String,
        /// Whether this segment is final or still being revised
        is_final: bool,
    },
    /// A provider-side status update streamed over the channel
    StatusUpdate {
        /// Session the update belongs to
        session_id: String,
        /// Provider state string
        state: String,
    },
}

impl ChannelEvent {
    /// Session this event is scoped to
    pub fn session_id(&self) -> &str {
        match self {
            ChannelEvent::Transcript { session_id, .. } => session_id,
            ChannelEvent::StatusUpdate { session_id, .. } => session_id,
        }
    }
}

/// Realtime publish/subscribe channel service
///
/// The consumed interface of the external channel service. `subscribe`
/// returns a receiver on the account-global event stream; room
/// membership only controls which call's events the service publishes
/// for this account.
#[async_trait]
pub trait RealtimeChannel: Send + Sync {
    /// Join the room for a call
    async fn join_room(&self, call_id: &str, session_id: &str) -> Result<(), anyhow::Error>;

    /// Leave the room for a call
    async fn leave_room(&self, call_id: &str, session_id: &str) -> Result<(), anyhow::Error>;

    /// Subscribe to the account-global event stream
    fn subscribe(&self) -> broadcast::Receiver<ChannelEvent>;
}

/// Membership of one call's room, released exactly once
///
/// Ephemeral: created when the session reaches `Connecting`, destroyed
/// when the session terminates or the owning UI tears down, whichever
/// happens first. The joined flag is atomic so the normal end path and
/// the forced teardown path can race on [`ChannelMembership::leave`]
/// and the room is still only left once.
pub struct ChannelMembership {
    channel: Arc<dyn RealtimeChannel>,
    call_id: String,
    session_id: String,
    joined: AtomicBool,
}

impl ChannelMembership {
    /// Create a membership for the given room. Both identifiers must be
    /// non-empty; the state machine guarantees this by reconciling
    /// `session_id` before any join is attempted.
    pub fn new(channel: Arc<dyn RealtimeChannel>, call_id: String, session_id: String) -> Self {
        debug_assert!(!call_id.is_empty());
        debug_assert!(!session_id.is_empty());
        Self {
            channel,
            call_id,
            session_id,
            joined: AtomicBool::new(false),
        }
    }

    /// Call identifier this membership is scoped to
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Session identifier this membership is scoped to
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether the room is currently joined
    pub fn is_joined(&self) -> bool {
        self.joined.load(Ordering::SeqCst)
    }

    /// Join the room
    pub async fn join(&self) -> ClientResult<()> {
        self.channel
            .join_room(&self.call_id, &self.session_id)
            .await
            .map_err(|e| ClientError::channel_join_failed(e.to_string()))?;
        self.joined.store(true, Ordering::SeqCst);
        tracing::info!(call_id = %self.call_id, session_id = %self.session_id, "joined call room");
        Ok(())
    }

    /// Leave the room
    ///
    /// Idempotent: leaving an already-left or never-joined room is a
    /// no-op, not an error. The first caller to swap the joined flag
    /// performs the actual leave.
    pub async fn leave(&self) -> ClientResult<()> {
        if !self.joined.swap(false, Ordering::SeqCst) {
            tracing::debug!(call_id = %self.call_id, "room already left, nothing to do");
            return Ok(());
        }
        self.channel
            .leave_room(&self.call_id, &self.session_id)
            .await
            .map_err(|e| ClientError::internal(format!("channel leave failed: {}", e)))?;
        tracing::info!(call_id = %self.call_id, session_id = %self.session_id, "left call room");
        Ok(())
    }

    /// Subscribe to the service's global event stream
    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.channel.subscribe()
    }
}

impl std::fmt::Debug for ChannelMembership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelMembership")
            .field("call_id", &self.call_id)
            .field("session_id", &self.session_id)
            .field("joined", &self.is_joined())
            .finish()
    }
}
