//! Call session types for the call-core library
//!
//! This module contains the data model for one outbound call attempt:
//! the authoritative [`CallStatus`] state, the [`CallSession`] record
//! that tracks identifiers and timing, and the projection of internal
//! states onto the small vocabulary a UI displays.
//!
//! # Identifier reconciliation
//!
//! A session carries two identifiers. `call_id` is assigned by the
//! telephony provider and is authoritative once present. `session_id`
//! keys the realtime channel for the call; some provider responses omit
//! it, in which case it is defaulted to `call_id` exactly once, before
//! any channel join is attempted. After that defaulting a session in
//! flight always has a non-empty `session_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of a call session
///
/// Transitions are strictly sequential: `Idle → Initiating → Initiated
/// → Connecting → Connected → Ending → Ended`, with `Failed` reachable
/// from any non-terminal state. `Ended` and `Failed` are terminal; no
/// event is processed once either is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallStatus {
    /// No call in flight
    Idle,
    /// Caller ID resolved, provider initiation request in progress
    Initiating,
    /// Provider accepted the call; identifiers reconciled
    Initiated,
    /// Joining the realtime channel for the call
    Connecting,
    /// Channel joined, streaming events accepted
    Connected,
    /// Provider termination request in progress
    Ending,
    /// Call finished and released (terminal)
    Ended,
    /// Call failed; session retained for diagnostics (terminal)
    Failed,
}

impl CallStatus {
    /// Whether no further transitions are accepted from this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallStatus::Ended | CallStatus::Failed)
    }

    /// Whether a call has been initiated and not yet finished
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            CallStatus::Initiated | CallStatus::Connecting | CallStatus::Connected
        )
    }

    /// Project this state onto the display vocabulary
    ///
    /// `Initiated` and `Connecting` collapse into a single displayed
    /// "connecting" state, and `Ended` reads the same whether it was
    /// reached by a clean hangup or forced teardown.
    pub fn display(&self) -> DisplayStatus {
        match self {
            CallStatus::Idle => DisplayStatus::Idle,
            CallStatus::Initiating => DisplayStatus::Initiating,
            CallStatus::Initiated | CallStatus::Connecting => DisplayStatus::Connecting,
            CallStatus::Connected => DisplayStatus::Connected,
            CallStatus::Ending => DisplayStatus::Ending,
            CallStatus::Ended => DisplayStatus::Ended,
            CallStatus::Failed => DisplayStatus::Error,
        }
    }
}

/// Display vocabulary for call state, as consumed by UI layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStatus {
    /// No call in flight
    Idle,
    /// Call being placed
    Initiating,
    /// Call placed, realtime channel not yet established
    Connecting,
    /// Live call
    Connected,
    /// Hangup in progress
    Ending,
    /// Call finished
    Ended,
    /// Call failed
    Error,
}

impl std::fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DisplayStatus::Idle => "idle",
            DisplayStatus::Initiating => "initiating",
            DisplayStatus::Connecting => "connecting",
            DisplayStatus::Connected => "connected",
            DisplayStatus::Ending => "ending",
            DisplayStatus::Ended => "ended",
            DisplayStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Delivery mode for an outbound call
///
/// The mode is captured at initiation and travels opaque to the
/// provider; the controller does not branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallMode {
    /// Interactive two-way conversation
    Conversation,
    /// One-way announcement to the recipients
    Broadcast,
}

impl Default for CallMode {
    fn default() -> Self {
        CallMode::Conversation
    }
}

/// Record of one outbound call attempt
///
/// Exactly one `CallSession` may be active per controller instance.
/// The session is created on the start-call intent and cleared once a
/// terminal status has been reached and reported, except after
/// failures, where it is retained so the UI can still inspect
/// `call_id` for diagnostics or attempt manual termination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSession {
    /// Provider-assigned call identifier, authoritative once present
    pub call_id: String,
    /// Realtime channel key; defaulted to `call_id` when the provider
    /// response omits it
    pub session_id: String,
    /// Current state of the session
    pub status: CallStatus,
    /// Destination numbers captured at initiation
    pub recipients: Vec<String>,
    /// Resolved originating number used to place the call
    pub caller_id: String,
    /// Delivery mode captured at initiation
    pub mode: CallMode,
    /// Free-form notes passed to the provider
    pub notes: Option<String>,
    /// Whether the provider flagged this as a simulated call.
    /// Affects display only, never state transitions.
    pub mock: bool,
    /// When the start-call intent was accepted
    pub created_at: DateTime<Utc>,
    /// When the session reached `Connected`
    pub connected_at: Option<DateTime<Utc>>,
    /// When the session reached a terminal state
    pub ended_at: Option<DateTime<Utc>>,
}

impl CallSession {
    /// Project the current status onto the display vocabulary
    pub fn display_status(&self) -> DisplayStatus {
        self.status.display()
    }
}
