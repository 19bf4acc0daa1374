//! Event surface for call-core
//!
//! Status changes and failures are reported on two decoupled surfaces,
//! both independent of the promises returned by controller operations,
//! so a UI can render live status regardless of which task awaited the
//! triggering call:
//!
//! - a registered [`ControllerEventHandler`] receives each event as an
//!   async callback
//! - an [`EventEmitter`] broadcasts the same events to any number of
//!   stream subscribers
//!
//! # Basic handler
//!
//! ```rust
//! use callbridge_call_core::events::{
//!     CallStatusInfo, ControllerErrorInfo, ControllerEventHandler, TranscriptSegment,
//! };
//! use async_trait::async_trait;
//!
//! struct MyHandler;
//!
//! #[async_trait]
//! impl ControllerEventHandler for MyHandler {
//!     async fn on_call_state_changed(&self, info: CallStatusInfo) {
//!         println!("call {} is now {:?}", info.call_id, info.new_status);
//!     }
//!
//!     async fn on_transcript(&self, segment: TranscriptSegment) {
//!         println!("{}: {}", segment.speaker, segment.text);
//!     }
//!
//!     async fn on_error(&self, error: ControllerErrorInfo) {
//!         eprintln!("call error: {}", error.message);
//!     }
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::call::{CallStatus, DisplayStatus};

/// Information about a call state transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallStatusInfo {
    /// Provider call identifier; empty while no call exists yet
    pub call_id: String,
    /// New status after the transition
    pub new_status: CallStatus,
    /// Previous status before the transition, if known
    pub previous_status: Option<CallStatus>,
    /// Projection of `new_status` onto the display vocabulary
    pub display: DisplayStatus,
    /// Reason for the change, when one exists ("provider rejected", ...)
    pub reason: Option<String>,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}

/// A transcription segment forwarded from the realtime channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Session the segment belongs to
    pub session_id: String,
    /// Speaker label from the transcription service
    pub speaker: String,
    /// Transcribed text
    pub text: String,
    /// Whether the segment is final
    pub is_final: bool,
    /// When the segment was received
    pub timestamp: DateTime<Utc>,
}

/// A failure reported outside the operation promises
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerErrorInfo {
    /// Call the failure relates to, when a session exists
    pub call_id: Option<String>,
    /// Normalized, human-readable message
    pub message: String,
    /// Whether the session reached a terminal state because of this
    pub terminal: bool,
    /// When the failure was observed
    pub timestamp: DateTime<Utc>,
}

/// Events emitted by the call controller
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// Call state changed
    CallStateChanged(CallStatusInfo),
    /// Transcription segment received for the active session
    Transcript(TranscriptSegment),
    /// Provider status update streamed over the channel
    ProviderStatus {
        /// Session the update belongs to
        session_id: String,
        /// Provider state string
        state: String,
    },
    /// A failure was observed
    Error(ControllerErrorInfo),
}

/// Async callback surface for controller events
#[async_trait]
pub trait ControllerEventHandler: Send + Sync {
    /// Called on every call state transition
    async fn on_call_state_changed(&self, info: CallStatusInfo);

    /// Called for each transcription segment of the active session
    async fn on_transcript(&self, segment: TranscriptSegment);

    /// Called on every terminal or non-terminal failure
    async fn on_error(&self, error: ControllerErrorInfo);
}

/// Stream of controller events for subscribers
pub type EventStream = BroadcastStream<ControllerEvent>;

/// Broadcast emitter for controller events
#[derive(Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<ControllerEvent>,
}

impl EventEmitter {
    /// Create a new emitter with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event. Send errors (no receivers) are ignored.
    pub fn emit(&self, event: ControllerEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> EventStream {
        BroadcastStream::new(self.sender.subscribe())
    }

    /// Number of active subscribers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}
