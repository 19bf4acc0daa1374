//! # Callbridge Call Core - Call Session Lifecycle Coordination
//!
//! This crate is the coordination layer for placing outbound
//! AI-assisted voice calls. It reconciles three independently-failing
//! systems into one consistent state machine:
//!
//! - a REST **control plane** (the telephony provider that places and
//!   terminates calls, consumed through [`TelephonyProvider`])
//! - a realtime **data plane** (the channel service streaming
//!   transcription and status events, consumed through
//!   [`RealtimeChannel`])
//! - the consuming **UI lifecycle** (bound through [`LifecycleGuard`])
//!
//! ## What it guarantees
//!
//! - The originating number is resolved from the account's verified
//!   caller IDs before any provider call; an unusable account fails
//!   fast and locally.
//! - The realtime session key is reconciled exactly once: when the
//!   provider omits `session_id`, it is defaulted to `call_id` before
//!   any channel join is attempted.
//! - Channel membership and local state are released exactly once,
//!   whether the call ends cleanly, fails remotely, or the consuming
//!   surface disappears mid-call.
//! - No channel event is dispatched after the session reaches a
//!   terminal state, and events for other sessions on the shared
//!   stream never leak through.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use callbridge_call_core::{CallController, CallMode, ControllerConfig, StartCallOptions};
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     provider: Arc<dyn callbridge_call_core::TelephonyProvider>,
//! #     directory: Arc<dyn callbridge_call_core::CallerIdDirectory>,
//! #     channel: Arc<dyn callbridge_call_core::RealtimeChannel>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let controller = Arc::new(CallController::new(
//!     ControllerConfig::default(),
//!     provider,
//!     directory,
//!     channel,
//! ));
//! let guard = controller.lifecycle_guard();
//!
//! let session = controller
//!     .start_call(StartCallOptions {
//!         recipients: vec!["+15551234567".to_string()],
//!         caller_id: None,
//!         mode: CallMode::Conversation,
//!         notes: Some("follow-up call".to_string()),
//!     })
//!     .await?;
//! println!("connected: {} ({})", session.call_id, session.display_status());
//!
//! controller.end_call().await?;
//! guard.release().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod call;
pub mod caller_id;
pub mod channel;
pub mod controller;
pub mod error;
pub mod events;
pub mod provider;

// Re-export main types
pub use call::{CallMode, CallSession, CallStatus, DisplayStatus};
pub use caller_id::{resolve_caller_id, CallerIdPreference, VerifiedCallerId};
pub use channel::{ChannelEvent, ChannelMembership, RealtimeChannel};
pub use controller::{CallController, ControllerConfig, LifecycleGuard, StartCallOptions};
pub use error::{ClientError, ClientResult};
pub use events::{
    CallStatusInfo, ControllerErrorInfo, ControllerEvent, ControllerEventHandler, EventEmitter,
    EventStream, TranscriptSegment,
};
pub use provider::{
    CallerIdDirectory, InitiateCallRequest, InitiateCallResponse, ProviderCallStatus,
    TelephonyProvider,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
