//! Call session controller
//!
//! [`CallController`] owns the authoritative state of a single
//! in-flight call and coordinates the three independently-failing
//! systems around it: the telephony control plane, the realtime channel
//! data plane, and the consuming UI's lifecycle. At most one
//! [`CallSession`] is active per controller instance; a second start
//! attempt while one is active is rejected, not queued. Controllers are
//! meant to be instantiated per call surface, not shared process-wide.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use callbridge_call_core::{
//!     CallController, CallMode, ControllerConfig, StartCallOptions,
//! };
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
//!
//! // Bind cleanup to the surface lifetime
//! let guard = controller.lifecycle_guard();
//!
//! let session = controller
//!     .start_call(StartCallOptions {
//!         recipients: vec!["+15551234567".to_string()],
//!         caller_id: None,
//!         mode: CallMode::Conversation,
//!         notes: None,
//!     })
//!     .await?;
//! println!("call {} connected", session.call_id);
//!
//! controller.end_call().await?;
//! guard.release().await;
//! # Ok(())
//! # }
//! ```

pub mod calls;
pub mod config;
pub mod events;
pub mod guard;


pub use config::ControllerConfig;
pub use guard::LifecycleGuard;

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::call::{CallMode, CallSession, CallStatus, DisplayStatus};
use crate::channel::{ChannelMembership, RealtimeChannel};
use crate::events::{
    CallStatusInfo, ControllerErrorInfo, ControllerEvent, ControllerEventHandler, EventEmitter,
    EventStream,
};
use crate::provider::{CallerIdDirectory, TelephonyProvider};

/// Options for starting an outbound call
#[derive(Debug, Clone, Default)]
pub struct StartCallOptions {
    /// Destination numbers
    pub recipients: Vec<String>,
    /// Explicitly requested originating number; used only if verified
    pub caller_id: Option<String>,
    /// Delivery mode
    pub mode: CallMode,
    /// Free-form notes forwarded to the provider
    pub notes: Option<String>,
}

/// Coordinator for one outbound call at a time
///
/// The session value is exclusively owned and mutated here; resolver,
/// membership, guard and projection are all stateless with respect to
/// session data, so no locking beyond the session slot is needed.
pub struct CallController {
    pub(crate) config: ControllerConfig,
    pub(crate) provider: Arc<dyn TelephonyProvider>,
    pub(crate) directory: Arc<dyn CallerIdDirectory>,
    pub(crate) channel: Arc<dyn RealtimeChannel>,
    /// The one active session, if any
    pub(crate) session: Arc<RwLock<Option<CallSession>>>,
    /// Room membership for the active session
    pub(crate) membership: Arc<RwLock<Option<Arc<ChannelMembership>>>>,
    /// Registered callback handler
    pub(crate) event_handler: Arc<RwLock<Option<Arc<dyn ControllerEventHandler>>>>,
    /// Broadcast surface for the same events
    pub(crate) emitter: EventEmitter,
    /// Channel event pump for the active session
    pub(crate) pump: Arc<RwLock<Option<JoinHandle<()>>>>,
}

impl CallController {
    /// Create a controller over the given collaborators
    pub fn new(
        config: ControllerConfig,
        provider: Arc<dyn TelephonyProvider>,
        directory: Arc<dyn CallerIdDirectory>,
        channel: Arc<dyn RealtimeChannel>,
    ) -> Self {
        let emitter = EventEmitter::new(config.event_buffer);
        Self {
            config,
            provider,
            directory,
            channel,
            session: Arc::new(RwLock::new(None)),
            membership: Arc::new(RwLock::new(None)),
            event_handler: Arc::new(RwLock::new(None)),
            emitter,
            pump: Arc::new(RwLock::new(None)),
        }
    }

    /// Register the callback handler for status and error reporting
    pub async fn set_event_handler(&self, handler: Arc<dyn ControllerEventHandler>) {
        *self.event_handler.write().await = Some(handler);
    }

    /// Remove the registered callback handler
    pub async fn clear_event_handler(&self) {
        *self.event_handler.write().await = None;
    }

    /// Subscribe to the broadcast event stream
    pub fn subscribe(&self) -> EventStream {
        self.emitter.subscribe()
    }

    /// Snapshot of the active session, if any
    pub async fn session(&self) -> Option<CallSession> {
        self.session.read().await.clone()
    }

    /// Current status; `Idle` when no session exists
    pub async fn status(&self) -> CallStatus {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.status)
            .unwrap_or(CallStatus::Idle)
    }

    /// Current status projected onto the display vocabulary
    pub async fn display_status(&self) -> DisplayStatus {
        self.status().await.display()
    }

    /// Transition the active session to a new status and report it on
    /// both event surfaces. Returns the info that was reported, or
    /// `None` when there is no session to transition.
    pub(crate) async fn transition(
        &self,
        new_status: CallStatus,
        reason: Option<String>,
    ) -> Option<CallStatusInfo> {
        let info = {
            let mut lock = self.session.write().await;
            let session = lock.as_mut()?;
            let previous = session.status;
            session.status = new_status;
            match new_status {
                CallStatus::Connected => session.connected_at = Some(Utc::now()),
                s if s.is_terminal() => session.ended_at = Some(Utc::now()),
                _ => {}
            }
            CallStatusInfo {
                call_id: session.call_id.clone(),
                new_status,
                previous_status: Some(previous),
                display: new_status.display(),
                reason,
                timestamp: Utc::now(),
            }
        };
        tracing::info!(
            call_id = %info.call_id,
            from = ?info.previous_status,
            to = ?info.new_status,
            "call state changed"
        );
        self.notify_state_changed(info.clone()).await;
        Some(info)
    }

    pub(crate) async fn notify_state_changed(&self, info: CallStatusInfo) {
        if let Some(handler) = self.event_handler.read().await.clone() {
            handler.on_call_state_changed(info.clone()).await;
        }
        self.emitter.emit(ControllerEvent::CallStateChanged(info));
    }

    /// Report a failure on both event surfaces
    pub(crate) async fn notify_error(&self, message: String, terminal: bool) {
        let call_id = self
            .session
            .read()
            .await
            .as_ref()
            .filter(|s| !s.call_id.is_empty())
            .map(|s| s.call_id.clone());
        let info = ControllerErrorInfo {
            call_id,
            message,
            terminal,
            timestamp: Utc::now(),
        };
        tracing::warn!(call_id = ?info.call_id, terminal, "call error: {}", info.message);
        if let Some(handler) = self.event_handler.read().await.clone() {
            handler.on_error(info.clone()).await;
        }
        self.emitter.emit(ControllerEvent::Error(info));
    }

    /// Move the active session to `Failed`, retaining it so callers can
    /// still inspect `call_id` for diagnostics, and report the error.
    pub(crate) async fn fail_session(&self, message: String) {
        self.transition(CallStatus::Failed, Some(message.clone()))
            .await;
        self.notify_error(message, true).await;
    }

    /// Take and leave the current room membership, swallowing failures.
    /// Used on paths where the session parks in `Failed`: the membership
    /// still has to be destroyed once the session is terminal.
    pub(crate) async fn release_membership_best_effort(&self) {
        self.stop_pump().await;
        if let Some(membership) = self.membership.write().await.take() {
            if let Err(err) = membership.leave().await {
                tracing::debug!("membership leave failed (swallowed): {}", err);
            }
        }
    }

    /// Stop the channel event pump for the previous session, if any
    pub(crate) async fn stop_pump(&self) {
        if let Some(handle) = self.pump.write().await.take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for CallController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallController")
            .field("config", &self.config)
            .finish()
    }
}
