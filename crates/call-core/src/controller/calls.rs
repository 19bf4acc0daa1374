//! Call operations for the controller
//!
//! This module drives the session state machine:
//!
//! ```text
//! Idle → Initiating → Initiated → Connecting → Connected → Ending → Ended
//!            │             │           │            │          │
//!            └─────────────┴───────────┴────────────┴──────────┴──→ Failed
//! ```
//!
//! `Initiated → Connecting` is the same synchronous continuation of
//! [`CallController::start_call`]; there is no separate trigger, and a
//! channel join is never attempted before the session's identifiers
//! have been reconciled.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::timeout;

use crate::call::{CallSession, CallStatus};
use crate::caller_id::resolve_caller_id;
use crate::channel::ChannelMembership;
use crate::error::{ClientError, ClientResult};
use crate::provider::{InitiateCallRequest, ProviderCallStatus};

use super::{CallController, StartCallOptions};

impl CallController {
    /// Place an outbound call and join its realtime channel
    ///
    /// Resolves the originating number, asks the provider to place the
    /// call, reconciles the session identifier (defaulting it to the
    /// provider's `call_id` when omitted), joins the call room and
    /// starts streaming channel events. Returns a snapshot of the
    /// connected session.
    ///
    /// # Errors
    ///
    /// * [`ClientError::CallAlreadyActive`] - a call is already in flight
    /// * [`ClientError::NoVerifiedCallerId`] - raised before any provider
    ///   call when the account has no verified numbers
    /// * [`ClientError::DirectoryFailed`] - the verified-ID fetch failed
    /// * [`ClientError::InitiationFailed`] - the provider rejected the call
    /// * [`ClientError::ChannelJoinFailed`] - the call exists at the
    ///   provider but realtime visibility failed; the session is retained
    ///   so `call_id` stays available for diagnostics
    /// * [`ClientError::Timeout`] - a deadline expired
    ///
    /// On any failure the session status is `Failed` and the same error
    /// is also reported through the event surfaces.
    pub async fn start_call(&self, options: StartCallOptions) -> ClientResult<CallSession> {
        // Claim the single session slot before any remote work
        {
            let mut lock = self.session.write().await;
            if let Some(existing) = lock.as_ref() {
                if !existing.status.is_terminal() {
                    tracing::warn!(
                        call_id = %existing.call_id,
                        status = ?existing.status,
                        "rejecting start: a call is already active"
                    );
                    return Err(ClientError::CallAlreadyActive);
                }
            }
            *lock = Some(CallSession {
                call_id: String::new(),
                session_id: String::new(),
                status: CallStatus::Initiating,
                recipients: options.recipients.clone(),
                caller_id: String::new(),
                mode: options.mode,
                notes: options.notes.clone(),
                mock: false,
                created_at: Utc::now(),
                connected_at: None,
                ended_at: None,
            });
        }
        // A previous failed attempt may still hold its room; release it
        // before the new call claims one.
        self.release_membership_best_effort().await;
        self.notify_state_changed(crate::events::CallStatusInfo {
            call_id: String::new(),
            new_status: CallStatus::Initiating,
            previous_status: Some(CallStatus::Idle),
            display: CallStatus::Initiating.display(),
            reason: None,
            timestamp: Utc::now(),
        })
        .await;

        // Resolve the originating number before touching the provider
        let verified = match self.directory.verified_caller_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                let err = ClientError::directory_failed(e.to_string());
                self.fail_session(err.to_string()).await;
                return Err(err);
            }
        };
        let preference = match self.directory.caller_id_preference().await {
            Ok(pref) => pref,
            Err(e) => {
                let err = ClientError::directory_failed(e.to_string());
                self.fail_session(err.to_string()).await;
                return Err(err);
            }
        };
        let caller_id = match resolve_caller_id(
            options.caller_id.as_deref(),
            preference.caller_id.as_deref(),
            &verified,
        ) {
            Ok(caller_id) => caller_id,
            Err(err) => {
                self.fail_session(err.to_string()).await;
                return Err(err);
            }
        };
        if let Some(session) = self.session.write().await.as_mut() {
            session.caller_id = caller_id.clone();
        }

        // Place the call
        let initiate = self.provider.initiate_call(InitiateCallRequest {
            recipients: options.recipients.clone(),
            caller_id,
            mode: options.mode,
            notes: options.notes.clone(),
        });
        let response = match timeout(self.config.initiate_timeout, initiate).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let err = ClientError::initiation_failed(e.to_string());
                self.fail_session(err.to_string()).await;
                return Err(err);
            }
            Err(_) => {
                let err = ClientError::timeout(
                    "Call initiation",
                    self.config.initiate_timeout.as_secs(),
                );
                self.fail_session(err.to_string()).await;
                return Err(err);
            }
        };

        // Reconcile identifiers. The session key falls back to the call
        // identifier exactly once, here, before any join is attempted.
        if response.call_id.is_empty() {
            let err =
                ClientError::initiation_failed("provider response missing call identifier");
            self.fail_session(err.to_string()).await;
            return Err(err);
        }
        let call_id = response.call_id.clone();
        let session_id = response
            .session_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| call_id.clone());
        {
            let mut lock = self.session.write().await;
            if let Some(session) = lock.as_mut() {
                session.call_id = call_id.clone();
                session.session_id = session_id.clone();
                session.mock = response.mock;
            }
        }
        self.transition(CallStatus::Initiated, None).await;

        // Joining is the same synchronous continuation, no separate trigger
        self.transition(CallStatus::Connecting, None).await;
        let membership = Arc::new(ChannelMembership::new(
            self.channel.clone(),
            call_id.clone(),
            session_id.clone(),
        ));
        match timeout(self.config.join_timeout, membership.join()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                self.fail_session(err.to_string()).await;
                return Err(err);
            }
            Err(_) => {
                let err =
                    ClientError::timeout("Channel join", self.config.join_timeout.as_secs());
                self.fail_session(err.to_string()).await;
                return Err(err);
            }
        }
        let receiver = membership.subscribe();
        *self.membership.write().await = Some(membership);
        self.spawn_event_pump(receiver, session_id).await;

        self.transition(CallStatus::Connected, None).await;
        self.session
            .read()
            .await
            .clone()
            .ok_or_else(|| ClientError::internal("session vanished during start"))
    }

    /// End the active call
    ///
    /// Resolves immediately when no call is in flight (the terminate
    /// API is not invoked). Otherwise drives `Connected/Failed → Ending
    /// → Ended`, terminating at the provider and leaving the call room.
    /// This method never returns an error to the caller: termination
    /// failures are reported through the event surfaces and leave the
    /// session parked in `Failed` with its `call_id` intact, so the UI
    /// is never crashed by a hangup.
    pub async fn end_call(&self) -> ClientResult<()> {
        let call_id = {
            let lock = self.session.read().await;
            match lock.as_ref() {
                None => return Ok(()),
                Some(s) if s.status == CallStatus::Ended || s.status == CallStatus::Idle => {
                    return Ok(())
                }
                Some(s) => s.call_id.clone(),
            }
        };

        // A session that never got a provider call_id has nothing to
        // terminate remotely; release local state and finish.
        if call_id.is_empty() {
            self.stop_pump().await;
            self.transition(CallStatus::Ended, Some("ended before initiation".into()))
                .await;
            self.session.write().await.take();
            return Ok(());
        }

        self.transition(CallStatus::Ending, None).await;

        let terminate = self.provider.terminate_call(&call_id);
        match timeout(self.config.terminate_timeout, terminate).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let err = ClientError::termination_failed(e.to_string());
                self.release_membership_best_effort().await;
                self.fail_session(err.to_string()).await;
                return Ok(());
            }
            Err(_) => {
                let err = ClientError::timeout(
                    "Call termination",
                    self.config.terminate_timeout.as_secs(),
                );
                self.release_membership_best_effort().await;
                self.fail_session(err.to_string()).await;
                return Ok(());
            }
        }

        // Terminated at the provider; release realtime membership.
        // A leave failure here is reported but does not block shutdown.
        if let Some(membership) = self.membership.write().await.take() {
            if let Err(err) = membership.leave().await {
                self.notify_error(err.to_string(), false).await;
            }
        }
        self.stop_pump().await;

        self.transition(CallStatus::Ended, None).await;
        self.session.write().await.take();
        Ok(())
    }

    /// Query the provider's view of a call
    ///
    /// Pure passthrough. Provider failures are reported through the
    /// event surfaces and yield `Ok(None)` rather than an error.
    pub async fn call_status(&self, call_id: &str) -> ClientResult<Option<ProviderCallStatus>> {
        match self.provider.call_status(call_id).await {
            Ok(status) => Ok(Some(status)),
            Err(e) => {
                self.notify_error(format!("Call status query failed: {}", e), false)
                    .await;
                Ok(None)
            }
        }
    }
}
