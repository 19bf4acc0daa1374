//! External collaborator interfaces
//!
//! The controller coordinates two remote planes it does not implement:
//! the telephony provider that places and terminates calls, and the
//! account directory that holds verified caller IDs and the caller-ID
//! preference. Both are consumed through async traits so transports
//! stay out of this crate and tests can substitute in-memory fakes.
//!
//! Trait methods return `anyhow::Error`; the controller flattens those
//! into [`crate::ClientError`] messages at the call site, so no raw
//! collaborator error ever crosses the controller boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::call::CallMode;
use crate::caller_id::{CallerIdPreference, VerifiedCallerId};

/// Request to place an outbound call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiateCallRequest {
    /// Destination numbers
    pub recipients: Vec<String>,
    /// Resolved, verified originating number
    pub caller_id: String,
    /// Delivery mode, opaque to the controller
    pub mode: CallMode,
    /// Free-form notes forwarded to the provider
    pub notes: Option<String>,
}

/// Provider response to a successful initiation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiateCallResponse {
    /// Provider-assigned call identifier
    pub call_id: String,
    /// Realtime session key; when absent the controller defaults it to
    /// `call_id` before any channel join
    pub session_id: Option<String>,
    /// Set when the provider ran a simulated call
    #[serde(default)]
    pub mock: bool,
}

/// Provider's own view of a call, passed through to callers untouched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCallStatus {
    /// Provider-assigned call identifier
    pub call_id: String,
    /// Provider state string, not mapped onto [`crate::CallStatus`]
    pub state: String,
    /// Call duration so far, if the provider reports one
    pub duration_secs: Option<u64>,
}

/// Telephony control plane: placement, termination, status queries
#[async_trait]
pub trait TelephonyProvider: Send + Sync {
    /// Place an outbound call
    async fn initiate_call(
        &self,
        request: InitiateCallRequest,
    ) -> Result<InitiateCallResponse, anyhow::Error>;

    /// Terminate an in-flight call
    async fn terminate_call(&self, call_id: &str) -> Result<(), anyhow::Error>;

    /// Query the provider's view of a call
    async fn call_status(&self, call_id: &str) -> Result<ProviderCallStatus, anyhow::Error>;
}

/// Account directory for caller-ID state
#[async_trait]
pub trait CallerIdDirectory: Send + Sync {
    /// Fetch the verified originating numbers for the account
    async fn verified_caller_ids(&self) -> Result<Vec<VerifiedCallerId>, anyhow::Error>;

    /// Fetch the stored caller-ID preference
    async fn caller_id_preference(&self) -> Result<CallerIdPreference, anyhow::Error>;
}
