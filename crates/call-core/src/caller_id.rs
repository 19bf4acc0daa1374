//! Caller ID resolution
//!
//! Picks the originating number for an outbound call from the set of
//! numbers the account has verified. Resolution is a pure function: it
//! never mutates backend state and has no retry semantics; retrying
//! the verified-ID fetch is the caller's responsibility.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// An originating number and its verification state
///
/// Read-only snapshot fetched from the backend before initiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedCallerId {
    /// E.164 phone number
    pub phone_number: String,
    /// Whether the account is authorized to originate calls from it
    pub verified: bool,
}

/// The account's stored caller-ID preference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdPreference {
    /// Preferred originating number, if one has been set
    pub caller_id: Option<String>,
}

/// Resolve the originating number for a call
///
/// Selection order:
/// 1. `requested`, when present and verified
/// 2. the stored `preference`, when present and verified
/// 3. the first verified entry, in backend order (no extra sorting,
///    source order is the tie-break)
///
/// Fails with [`ClientError::NoVerifiedCallerId`] when the account has
/// no verified numbers at all. This check runs before any provider
/// call is made, so an unusable account fails cheaply.
pub fn resolve_caller_id(
    requested: Option<&str>,
    preference: Option<&str>,
    verified_ids: &[VerifiedCallerId],
) -> ClientResult<String> {
    let verified: Vec<&VerifiedCallerId> =
        verified_ids.iter().filter(|id| id.verified).collect();

    if verified.is_empty() {
        tracing::warn!("caller ID resolution failed: no verified numbers on account");
        return Err(ClientError::NoVerifiedCallerId);
    }

    let is_verified = |number: &str| verified.iter().any(|id| id.phone_number == number);

    if let Some(requested) = requested {
        if is_verified(requested) {
            tracing::debug!(caller_id = %requested, "using requested caller ID");
            return Ok(requested.to_string());
        }
        tracing::debug!(caller_id = %requested, "requested caller ID not verified, ignoring");
    }

    if let Some(preference) = preference {
        if is_verified(preference) {
            tracing::debug!(caller_id = %preference, "using preferred caller ID");
            return Ok(preference.to_string());
        }
        tracing::debug!(caller_id = %preference, "preferred caller ID not verified, ignoring");
    }

    let fallback = verified[0].phone_number.clone();
    tracing::debug!(caller_id = %fallback, "falling back to first verified caller ID");
    Ok(fallback)
}
