//! Lifecycle guard
//!
//! Binds the controller's active session to the consuming surface's
//! mount interval. When the surface goes away mid-call, the guard
//! terminates the call at the provider, releases channel membership and
//! clears local state, so an abandoned `Connected` session cannot keep
//! the call live or hold an open subscription indefinitely.
//!
//! Release happens exactly once no matter which path terminates the
//! session first: the guard carries its own released flag, and the
//! membership underneath carries an atomic joined flag, so the normal
//! hangup path and forced teardown can race safely.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::timeout;

use crate::call::CallStatus;

use super::CallController;

/// Ties session cleanup to a consumer scope
///
/// Obtain one from [`CallController::lifecycle_guard`] and keep it
/// alive for as long as the consuming surface is mounted. Call
/// [`LifecycleGuard::release`] on orderly teardown; if the guard is
/// simply dropped while still armed, cleanup is spawned as a detached
/// best-effort task instead (`Drop` cannot await).
///
/// Teardown never panics and never reports errors: by the time it
/// runs, no UI remains to receive them.
pub struct LifecycleGuard {
    controller: Arc<CallController>,
    released: Arc<AtomicBool>,
}

impl CallController {
    /// Create a guard bound to this controller
    pub fn lifecycle_guard(self: &Arc<Self>) -> LifecycleGuard {
        LifecycleGuard {
            controller: Arc::clone(self),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Best-effort terminate-and-release of the active session. All
    /// failures are swallowed.
    pub(crate) async fn force_teardown(&self) {
        // A session still live at the provider must be hung up too;
        // leaving the room alone would keep the call running unheard.
        let live_call_id = {
            let lock = self.session.read().await;
            lock.as_ref()
                .filter(|s| !s.status.is_terminal() && !s.call_id.is_empty())
                .map(|s| s.call_id.clone())
        };
        if let Some(call_id) = live_call_id {
            let terminate = self.provider.terminate_call(&call_id);
            match timeout(self.config.terminate_timeout, terminate).await {
                Ok(Ok(())) => {
                    tracing::info!(call_id = %call_id, "terminated call during teardown");
                }
                Ok(Err(err)) => {
                    tracing::debug!(
                        call_id = %call_id,
                        "teardown terminate failed (swallowed): {}",
                        err
                    );
                }
                Err(_) => {
                    tracing::debug!(call_id = %call_id, "teardown terminate timed out (swallowed)");
                }
            }
        }

        self.release_membership_best_effort().await;

        let active = {
            let lock = self.session.read().await;
            lock.as_ref().map(|s| s.status).filter(|s| !s.is_terminal())
        };
        if active.is_some() {
            self.transition(CallStatus::Ended, Some("surface teardown".into()))
                .await;
        }
        self.session.write().await.take();
    }
}

impl LifecycleGuard {
    /// Whether this guard has already released its session
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Release the bound session now
    ///
    /// Idempotent; the second and later calls are no-ops. Never returns
    /// an error: teardown failures are swallowed.
    pub async fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("lifecycle guard released explicitly");
        self.controller.force_teardown().await;
    }
}

impl Drop for LifecycleGuard {
    fn drop(&mut self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("lifecycle guard dropped while armed, spawning teardown");
        let controller = Arc::clone(&self.controller);
        // Drop cannot await; detach the cleanup. Outside a runtime there
        // is nothing to clean up asynchronously, so the flag alone wins.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                controller.force_teardown().await;
            });
        }
    }
}

impl std::fmt::Debug for LifecycleGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleGuard")
            .field("released", &self.is_released())
            .finish()
    }
}
