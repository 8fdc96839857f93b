//! # Session State
//!
//! The sale in progress at this counter: cart plus selected client.
//!
//! The session is wrapped in `Arc<Mutex<T>>` because commands run on the
//! tokio runtime and any of them may touch it. A separate flag marks a
//! sale submission in flight.
//!
//! ## Checkout Exclusion
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    While a sale is being submitted                      │
//! │                                                                         │
//! │  checkout ──► begin_checkout() ──► CheckoutGuard (flag = true)         │
//! │                    │                                                    │
//! │                    │   add / qty / toggle / rm / discount / client     │
//! │                    │       └──► CHECKOUT_PENDING, nothing changes      │
//! │                    │   second checkout                                 │
//! │                    │       └──► CHECKOUT_PENDING                       │
//! │                    ▼                                                    │
//! │  backend answers ──► guard dropped (flag = false)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The flag keeps the cart the operator is looking at identical to the
//! payload that was sent, and guarantees at most one submission per
//! attempt. It is only read or set while the session lock is held, so a
//! mutation either finishes before the flag goes up or sees it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use vetpos_core::SaleSession;

use crate::error::ApiError;

/// Thread-safe sale session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    session: Arc<Mutex<SaleSession>>,
    submitting: Arc<AtomicBool>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A panic while holding the lock cannot leave the session half
    /// updated (every cart operation validates before it mutates), so a
    /// poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, SaleSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Executes a read-only operation on the session.
    pub fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SaleSession) -> R,
    {
        f(&self.lock())
    }

    /// Executes a mutating operation on the session.
    ///
    /// Refused with `CHECKOUT_PENDING` while a sale is in flight.
    pub fn with_session_mut<F, R>(&self, f: F) -> Result<R, ApiError>
    where
        F: FnOnce(&mut SaleSession) -> R,
    {
        let mut session = self.lock();
        if self.is_submitting() {
            return Err(ApiError::checkout_pending());
        }
        Ok(f(&mut session))
    }

    /// Mutates the session on behalf of the checkout that holds `guard`.
    pub fn with_session_checkout<F, R>(&self, _guard: &CheckoutGuard, f: F) -> R
    where
        F: FnOnce(&mut SaleSession) -> R,
    {
        f(&mut self.lock())
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Marks a submission in flight until the returned guard drops.
    ///
    /// Waits for any mutation that already holds the lock.
    pub fn begin_checkout(&self) -> Result<CheckoutGuard, ApiError> {
        let _session = self.lock();
        self.submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ApiError::checkout_pending())?;

        Ok(CheckoutGuard {
            flag: Arc::clone(&self.submitting),
        })
    }
}

/// Clears the in-flight flag on drop, whether the submission succeeded,
/// failed, or the future was cancelled.
#[derive(Debug)]
pub struct CheckoutGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for CheckoutGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
