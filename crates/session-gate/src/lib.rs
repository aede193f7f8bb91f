//! Readiness gate over an externally managed authentication session.
//!
//! The identity provider owns all session state; this crate only answers
//! whether a signed-in identity with a freshly issued credential token is
//! available right now, and can wait for that to become true with a bounded
//! retry budget. All failures are returned as data so callers branch on the
//! result instead of catching errors.

mod session;
mod verify;

pub use session::{AuthSession, Identity, SessionError, StaticSession};
pub use verify::{AuthVerification, RetryPolicy, SessionGate, VerifyError};
