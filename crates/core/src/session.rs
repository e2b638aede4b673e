//! Administrator session context.
//!
//! The credential is threaded explicitly into every coordinator and
//! repository call rather than read from ambient storage at each call site,
//! so a caller can operate several sessions side by side and tests can mint
//! credentials freely.

use donorlink_types::AuthToken;

/// An authenticated administrator session.
///
/// Hospital scope is deliberately not part of the session: an administrator
/// may operate across multiple hospitals, so every call names its hospital id
/// explicitly.
#[derive(Debug, Clone)]
pub struct Session {
    token: AuthToken,
}

impl Session {
    pub fn new(token: AuthToken) -> Self {
        Self { token }
    }

    /// The credential to attach to an authority call.
    pub fn token(&self) -> &AuthToken {
        &self.token
    }
}
