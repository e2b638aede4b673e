//! Workflow error taxonomy.
//!
//! Every failure surfaced by the matching workflow falls into one of five
//! kinds, each carrying a human-readable message tied to the triggering
//! action. Local validation failures block a call before dispatch; all other
//! kinds surface only after a round trip to the authority and leave local
//! caches unchanged.

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The requested Request/Donor/Donation id is absent for the given hospital.
    #[error("not found: {0}")]
    NotFound(String),

    /// An attempted transition from a terminal or mismatched state, e.g.
    /// completing a non-scheduled donation or updating a non-open request.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Malformed or domain-inconsistent input, e.g. an organ the donor does
    /// not offer, or a blood type on an organ donation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Missing or rejected authorization credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The remote authority could not be reached or failed the call.
    #[error("authority unavailable: {0}")]
    Unavailable(String),
}

impl WorkflowError {
    /// True when this is a `NotFound` for an optional, not-yet-created
    /// resource, which query paths treat as an absent result rather than a
    /// failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WorkflowError::NotFound(_))
    }
}

pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;
