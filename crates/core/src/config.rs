//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into
//! services, so no request path reads process-wide environment variables.
//! Two unresolved business rules of the workflow are deliberately expressed
//! here as policies rather than hard-coded behaviour.

/// How a matched request reaches `completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionPolicy {
    /// A matched request stays matched until an external action completes it.
    #[default]
    Manual,
    /// A matched request completes automatically once every matched donor has
    /// a completed donation against it.
    AutoWhenAllMatchedComplete,
}

/// Whether a donor outside a matched request's `matched_donors` set may be
/// scheduled against that request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmatchedDonorPolicy {
    /// Permit it, logging a warning.
    #[default]
    Allow,
    /// Reject it with a validation error before dispatch.
    Reject,
}

/// Workflow configuration resolved at startup.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub completion_policy: CompletionPolicy,
    pub unmatched_donor_policy: UnmatchedDonorPolicy,
    /// Pre-filled distance constraint for donor searches, in kilometres.
    pub default_max_distance_km: f64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            completion_policy: CompletionPolicy::default(),
            unmatched_donor_policy: UnmatchedDonorPolicy::default(),
            default_max_distance_km: 10.0,
        }
    }
}
