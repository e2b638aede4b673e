//! The remote donation authority abstraction.
//!
//! Every operation the workflow consumes from its remote collaborator
//! (request/response JSON calls scoped by hospital id) is captured by the
//! [`DonationAuthority`] trait. The `api-http` crate implements it over the
//! real backend; [`memory::InMemoryAuthority`] implements it with the
//! server-side rules for tests and demos.
//!
//! The authority is the sole serialization point for concurrent writers;
//! callers re-fetch affected entities after any mutating call instead of
//! trusting local state.

pub mod memory;

use crate::error::WorkflowResult;
use crate::model::{
    CompletionDetails, Donation, DonationRequest, Donor, DonorFilters, RequestDraft, RequestPatch,
    ScheduleInput,
};
use crate::session::Session;
use async_trait::async_trait;

/// The remote authority's operation surface.
///
/// All calls carry the session credential explicitly and are scoped by
/// hospital id. Mutating calls either succeed fully or leave remote state
/// unchanged; there are no partial writes.
#[async_trait]
pub trait DonationAuthority: Send + Sync {
    /// Lists all of a hospital's donation requests, any status.
    async fn list_requests(
        &self,
        session: &Session,
        hospital_id: &str,
    ) -> WorkflowResult<Vec<DonationRequest>>;

    /// Creates a new donation request.
    async fn create_request(
        &self,
        session: &Session,
        hospital_id: &str,
        draft: RequestDraft,
    ) -> WorkflowResult<DonationRequest>;

    /// Updates an open request's editable fields.
    async fn update_request(
        &self,
        session: &Session,
        hospital_id: &str,
        request_id: &str,
        patch: RequestPatch,
    ) -> WorkflowResult<DonationRequest>;

    /// Runs the remote ranking operation for a request and returns the
    /// matched donors. On success the request becomes `matched` with its
    /// `matched_donors` replaced wholesale.
    async fn auto_match(
        &self,
        session: &Session,
        hospital_id: &str,
        request_id: &str,
    ) -> WorkflowResult<Vec<Donor>>;

    /// Filtered donor query. Result ordering is implementation-defined and
    /// must not be assumed stable across calls.
    async fn search_donors(
        &self,
        session: &Session,
        hospital_id: &str,
        filters: &DonorFilters,
    ) -> WorkflowResult<Vec<Donor>>;

    /// Creates a donation with status `scheduled`.
    async fn schedule_donation(
        &self,
        session: &Session,
        hospital_id: &str,
        input: ScheduleInput,
    ) -> WorkflowResult<Donation>;

    /// Transitions a scheduled donation to `completed` (terminal).
    async fn complete_donation(
        &self,
        session: &Session,
        hospital_id: &str,
        donation_id: &str,
        details: CompletionDetails,
    ) -> WorkflowResult<Donation>;

    /// Transitions a scheduled donation to `cancelled` (terminal).
    async fn cancel_donation(
        &self,
        session: &Session,
        hospital_id: &str,
        donation_id: &str,
        reason: &str,
    ) -> WorkflowResult<Donation>;

    /// Lists all of a hospital's donations, any status.
    async fn list_donations(
        &self,
        session: &Session,
        hospital_id: &str,
    ) -> WorkflowResult<Vec<Donation>>;
}
