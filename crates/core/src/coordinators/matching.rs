//! Matching coordinator.
//!
//! Drives the remote ranking operation for a request and reconciles the
//! result into the request cache and the caller's donor list.

use crate::authority::DonationAuthority;
use crate::error::{WorkflowError, WorkflowResult};
use crate::model::Donor;
use crate::repositories::requests::RequestRepository;
use crate::session::Session;
use std::sync::Arc;

/// Invokes auto-match for a request and applies the confirmed result.
pub struct MatchingCoordinator {
    authority: Arc<dyn DonationAuthority>,
    requests: Arc<RequestRepository>,
}

impl MatchingCoordinator {
    pub fn new(authority: Arc<dyn DonationAuthority>, requests: Arc<RequestRepository>) -> Self {
        Self { authority, requests }
    }

    /// Runs the remote ranking operation for an open request.
    ///
    /// A non-open request is rejected before dispatch without touching
    /// `matched_donors`. On success the cached request transitions to
    /// `matched` with its donor set replaced wholesale (last successful call
    /// wins); on failure the request is left exactly as it was, since nothing
    /// is applied before the authority confirms.
    pub async fn auto_match(
        &self,
        session: &Session,
        hospital_id: &str,
        request_id: &str,
    ) -> WorkflowResult<Vec<Donor>> {
        let request = self
            .requests
            .get_request(session, hospital_id, request_id)
            .await?;
        if !request.is_open() {
            return Err(WorkflowError::InvalidState(format!(
                "request {request_id} is {}; only open requests can be matched",
                request.status
            )));
        }

        let matched = self
            .authority
            .auto_match(session, hospital_id, request_id)
            .await?;

        if matched.is_empty() {
            tracing::info!(request_id, "auto-match found no compatible donors");
        } else {
            tracing::info!(request_id, donors = matched.len(), "auto-match succeeded");
            let donor_ids = matched.iter().map(|d| d.id.clone()).collect();
            self.requests.record_match(hospital_id, request_id, donor_ids);
        }

        Ok(matched)
    }
}
