//! Donation request repository.
//!
//! Owns the hospital-scoped request cache and the request status rules the
//! client enforces locally: edits only while open, in-place replacement of
//! cached entities after a confirmed mutation, wholesale cache invalidation
//! after operations that change matching state.

use super::lock_cache;
use crate::authority::DonationAuthority;
use crate::error::{WorkflowError, WorkflowResult};
use crate::model::{DonationRequest, RequestDraft, RequestPatch, RequestStatus};
use crate::session::Session;
use crate::validation;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Fetches and caches a hospital's donation requests.
pub struct RequestRepository {
    authority: Arc<dyn DonationAuthority>,
    cache: Mutex<HashMap<String, Vec<DonationRequest>>>,
}

impl RequestRepository {
    pub fn new(authority: Arc<dyn DonationAuthority>) -> Self {
        Self {
            authority,
            cache: Mutex::new(HashMap::new()),
        }
    }

    async fn fetch_or_cached(
        &self,
        session: &Session,
        hospital_id: &str,
    ) -> WorkflowResult<Vec<DonationRequest>> {
        if let Some(cached) = lock_cache(&self.cache).get(hospital_id) {
            return Ok(cached.clone());
        }
        let requests = self.authority.list_requests(session, hospital_id).await?;
        lock_cache(&self.cache).insert(hospital_id.to_owned(), requests.clone());
        Ok(requests)
    }

    /// Lists a hospital's requests, optionally narrowed to one status.
    pub async fn list_requests(
        &self,
        session: &Session,
        hospital_id: &str,
        status_filter: Option<RequestStatus>,
    ) -> WorkflowResult<Vec<DonationRequest>> {
        let requests = self.fetch_or_cached(session, hospital_id).await?;
        Ok(match status_filter {
            Some(status) => requests.into_iter().filter(|r| r.status == status).collect(),
            None => requests,
        })
    }

    /// Only the open requests, as the matching panel's candidate list.
    pub async fn list_open_requests(
        &self,
        session: &Session,
        hospital_id: &str,
    ) -> WorkflowResult<Vec<DonationRequest>> {
        self.list_requests(session, hospital_id, Some(RequestStatus::Open))
            .await
    }

    /// A single request by id; `NotFound` if it is absent from the
    /// hospital's set.
    pub async fn get_request(
        &self,
        session: &Session,
        hospital_id: &str,
        request_id: &str,
    ) -> WorkflowResult<DonationRequest> {
        self.fetch_or_cached(session, hospital_id)
            .await?
            .into_iter()
            .find(|r| r.id == request_id)
            .ok_or_else(|| WorkflowError::NotFound(format!("donation request {request_id}")))
    }

    /// Creates a new request after local draft validation and adds it to the
    /// cached set.
    pub async fn create_request(
        &self,
        session: &Session,
        hospital_id: &str,
        draft: RequestDraft,
    ) -> WorkflowResult<DonationRequest> {
        validation::validate_request_draft(&draft)?;
        let request = self
            .authority
            .create_request(session, hospital_id, draft)
            .await?;
        if let Some(cached) = lock_cache(&self.cache).get_mut(hospital_id) {
            cached.push(request.clone());
        }
        Ok(request)
    }

    /// Updates an open request's editable fields. Fails fast with
    /// `InvalidState` when the cached copy is no longer open; on success the
    /// cached entity is replaced in place, so no partial write is visible.
    pub async fn update_request(
        &self,
        session: &Session,
        hospital_id: &str,
        request_id: &str,
        patch: RequestPatch,
    ) -> WorkflowResult<DonationRequest> {
        let current = self.get_request(session, hospital_id, request_id).await?;
        if !current.is_open() {
            return Err(WorkflowError::InvalidState(format!(
                "request {request_id} is {} and can no longer be edited",
                current.status
            )));
        }

        let updated = self
            .authority
            .update_request(session, hospital_id, request_id, patch)
            .await?;
        self.replace_cached(hospital_id, updated.clone());
        Ok(updated)
    }

    /// Records a confirmed match result in the cache: status becomes
    /// `matched` and `matched_donors` is replaced wholesale.
    pub(crate) fn record_match(&self, hospital_id: &str, request_id: &str, donor_ids: Vec<String>) {
        let mut cache = lock_cache(&self.cache);
        if let Some(requests) = cache.get_mut(hospital_id) {
            if let Some(request) = requests.iter_mut().find(|r| r.id == request_id) {
                request.status = RequestStatus::Matched;
                request.matched_donors = donor_ids;
            }
        }
    }

    fn replace_cached(&self, hospital_id: &str, updated: DonationRequest) {
        let mut cache = lock_cache(&self.cache);
        if let Some(requests) = cache.get_mut(hospital_id) {
            if let Some(slot) = requests.iter_mut().find(|r| r.id == updated.id) {
                *slot = updated;
            }
        }
    }

    /// Drops the hospital's cached request set so the next read re-fetches.
    pub fn invalidate(&self, hospital_id: &str) {
        if lock_cache(&self.cache).remove(hospital_id).is_some() {
            tracing::debug!(hospital_id, "request cache invalidated");
        }
    }
}
