//! Donor search client.
//!
//! Stateless, idempotent filtered queries over the donor pool, delegated to
//! the remote authority's search operation. The client additionally keeps the
//! last result per hospital as a snapshot for the interactive surfaces, so a
//! cancellation can invalidate donor availability everywhere at once.

use crate::authority::DonationAuthority;
use crate::error::WorkflowResult;
use crate::model::{Donor, DonorFilters};
use crate::repositories::lock_cache;
use crate::session::Session;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Issues filtered donor queries and caches the latest snapshot per hospital.
pub struct DonorSearchClient {
    authority: Arc<dyn DonationAuthority>,
    snapshots: Mutex<HashMap<String, Vec<Donor>>>,
}

impl DonorSearchClient {
    pub fn new(authority: Arc<dyn DonationAuthority>) -> Self {
        Self {
            authority,
            snapshots: Mutex::new(HashMap::new()),
        }
    }

    /// Runs a filtered donor query.
    ///
    /// A distance constraint without origin coordinates is silently disabled
    /// (logged, not failed): geolocation is best-effort and its absence must
    /// never block a search. Result ordering is authority-defined and not
    /// stable across calls.
    pub async fn search(
        &self,
        session: &Session,
        hospital_id: &str,
        filters: &DonorFilters,
    ) -> WorkflowResult<Vec<Donor>> {
        let mut effective = filters.clone();
        if effective.max_distance_km.is_some() && effective.origin.is_none() {
            tracing::debug!(
                hospital_id,
                "no origin coordinates available; distance filter disabled"
            );
            effective.max_distance_km = None;
        }

        let donors = self
            .authority
            .search_donors(session, hospital_id, &effective)
            .await?;
        lock_cache(&self.snapshots).insert(hospital_id.to_owned(), donors.clone());
        Ok(donors)
    }

    /// The last search result for a hospital, if still valid.
    pub fn snapshot(&self, hospital_id: &str) -> Option<Vec<Donor>> {
        lock_cache(&self.snapshots).get(hospital_id).cloned()
    }

    /// Drops the hospital's donor snapshot; called when scheduling activity
    /// may have changed donor availability.
    pub fn invalidate(&self, hospital_id: &str) {
        if lock_cache(&self.snapshots).remove(hospital_id).is_some() {
            tracing::debug!(hospital_id, "donor snapshot invalidated");
        }
    }
}
