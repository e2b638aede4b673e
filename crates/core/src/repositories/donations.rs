//! Donation repository.
//!
//! Read path for the donor management surface. The authority only exposes an
//! unfiltered per-hospital listing, so the repository caches that full fetch
//! and answers narrower status filters locally without another round trip.

use super::lock_cache;
use crate::authority::DonationAuthority;
use crate::error::{WorkflowError, WorkflowResult};
use crate::model::{Donation, DonationStatus};
use crate::session::Session;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Fetches and caches a hospital's donation records.
pub struct DonationRepository {
    authority: Arc<dyn DonationAuthority>,
    cache: Mutex<HashMap<String, Vec<Donation>>>,
}

impl DonationRepository {
    pub fn new(authority: Arc<dyn DonationAuthority>) -> Self {
        Self {
            authority,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Lists a hospital's donations, optionally narrowed to one status.
    ///
    /// The unfiltered listing is cached per hospital; a later filter change
    /// re-filters the cached set client-side instead of re-querying.
    pub async fn list_donations(
        &self,
        session: &Session,
        hospital_id: &str,
        status_filter: Option<DonationStatus>,
    ) -> WorkflowResult<Vec<Donation>> {
        // Clone out of the guard so the lock is released before the fetch;
        // holding it across the await would deadlock the re-lock below.
        let cached = lock_cache(&self.cache).get(hospital_id).cloned();
        let all = match cached {
            Some(cached) => cached,
            None => {
                let fetched = self.authority.list_donations(session, hospital_id).await?;
                lock_cache(&self.cache).insert(hospital_id.to_owned(), fetched.clone());
                fetched
            }
        };

        Ok(match status_filter {
            Some(status) => all.into_iter().filter(|d| d.status == status).collect(),
            None => all,
        })
    }

    /// A single donation by id; `NotFound` if it is absent from the
    /// hospital's set.
    pub async fn get_donation(
        &self,
        session: &Session,
        hospital_id: &str,
        donation_id: &str,
    ) -> WorkflowResult<Donation> {
        self.list_donations(session, hospital_id, None)
            .await?
            .into_iter()
            .find(|d| d.id == donation_id)
            .ok_or_else(|| WorkflowError::NotFound(format!("donation {donation_id}")))
    }

    /// Drops the hospital's cached donation set so the next read re-fetches.
    pub fn invalidate(&self, hospital_id: &str) {
        if lock_cache(&self.cache).remove(hospital_id).is_some() {
            tracing::debug!(hospital_id, "donation cache invalidated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::memory::InMemoryAuthority;
    use crate::model::{BloodType, DonationKind, Donor, ScheduleInput};
    use chrono::NaiveDate;
    use donorlink_types::AuthToken;

    fn donor(id: &str) -> Donor {
        Donor {
            id: id.into(),
            user: None,
            blood_type: BloodType::OPositive,
            organ_donor: false,
            organs: vec![],
            medical_conditions: vec![],
            medications: vec![],
            last_donated: None,
            geolocation: None,
        }
    }

    fn schedule_input(donor_id: &str) -> ScheduleInput {
        ScheduleInput {
            donor_id: donor_id.into(),
            request_id: None,
            donation_type: DonationKind::Blood,
            blood_type: Some(BloodType::OPositive),
            organ: None,
            donation_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn narrower_filter_is_served_from_the_cached_full_fetch() {
        let token = AuthToken::new("tok").unwrap();
        let authority = Arc::new(InMemoryAuthority::new(token.clone()));
        let session = Session::new(token);
        authority.register_donor(donor("don-1"));
        authority.register_donor(donor("don-2"));

        authority
            .schedule_donation(&session, "hosp-1", schedule_input("don-1"))
            .await
            .unwrap();

        let repo = DonationRepository::new(authority.clone());
        let all = repo.list_donations(&session, "hosp-1", None).await.unwrap();
        assert_eq!(all.len(), 1);

        // Mutate authority state behind the repository's back: a cached
        // filter pass must not re-query, so the new donation stays invisible
        // until invalidation.
        authority
            .schedule_donation(&session, "hosp-1", schedule_input("don-2"))
            .await
            .unwrap();

        let scheduled = repo
            .list_donations(&session, "hosp-1", Some(DonationStatus::Scheduled))
            .await
            .unwrap();
        assert_eq!(scheduled.len(), 1);

        repo.invalidate("hosp-1");
        let refreshed = repo.list_donations(&session, "hosp-1", None).await.unwrap();
        assert_eq!(refreshed.len(), 2);
    }

    #[tokio::test]
    async fn get_donation_not_found_for_unknown_id() {
        let token = AuthToken::new("tok").unwrap();
        let authority = Arc::new(InMemoryAuthority::new(token.clone()));
        let session = Session::new(token);
        let repo = DonationRepository::new(authority);

        let err = repo
            .get_donation(&session, "hosp-1", "missing")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
