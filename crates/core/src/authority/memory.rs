//! In-memory reference implementation of the donation authority.
//!
//! Implements the server-side rules the remote backend is responsible for:
//! credential checking, request/donation status transitions, the one active
//! donation per (donor, request) rule, compatibility filtering for search and
//! match, and the configurable request completion policy. Tests and the demo
//! binary run the whole workflow against it without a network.

use super::DonationAuthority;
use crate::config::{CompletionPolicy, CoreConfig};
use crate::error::{WorkflowError, WorkflowResult};
use crate::model::{
    CompletionDetails, Coordinates, Donation, DonationKind, DonationRequest, DonationStatus,
    Donor, DonorFilters, RequestDraft, RequestPatch, RequestStatus, ScheduleInput,
};
use crate::session::Session;
use crate::validation;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use donorlink_types::AuthToken;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// How long a new request stays live before its `expires_at` timestamp.
const REQUEST_TTL_DAYS: i64 = 30;

#[derive(Default)]
struct State {
    requests: HashMap<String, DonationRequest>,
    donors: Vec<Donor>,
    donations: HashMap<String, Donation>,
}

/// A self-contained donation authority holding all state in memory.
pub struct InMemoryAuthority {
    token: AuthToken,
    config: CoreConfig,
    state: Mutex<State>,
}

impl InMemoryAuthority {
    /// Creates an authority that accepts only the given credential.
    pub fn new(token: AuthToken) -> Self {
        Self::with_config(token, CoreConfig::default())
    }

    /// Creates an authority with an explicit completion policy configuration.
    pub fn with_config(token: AuthToken, config: CoreConfig) -> Self {
        Self {
            token,
            config,
            state: Mutex::new(State::default()),
        }
    }

    /// Registers a donor in the searchable pool. Donors are owned by the
    /// external donor-management subsystem; this stands in for it.
    pub fn register_donor(&self, donor: Donor) {
        self.lock().donors.push(donor);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means another caller panicked mid-operation;
        // the state itself is still a consistent snapshot.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn authorize(&self, session: &Session) -> WorkflowResult<()> {
        if session.token() != &self.token {
            return Err(WorkflowError::Unauthorized(
                "credential rejected by authority".into(),
            ));
        }
        Ok(())
    }

    fn donor_matches(donor: &Donor, request: &DonationRequest) -> bool {
        match request.request_type {
            DonationKind::Blood => Some(donor.blood_type) == request.blood_type,
            DonationKind::Organ => request
                .organ
                .map(|organ| donor.offers_organ(organ))
                .unwrap_or(false),
        }
    }

    fn within_distance(donor: &Donor, origin: Coordinates, max_km: f64) -> bool {
        match donor.geolocation {
            Some(position) => haversine_km(origin, position) <= max_km,
            // Donors without a recorded position cannot satisfy a distance
            // constraint.
            None => false,
        }
    }

    /// Applies the configured completion policy after a donation completes.
    fn maybe_complete_request(state: &mut State, donation: &Donation) {
        let Some(request_id) = &donation.request_id else {
            return;
        };
        let Some(request) = state.requests.get(request_id) else {
            return;
        };
        if request.status != RequestStatus::Matched || request.matched_donors.is_empty() {
            return;
        }

        let all_complete = request.matched_donors.iter().all(|donor_id| {
            state.donations.values().any(|d| {
                d.request_id.as_deref() == Some(request_id.as_str())
                    && &d.donor_id == donor_id
                    && d.status == DonationStatus::Completed
            })
        });

        if all_complete {
            if let Some(request) = state.requests.get_mut(request_id) {
                request.status = RequestStatus::Completed;
                tracing::info!(request_id, "all matched donors completed; request closed");
            }
        }
    }
}

#[async_trait]
impl DonationAuthority for InMemoryAuthority {
    async fn list_requests(
        &self,
        session: &Session,
        hospital_id: &str,
    ) -> WorkflowResult<Vec<DonationRequest>> {
        self.authorize(session)?;
        let state = self.lock();
        Ok(state
            .requests
            .values()
            .filter(|r| r.hospital_id == hospital_id)
            .cloned()
            .collect())
    }

    async fn create_request(
        &self,
        session: &Session,
        hospital_id: &str,
        draft: RequestDraft,
    ) -> WorkflowResult<DonationRequest> {
        self.authorize(session)?;
        validation::validate_request_draft(&draft)?;

        let now = Utc::now();
        let request = DonationRequest {
            id: uuid::Uuid::new_v4().to_string(),
            hospital_id: hospital_id.to_owned(),
            request_type: draft.request_type,
            blood_type: draft.blood_type,
            organ: draft.organ,
            urgency: draft.urgency,
            patient_condition: draft.patient_condition,
            notes: draft.notes,
            preferred_donation_date: draft.preferred_donation_date,
            created_at: now,
            expires_at: now + Duration::days(REQUEST_TTL_DAYS),
            status: RequestStatus::Open,
            matched_donors: vec![],
        };

        self.lock()
            .requests
            .insert(request.id.clone(), request.clone());
        Ok(request)
    }

    async fn update_request(
        &self,
        session: &Session,
        hospital_id: &str,
        request_id: &str,
        patch: RequestPatch,
    ) -> WorkflowResult<DonationRequest> {
        self.authorize(session)?;
        let mut state = self.lock();
        let request = state
            .requests
            .get_mut(request_id)
            .filter(|r| r.hospital_id == hospital_id)
            .ok_or_else(|| {
                WorkflowError::NotFound(format!("donation request {request_id}"))
            })?;

        if request.status != RequestStatus::Open {
            return Err(WorkflowError::InvalidState(format!(
                "request {request_id} is {} and can no longer be edited",
                request.status
            )));
        }

        patch.apply_to(request);
        Ok(request.clone())
    }

    async fn auto_match(
        &self,
        session: &Session,
        hospital_id: &str,
        request_id: &str,
    ) -> WorkflowResult<Vec<Donor>> {
        self.authorize(session)?;
        let mut state = self.lock();
        let request = state
            .requests
            .get(request_id)
            .filter(|r| r.hospital_id == hospital_id)
            .cloned()
            .ok_or_else(|| {
                WorkflowError::NotFound(format!("donation request {request_id}"))
            })?;

        if request.status != RequestStatus::Open {
            return Err(WorkflowError::InvalidState(format!(
                "request {request_id} is {}; only open requests can be matched",
                request.status
            )));
        }

        let matched: Vec<Donor> = state
            .donors
            .iter()
            .filter(|d| Self::donor_matches(d, &request))
            .cloned()
            .collect();

        // An empty candidate set leaves the request open, preserving the
        // invariant that matched requests carry at least one donor.
        if !matched.is_empty() {
            if let Some(request) = state.requests.get_mut(request_id) {
                request.status = RequestStatus::Matched;
                request.matched_donors = matched.iter().map(|d| d.id.clone()).collect();
            }
        }

        Ok(matched)
    }

    async fn search_donors(
        &self,
        session: &Session,
        _hospital_id: &str,
        filters: &DonorFilters,
    ) -> WorkflowResult<Vec<Donor>> {
        self.authorize(session)?;
        let state = self.lock();
        Ok(state
            .donors
            .iter()
            .filter(|d| {
                filters
                    .blood_type
                    .map(|bt| d.blood_type == bt)
                    .unwrap_or(true)
            })
            .filter(|d| filters.organ.map(|o| d.offers_organ(o)).unwrap_or(true))
            .filter(|d| match (filters.origin, filters.max_distance_km) {
                (Some(origin), Some(max_km)) => Self::within_distance(d, origin, max_km),
                _ => true,
            })
            .cloned()
            .collect())
    }

    async fn schedule_donation(
        &self,
        session: &Session,
        hospital_id: &str,
        input: ScheduleInput,
    ) -> WorkflowResult<Donation> {
        self.authorize(session)?;
        let mut state = self.lock();

        let donor = state
            .donors
            .iter()
            .find(|d| d.id == input.donor_id)
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound(format!("donor {}", input.donor_id)))?;
        validation::validate_schedule_input(&input, &donor)?;

        if let Some(request_id) = &input.request_id {
            if !state
                .requests
                .values()
                .any(|r| &r.id == request_id && r.hospital_id == hospital_id)
            {
                return Err(WorkflowError::NotFound(format!(
                    "donation request {request_id}"
                )));
            }

            let already_scheduled = state.donations.values().any(|d| {
                d.donor_id == input.donor_id
                    && d.request_id.as_deref() == Some(request_id.as_str())
                    && d.status == DonationStatus::Scheduled
            });
            if already_scheduled {
                return Err(WorkflowError::InvalidState(format!(
                    "donor {} already has a scheduled donation for request {request_id}",
                    input.donor_id
                )));
            }
        }

        let donation = Donation {
            id: uuid::Uuid::new_v4().to_string(),
            hospital_id: hospital_id.to_owned(),
            donor_id: input.donor_id,
            request_id: input.request_id,
            donation_type: input.donation_type,
            blood_type: input.blood_type,
            organ: input.organ,
            donation_date: input.donation_date,
            notes: input.notes,
            status: DonationStatus::Scheduled,
        };

        state
            .donations
            .insert(donation.id.clone(), donation.clone());
        Ok(donation)
    }

    async fn complete_donation(
        &self,
        session: &Session,
        hospital_id: &str,
        donation_id: &str,
        details: CompletionDetails,
    ) -> WorkflowResult<Donation> {
        self.authorize(session)?;
        let mut state = self.lock();

        let donation = state
            .donations
            .get_mut(donation_id)
            .filter(|d| d.hospital_id == hospital_id)
            .ok_or_else(|| WorkflowError::NotFound(format!("donation {donation_id}")))?;

        if donation.status != DonationStatus::Scheduled {
            return Err(WorkflowError::InvalidState(format!(
                "donation {donation_id} is {}; only scheduled donations can be completed",
                donation.status
            )));
        }

        donation.status = DonationStatus::Completed;
        if let Some(notes) = details.notes {
            donation.notes = notes;
        }
        let completed = donation.clone();

        if self.config.completion_policy == CompletionPolicy::AutoWhenAllMatchedComplete {
            Self::maybe_complete_request(&mut state, &completed);
        }

        Ok(completed)
    }

    async fn cancel_donation(
        &self,
        session: &Session,
        hospital_id: &str,
        donation_id: &str,
        reason: &str,
    ) -> WorkflowResult<Donation> {
        self.authorize(session)?;
        let mut state = self.lock();

        let donation = state
            .donations
            .get_mut(donation_id)
            .filter(|d| d.hospital_id == hospital_id)
            .ok_or_else(|| WorkflowError::NotFound(format!("donation {donation_id}")))?;

        if donation.status != DonationStatus::Scheduled {
            return Err(WorkflowError::InvalidState(format!(
                "donation {donation_id} is {}; only scheduled donations can be cancelled",
                donation.status
            )));
        }

        donation.status = DonationStatus::Cancelled;
        // Scheduling-time notes stay in the record; the reason is appended.
        if donation.notes.is_empty() {
            donation.notes = format!("cancelled: {reason}");
        } else {
            donation.notes = format!("{}; cancelled: {reason}", donation.notes);
        }
        Ok(donation.clone())
    }

    async fn list_donations(
        &self,
        session: &Session,
        hospital_id: &str,
    ) -> WorkflowResult<Vec<Donation>> {
        self.authorize(session)?;
        let state = self.lock();
        Ok(state
            .donations
            .values()
            .filter(|d| d.hospital_id == hospital_id)
            .cloned()
            .collect())
    }
}

/// Great-circle distance between two positions in kilometres.
fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}
