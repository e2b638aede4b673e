//! Interactive panel state.
//!
//! Each panel mirrors one administrator surface: request detail, donor
//! matching, and donor management. Panels hold only view state (the current
//! selection and the last loaded lists); every entity they display comes from
//! the shared repositories, and every mutation goes through a coordinator so
//! the caches stay coherent across panels.

use crate::config::CoreConfig;
use crate::coordinators::matching::MatchingCoordinator;
use crate::coordinators::scheduling::SchedulingCoordinator;
use crate::error::{WorkflowError, WorkflowResult};
use crate::model::{
    CompletionDetails, Donation, DonationRequest, DonationStatus, Donor, DonorFilters,
    RequestPatch, ScheduleInput,
};
use crate::repositories::donations::DonationRepository;
use crate::repositories::requests::RequestRepository;
use crate::search::DonorSearchClient;
use crate::session::Session;
use chrono::Utc;
use donorlink_types::NonEmptyText;
use std::sync::Arc;

/// The matching surface: pick an open request, find compatible donors, and
/// schedule one of them against it.
pub struct MatchPanel {
    config: CoreConfig,
    requests: Arc<RequestRepository>,
    donors: Arc<DonorSearchClient>,
    matching: Arc<MatchingCoordinator>,
    scheduling: Arc<SchedulingCoordinator>,
    selected_request: Option<DonationRequest>,
    candidates: Vec<Donor>,
}

impl MatchPanel {
    pub fn new(
        config: CoreConfig,
        requests: Arc<RequestRepository>,
        donors: Arc<DonorSearchClient>,
        matching: Arc<MatchingCoordinator>,
        scheduling: Arc<SchedulingCoordinator>,
    ) -> Self {
        Self {
            config,
            requests,
            donors,
            matching,
            scheduling,
            selected_request: None,
            candidates: Vec::new(),
        }
    }

    /// The open requests available for matching.
    pub async fn open_requests(
        &self,
        session: &Session,
        hospital_id: &str,
    ) -> WorkflowResult<Vec<DonationRequest>> {
        self.requests.list_open_requests(session, hospital_id).await
    }

    /// Selects a request and derives the donor filters its type implies:
    /// the matching blood type or organ, plus the configured default search
    /// radius. Any previous candidate list is discarded.
    pub async fn select_request(
        &mut self,
        session: &Session,
        hospital_id: &str,
        request_id: &str,
    ) -> WorkflowResult<DonorFilters> {
        let request = self
            .requests
            .get_request(session, hospital_id, request_id)
            .await?;
        let filters = DonorFilters {
            blood_type: request.blood_type,
            organ: request.organ,
            max_distance_km: Some(self.config.default_max_distance_km),
            origin: None,
        };
        self.selected_request = Some(request);
        self.candidates.clear();
        Ok(filters)
    }

    pub fn selected_request(&self) -> Option<&DonationRequest> {
        self.selected_request.as_ref()
    }

    /// The donors currently shown as candidates for the selected request.
    pub fn candidates(&self) -> &[Donor] {
        &self.candidates
    }

    /// Runs auto-match for the selected request and shows the matched donors
    /// as candidates.
    pub async fn auto_match(
        &mut self,
        session: &Session,
        hospital_id: &str,
    ) -> WorkflowResult<usize> {
        let request_id = self.selected_request_id()?;
        let matched = self
            .matching
            .auto_match(session, hospital_id, &request_id)
            .await?;
        // The selection itself changed status; reload it.
        self.selected_request = Some(
            self.requests
                .get_request(session, hospital_id, &request_id)
                .await?,
        );
        self.candidates = matched;
        Ok(self.candidates.len())
    }

    /// Runs a manual donor search with caller-adjusted filters, replacing the
    /// candidate list.
    pub async fn manual_search(
        &mut self,
        session: &Session,
        hospital_id: &str,
        filters: &DonorFilters,
    ) -> WorkflowResult<usize> {
        self.candidates = self.donors.search(session, hospital_id, filters).await?;
        Ok(self.candidates.len())
    }

    /// Schedules one of the current candidates against the selected request,
    /// then clears the panel for the next request.
    pub async fn schedule_selected(
        &mut self,
        session: &Session,
        hospital_id: &str,
        donor_id: &str,
    ) -> WorkflowResult<Donation> {
        let request = self
            .selected_request
            .clone()
            .ok_or_else(|| WorkflowError::InvalidState("no request selected".to_owned()))?;
        let donor = self
            .candidates
            .iter()
            .find(|d| d.id == donor_id)
            .cloned()
            .ok_or_else(|| {
                WorkflowError::NotFound(format!("donor {donor_id} is not in the candidate list"))
            })?;

        let input = ScheduleInput {
            donor_id: donor.id.clone(),
            request_id: Some(request.id.clone()),
            donation_type: request.request_type,
            blood_type: request.blood_type,
            organ: request.organ,
            donation_date: request
                .preferred_donation_date
                .unwrap_or_else(|| Utc::now().date_naive()),
            notes: format!(
                "Scheduled by hospital for {} donation",
                request.request_type
            ),
        };

        let donation = self
            .scheduling
            .schedule_donation(session, hospital_id, &donor, input)
            .await?;
        self.selected_request = None;
        self.candidates.clear();
        Ok(donation)
    }

    fn selected_request_id(&self) -> WorkflowResult<String> {
        self.selected_request
            .as_ref()
            .map(|r| r.id.clone())
            .ok_or_else(|| WorkflowError::InvalidState("no request selected".to_owned()))
    }
}

/// The donor management surface: search the donor pool, schedule ad-hoc
/// donations, and drive scheduled donations to completion or cancellation.
pub struct DonorManagementPanel {
    donors: Arc<DonorSearchClient>,
    donations: Arc<DonationRepository>,
    scheduling: Arc<SchedulingCoordinator>,
    status_filter: Option<DonationStatus>,
    listed: Vec<Donation>,
}

impl DonorManagementPanel {
    pub fn new(
        donors: Arc<DonorSearchClient>,
        donations: Arc<DonationRepository>,
        scheduling: Arc<SchedulingCoordinator>,
    ) -> Self {
        Self {
            donors,
            donations,
            scheduling,
            status_filter: None,
            listed: Vec::new(),
        }
    }

    pub async fn search_donors(
        &self,
        session: &Session,
        hospital_id: &str,
        filters: &DonorFilters,
    ) -> WorkflowResult<Vec<Donor>> {
        self.donors.search(session, hospital_id, filters).await
    }

    /// Schedules a donation not tied to any request, e.g. a walk-in donor.
    pub async fn schedule_walk_in(
        &self,
        session: &Session,
        hospital_id: &str,
        donor: &Donor,
        input: ScheduleInput,
    ) -> WorkflowResult<Donation> {
        self.scheduling
            .schedule_donation(session, hospital_id, donor, input)
            .await
    }

    /// Sets the status filter and reloads the donation list through the
    /// shared cache.
    pub async fn set_status_filter(
        &mut self,
        session: &Session,
        hospital_id: &str,
        status: Option<DonationStatus>,
    ) -> WorkflowResult<&[Donation]> {
        self.status_filter = status;
        self.reload(session, hospital_id).await
    }

    /// Reloads the list under the current filter.
    pub async fn reload(
        &mut self,
        session: &Session,
        hospital_id: &str,
    ) -> WorkflowResult<&[Donation]> {
        self.listed = self
            .donations
            .list_donations(session, hospital_id, self.status_filter)
            .await?;
        Ok(&self.listed)
    }

    pub fn listed(&self) -> &[Donation] {
        &self.listed
    }

    pub async fn complete(
        &mut self,
        session: &Session,
        hospital_id: &str,
        donation_id: &str,
        details: CompletionDetails,
    ) -> WorkflowResult<Donation> {
        let donation = self
            .scheduling
            .complete_donation(session, hospital_id, donation_id, details)
            .await?;
        self.reload(session, hospital_id).await?;
        Ok(donation)
    }

    pub async fn cancel(
        &mut self,
        session: &Session,
        hospital_id: &str,
        donation_id: &str,
        reason: &NonEmptyText,
    ) -> WorkflowResult<Donation> {
        let donation = self
            .scheduling
            .cancel_donation(session, hospital_id, donation_id, reason)
            .await?;
        self.reload(session, hospital_id).await?;
        Ok(donation)
    }
}

/// The request detail surface: inspect one request, edit it while open, or
/// kick off matching directly.
pub struct RequestDetailPanel {
    requests: Arc<RequestRepository>,
    matching: Arc<MatchingCoordinator>,
    current: Option<DonationRequest>,
}

impl RequestDetailPanel {
    pub fn new(requests: Arc<RequestRepository>, matching: Arc<MatchingCoordinator>) -> Self {
        Self {
            requests,
            matching,
            current: None,
        }
    }

    pub async fn load(
        &mut self,
        session: &Session,
        hospital_id: &str,
        request_id: &str,
    ) -> WorkflowResult<&DonationRequest> {
        let request = self
            .requests
            .get_request(session, hospital_id, request_id)
            .await?;
        Ok(self.current.insert(request))
    }

    pub fn current(&self) -> Option<&DonationRequest> {
        self.current.as_ref()
    }

    pub async fn update(
        &mut self,
        session: &Session,
        hospital_id: &str,
        patch: RequestPatch,
    ) -> WorkflowResult<&DonationRequest> {
        let request_id = self.current_id()?;
        let updated = self
            .requests
            .update_request(session, hospital_id, &request_id, patch)
            .await?;
        Ok(self.current.insert(updated))
    }

    pub async fn auto_match(
        &mut self,
        session: &Session,
        hospital_id: &str,
    ) -> WorkflowResult<Vec<Donor>> {
        let request_id = self.current_id()?;
        let matched = self
            .matching
            .auto_match(session, hospital_id, &request_id)
            .await?;
        self.current = Some(
            self.requests
                .get_request(session, hospital_id, &request_id)
                .await?,
        );
        Ok(matched)
    }

    fn current_id(&self) -> WorkflowResult<String> {
        self.current
            .as_ref()
            .map(|r| r.id.clone())
            .ok_or_else(|| WorkflowError::InvalidState("no request loaded".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::memory::InMemoryAuthority;
    use crate::model::{BloodType, DonationKind, RequestDraft, RequestStatus, Urgency};
    use donorlink_types::AuthToken;

    struct Harness {
        authority: Arc<InMemoryAuthority>,
        requests: Arc<RequestRepository>,
        donations: Arc<DonationRepository>,
        donors: Arc<DonorSearchClient>,
        matching: Arc<MatchingCoordinator>,
        scheduling: Arc<SchedulingCoordinator>,
        session: Session,
    }

    fn harness() -> Harness {
        let token = AuthToken::new("tok").unwrap();
        let authority = Arc::new(InMemoryAuthority::new(token.clone()));
        let requests = Arc::new(RequestRepository::new(authority.clone()));
        let donations = Arc::new(DonationRepository::new(authority.clone()));
        let donors = Arc::new(DonorSearchClient::new(authority.clone()));
        let matching = Arc::new(MatchingCoordinator::new(authority.clone(), requests.clone()));
        let scheduling = Arc::new(SchedulingCoordinator::new(
            authority.clone(),
            CoreConfig::default(),
            requests.clone(),
            donations.clone(),
            donors.clone(),
        ));
        Harness {
            authority,
            requests,
            donations,
            donors,
            matching,
            scheduling,
            session: Session::new(token),
        }
    }

    fn donor(id: &str, blood_type: BloodType) -> Donor {
        Donor {
            id: id.into(),
            user: None,
            blood_type,
            organ_donor: false,
            organs: vec![],
            medical_conditions: vec![],
            medications: vec![],
            last_donated: None,
            geolocation: None,
        }
    }

    fn o_neg_draft() -> RequestDraft {
        RequestDraft {
            request_type: DonationKind::Blood,
            blood_type: Some(BloodType::ONegative),
            organ: None,
            urgency: Urgency::Urgent,
            patient_condition: None,
            preferred_donation_date: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn match_panel_runs_the_select_match_schedule_flow() {
        let h = harness();
        h.authority.register_donor(donor("donor-x", BloodType::ONegative));
        let request = h
            .requests
            .create_request(&h.session, "hosp-1", o_neg_draft())
            .await
            .unwrap();

        let mut panel = MatchPanel::new(
            CoreConfig::default(),
            h.requests.clone(),
            h.donors.clone(),
            h.matching.clone(),
            h.scheduling.clone(),
        );

        let filters = panel
            .select_request(&h.session, "hosp-1", &request.id)
            .await
            .unwrap();
        assert_eq!(filters.blood_type, Some(BloodType::ONegative));

        let count = panel.auto_match(&h.session, "hosp-1").await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            panel.selected_request().map(|r| r.status),
            Some(RequestStatus::Matched)
        );

        let donation = panel
            .schedule_selected(&h.session, "hosp-1", "donor-x")
            .await
            .unwrap();
        assert_eq!(donation.status, DonationStatus::Scheduled);
        assert_eq!(donation.notes, "Scheduled by hospital for blood donation");

        // The panel resets for the next request.
        assert!(panel.selected_request().is_none());
        assert!(panel.candidates().is_empty());
    }

    #[tokio::test]
    async fn match_panel_rejects_scheduling_a_donor_outside_the_candidates() {
        let h = harness();
        h.authority.register_donor(donor("donor-x", BloodType::ONegative));
        let request = h
            .requests
            .create_request(&h.session, "hosp-1", o_neg_draft())
            .await
            .unwrap();

        let mut panel = MatchPanel::new(
            CoreConfig::default(),
            h.requests.clone(),
            h.donors.clone(),
            h.matching.clone(),
            h.scheduling.clone(),
        );
        panel
            .select_request(&h.session, "hosp-1", &request.id)
            .await
            .unwrap();

        let err = panel
            .schedule_selected(&h.session, "hosp-1", "donor-x")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn management_panel_refilters_after_completion() {
        let h = harness();
        let donor_x = donor("donor-x", BloodType::OPositive);
        h.authority.register_donor(donor_x.clone());

        let mut panel = DonorManagementPanel::new(
            h.donors.clone(),
            h.donations.clone(),
            h.scheduling.clone(),
        );

        let input = ScheduleInput {
            donor_id: "donor-x".into(),
            request_id: None,
            donation_type: DonationKind::Blood,
            blood_type: Some(BloodType::OPositive),
            organ: None,
            donation_date: Utc::now().date_naive(),
            notes: String::new(),
        };
        let donation = panel
            .schedule_walk_in(&h.session, "hosp-1", &donor_x, input)
            .await
            .unwrap();

        panel
            .set_status_filter(&h.session, "hosp-1", Some(DonationStatus::Scheduled))
            .await
            .unwrap();
        assert_eq!(panel.listed().len(), 1);

        panel
            .complete(&h.session, "hosp-1", &donation.id, CompletionDetails::default())
            .await
            .unwrap();
        // Still filtered to scheduled, now empty.
        assert!(panel.listed().is_empty());

        panel
            .set_status_filter(&h.session, "hosp-1", Some(DonationStatus::Completed))
            .await
            .unwrap();
        assert_eq!(panel.listed().len(), 1);
    }

    #[tokio::test]
    async fn detail_panel_update_requires_a_loaded_request() {
        let h = harness();
        let mut panel = RequestDetailPanel::new(h.requests.clone(), h.matching.clone());

        let err = panel
            .update(&h.session, "hosp-1", RequestPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState(_)));
    }
}
