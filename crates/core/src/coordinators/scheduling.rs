//! Scheduling coordinator.
//!
//! Converts a (Request, Donor) pair — or a donor alone — into a Donation and
//! drives the donation state machine: `scheduled` to `completed` or
//! `cancelled`, both terminal. Enforces the client-side exclusivity check per
//! request and the cache invalidations each transition requires.

use crate::authority::DonationAuthority;
use crate::config::{CoreConfig, UnmatchedDonorPolicy};
use crate::error::{WorkflowError, WorkflowResult};
use crate::model::{
    CompletionDetails, Donation, DonationStatus, Donor, RequestStatus, ScheduleInput,
};
use crate::repositories::donations::DonationRepository;
use crate::repositories::requests::RequestRepository;
use crate::search::DonorSearchClient;
use crate::session::Session;
use crate::validation;
use donorlink_types::NonEmptyText;
use std::sync::Arc;

/// Creates, completes and cancels donations against the shared caches.
pub struct SchedulingCoordinator {
    authority: Arc<dyn DonationAuthority>,
    config: CoreConfig,
    requests: Arc<RequestRepository>,
    donations: Arc<DonationRepository>,
    donors: Arc<DonorSearchClient>,
}

impl SchedulingCoordinator {
    pub fn new(
        authority: Arc<dyn DonationAuthority>,
        config: CoreConfig,
        requests: Arc<RequestRepository>,
        donations: Arc<DonationRepository>,
        donors: Arc<DonorSearchClient>,
    ) -> Self {
        Self {
            authority,
            config,
            requests,
            donations,
            donors,
        }
    }

    /// Schedules a donation for a donor, optionally against a request.
    ///
    /// Local fast-fails before dispatch: the type detail must match the
    /// donation type's domain, an organ donation must name an organ the donor
    /// offers, and a donor already holding a scheduled donation for the same
    /// request is a conflict. The authority performs the authoritative
    /// versions of all three checks.
    pub async fn schedule_donation(
        &self,
        session: &Session,
        hospital_id: &str,
        donor: &Donor,
        input: ScheduleInput,
    ) -> WorkflowResult<Donation> {
        validation::validate_schedule_input(&input, donor)?;

        if let Some(request_id) = &input.request_id {
            let request = self
                .requests
                .get_request(session, hospital_id, request_id)
                .await?;

            let existing = self
                .donations
                .list_donations(session, hospital_id, Some(DonationStatus::Scheduled))
                .await?;
            if existing
                .iter()
                .any(|d| d.donor_id == donor.id && d.request_id.as_deref() == Some(request_id.as_str()))
            {
                return Err(WorkflowError::InvalidState(format!(
                    "donor {} is already scheduled for request {request_id}",
                    donor.display_name()
                )));
            }

            if request.status == RequestStatus::Matched
                && !request.matched_donors.iter().any(|id| id == &donor.id)
            {
                match self.config.unmatched_donor_policy {
                    UnmatchedDonorPolicy::Reject => {
                        return Err(WorkflowError::Validation(format!(
                            "donor {} is not among the matched donors of request {request_id}",
                            donor.display_name()
                        )));
                    }
                    UnmatchedDonorPolicy::Allow => {
                        tracing::warn!(
                            request_id,
                            donor_id = %donor.id,
                            "scheduling a donor outside the request's matched set"
                        );
                    }
                }
            }
        }

        let donation = self
            .authority
            .schedule_donation(session, hospital_id, input)
            .await?;

        tracing::info!(donation_id = %donation.id, donor_id = %donation.donor_id, "donation scheduled");
        self.donations.invalidate(hospital_id);
        self.donors.invalidate(hospital_id);
        Ok(donation)
    }

    /// Marks a scheduled donation completed. Terminal.
    pub async fn complete_donation(
        &self,
        session: &Session,
        hospital_id: &str,
        donation_id: &str,
        details: CompletionDetails,
    ) -> WorkflowResult<Donation> {
        let current = self
            .donations
            .get_donation(session, hospital_id, donation_id)
            .await?;
        if current.status != DonationStatus::Scheduled {
            return Err(WorkflowError::InvalidState(format!(
                "donation {donation_id} is {}; only scheduled donations can be completed",
                current.status
            )));
        }

        let completed = self
            .authority
            .complete_donation(session, hospital_id, donation_id, details)
            .await?;

        tracing::info!(donation_id, "donation completed");
        self.donations.invalidate(hospital_id);
        self.donors.invalidate(hospital_id);
        // Completion may close the parent request, depending on the
        // authority's completion policy.
        self.requests.invalidate(hospital_id);
        Ok(completed)
    }

    /// Cancels a scheduled donation. Terminal. The reason is typed non-empty
    /// so the audit trail never carries a blank entry. Cancellation may free
    /// the donor for rematching, so the donor snapshot is always refreshed.
    pub async fn cancel_donation(
        &self,
        session: &Session,
        hospital_id: &str,
        donation_id: &str,
        reason: &NonEmptyText,
    ) -> WorkflowResult<Donation> {
        let current = self
            .donations
            .get_donation(session, hospital_id, donation_id)
            .await?;
        if current.status != DonationStatus::Scheduled {
            return Err(WorkflowError::InvalidState(format!(
                "donation {donation_id} is {}; only scheduled donations can be cancelled",
                current.status
            )));
        }

        let cancelled = self
            .authority
            .cancel_donation(session, hospital_id, donation_id, reason.as_str())
            .await?;

        tracing::info!(donation_id, reason = %reason, "donation cancelled");
        self.donations.invalidate(hospital_id);
        self.donors.invalidate(hospital_id);
        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::memory::InMemoryAuthority;
    use crate::coordinators::matching::MatchingCoordinator;
    use crate::model::{BloodType, DonationKind, RequestDraft, Urgency};
    use chrono::NaiveDate;
    use donorlink_types::AuthToken;

    struct Fixture {
        authority: Arc<InMemoryAuthority>,
        requests: Arc<RequestRepository>,
        scheduling: SchedulingCoordinator,
        session: Session,
    }

    fn fixture_with(config: CoreConfig) -> Fixture {
        let token = AuthToken::new("tok").unwrap();
        let authority = Arc::new(InMemoryAuthority::new(token.clone()));
        let requests = Arc::new(RequestRepository::new(authority.clone()));
        let donations = Arc::new(DonationRepository::new(authority.clone()));
        let donors = Arc::new(DonorSearchClient::new(authority.clone()));
        let scheduling = SchedulingCoordinator::new(
            authority.clone(),
            config,
            requests.clone(),
            donations,
            donors,
        );
        Fixture {
            authority,
            requests,
            scheduling,
            session: Session::new(token),
        }
    }

    fn fixture() -> Fixture {
        fixture_with(CoreConfig::default())
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

    fn blood_input(donor_id: &str, request_id: Option<String>) -> ScheduleInput {
        ScheduleInput {
            donor_id: donor_id.into(),
            request_id,
            donation_type: DonationKind::Blood,
            blood_type: Some(BloodType::ONegative),
            organ: None,
            donation_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            notes: "Scheduled by hospital for blood donation".into(),
        }
    }

    async fn open_o_neg_request(fixture: &Fixture) -> String {
        fixture
            .requests
            .create_request(
                &fixture.session,
                "hosp-1",
                RequestDraft {
                    request_type: DonationKind::Blood,
                    blood_type: Some(BloodType::ONegative),
                    organ: None,
                    urgency: Urgency::Urgent,
                    patient_condition: None,
                    preferred_donation_date: None,
                    notes: None,
                },
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn scheduling_creates_a_scheduled_donation_with_supplied_fields() {
        let fx = fixture();
        let donor_x = donor("donor-x", BloodType::ONegative);
        fx.authority.register_donor(donor_x.clone());
        let request_id = open_o_neg_request(&fx).await;

        let donation = fx
            .scheduling
            .schedule_donation(
                &fx.session,
                "hosp-1",
                &donor_x,
                blood_input("donor-x", Some(request_id.clone())),
            )
            .await
            .unwrap();

        assert_eq!(donation.status, DonationStatus::Scheduled);
        assert_eq!(donation.donor_id, "donor-x");
        assert_eq!(donation.request_id.as_deref(), Some(request_id.as_str()));
        assert_eq!(donation.blood_type, Some(BloodType::ONegative));
        assert_eq!(
            donation.donation_date,
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
        );
    }

    #[tokio::test]
    async fn double_booking_a_donor_for_the_same_request_is_a_conflict() {
        let fx = fixture();
        let donor_x = donor("donor-x", BloodType::ONegative);
        fx.authority.register_donor(donor_x.clone());
        let request_id = open_o_neg_request(&fx).await;

        fx.scheduling
            .schedule_donation(
                &fx.session,
                "hosp-1",
                &donor_x,
                blood_input("donor-x", Some(request_id.clone())),
            )
            .await
            .unwrap();

        let err = fx
            .scheduling
            .schedule_donation(
                &fx.session,
                "hosp-1",
                &donor_x,
                blood_input("donor-x", Some(request_id)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState(_)));
    }

    #[tokio::test]
    async fn complete_then_cancel_hits_the_terminal_state_wall() {
        let fx = fixture();
        let donor_x = donor("donor-x", BloodType::ONegative);
        fx.authority.register_donor(donor_x.clone());

        let donation = fx
            .scheduling
            .schedule_donation(&fx.session, "hosp-1", &donor_x, blood_input("donor-x", None))
            .await
            .unwrap();

        let completed = fx
            .scheduling
            .complete_donation(
                &fx.session,
                "hosp-1",
                &donation.id,
                CompletionDetails::default(),
            )
            .await
            .unwrap();
        assert_eq!(completed.status, DonationStatus::Completed);

        let err = fx
            .scheduling
            .cancel_donation(
                &fx.session,
                "hosp-1",
                &donation.id,
                &NonEmptyText::new("changed plans").unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState(_)));

        // And completing again fails the same way.
        let err = fx
            .scheduling
            .complete_donation(
                &fx.session,
                "hosp-1",
                &donation.id,
                CompletionDetails::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState(_)));
    }

    #[tokio::test]
    async fn unmatched_donor_policy_reject_blocks_off_list_scheduling() {
        let fx = fixture_with(CoreConfig {
            unmatched_donor_policy: UnmatchedDonorPolicy::Reject,
            ..Default::default()
        });
        let matched_donor = donor("donor-x", BloodType::ONegative);
        let outsider = donor("donor-z", BloodType::ONegative);
        fx.authority.register_donor(matched_donor.clone());
        let request_id = open_o_neg_request(&fx).await;

        // Match the request so donor-x becomes its matched set, then register
        // an outsider donor afterwards.
        let matching =
            MatchingCoordinator::new(fx.authority.clone(), fx.requests.clone());
        matching
            .auto_match(&fx.session, "hosp-1", &request_id)
            .await
            .unwrap();
        fx.authority.register_donor(outsider.clone());

        let err = fx
            .scheduling
            .schedule_donation(
                &fx.session,
                "hosp-1",
                &outsider,
                blood_input("donor-z", Some(request_id)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }
}
