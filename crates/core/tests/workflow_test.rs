//! End-to-end workflow tests over the in-memory authority.
//!
//! Exercises the full administrator lifecycle through the public API:
//! create a request, match it, schedule the donor, and drive the donation
//! to a terminal state, checking cache coherence between the surfaces along
//! the way.

use donorlink_core::authority::memory::InMemoryAuthority;
use donorlink_core::coordinators::matching::MatchingCoordinator;
use donorlink_core::coordinators::scheduling::SchedulingCoordinator;
use donorlink_core::model::{
    BloodType, CompletionDetails, Coordinates, DonationKind, DonationStatus, Donor, DonorProfile,
    RequestDraft, RequestStatus, Urgency,
};
use donorlink_core::panels::{DonorManagementPanel, MatchPanel};
use donorlink_core::repositories::donations::DonationRepository;
use donorlink_core::repositories::requests::RequestRepository;
use donorlink_core::search::DonorSearchClient;
use donorlink_core::{CompletionPolicy, CoreConfig, Session, WorkflowError};
use donorlink_types::{AuthToken, NonEmptyText};
use std::sync::Arc;

const HOSPITAL: &str = "hosp-royal-free";

struct World {
    authority: Arc<InMemoryAuthority>,
    requests: Arc<RequestRepository>,
    donations: Arc<DonationRepository>,
    donors: Arc<DonorSearchClient>,
    matching: Arc<MatchingCoordinator>,
    scheduling: Arc<SchedulingCoordinator>,
    session: Session,
}

fn world_with(config: CoreConfig) -> World {
    let token = AuthToken::new("integration-token").unwrap();
    let authority = Arc::new(InMemoryAuthority::with_config(token.clone(), config.clone()));
    let requests = Arc::new(RequestRepository::new(authority.clone()));
    let donations = Arc::new(DonationRepository::new(authority.clone()));
    let donors = Arc::new(DonorSearchClient::new(authority.clone()));
    let matching = Arc::new(MatchingCoordinator::new(authority.clone(), requests.clone()));
    let scheduling = Arc::new(SchedulingCoordinator::new(
        authority.clone(),
        config,
        requests.clone(),
        donations.clone(),
        donors.clone(),
    ));
    World {
        authority,
        requests,
        donations,
        donors,
        matching,
        scheduling,
        session: Session::new(token),
    }
}

fn world() -> World {
    world_with(CoreConfig::default())
}

fn named_donor(id: &str, name: &str, blood_type: BloodType) -> Donor {
    Donor {
        id: id.into(),
        user: Some(DonorProfile {
            name: name.into(),
            phone: String::new(),
        }),
        blood_type,
        organ_donor: false,
        organs: vec![],
        medical_conditions: vec![],
        medications: vec![],
        last_donated: None,
        geolocation: Some(Coordinates {
            longitude: -0.13,
            latitude: 51.51,
        }),
    }
}

fn o_neg_draft() -> RequestDraft {
    RequestDraft {
        request_type: DonationKind::Blood,
        blood_type: Some(BloodType::ONegative),
        organ: None,
        urgency: Urgency::Emergency,
        patient_condition: Some("post-operative haemorrhage".into()),
        preferred_donation_date: None,
        notes: None,
    }
}

#[tokio::test]
async fn full_lifecycle_from_request_to_completed_donation() {
    let w = world_with(CoreConfig {
        completion_policy: CompletionPolicy::AutoWhenAllMatchedComplete,
        ..Default::default()
    });
    w.authority
        .register_donor(named_donor("don-ada", "Ada", BloodType::ONegative));

    // Create and confirm it is listed as open.
    let request = w
        .requests
        .create_request(&w.session, HOSPITAL, o_neg_draft())
        .await
        .unwrap();
    let open = w.requests.list_open_requests(&w.session, HOSPITAL).await.unwrap();
    assert_eq!(open.len(), 1);

    // Match through the panel so the whole surface flow runs.
    let mut panel = MatchPanel::new(
        CoreConfig::default(),
        w.requests.clone(),
        w.donors.clone(),
        w.matching.clone(),
        w.scheduling.clone(),
    );
    panel
        .select_request(&w.session, HOSPITAL, &request.id)
        .await
        .unwrap();
    let matched = panel.auto_match(&w.session, HOSPITAL).await.unwrap();
    assert_eq!(matched, 1);

    // Schedule the matched donor against the request.
    let donation = panel
        .schedule_selected(&w.session, HOSPITAL, "don-ada")
        .await
        .unwrap();
    assert_eq!(donation.status, DonationStatus::Scheduled);
    assert_eq!(donation.request_id.as_deref(), Some(request.id.as_str()));

    // The matched request no longer appears in the open list.
    let open = w.requests.list_open_requests(&w.session, HOSPITAL).await.unwrap();
    assert!(open.is_empty());

    // Complete; with the auto policy the parent request closes too, and the
    // request cache invalidation makes that visible.
    w.scheduling
        .complete_donation(&w.session, HOSPITAL, &donation.id, CompletionDetails::default())
        .await
        .unwrap();
    let closed = w
        .requests
        .get_request(&w.session, HOSPITAL, &request.id)
        .await
        .unwrap();
    assert_eq!(closed.status, RequestStatus::Completed);

    let completed = w
        .donations
        .list_donations(&w.session, HOSPITAL, Some(DonationStatus::Completed))
        .await
        .unwrap();
    assert_eq!(completed.len(), 1);
}

#[tokio::test]
async fn cancellation_frees_the_donor_for_rescheduling() {
    let w = world();
    w.authority
        .register_donor(named_donor("don-ada", "Ada", BloodType::ONegative));
    let request = w
        .requests
        .create_request(&w.session, HOSPITAL, o_neg_draft())
        .await
        .unwrap();
    w.matching
        .auto_match(&w.session, HOSPITAL, &request.id)
        .await
        .unwrap();

    let mut mgmt = DonorManagementPanel::new(
        w.donors.clone(),
        w.donations.clone(),
        w.scheduling.clone(),
    );

    let donor = named_donor("don-ada", "Ada", BloodType::ONegative);
    let input = donorlink_core::model::ScheduleInput {
        donor_id: "don-ada".into(),
        request_id: Some(request.id.clone()),
        donation_type: DonationKind::Blood,
        blood_type: Some(BloodType::ONegative),
        organ: None,
        donation_date: chrono::Utc::now().date_naive(),
        notes: String::new(),
    };
    let first = mgmt
        .schedule_walk_in(&w.session, HOSPITAL, &donor, input.clone())
        .await
        .unwrap();

    // While scheduled, the same (donor, request) pair cannot be booked again.
    let err = mgmt
        .schedule_walk_in(&w.session, HOSPITAL, &donor, input.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidState(_)));

    // After cancellation it can. The reason arrives as validated non-empty
    // text, so the record never carries a blank audit entry.
    let reason = NonEmptyText::new("donor unavailable").unwrap();
    let cancelled = mgmt
        .cancel(&w.session, HOSPITAL, &first.id, &reason)
        .await
        .unwrap();
    assert_eq!(cancelled.status, DonationStatus::Cancelled);
    assert_eq!(cancelled.notes, "cancelled: donor unavailable");

    let second = mgmt
        .schedule_walk_in(&w.session, HOSPITAL, &donor, input)
        .await
        .unwrap();
    assert_eq!(second.status, DonationStatus::Scheduled);
}

#[tokio::test]
async fn stale_credential_surfaces_as_unauthorized_everywhere() {
    let w = world();
    let stale = Session::new(AuthToken::new("expired").unwrap());

    let err = w
        .requests
        .list_requests(&stale, HOSPITAL, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Unauthorized(_)));

    let err = w
        .donors
        .search(&stale, HOSPITAL, &Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Unauthorized(_)));
}

#[tokio::test]
async fn hospitals_see_only_their_own_entities() {
    let w = world();
    w.authority
        .register_donor(named_donor("don-ada", "Ada", BloodType::ONegative));
    w.requests
        .create_request(&w.session, HOSPITAL, o_neg_draft())
        .await
        .unwrap();

    let other = w
        .requests
        .list_requests(&w.session, "hosp-other", None)
        .await
        .unwrap();
    assert!(other.is_empty());

    let other_donations = w
        .donations
        .list_donations(&w.session, "hosp-other", None)
        .await
        .unwrap();
    assert!(other_donations.is_empty());
}
