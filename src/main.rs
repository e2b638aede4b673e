use donorlink_core::authority::memory::InMemoryAuthority;
use donorlink_core::coordinators::matching::MatchingCoordinator;
use donorlink_core::coordinators::scheduling::SchedulingCoordinator;
use donorlink_core::model::{
    BloodType, CompletionDetails, Coordinates, DonationKind, Donor, DonorProfile, RequestDraft,
    ScheduleInput, Urgency,
};
use donorlink_core::repositories::donations::DonationRepository;
use donorlink_core::repositories::requests::RequestRepository;
use donorlink_core::search::DonorSearchClient;
use donorlink_core::{CompletionPolicy, CoreConfig, Session};
use donorlink_types::AuthToken;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HOSPITAL: &str = "hosp-demo";

fn demo_donor(id: &str, name: &str, blood_type: BloodType) -> Donor {
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

/// Runs the full request-to-completion workflow against the in-memory
/// authority, as a demonstration of the engine without a backend.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("donorlink=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let token = AuthToken::new("demo-token")?;
    let config = CoreConfig {
        completion_policy: CompletionPolicy::AutoWhenAllMatchedComplete,
        ..Default::default()
    };
    let authority = Arc::new(InMemoryAuthority::with_config(token.clone(), config.clone()));
    authority.register_donor(demo_donor("don-ada", "Ada Lovelace", BloodType::ONegative));
    authority.register_donor(demo_donor("don-grace", "Grace Hopper", BloodType::APositive));

    let session = Session::new(token);
    let requests = Arc::new(RequestRepository::new(authority.clone()));
    let donations = Arc::new(DonationRepository::new(authority.clone()));
    let donors = Arc::new(DonorSearchClient::new(authority.clone()));
    let matching = MatchingCoordinator::new(authority.clone(), requests.clone());
    let scheduling = SchedulingCoordinator::new(
        authority,
        config,
        requests.clone(),
        donations.clone(),
        donors.clone(),
    );

    let request = requests
        .create_request(
            &session,
            HOSPITAL,
            RequestDraft {
                request_type: DonationKind::Blood,
                blood_type: Some(BloodType::ONegative),
                organ: None,
                urgency: Urgency::Emergency,
                patient_condition: Some("post-operative haemorrhage".into()),
                preferred_donation_date: None,
                notes: None,
            },
        )
        .await?;
    println!("Created request {} ({})", request.id, request.type_detail());

    let matched = matching.auto_match(&session, HOSPITAL, &request.id).await?;
    println!("Matched {} donor(s)", matched.len());
    let donor = matched
        .first()
        .ok_or_else(|| anyhow::anyhow!("no compatible donor in the demo pool"))?;

    let donation = scheduling
        .schedule_donation(
            &session,
            HOSPITAL,
            donor,
            ScheduleInput {
                donor_id: donor.id.clone(),
                request_id: Some(request.id.clone()),
                donation_type: DonationKind::Blood,
                blood_type: Some(BloodType::ONegative),
                organ: None,
                donation_date: chrono::Utc::now().date_naive(),
                notes: "Scheduled by hospital for blood donation".into(),
            },
        )
        .await?;
    println!("Scheduled donation {} for {}", donation.id, donor.display_name());

    scheduling
        .complete_donation(
            &session,
            HOSPITAL,
            &donation.id,
            CompletionDetails {
                amount: Some("450ml".into()),
                notes: None,
            },
        )
        .await?;

    let closed = requests.get_request(&session, HOSPITAL, &request.id).await?;
    println!("Donation completed; request is now {}", closed.status);
    Ok(())
}
