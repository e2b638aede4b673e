use clap::{Parser, Subcommand};
use donorlink_api_http::HttpAuthority;
use donorlink_core::coordinators::matching::MatchingCoordinator;
use donorlink_core::coordinators::scheduling::SchedulingCoordinator;
use donorlink_core::model::{
    BloodType, CompletionDetails, Coordinates, Donation, DonationKind, DonationRequest,
    DonationStatus, DonorFilters, Organ, RequestDraft, RequestPatch, RequestStatus, ScheduleInput,
    Urgency,
};
use donorlink_core::repositories::donations::DonationRepository;
use donorlink_core::repositories::requests::RequestRepository;
use donorlink_core::search::DonorSearchClient;
use donorlink_core::{CoreConfig, Session};
use donorlink_types::{AuthToken, NonEmptyText};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "donorlink")]
#[command(about = "Hospital donation workflow CLI")]
struct Cli {
    /// Hospital id scoping every call
    #[arg(long, env = "DONORLINK_HOSPITAL_ID")]
    hospital: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List donation requests
    ListRequests {
        /// Restrict to one status (open, matched, completed)
        #[arg(long)]
        status: Option<RequestStatus>,
    },
    /// Create a donation request
    CreateRequest {
        /// Donation type (blood or organ)
        request_type: DonationKind,
        /// Urgency (routine, urgent, emergency)
        urgency: Urgency,
        /// Blood type for a blood request, e.g. "O-"
        #[arg(long)]
        blood_type: Option<BloodType>,
        /// Organ for an organ request, e.g. "kidney"
        #[arg(long)]
        organ: Option<Organ>,
        /// Patient condition summary
        #[arg(long)]
        condition: Option<String>,
        /// Preferred donation date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Update an open donation request
    UpdateRequest {
        /// Request id
        request_id: String,
        /// New urgency
        #[arg(long)]
        urgency: Option<Urgency>,
        /// New patient condition summary
        #[arg(long)]
        condition: Option<String>,
        /// New preferred donation date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
        /// New notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Auto-match an open request against the donor pool
    Match {
        /// Request id
        request_id: String,
    },
    /// Search the donor pool
    SearchDonors {
        /// Blood type filter, e.g. "A+"
        #[arg(long)]
        blood_type: Option<BloodType>,
        /// Organ filter, e.g. "liver"
        #[arg(long)]
        organ: Option<Organ>,
        /// Maximum distance in kilometres (requires --location)
        #[arg(long)]
        max_distance: Option<f64>,
        /// Origin as "lon,lat"
        #[arg(long)]
        location: Option<String>,
    },
    /// Schedule a donation for a donor
    Schedule {
        /// Donor id
        donor_id: String,
        /// Donation type (blood or organ)
        donation_type: DonationKind,
        /// Donation date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
        /// Request this donation fulfils (optional)
        #[arg(long)]
        request_id: Option<String>,
        /// Blood type for a blood donation
        #[arg(long)]
        blood_type: Option<BloodType>,
        /// Organ for an organ donation
        #[arg(long)]
        organ: Option<Organ>,
        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Mark a scheduled donation completed
    Complete {
        /// Donation id
        donation_id: String,
        /// Quantity collected, e.g. "450ml"
        #[arg(long)]
        amount: Option<String>,
        /// Completion notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Cancel a scheduled donation
    Cancel {
        /// Donation id
        donation_id: String,
        /// Cancellation reason (must be non-empty)
        reason: NonEmptyText,
    },
    /// List the hospital's donations
    ListDonations {
        /// Restrict to one status (scheduled, completed, cancelled)
        #[arg(long)]
        status: Option<DonationStatus>,
    },
}

struct App {
    requests: Arc<RequestRepository>,
    donations: Arc<DonationRepository>,
    donors: Arc<DonorSearchClient>,
    matching: MatchingCoordinator,
    scheduling: SchedulingCoordinator,
    session: Session,
    hospital: String,
}

fn parse_location(raw: &str) -> anyhow::Result<Coordinates> {
    let (lon, lat) = raw
        .split_once(',')
        .ok_or_else(|| anyhow::anyhow!("location must be \"lon,lat\""))?;
    Ok(Coordinates {
        longitude: lon.trim().parse()?,
        latitude: lat.trim().parse()?,
    })
}

fn print_request(request: &DonationRequest) {
    println!(
        "{}  {} {}  urgency: {}  status: {}  matched: {}",
        request.id,
        request.request_type,
        request.type_detail(),
        request.urgency,
        request.status,
        request.matched_donors.len()
    );
}

fn print_donation(donation: &Donation) {
    println!(
        "{}  donor: {}  {} on {}  status: {}",
        donation.id, donation.donor_id, donation.donation_type, donation.donation_date, donation.status
    );
}

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

    let cli = Cli::parse();

    let base_url = std::env::var("DONORLINK_BACKEND_URL")
        .unwrap_or_else(|_| "http://localhost:5000".into());
    let token = AuthToken::new(std::env::var("DONORLINK_TOKEN")?)?;

    let config = CoreConfig::default();
    let authority = Arc::new(HttpAuthority::new(base_url));
    let requests = Arc::new(RequestRepository::new(authority.clone()));
    let donations = Arc::new(DonationRepository::new(authority.clone()));
    let donors = Arc::new(DonorSearchClient::new(authority.clone()));
    let app = App {
        matching: MatchingCoordinator::new(authority.clone(), requests.clone()),
        scheduling: SchedulingCoordinator::new(
            authority,
            config,
            requests.clone(),
            donations.clone(),
            donors.clone(),
        ),
        requests,
        donations,
        donors,
        session: Session::new(token),
        hospital: cli.hospital,
    };

    match cli.command {
        Commands::ListRequests { status } => {
            let listed = app
                .requests
                .list_requests(&app.session, &app.hospital, status)
                .await?;
            if listed.is_empty() {
                println!("No requests found.");
            }
            for request in &listed {
                print_request(request);
            }
        }
        Commands::CreateRequest {
            request_type,
            urgency,
            blood_type,
            organ,
            condition,
            date,
            notes,
        } => {
            let draft = RequestDraft {
                request_type,
                blood_type,
                organ,
                urgency,
                patient_condition: condition,
                preferred_donation_date: date,
                notes,
            };
            let created = app
                .requests
                .create_request(&app.session, &app.hospital, draft)
                .await?;
            println!("Created request {}", created.id);
        }
        Commands::UpdateRequest {
            request_id,
            urgency,
            condition,
            date,
            notes,
        } => {
            let patch = RequestPatch {
                urgency,
                patient_condition: condition,
                preferred_donation_date: date,
                notes,
            };
            let updated = app
                .requests
                .update_request(&app.session, &app.hospital, &request_id, patch)
                .await?;
            print_request(&updated);
        }
        Commands::Match { request_id } => {
            let matched = app
                .matching
                .auto_match(&app.session, &app.hospital, &request_id)
                .await?;
            if matched.is_empty() {
                println!("No compatible donors found; request stays open.");
            } else {
                println!("Matched {} donor(s):", matched.len());
                for donor in &matched {
                    println!("  {}  {}  {}", donor.id, donor.display_name(), donor.blood_type);
                }
            }
        }
        Commands::SearchDonors {
            blood_type,
            organ,
            max_distance,
            location,
        } => {
            let origin = location.as_deref().map(parse_location).transpose()?;
            let filters = DonorFilters {
                blood_type,
                organ,
                max_distance_km: max_distance,
                origin,
            };
            let found = app
                .donors
                .search(&app.session, &app.hospital, &filters)
                .await?;
            if found.is_empty() {
                println!("No donors found.");
            }
            for donor in &found {
                println!("{}  {}  {}", donor.id, donor.display_name(), donor.blood_type);
            }
        }
        Commands::Schedule {
            donor_id,
            donation_type,
            date,
            request_id,
            blood_type,
            organ,
            notes,
        } => {
            // The scheduling coordinator checks the donor's profile, so fetch
            // it from the pool first.
            let pool = app
                .donors
                .search(&app.session, &app.hospital, &DonorFilters::default())
                .await?;
            let donor = pool
                .iter()
                .find(|d| d.id == donor_id)
                .ok_or_else(|| anyhow::anyhow!("donor {donor_id} not found"))?;

            let input = ScheduleInput {
                donor_id: donor_id.clone(),
                request_id,
                donation_type,
                blood_type,
                organ,
                donation_date: date.unwrap_or_else(|| chrono::Utc::now().date_naive()),
                notes: notes.unwrap_or_default(),
            };
            let donation = app
                .scheduling
                .schedule_donation(&app.session, &app.hospital, donor, input)
                .await?;
            println!("Scheduled donation {}", donation.id);
        }
        Commands::Complete {
            donation_id,
            amount,
            notes,
        } => {
            let details = CompletionDetails { amount, notes };
            let completed = app
                .scheduling
                .complete_donation(&app.session, &app.hospital, &donation_id, details)
                .await?;
            print_donation(&completed);
        }
        Commands::Cancel {
            donation_id,
            reason,
        } => {
            let cancelled = app
                .scheduling
                .cancel_donation(&app.session, &app.hospital, &donation_id, &reason)
                .await?;
            print_donation(&cancelled);
        }
        Commands::ListDonations { status } => {
            let listed = app
                .donations
                .list_donations(&app.session, &app.hospital, status)
                .await?;
            if listed.is_empty() {
                println!("No donations found.");
            }
            for donation in &listed {
                print_donation(donation);
            }
        }
    }

    Ok(())
}
