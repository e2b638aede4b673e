//! Wire envelopes and query construction for the donation backend.
//!
//! The backend wraps every payload in a single-key JSON envelope and takes
//! the hospital scope as a query parameter on every call.

use donorlink_core::model::{Donation, DonationRequest, Donor, DonorFilters};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct RequestsEnvelope {
    pub requests: Vec<DonationRequest>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RequestEnvelope {
    pub request: DonationRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MatchEnvelope {
    pub matched_donors: Vec<Donor>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DonorsEnvelope {
    pub donors: Vec<Donor>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DonationEnvelope {
    pub donation: Donation,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DonationsEnvelope {
    pub donations: Vec<Donation>,
}

/// The error shape the backend returns alongside non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub message: Option<String>,
}

/// Builds the donor search query pairs from a filter set.
///
/// Only populated filters produce parameters; the origin serialises as
/// `location=lon,lat` to match the backend's parser.
pub(crate) fn donor_query(hospital_id: &str, filters: &DonorFilters) -> Vec<(String, String)> {
    let mut pairs = vec![("hospitalId".to_owned(), hospital_id.to_owned())];
    if let Some(blood_type) = filters.blood_type {
        pairs.push(("bloodType".to_owned(), blood_type.to_string()));
    }
    if let Some(organ) = filters.organ {
        pairs.push(("organ".to_owned(), organ.to_string()));
    }
    if let Some(max_km) = filters.max_distance_km {
        pairs.push(("maxDistance".to_owned(), max_km.to_string()));
    }
    if let Some(origin) = filters.origin {
        pairs.push(("location".to_owned(), origin.as_query_value()));
    }
    pairs
}
