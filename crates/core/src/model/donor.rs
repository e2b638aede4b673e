//! Donor entity and donor search filters.
//!
//! Donors are owned by the external donor-management subsystem. This
//! workflow reads them for matching and scheduling and never mutates them
//! directly.

use super::{BloodType, Organ};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Geographic position, longitude first (the authority's wire order).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    /// Renders the position as the `lon,lat` query parameter the authority
    /// expects.
    pub fn as_query_value(&self) -> String {
        format!("{},{}", self.longitude, self.latitude)
    }
}

/// The donor's linked user profile; read-only from this workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DonorProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// A registered individual eligible to give blood or organs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<DonorProfile>,
    pub blood_type: BloodType,
    #[serde(default)]
    pub organ_donor: bool,
    /// Organ tags on offer; only meaningful when `organ_donor` is set.
    #[serde(default)]
    pub organs: Vec<Organ>,
    /// Exclusionary free-text tags; not validated by this workflow.
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    /// Advisory eligibility signal; not enforced here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_donated: Option<NaiveDate>,
    /// Used only by the donor search distance filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<Coordinates>,
}

impl Donor {
    /// Display name, falling back to an anonymous label.
    pub fn display_name(&self) -> &str {
        match &self.user {
            Some(profile) if !profile.name.is_empty() => &profile.name,
            _ => "Anonymous Donor",
        }
    }

    /// True when the donor offers the given organ.
    pub fn offers_organ(&self, organ: Organ) -> bool {
        self.organ_donor && self.organs.contains(&organ)
    }
}

/// Filters for a manual donor search.
///
/// Blood type and organ are independently optional; an empty filter returns
/// the unranked candidate pool. `max_distance_km` is honoured only when
/// `origin` is present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonorFilters {
    pub blood_type: Option<BloodType>,
    pub organ: Option<Organ>,
    pub max_distance_km: Option<f64>,
    pub origin: Option<Coordinates>,
}
