//! Donation request entity and its input types.

use super::{BloodType, DonationKind, Organ};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Urgency of a donation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Routine,
    Urgent,
    Emergency,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::Routine => f.write_str("routine"),
            Urgency::Urgent => f.write_str("urgent"),
            Urgency::Emergency => f.write_str("emergency"),
        }
    }
}

impl std::str::FromStr for Urgency {
    type Err = crate::WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "routine" => Ok(Urgency::Routine),
            "urgent" => Ok(Urgency::Urgent),
            "emergency" => Ok(Urgency::Emergency),
            other => Err(crate::WorkflowError::Validation(format!(
                "unknown urgency: {other}"
            ))),
        }
    }
}

/// Lifecycle status of a donation request.
///
/// Transitions are monotonic: `open --auto-match--> matched`, and `matched`
/// leaves this workflow only through the configurable completion policy.
/// Manual edits are permitted only while `open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Open,
    Matched,
    Completed,
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestStatus::Open => f.write_str("open"),
            RequestStatus::Matched => f.write_str("matched"),
            RequestStatus::Completed => f.write_str("completed"),
        }
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = crate::WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(RequestStatus::Open),
            "matched" => Ok(RequestStatus::Matched),
            "completed" => Ok(RequestStatus::Completed),
            other => Err(crate::WorkflowError::Validation(format!(
                "unknown request status: {other}"
            ))),
        }
    }
}

/// A hospital's declared need for a blood or organ donation.
///
/// Exactly one of `blood_type`/`organ` is populated, according to
/// `request_type`. `matched_donors` is non-empty only once the request has
/// been matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    #[serde(rename = "_id")]
    pub id: String,
    pub hospital_id: String,
    pub request_type: DonationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<BloodType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organ: Option<Organ>,
    pub urgency: Urgency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_donation_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: RequestStatus,
    #[serde(default)]
    pub matched_donors: Vec<String>,
}

impl DonationRequest {
    /// True while the request accepts manual edits and auto-matching.
    pub fn is_open(&self) -> bool {
        self.status == RequestStatus::Open
    }

    /// The request's type detail as a display string, e.g. `"A+"` or `"kidney"`.
    pub fn type_detail(&self) -> String {
        match self.request_type {
            DonationKind::Blood => self
                .blood_type
                .map(|bt| bt.to_string())
                .unwrap_or_default(),
            DonationKind::Organ => self.organ.map(|o| o.to_string()).unwrap_or_default(),
        }
    }
}

/// Input for creating a new donation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDraft {
    pub request_type: DonationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<BloodType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organ: Option<Organ>,
    pub urgency: Urgency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_donation_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update applied to an open request.
///
/// Only the fields an administrator may edit after creation: urgency, patient
/// condition, preferred donation date and notes. `None` leaves the field
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_donation_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RequestPatch {
    /// Applies the patch to a request, leaving unset fields alone.
    pub fn apply_to(&self, request: &mut DonationRequest) {
        if let Some(urgency) = self.urgency {
            request.urgency = urgency;
        }
        if let Some(condition) = &self.patient_condition {
            request.patient_condition = Some(condition.clone());
        }
        if let Some(date) = self.preferred_donation_date {
            request.preferred_donation_date = Some(date);
        }
        if let Some(notes) = &self.notes {
            request.notes = Some(notes.clone());
        }
    }
}
