//! Donation entity and scheduling inputs.

use super::{BloodType, DonationKind, Organ};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a donation.
///
/// `scheduled --complete--> completed` and `scheduled --cancel--> cancelled`;
/// both targets are terminal and nothing re-enters `scheduled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl DonationStatus {
    /// True once the status can never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DonationStatus::Completed | DonationStatus::Cancelled)
    }
}

impl std::fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DonationStatus::Scheduled => f.write_str("scheduled"),
            DonationStatus::Completed => f.write_str("completed"),
            DonationStatus::Cancelled => f.write_str("cancelled"),
        }
    }
}

impl std::str::FromStr for DonationStatus {
    type Err = crate::WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(DonationStatus::Scheduled),
            "completed" => Ok(DonationStatus::Completed),
            "cancelled" => Ok(DonationStatus::Cancelled),
            other => Err(crate::WorkflowError::Validation(format!(
                "unknown donation status: {other}"
            ))),
        }
    }
}

/// A concrete scheduled, completed or cancelled act of donation.
///
/// `request_id` is absent for manual scheduling without a request. At most
/// one donation with status `scheduled` may exist per (donor, request) pair;
/// the authority enforces this, the client surfaces the conflict before
/// dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    #[serde(rename = "_id")]
    pub id: String,
    pub hospital_id: String,
    pub donor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub donation_type: DonationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<BloodType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organ: Option<Organ>,
    pub donation_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    pub status: DonationStatus,
}

/// Input for scheduling a new donation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInput {
    pub donor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub donation_type: DonationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<BloodType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organ: Option<Organ>,
    pub donation_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

/// Details recorded when a donation is marked completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!DonationStatus::Scheduled.is_terminal());
        assert!(DonationStatus::Completed.is_terminal());
        assert!(DonationStatus::Cancelled.is_terminal());
    }

    #[test]
    fn schedule_input_serializes_without_unset_detail() {
        let input = ScheduleInput {
            donor_id: "don-1".into(),
            request_id: None,
            donation_type: DonationKind::Blood,
            blood_type: Some(BloodType::OPositive),
            organ: None,
            donation_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            notes: String::new(),
        };

        let json = serde_json::to_string(&input).unwrap();
        assert!(json.contains("\"bloodType\":\"O+\""));
        assert!(!json.contains("organ"));
        assert!(!json.contains("requestId"));
    }
}
