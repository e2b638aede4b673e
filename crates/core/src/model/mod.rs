//! Domain model for the donation matching workflow.
//!
//! Three entities span the workflow: [`DonationRequest`] (a hospital's
//! declared need), [`Donor`] (a registered individual, owned by the external
//! donor-management subsystem and read-only here) and [`Donation`] (a
//! concrete scheduled act linking the two). Field names serialize in the
//! remote authority's camelCase wire format.

mod donation;
mod donor;
mod request;

pub use donation::{CompletionDetails, Donation, DonationStatus, ScheduleInput};
pub use donor::{Coordinates, Donor, DonorFilters, DonorProfile};
pub use request::{DonationRequest, RequestDraft, RequestPatch, RequestStatus, Urgency};

use crate::error::WorkflowError;
use serde::{Deserialize, Serialize};

/// Whether a request or donation concerns blood or an organ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationKind {
    Blood,
    Organ,
}

impl std::fmt::Display for DonationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DonationKind::Blood => f.write_str("blood"),
            DonationKind::Organ => f.write_str("organ"),
        }
    }
}

impl std::str::FromStr for DonationKind {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blood" => Ok(DonationKind::Blood),
            "organ" => Ok(DonationKind::Organ),
            other => Err(WorkflowError::Validation(format!(
                "unknown donation kind: {other}"
            ))),
        }
    }
}

/// One of the eight ABO/Rh blood type combinations, serialized in clinical
/// notation (`"A+"` … `"O-"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodType {
    /// All eight ABO/Rh combinations, in donor-card order.
    pub const ALL: [BloodType; 8] = [
        BloodType::APositive,
        BloodType::ANegative,
        BloodType::BPositive,
        BloodType::BNegative,
        BloodType::AbPositive,
        BloodType::AbNegative,
        BloodType::OPositive,
        BloodType::ONegative,
    ];

    /// Clinical notation for this blood type.
    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
        }
    }
}

impl std::fmt::Display for BloodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BloodType {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BloodType::ALL
            .into_iter()
            .find(|bt| bt.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| WorkflowError::Validation(format!("unknown blood type: {s}")))
    }
}

/// The fixed set of organ tags the workflow recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Organ {
    Kidney,
    Liver,
    Heart,
    Lungs,
    Pancreas,
    Intestines,
    Cornea,
    Tissue,
    #[serde(rename = "bone marrow")]
    BoneMarrow,
}

impl Organ {
    /// Wire-format tag for this organ.
    pub fn as_str(&self) -> &'static str {
        match self {
            Organ::Kidney => "kidney",
            Organ::Liver => "liver",
            Organ::Heart => "heart",
            Organ::Lungs => "lungs",
            Organ::Pancreas => "pancreas",
            Organ::Intestines => "intestines",
            Organ::Cornea => "cornea",
            Organ::Tissue => "tissue",
            Organ::BoneMarrow => "bone marrow",
        }
    }
}

impl std::fmt::Display for Organ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Organ {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [Organ; 9] = [
            Organ::Kidney,
            Organ::Liver,
            Organ::Heart,
            Organ::Lungs,
            Organ::Pancreas,
            Organ::Intestines,
            Organ::Cornea,
            Organ::Tissue,
            Organ::BoneMarrow,
        ];
        ALL.into_iter()
            .find(|o| o.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| WorkflowError::Validation(format!("unknown organ: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blood_type_serializes_in_clinical_notation() {
        assert_eq!(
            serde_json::to_string(&BloodType::AbNegative).unwrap(),
            "\"AB-\""
        );
        let parsed: BloodType = serde_json::from_str("\"O-\"").unwrap();
        assert_eq!(parsed, BloodType::ONegative);
    }

    #[test]
    fn organ_tags_round_trip_including_spaced_variant() {
        assert_eq!(
            serde_json::to_string(&Organ::BoneMarrow).unwrap(),
            "\"bone marrow\""
        );
        let parsed: Organ = serde_json::from_str("\"bone marrow\"").unwrap();
        assert_eq!(parsed, Organ::BoneMarrow);
    }

    #[test]
    fn enums_parse_from_cli_strings() {
        assert_eq!("A+".parse::<BloodType>().unwrap(), BloodType::APositive);
        assert_eq!("kidney".parse::<Organ>().unwrap(), Organ::Kidney);
        assert!("spleen".parse::<Organ>().is_err());
        assert_eq!("organ".parse::<DonationKind>().unwrap(), DonationKind::Organ);
    }
}
