//! Pre-dispatch input validation.
//!
//! These checks run locally before any authority round trip and block the
//! call entirely when they fail. They cover structural consistency only; the
//! authority remains the source of truth for anything requiring remote state.

use crate::error::{WorkflowError, WorkflowResult};
use crate::model::{DonationKind, Donor, RequestDraft, ScheduleInput};

/// Validates that a request draft carries exactly the type detail its kind
/// requires: a blood type for blood requests, an organ for organ requests,
/// never both.
pub fn validate_request_draft(draft: &RequestDraft) -> WorkflowResult<()> {
    match draft.request_type {
        DonationKind::Blood => {
            if draft.blood_type.is_none() {
                return Err(WorkflowError::Validation(
                    "blood requests require a blood type".into(),
                ));
            }
            if draft.organ.is_some() {
                return Err(WorkflowError::Validation(
                    "blood requests must not name an organ".into(),
                ));
            }
        }
        DonationKind::Organ => {
            if draft.organ.is_none() {
                return Err(WorkflowError::Validation(
                    "organ requests require an organ".into(),
                ));
            }
            if draft.blood_type.is_some() {
                return Err(WorkflowError::Validation(
                    "organ requests must not name a blood type".into(),
                ));
            }
        }
    }
    Ok(())
}

/// Validates a scheduling input against its donation type and, when given,
/// the donor it targets.
///
/// Checks that the type detail matches the donation type's domain and that an
/// organ donation names an organ the donor actually offers. The donor-side
/// check is a fast fail only; the authoritative check is remote.
pub fn validate_schedule_input(input: &ScheduleInput, donor: &Donor) -> WorkflowResult<()> {
    if input.donor_id != donor.id {
        return Err(WorkflowError::Validation(
            "schedule input targets a different donor".into(),
        ));
    }

    match input.donation_type {
        DonationKind::Blood => {
            if input.blood_type.is_none() {
                return Err(WorkflowError::Validation(
                    "blood donations require a blood type".into(),
                ));
            }
            if input.organ.is_some() {
                return Err(WorkflowError::Validation(
                    "blood donations must not name an organ".into(),
                ));
            }
        }
        DonationKind::Organ => {
            let organ = input.organ.ok_or_else(|| {
                WorkflowError::Validation("organ donations require an organ".into())
            })?;
            if input.blood_type.is_some() {
                return Err(WorkflowError::Validation(
                    "organ donations must not name a blood type".into(),
                ));
            }
            if !donor.offers_organ(organ) {
                return Err(WorkflowError::Validation(format!(
                    "donor {} does not offer {organ}",
                    donor.display_name()
                )));
            }
        }
    }
    Ok(())
}
