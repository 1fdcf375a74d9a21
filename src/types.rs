use crate::error::PortalError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentType {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub duration_minutes: u32,
    pub bookable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub time: NaiveTime,
    pub available: bool,
    pub staff_id: Option<Uuid>,
}

/// Slots and staff metadata for one (workspace, date, type, duration) query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotDay {
    pub slots: Vec<AvailableSlot>,
    pub staff: Vec<StaffMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotQuery {
    pub workspace_id: Uuid,
    pub date: NaiveDate,
    pub appointment_type_id: Uuid,
    pub duration_minutes: u32,
}

/// Issued by the scheduling service for a successful reserve call. The
/// reservation id is an opaque token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotHold {
    pub reservation_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Client-side mirror of a hold. The scheduling service stays the source of
/// truth for whether it is still valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservedSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reservation_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

lazy_static! {
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9][0-9 \-]{5,17}$").unwrap();
}

#[derive(Debug, Clone, Default, Validate, Serialize, Deserialize)]
pub struct PatientDetails {
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

impl PatientDetails {
    /// Form-level gate before the booking handoff.
    pub fn checked(&self) -> Result<(), PortalError> {
        Ok(self.validate()?)
    }
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_REGEX.is_match(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("phone"))
    }
}
