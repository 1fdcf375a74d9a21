use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("request to the scheduling service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("scheduling service rejected the request ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("slot is no longer available")]
    SlotUnavailable,

    #[error("no active reservation")]
    NoReservation,

    #[error("reservation hold expired")]
    HoldExpired,

    #[error("invalid booking details: {0}")]
    Validation(#[from] validator::ValidationErrors),
}
