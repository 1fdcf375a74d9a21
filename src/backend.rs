use crate::error::PortalError;
use crate::types::{AppointmentType, SlotDay, SlotHold, SlotQuery};
use async_trait::async_trait;
use chrono::NaiveTime;
use uuid::Uuid;

/// The REST boundary to the external scheduling service. Slot ownership,
/// concurrency-safe reservation and hold expiry all live on the other side
/// of this trait; the client only mirrors what it is told.
#[async_trait]
pub trait SchedulingBackend: Clone + Send + Sync + 'static {
    async fn appointment_types(
        &self,
        workspace_id: Uuid,
    ) -> Result<Vec<AppointmentType>, PortalError>;
    async fn available_slots(&self, query: &SlotQuery) -> Result<SlotDay, PortalError>;
    async fn reserve_slot(
        &self,
        query: &SlotQuery,
        time: NaiveTime,
    ) -> Result<SlotHold, PortalError>;
    async fn release_slot(&self, reservation_id: Uuid) -> Result<(), PortalError>;
    /// Whether the scheduling service still honors the hold.
    async fn reservation_live(&self, reservation_id: Uuid) -> Result<bool, PortalError>;
}
