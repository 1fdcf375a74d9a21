use crate::backend::SchedulingBackend;
use crate::countdown::{remaining_seconds, Countdown};
use crate::error::PortalError;
use crate::slot_board::SlotBoard;
use crate::types::{ReservedSlot, SlotQuery};
use chrono::{NaiveTime, Utc};
use std::sync::{Arc, Mutex};
use tokio::sync::watch::{self, Receiver, Sender};
use tokio_stream::wrappers::WatchStream;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Receives a confirmed hold to carry into the booking-details step. The
/// actual booking is finalized there, outside this crate.
#[cfg_attr(test, mockall::automock)]
pub trait BookingHandoff: Send + Sync + 'static {
    fn proceed(&self, slot: ReservedSlot);
}

struct ActiveHold {
    slot: ReservedSlot,
    countdown: Countdown,
}

/// Owns the single client-side hold: {no reservation} -> reserve ->
/// {reserved, ticking} -> confirm | release | timeout -> {no reservation}.
/// Every exit path drops the countdown, and successful transitions refresh
/// the slot board so the UI reflects updated availability.
#[derive(Clone)]
pub struct ReservationController<T: SchedulingBackend> {
    backend: T,
    board: SlotBoard<T>,
    hold: Arc<Mutex<Option<ActiveHold>>>,
    remaining: Sender<Option<i64>>,
    remaining_rx: Receiver<Option<i64>>,
}

impl<T: SchedulingBackend> ReservationController<T> {
    pub fn new(backend: T, board: SlotBoard<T>) -> Self {
        let (remaining, remaining_rx) = watch::channel(None);
        Self {
            backend,
            board,
            hold: Arc::new(Mutex::default()),
            remaining,
            remaining_rx,
        }
    }

    pub fn reserved(&self) -> Option<ReservedSlot> {
        self.hold
            .lock()
            .unwrap()
            .as_ref()
            .map(|active| active.slot.clone())
    }

    /// Remaining hold seconds, `None` while no hold is active.
    pub fn countdown_stream(&self) -> WatchStream<Option<i64>> {
        WatchStream::new(self.remaining_rx.clone())
    }

    /// Places a hold on the given slot. An already active hold is released
    /// first: picking a new slot replaces the previous selection.
    pub async fn reserve(
        &self,
        query: &SlotQuery,
        time: NaiveTime,
    ) -> Result<ReservedSlot, PortalError> {
        if let Some(previous) = self.take_hold() {
            info!(reservation_id = %previous.reservation_id, "Replacing the active hold");
            self.release_remote(previous.reservation_id).await;
        }

        let hold = self.backend.reserve_slot(query, time).await?;
        let slot = ReservedSlot {
            date: query.date,
            time,
            reservation_id: hold.reservation_id,
            expires_at: hold.expires_at,
        };

        {
            // The hold is in place before the first tick can observe it.
            let mut guard = self.hold.lock().unwrap();
            let countdown = {
                let controller = self.clone();
                let reservation_id = slot.reservation_id;
                Countdown::start(slot.expires_at, self.remaining.clone(), move || async move {
                    controller.expire(reservation_id).await;
                })
            };
            *guard = Some(ActiveHold {
                slot: slot.clone(),
                countdown,
            });
        }

        info!(
            reservation_id = %slot.reservation_id,
            date = %slot.date,
            time = %slot.time,
            expires_at = %slot.expires_at,
            "Slot reserved"
        );
        self.board.refresh().await;
        Ok(slot)
    }

    /// Cancels the active hold. Without one this is a no-op.
    pub async fn release(&self) {
        let Some(slot) = self.take_hold() else {
            return;
        };

        self.release_remote(slot.reservation_id).await;
        info!(reservation_id = %slot.reservation_id, "Hold released");
        self.board.refresh().await;
    }

    /// Hands the held slot to the booking-details step. The hold is
    /// revalidated against the scheduling service first: a hold the service
    /// has already expired is treated as gone, never handed off.
    pub async fn confirm(&self, handoff: &dyn BookingHandoff) -> Result<ReservedSlot, PortalError> {
        let slot = self.reserved().ok_or(PortalError::NoReservation)?;

        if remaining_seconds(slot.expires_at, Utc::now()) == 0 {
            self.clear_and_refresh().await;
            return Err(PortalError::HoldExpired);
        }
        if !self.backend.reservation_live(slot.reservation_id).await? {
            warn!(
                reservation_id = %slot.reservation_id,
                "Hold expired on the scheduling service before confirmation"
            );
            self.clear_and_refresh().await;
            return Err(PortalError::HoldExpired);
        }

        let Some(slot) = self.take_hold() else {
            return Err(PortalError::NoReservation);
        };
        info!(reservation_id = %slot.reservation_id, "Hold confirmed, handing off to booking details");
        handoff.proceed(slot.clone());
        Ok(slot)
    }

    /// Timeout transition, invoked from inside the countdown task.
    async fn expire(&self, reservation_id: Uuid) {
        let active = {
            let mut hold = self.hold.lock().unwrap();
            let expiring =
                matches!(&*hold, Some(active) if active.slot.reservation_id == reservation_id);
            if expiring {
                hold.take()
            } else {
                // A user action won the race against the timer.
                None
            }
        };
        let Some(active) = active else {
            return;
        };

        active.countdown.disarm();
        self.send_remaining(None);
        info!(%reservation_id, "Hold expired, refreshing available slots");
        self.board.refresh().await;
    }

    async fn clear_and_refresh(&self) {
        if self.take_hold().is_some() {
            self.board.refresh().await;
        }
    }

    fn take_hold(&self) -> Option<ReservedSlot> {
        let active = self.hold.lock().unwrap().take()?;
        self.send_remaining(None);
        Some(active.slot)
    }

    async fn release_remote(&self, reservation_id: Uuid) {
        // Best effort: the service enforces expiry on its own, and the local
        // mirror is already gone.
        if let Err(err) = self.backend.release_slot(reservation_id).await {
            warn!(?err, %reservation_id, "Failed to release the hold on the scheduling service");
        }
    }

    fn send_remaining(&self, value: Option<i64>) {
        if let Err(err) = self.remaining.send(value) {
            error!(?err, "Failed to send countdown value");
        }
    }
}
