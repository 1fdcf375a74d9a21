use crate::backend::SchedulingBackend;
use crate::error::PortalError;
use crate::types::{AppointmentType, AvailableSlot, SlotQuery, StaffMember};
use std::sync::{Arc, Mutex};
use tokio::sync::watch::{self, Sender};
use tokio_stream::wrappers::WatchStream;
use tracing::error;
use uuid::Uuid;

/// What the slot picker renders: the slots of the last query, the staff
/// offering them, and an inline error when the last fetch failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotBoardView {
    pub slots: Vec<AvailableSlot>,
    pub staff: Vec<StaffMember>,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct SlotBoard<T: SchedulingBackend> {
    backend: T,
    query: Arc<Mutex<Option<SlotQuery>>>,
    view: Arc<Mutex<SlotBoardView>>,
    sender: Sender<SlotBoardView>,
}

impl<T: SchedulingBackend> SlotBoard<T> {
    pub fn new(backend: T) -> Self {
        let (sender, _) = watch::channel(SlotBoardView::default());
        Self {
            backend,
            query: Arc::new(Mutex::default()),
            view: Arc::new(Mutex::default()),
            sender,
        }
    }

    pub async fn appointment_types(
        &self,
        workspace_id: Uuid,
    ) -> Result<Vec<AppointmentType>, PortalError> {
        self.backend.appointment_types(workspace_id).await
    }

    pub fn view(&self) -> SlotBoardView {
        self.view.lock().unwrap().clone()
    }

    pub fn view_stream(&self) -> WatchStream<SlotBoardView> {
        let stream = WatchStream::new(self.sender.subscribe());
        self.send_view();
        stream
    }

    pub async fn show(&self, query: SlotQuery) {
        *self.query.lock().unwrap() = Some(query);
        self.refresh().await;
    }

    /// Re-runs the last shown query. Doubles as the manual retry action
    /// after an inline error.
    pub async fn refresh(&self) {
        let query = self.query.lock().unwrap().clone();
        let Some(query) = query else {
            return;
        };

        match self.backend.available_slots(&query).await {
            Ok(mut day) => {
                day.slots.sort_unstable_by(|a, b| a.time.cmp(&b.time));
                let mut view = self.view.lock().unwrap();
                view.slots = day.slots;
                view.staff = day.staff;
                view.error = None;
            }
            Err(err) => {
                error!(?err, date = %query.date, "Failed to load available slots");
                self.view.lock().unwrap().error = Some(err.to_string());
            }
        }
        self.send_view();
    }

    fn send_view(&self) {
        let view = self.view();
        if let Err(err) = self.sender.send(view) {
            error!(?err, "Failed to send current slot view");
        }
    }
}
