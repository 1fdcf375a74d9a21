use crate::backend::SchedulingBackend;
use crate::configuration::Configuration;
use crate::error::PortalError;
use crate::types::{
    AppointmentType, AvailableSlot, SlotDay, SlotHold, SlotQuery, StaffMember,
};
use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use futures::StreamExt;
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_stream::wrappers::WatchStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;
use uuid::Uuid;

pub struct MockSchedulingInner {
    pub success: AtomicBool,
    pub live: AtomicBool,
    pub hold_ttl_secs: AtomicI64,
    pub calls_to_appointment_types: AtomicU64,
    pub calls_to_available_slots: AtomicU64,
    pub calls_to_reserve_slot: AtomicU64,
    pub calls_to_release_slot: AtomicU64,
    pub calls_to_reservation_live: AtomicU64,
    pub appointment_types: Mutex<Vec<AppointmentType>>,
    pub day: Mutex<SlotDay>,
    pub last_hold: Mutex<Option<SlotHold>>,
    pub released: Mutex<Vec<Uuid>>,
}

#[derive(Clone)]
pub struct MockScheduling(pub Arc<MockSchedulingInner>);

impl MockScheduling {
    pub fn new() -> Self {
        Self(Arc::new(MockSchedulingInner {
            success: AtomicBool::new(true),
            live: AtomicBool::new(true),
            hold_ttl_secs: AtomicI64::new(300),
            calls_to_appointment_types: AtomicU64::default(),
            calls_to_available_slots: AtomicU64::default(),
            calls_to_reserve_slot: AtomicU64::default(),
            calls_to_release_slot: AtomicU64::default(),
            calls_to_reservation_live: AtomicU64::default(),
            appointment_types: Mutex::default(),
            day: Mutex::default(),
            last_hold: Mutex::default(),
            released: Mutex::default(),
        }))
    }

    fn result(&self) -> Result<(), PortalError> {
        match self.0.success.load(Ordering::SeqCst) {
            true => Ok(()),
            false => Err(PortalError::Backend {
                status: 500,
                message: "Supposed to fail".into(),
            }),
        }
    }
}

#[async_trait]
impl SchedulingBackend for MockScheduling {
    async fn appointment_types(
        &self,
        _workspace_id: Uuid,
    ) -> Result<Vec<AppointmentType>, PortalError> {
        self.0
            .calls_to_appointment_types
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(self.0.appointment_types.lock().unwrap().clone())
    }

    async fn available_slots(&self, _query: &SlotQuery) -> Result<SlotDay, PortalError> {
        self.0
            .calls_to_available_slots
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(self.0.day.lock().unwrap().clone())
    }

    async fn reserve_slot(
        &self,
        _query: &SlotQuery,
        _time: NaiveTime,
    ) -> Result<SlotHold, PortalError> {
        self.0.calls_to_reserve_slot.fetch_add(1, Ordering::SeqCst);
        self.result()?;

        let ttl = self.0.hold_ttl_secs.load(Ordering::SeqCst);
        let hold = SlotHold {
            reservation_id: Uuid::new_v4(),
            expires_at: Utc::now() + chrono::Duration::seconds(ttl),
        };
        *self.0.last_hold.lock().unwrap() = Some(hold.clone());
        Ok(hold)
    }

    async fn release_slot(&self, reservation_id: Uuid) -> Result<(), PortalError> {
        self.0.calls_to_release_slot.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        self.0.released.lock().unwrap().push(reservation_id);
        Ok(())
    }

    async fn reservation_live(&self, _reservation_id: Uuid) -> Result<bool, PortalError> {
        self.0
            .calls_to_reservation_live
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(self.0.live.load(Ordering::SeqCst))
    }
}

pub fn example_types() -> Vec<AppointmentType> {
    vec![
        AppointmentType {
            id: Uuid::from_u128(0x11),
            name: String::from("Vaccination"),
            description: String::from("Flu and travel vaccinations"),
            duration_minutes: 15,
            bookable: true,
        },
        AppointmentType {
            id: Uuid::from_u128(0x12),
            name: String::from("Medication Review"),
            description: String::from("Review of the current medication plan"),
            duration_minutes: 30,
            bookable: false,
        },
    ]
}

pub fn example_day() -> SlotDay {
    let staff_anna = Uuid::from_u128(0x21);
    let staff_georg = Uuid::from_u128(0x22);
    SlotDay {
        // Deliberately unsorted, the board sorts on refresh.
        slots: vec![
            AvailableSlot {
                time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
                available: true,
                staff_id: Some(staff_anna),
            },
            AvailableSlot {
                time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                available: true,
                staff_id: Some(staff_georg),
            },
            AvailableSlot {
                time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
                available: true,
                staff_id: None,
            },
            AvailableSlot {
                time: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
                available: false,
                staff_id: Some(staff_anna),
            },
        ],
        staff: vec![
            StaffMember {
                id: staff_anna,
                name: String::from("Anna"),
            },
            StaffMember {
                id: staff_georg,
                name: String::from("Georg"),
            },
        ],
    }
}

pub fn example_query(workspace_id: Uuid) -> SlotQuery {
    SlotQuery {
        workspace_id,
        date: NaiveDate::from_ymd_opt(2026, 9, 14).unwrap(),
        appointment_type_id: example_types()[0].id,
        duration_minutes: 15,
    }
}

pub async fn read_from_stream<T>(stream: &mut WatchStream<T>) -> T
where
    T: Clone + Send + Sync + 'static,
{
    timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("Timed out waiting for a stream value")
        .expect("Stream ended unexpectedly")
}

#[derive(Debug, Clone)]
pub struct FixedConfiguration {
    pub workspace_id: Uuid,
    pub scheduling_url: String,
    pub patient_name: String,
}

impl Default for FixedConfiguration {
    fn default() -> Self {
        Self {
            workspace_id: Uuid::from_u128(0xA),
            scheduling_url: String::from("http://127.0.0.1:0"),
            patient_name: String::from("Maria"),
        }
    }
}

impl Configuration for FixedConfiguration {
    fn scheduling_url(&self) -> String {
        self.scheduling_url.clone()
    }

    fn workspace_id(&self) -> Uuid {
        self.workspace_id
    }

    fn patient_name(&self) -> String {
        self.patient_name.clone()
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(2)
    }
}

#[derive(Debug, Clone)]
struct StubHold {
    time: NaiveTime,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
struct StubState {
    hold_ttl: chrono::Duration,
    appointment_types: Arc<Mutex<Vec<AppointmentType>>>,
    day: Arc<Mutex<SlotDay>>,
    holds: Arc<Mutex<HashMap<Uuid, StubHold>>>,
}

impl StubState {
    fn prune_expired(&self) {
        let now = Utc::now();
        self.holds
            .lock()
            .unwrap()
            .retain(|_, hold| hold.expires_at > now);
    }
}

/// In-process scheduling service with real hold TTLs, the live collaborator
/// for client round-trip tests.
pub struct StubScheduler {
    state: StubState,
    workspace_id: Uuid,
    address: SocketAddr,
    server: JoinHandle<()>,
}

impl StubScheduler {
    pub async fn start(hold_ttl: chrono::Duration) -> Self {
        let state = StubState {
            hold_ttl,
            appointment_types: Arc::new(Mutex::new(example_types())),
            day: Arc::new(Mutex::new(example_day())),
            holds: Arc::new(Mutex::default()),
        };

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        let app = Router::new()
            .route(
                "/workspaces/:workspace_id/appointment-types",
                get(get_appointment_types),
            )
            .route("/workspaces/:workspace_id/slots", get(get_slots))
            .route("/workspaces/:workspace_id/reservations", post(post_reservation))
            .route(
                "/reservations/:reservation_id",
                get(get_reservation).delete(delete_reservation),
            )
            .with_state(state.clone())
            .layer(cors);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            workspace_id: Uuid::new_v4(),
            address,
            server,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.address)
    }

    pub fn workspace_id(&self) -> Uuid {
        self.workspace_id
    }

    pub fn active_holds(&self) -> usize {
        self.state.prune_expired();
        self.state.holds.lock().unwrap().len()
    }
}

impl Drop for StubScheduler {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn get_appointment_types(State(state): State<StubState>) -> Json<Vec<AppointmentType>> {
    Json(state.appointment_types.lock().unwrap().clone())
}

async fn get_slots(State(state): State<StubState>) -> Json<SlotDay> {
    state.prune_expired();
    let mut day = state.day.lock().unwrap().clone();
    let holds = state.holds.lock().unwrap();
    for slot in &mut day.slots {
        if holds.values().any(|hold| hold.time == slot.time) {
            slot.available = false;
        }
    }
    Json(day)
}

#[derive(Debug, Deserialize)]
struct StubReserveRequest {
    date: NaiveDate,
    time: NaiveTime,
    appointment_type_id: Uuid,
    duration_minutes: u32,
}

async fn post_reservation(
    State(state): State<StubState>,
    Json(request): Json<StubReserveRequest>,
) -> Result<Json<SlotHold>, StatusCode> {
    debug!(
        date = %request.date,
        appointment_type = %request.appointment_type_id,
        duration = request.duration_minutes,
        "Stub reservation request"
    );
    state.prune_expired();

    let bookable = state
        .day
        .lock()
        .unwrap()
        .slots
        .iter()
        .any(|slot| slot.time == request.time && slot.available);
    let mut holds = state.holds.lock().unwrap();
    if !bookable || holds.values().any(|hold| hold.time == request.time) {
        return Err(StatusCode::CONFLICT);
    }

    let hold = SlotHold {
        reservation_id: Uuid::new_v4(),
        expires_at: Utc::now() + state.hold_ttl,
    };
    holds.insert(
        hold.reservation_id,
        StubHold {
            time: request.time,
            expires_at: hold.expires_at,
        },
    );
    Ok(Json(hold))
}

async fn get_reservation(
    State(state): State<StubState>,
    Path(reservation_id): Path<Uuid>,
) -> StatusCode {
    state.prune_expired();
    match state.holds.lock().unwrap().contains_key(&reservation_id) {
        true => StatusCode::OK,
        false => StatusCode::NOT_FOUND,
    }
}

async fn delete_reservation(
    State(state): State<StubState>,
    Path(reservation_id): Path<Uuid>,
) -> StatusCode {
    state.prune_expired();
    match state.holds.lock().unwrap().remove(&reservation_id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}
