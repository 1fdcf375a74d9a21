use crate::backend::SchedulingBackend;
use crate::configuration::Configuration;
use crate::error::PortalError;
use crate::reservation::{BookingHandoff, ReservationController};
use crate::slot_board::{SlotBoard, SlotBoardView};
use crate::types::{AppointmentType, PatientDetails, ReservedSlot, SlotQuery};
use chrono::{NaiveDate, NaiveTime};
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str =
    "Commands: types | slots <YYYY-MM-DD> <type#> | reserve <HH:MM> | confirm <email> <phone> | release | quit";

pub struct ConsoleHandoff;

impl BookingHandoff for ConsoleHandoff {
    fn proceed(&self, slot: ReservedSlot) {
        println!(
            "Confirmed {} at {}. Continuing to the booking details for reservation {}.",
            slot.date, slot.time, slot.reservation_id
        );
    }
}

/// The interactive booking surface: dispatches user commands onto the slot
/// board and the reservation controller and renders their streams.
pub struct BookingFlow<T: SchedulingBackend, C: Configuration> {
    configuration: C,
    board: SlotBoard<T>,
    controller: ReservationController<T>,
    handoff: ConsoleHandoff,
    appointment_types: Vec<AppointmentType>,
    query: Option<SlotQuery>,
}

impl<T: SchedulingBackend, C: Configuration> BookingFlow<T, C> {
    pub fn new(backend: T, configuration: C) -> Self {
        let board = SlotBoard::new(backend.clone());
        let controller = ReservationController::new(backend, board.clone());
        Self {
            configuration,
            board,
            controller,
            handoff: ConsoleHandoff,
            appointment_types: Vec::new(),
            query: None,
        }
    }

    pub async fn run(&mut self) {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut countdown = self.controller.countdown_stream();
        println!("{HELP}");

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Ok(Some(line)) = line else { break };
                    if !self.handle_command(line.trim()).await {
                        break;
                    }
                }
                Some(remaining) = countdown.next() => {
                    if let Some(seconds) = remaining {
                        println!("Hold expires in {seconds}s");
                    }
                }
            }
        }
    }

    /// Returns false when the flow should end.
    pub async fn handle_command(&mut self, line: &str) -> bool {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("types") => self.show_types().await,
            Some("slots") => self.show_slots(parts.next(), parts.next()).await,
            Some("reserve") => self.reserve(parts.next()).await,
            Some("confirm") => self.confirm(parts.next(), parts.next()).await,
            Some("release") => {
                self.controller.release().await;
                println!("Released");
            }
            Some("quit") => {
                // Teardown releases an active hold instead of letting it
                // run out on the scheduling service.
                self.controller.release().await;
                return false;
            }
            Some(other) => println!("Unknown command: {other}\n{HELP}"),
            None => {}
        }
        true
    }

    async fn show_types(&mut self) {
        match self
            .board
            .appointment_types(self.configuration.workspace_id())
            .await
        {
            Ok(appointment_types) => {
                self.appointment_types = appointment_types;
                for (index, appointment_type) in self.appointment_types.iter().enumerate() {
                    let bookable = if appointment_type.bookable {
                        ""
                    } else {
                        " (currently not bookable)"
                    };
                    println!(
                        "[{index}] {} - {} ({} min){bookable}",
                        appointment_type.name,
                        appointment_type.description,
                        appointment_type.duration_minutes
                    );
                }
            }
            Err(err) => println!("Failed to load appointment types: {err}"),
        }
    }

    async fn show_slots(&mut self, date: Option<&str>, type_index: Option<&str>) {
        let Some(date) = date.and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        else {
            println!("Usage: slots <YYYY-MM-DD> <type#>");
            return;
        };
        let appointment_type = match type_index
            .and_then(|index| index.parse::<usize>().ok())
            .and_then(|index| self.appointment_types.get(index))
        {
            Some(appointment_type) if appointment_type.bookable => appointment_type,
            Some(_) => {
                println!("This appointment type is currently not bookable");
                return;
            }
            None => {
                println!("Unknown appointment type, list them with 'types' first");
                return;
            }
        };

        let query = SlotQuery {
            workspace_id: self.configuration.workspace_id(),
            date,
            appointment_type_id: appointment_type.id,
            duration_minutes: appointment_type.duration_minutes,
        };
        self.query = Some(query.clone());
        self.board.show(query).await;
        self.print_view(&self.board.view());
    }

    async fn reserve(&mut self, time: Option<&str>) {
        let Some(time) = time.and_then(|time| NaiveTime::parse_from_str(time, "%H:%M").ok())
        else {
            println!("Usage: reserve <HH:MM>");
            return;
        };
        let Some(query) = self.query.clone() else {
            println!("Pick a date first with 'slots <YYYY-MM-DD> <type#>'");
            return;
        };

        match self.controller.reserve(&query, time).await {
            Ok(slot) => println!(
                "Reserved {} at {} until {}",
                slot.date, slot.time, slot.expires_at
            ),
            Err(err) => println!("Reservation failed: {err}"),
        }
    }

    async fn confirm(&mut self, email: Option<&str>, phone: Option<&str>) {
        let details = PatientDetails {
            full_name: self.configuration.patient_name(),
            email: email.unwrap_or_default().into(),
            phone: phone.unwrap_or_default().into(),
            note: None,
        };
        match details.checked() {
            Ok(()) => {}
            Err(PortalError::Validation(errors)) => {
                for field in errors.field_errors().keys() {
                    println!("Invalid {field}");
                }
                return;
            }
            Err(err) => {
                println!("{err}");
                return;
            }
        }

        if let Err(err) = self.controller.confirm(&self.handoff).await {
            println!("Confirmation failed: {err}");
        }
    }

    fn print_view(&self, view: &SlotBoardView) {
        if let Some(error) = &view.error {
            println!("Could not load slots: {error} (retry with 'slots ...')");
            return;
        }
        if view.slots.is_empty() {
            println!("No slots available on this day");
            return;
        }
        for slot in &view.slots {
            let staff = slot
                .staff_id
                .and_then(|staff_id| view.staff.iter().find(|staff| staff.id == staff_id))
                .map(|staff| format!(" with {}", staff.name))
                .unwrap_or_default();
            let state = if slot.available { "" } else { " (taken)" };
            println!("{}{staff}{state}", slot.time.format("%H:%M"));
        }
    }
}
