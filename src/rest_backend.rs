use crate::backend::SchedulingBackend;
use crate::error::PortalError;
use crate::types::{AppointmentType, SlotDay, SlotHold, SlotQuery};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
struct ReserveRequest {
    date: NaiveDate,
    time: NaiveTime,
    appointment_type_id: Uuid,
    duration_minutes: u32,
}

#[derive(Debug, Clone)]
pub struct RestScheduling {
    client: Client,
    base_url: String,
}

impl RestScheduling {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, PortalError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn checked(response: Response) -> Result<Response, PortalError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        error!(%status, message, "Scheduling service returned an error");
        Err(PortalError::Backend {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl SchedulingBackend for RestScheduling {
    async fn appointment_types(
        &self,
        workspace_id: Uuid,
    ) -> Result<Vec<AppointmentType>, PortalError> {
        let response = self
            .client
            .get(format!(
                "{}/workspaces/{workspace_id}/appointment-types",
                self.base_url
            ))
            .send()
            .await?;

        Ok(Self::checked(response).await?.json().await?)
    }

    async fn available_slots(&self, query: &SlotQuery) -> Result<SlotDay, PortalError> {
        let response = self
            .client
            .get(format!(
                "{}/workspaces/{}/slots",
                self.base_url, query.workspace_id
            ))
            .query(&[
                ("date", query.date.to_string()),
                ("appointment_type", query.appointment_type_id.to_string()),
                ("duration", query.duration_minutes.to_string()),
            ])
            .send()
            .await?;

        Ok(Self::checked(response).await?.json().await?)
    }

    async fn reserve_slot(
        &self,
        query: &SlotQuery,
        time: NaiveTime,
    ) -> Result<SlotHold, PortalError> {
        let request = ReserveRequest {
            date: query.date,
            time,
            appointment_type_id: query.appointment_type_id,
            duration_minutes: query.duration_minutes,
        };
        let response = self
            .client
            .post(format!(
                "{}/workspaces/{}/reservations",
                self.base_url, query.workspace_id
            ))
            .json(&request)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            warn!(date = %query.date, %time, "Slot was taken before the hold could be placed");
            return Err(PortalError::SlotUnavailable);
        }
        Ok(Self::checked(response).await?.json().await?)
    }

    async fn release_slot(&self, reservation_id: Uuid) -> Result<(), PortalError> {
        let response = self
            .client
            .delete(format!("{}/reservations/{reservation_id}", self.base_url))
            .send()
            .await?;

        Self::checked(response).await?;
        Ok(())
    }

    async fn reservation_live(&self, reservation_id: Uuid) -> Result<bool, PortalError> {
        let response = self
            .client
            .get(format!("{}/reservations/{reservation_id}", self.base_url))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => Ok(false),
            _ => {
                Self::checked(response).await?;
                Ok(true)
            }
        }
    }
}
