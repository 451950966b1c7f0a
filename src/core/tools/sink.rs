//! Destinations for confirmed bookings.
//!
//! Persistence is outside this crate. A sink only has to accept the record;
//! the dispatcher does not wait on it or retry it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::ToolError;
use super::appointment::AppointmentData;

/// Request timeout for webhook delivery.
const WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// User agent sent with webhook requests.
const USER_AGENT: &str = concat!("receptionist-live/", env!("CARGO_PKG_VERSION"));

/// Receives completed bookings.
#[async_trait]
pub trait BookingSink: Send + Sync {
    async fn submit(&self, booking: AppointmentData) -> Result<(), ToolError>;
}

/// Records bookings in the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingBookingSink;

#[async_trait]
impl BookingSink for LoggingBookingSink {
    async fn submit(&self, booking: AppointmentData) -> Result<(), ToolError> {
        tracing::info!(
            name = %booking.name,
            age = booking.age,
            visit_type = %booking.visit_type,
            date = %booking.appointment_date,
            time = %booking.appointment_time,
            "Appointment booked"
        );
        Ok(())
    }
}

/// POSTs each booking as JSON to a webhook (a spreadsheet script, a CRM, ...).
#[derive(Debug, Clone)]
pub struct WebhookBookingSink {
    client: Client,
    url: Url,
}

impl WebhookBookingSink {
    pub fn new(url: Url) -> Result<Self, ToolError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ToolError::SinkFailed(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl BookingSink for WebhookBookingSink {
    async fn submit(&self, booking: AppointmentData) -> Result<(), ToolError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&booking)
            .send()
            .await
            .map_err(|e| ToolError::SinkFailed(format!("Webhook request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::SinkFailed(format!(
                "Webhook returned {status}: {body}"
            )));
        }

        tracing::debug!(url = %self.url, "Booking delivered to webhook");
        Ok(())
    }
}

/// Delivers each booking to every inner sink, in order.
///
/// A failing sink does not stop the rest; the first error is returned.
#[derive(Clone, Default)]
pub struct FanoutBookingSink {
    sinks: Vec<Arc<dyn BookingSink>>,
}

impl FanoutBookingSink {
    pub fn new(sinks: Vec<Arc<dyn BookingSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn BookingSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl BookingSink for FanoutBookingSink {
    async fn submit(&self, booking: AppointmentData) -> Result<(), ToolError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.submit(booking.clone()).await {
                tracing::warn!("Booking sink failed: {}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
