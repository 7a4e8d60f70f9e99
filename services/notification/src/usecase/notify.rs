use std::sync::Arc;

use skycast_domain::messages::{UserSubscribedMessage, WeatherUpdatedMessage};
use skycast_messaging::BusMessage;
use skycast_messaging::consumer::{HandlerError, MessageHandler};
use tracing::info;

use crate::domain::ports::{Mailer, WeatherPort};
use crate::render::{confirmation_email, weather_update_email};

/// Sends the confirmation link of a new subscription. Runs behind the
/// idempotent consumer, so each `message_id` reaches the mailer once.
pub struct ConfirmationEmailHandler {
    mailer: Arc<dyn Mailer>,
}

impl ConfirmationEmailHandler {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }
}

#[async_trait::async_trait]
impl MessageHandler for ConfirmationEmailHandler {
    async fn handle(&self, message: &BusMessage) -> Result<(), HandlerError> {
        let body: UserSubscribedMessage = message.decode()?;
        self.mailer.send(confirmation_email(&body)?).await?;
        info!(message_id = %body.message_id, city = %body.city, "confirmation email sent");
        Ok(())
    }
}

/// Looks up the forecast matching the subscriber's frequency and mails it.
pub struct WeatherUpdateHandler {
    weather: Arc<dyn WeatherPort>,
    mailer: Arc<dyn Mailer>,
}

impl WeatherUpdateHandler {
    pub fn new(weather: Arc<dyn WeatherPort>, mailer: Arc<dyn Mailer>) -> Self {
        Self { weather, mailer }
    }
}

#[async_trait::async_trait]
impl MessageHandler for WeatherUpdateHandler {
    async fn handle(&self, message: &BusMessage) -> Result<(), HandlerError> {
        let body: WeatherUpdatedMessage = message.decode()?;
        let forecast = self.weather.forecast(&body.city, body.frequency).await?;
        self.mailer
            .send(weather_update_email(&body, &forecast)?)
            .await?;
        info!(city = %body.city, frequency = %body.frequency, "weather update sent");
        Ok(())
    }
}
