//! Email bodies.
//!
//! Every email has a plain-text and an HTML alternative rendered from the
//! templates under `templates/`. HTML templates escape interpolated values.

use anyhow::Context;
use askama::Template;
use skycast_domain::messages::{UserSubscribedMessage, WeatherUpdatedMessage};
use skycast_domain::subscription::Frequency;
use skycast_domain::weather::{DailyForecast, Forecast, HourlyForecast};

use crate::domain::ports::Email;
use crate::error::NotificationServiceError;

#[derive(Template)]
#[template(path = "confirmation.txt")]
struct ConfirmationText<'a> {
    frequency: Frequency,
    city: &'a str,
    url: &'a str,
}

#[derive(Template)]
#[template(path = "confirmation.html")]
struct ConfirmationHtml<'a> {
    subject: &'a str,
    frequency: Frequency,
    city: &'a str,
    url: &'a str,
}

#[derive(Template)]
#[template(path = "weather_update.txt")]
struct WeatherUpdateText<'a> {
    lines: Vec<String>,
    unsubscribe_url: &'a str,
}

#[derive(Template)]
#[template(path = "weather_update.html")]
struct WeatherUpdateHtml<'a> {
    subject: &'a str,
    lines: Vec<String>,
    unsubscribe_url: &'a str,
}

pub fn confirmation_email(
    message: &UserSubscribedMessage,
) -> Result<Email, NotificationServiceError> {
    let subject = format!("Confirm your weather updates for {}", message.city);
    let text = ConfirmationText {
        frequency: message.frequency,
        city: &message.city,
        url: &message.url,
    }
    .render()
    .context("render confirmation text")?;
    let html = ConfirmationHtml {
        subject: &subject,
        frequency: message.frequency,
        city: &message.city,
        url: &message.url,
    }
    .render()
    .context("render confirmation html")?;

    Ok(Email {
        to: message.email.clone(),
        subject,
        text,
        html,
    })
}

pub fn weather_update_email(
    message: &WeatherUpdatedMessage,
    forecast: &Forecast,
) -> Result<Email, NotificationServiceError> {
    let subject = format!("{} weather for {}", title(forecast), message.city);
    let lines = forecast_lines(forecast);

    let text = WeatherUpdateText {
        lines: lines.clone(),
        unsubscribe_url: &message.unsubscribe_url,
    }
    .render()
    .context("render weather update text")?;
    let html = WeatherUpdateHtml {
        subject: &subject,
        lines,
        unsubscribe_url: &message.unsubscribe_url,
    }
    .render()
    .context("render weather update html")?;

    Ok(Email {
        to: message.email.clone(),
        subject,
        text,
        html,
    })
}

fn title(forecast: &Forecast) -> &'static str {
    match forecast {
        Forecast::Daily(_) => "Today's",
        Forecast::Hourly(_) => "Next hour's",
    }
}

fn forecast_lines(forecast: &Forecast) -> Vec<String> {
    match forecast {
        Forecast::Daily(daily) => daily_lines(daily),
        Forecast::Hourly(hourly) => hourly_lines(hourly),
    }
}

fn daily_lines(d: &DailyForecast) -> Vec<String> {
    vec![
        format!("{} on {}: {}", d.location, d.date, d.condition),
        format!(
            "Temperature: {:.1}°C to {:.1}°C, average {:.1}°C",
            d.min_temp_c, d.max_temp_c, d.avg_temp_c
        ),
        precipitation(d.will_it_rain, d.chance_rain, d.will_it_snow, d.chance_snow),
    ]
}

fn hourly_lines(h: &HourlyForecast) -> Vec<String> {
    vec![
        format!("{} at {}: {}", h.location, h.time, h.condition),
        format!("Temperature: {:.1}°C", h.temp_c),
        precipitation(h.will_it_rain, h.chance_rain, h.will_it_snow, h.chance_snow),
    ]
}

fn precipitation(rain: bool, chance_rain: i32, snow: bool, chance_snow: i32) -> String {
    match (rain, snow) {
        (false, false) => format!("No precipitation expected (rain {chance_rain}%, snow {chance_snow}%)"),
        (true, false) => format!("Rain expected ({chance_rain}%)"),
        (false, true) => format!("Snow expected ({chance_snow}%)"),
        (true, true) => format!("Rain ({chance_rain}%) and snow ({chance_snow}%) expected"),
    }
}
