//! Conversions between wire messages and domain weather payloads.

use skycast_domain::weather as domain;

use crate::weather as wire;

impl From<domain::CurrentWeather> for wire::CurrentWeather {
    fn from(w: domain::CurrentWeather) -> Self {
        Self {
            temperature: w.temperature,
            humidity: w.humidity,
            description: w.description,
        }
    }
}

impl From<wire::CurrentWeather> for domain::CurrentWeather {
    fn from(w: wire::CurrentWeather) -> Self {
        Self {
            temperature: w.temperature,
            humidity: w.humidity,
            description: w.description,
        }
    }
}

impl From<domain::DailyForecast> for wire::DailyForecast {
    fn from(d: domain::DailyForecast) -> Self {
        Self {
            location: d.location,
            date: d.date,
            max_temp_c: d.max_temp_c,
            min_temp_c: d.min_temp_c,
            avg_temp_c: d.avg_temp_c,
            will_it_rain: d.will_it_rain,
            chance_rain: d.chance_rain,
            will_it_snow: d.will_it_snow,
            chance_snow: d.chance_snow,
            condition: d.condition,
            icon: d.icon,
        }
    }
}

impl From<wire::DailyForecast> for domain::DailyForecast {
    fn from(d: wire::DailyForecast) -> Self {
        Self {
            location: d.location,
            date: d.date,
            max_temp_c: d.max_temp_c,
            min_temp_c: d.min_temp_c,
            avg_temp_c: d.avg_temp_c,
            will_it_rain: d.will_it_rain,
            chance_rain: d.chance_rain,
            will_it_snow: d.will_it_snow,
            chance_snow: d.chance_snow,
            condition: d.condition,
            icon: d.icon,
        }
    }
}

impl From<domain::HourlyForecast> for wire::HourlyForecast {
    fn from(h: domain::HourlyForecast) -> Self {
        Self {
            location: h.location,
            time: h.time,
            temp_c: h.temp_c,
            will_it_rain: h.will_it_rain,
            chance_rain: h.chance_rain,
            will_it_snow: h.will_it_snow,
            chance_snow: h.chance_snow,
            condition: h.condition,
            icon: h.icon,
        }
    }
}

impl From<wire::HourlyForecast> for domain::HourlyForecast {
    fn from(h: wire::HourlyForecast) -> Self {
        Self {
            location: h.location,
            time: h.time,
            temp_c: h.temp_c,
            will_it_rain: h.will_it_rain,
            chance_rain: h.chance_rain,
            will_it_snow: h.will_it_snow,
            chance_snow: h.chance_snow,
            condition: h.condition,
            icon: h.icon,
        }
    }
}
