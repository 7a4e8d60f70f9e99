//! WMO weather interpretation codes as reported by Open-Meteo.

/// Human description and icon name for a WMO code.
pub fn describe(code: u8) -> (&'static str, &'static str) {
    match code {
        0 => ("Clear sky", "clear"),
        1 => ("Mainly clear", "mostly-clear"),
        2 => ("Partly cloudy", "partly-cloudy"),
        3 => ("Overcast", "overcast"),
        45 | 48 => ("Fog", "fog"),
        51 => ("Light drizzle", "drizzle"),
        53 => ("Moderate drizzle", "drizzle"),
        55 => ("Dense drizzle", "drizzle"),
        56 | 57 => ("Freezing drizzle", "sleet"),
        61 => ("Slight rain", "rain"),
        63 => ("Moderate rain", "rain"),
        65 => ("Heavy rain", "rain"),
        66 | 67 => ("Freezing rain", "sleet"),
        71 => ("Slight snow fall", "snow"),
        73 => ("Moderate snow fall", "snow"),
        75 => ("Heavy snow fall", "snow"),
        77 => ("Snow grains", "snow"),
        80 => ("Slight rain showers", "showers"),
        81 => ("Moderate rain showers", "showers"),
        82 => ("Violent rain showers", "showers"),
        85 | 86 => ("Snow showers", "snow"),
        95 => ("Thunderstorm", "thunderstorm"),
        96 | 99 => ("Thunderstorm with hail", "thunderstorm"),
        _ => ("Unknown", "unknown"),
    }
}

pub fn is_rain(code: u8) -> bool {
    matches!(code, 51..=67 | 80..=82 | 95..=99)
}

pub fn is_snow(code: u8) -> bool {
    matches!(code, 71..=77 | 85 | 86)
}
