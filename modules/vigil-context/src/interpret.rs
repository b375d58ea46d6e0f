//! Human-readable labels for raw environmental readings, used when the
//! context is summarized for the model.

/// Label for an AQI on the 1–5 scale.
pub fn aqi_interpretation(aqi: u8) -> &'static str {
    match aqi {
        1 => "Good",
        2 => "Moderate",
        3 => "Unhealthy for Sensitive Groups",
        4 => "Unhealthy",
        5 => "Hazardous",
        _ => "Unknown",
    }
}

pub fn magnitude_interpretation(magnitude: f64) -> &'static str {
    if magnitude < 3.0 {
        "Minor - usually not felt"
    } else if magnitude < 4.0 {
        "Light - rarely causes damage"
    } else if magnitude < 5.0 {
        "Moderate - can cause localized damage"
    } else if magnitude < 6.0 {
        "Strong - significant damage likely"
    } else if magnitude < 7.0 {
        "Major - widespread damage"
    } else {
        "Great - severe widespread damage"
    }
}

pub fn disaster_type_interpretation(event_type: &str) -> &'static str {
    let t = event_type.to_ascii_lowercase();
    if t.contains("earthquake") {
        "Seismic activity detected"
    } else if t.contains("flood") {
        "Flooding event reported"
    } else if t.contains("storm") || t.contains("cyclone") || t.contains("hurricane") {
        "Severe weather warning"
    } else if t.contains("fire") {
        "Fire or wildfire event"
    } else if t.contains("epidemic") || t.contains("disease") {
        "Disease outbreak detected"
    } else if t.contains("emergency") {
        "Emergency situation"
    } else {
        "Event reported"
    }
}

/// WMO weather interpretation code to a short condition label.
pub fn weather_code_conditions(code: u16) -> &'static str {
    match code {
        0 => "clear",
        1 => "mainly clear",
        2 => "partly cloudy",
        3 => "overcast",
        45 | 48 => "foggy",
        51 => "light drizzle",
        53 => "moderate drizzle",
        55 => "dense drizzle",
        61 => "slight rain",
        63 => "moderate rain",
        65 => "heavy rain",
        71 => "slight snow",
        73 => "moderate snow",
        75 => "heavy snow",
        77 => "snow grains",
        80 => "slight rain showers",
        81 => "moderate rain showers",
        82 => "violent rain showers",
        85 => "slight snow showers",
        86 => "heavy snow showers",
        95 => "thunderstorm",
        96 => "thunderstorm with hail",
        99 => "thunderstorm with large hail",
        _ => "unknown",
    }
}
