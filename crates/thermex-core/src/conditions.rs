//! WMO weather interpretation codes as reported by Open-Meteo

pub const UNKNOWN_CONDITION: &str = "Unknown";

/// Map a provider weather code to its display label
pub fn condition_label(code: i64) -> &'static str {
    match code {
        0 => "Clear",
        1 => "Mainly Clear",
        2 => "Partly Cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing Rime Fog",
        51 => "Light Drizzle",
        53 => "Moderate Drizzle",
        55 => "Dense Drizzle",
        61 => "Light Rain",
        63 => "Moderate Rain",
        65 => "Heavy Rain",
        71 => "Light Snow",
        73 => "Moderate Snow",
        75 => "Heavy Snow",
        80 => "Rain Showers",
        81 => "Moderate Showers",
        82 => "Violent Showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm w/ Hail",
        99 => "Thunderstorm w/ Heavy Hail",
        _ => UNKNOWN_CONDITION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(condition_label(0), "Clear");
        assert_eq!(condition_label(61), "Light Rain");
        assert_eq!(condition_label(99), "Thunderstorm w/ Heavy Hail");
    }

    #[test]
    fn test_unmapped_codes_are_unknown() {
        assert_eq!(condition_label(4), UNKNOWN_CONDITION);
        assert_eq!(condition_label(-1), UNKNOWN_CONDITION);
        assert_eq!(condition_label(100), UNKNOWN_CONDITION);
    }
}
