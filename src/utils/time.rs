use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};

/// First second of 2015, the origin of Discord snowflakes (in milliseconds)
pub const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

/// Smallest snowflake that could have been generated at `instant`.
/// Instants before the Discord epoch map to 0.
pub fn timestamp_to_snowflake(instant: DateTime<Utc>) -> u64 {
    let millis = instant.timestamp_millis() - DISCORD_EPOCH_MS;
    if millis <= 0 {
        0
    } else {
        (millis as u64) << 22
    }
}

pub fn snowflake_to_timestamp(snowflake: u64) -> DateTime<Utc> {
    let millis = (snowflake >> 22) as i64 + DISCORD_EPOCH_MS;
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Parses an ISO-8601 date and time with offset, e.g. `2011-12-03T10:15:30+01:00`.
pub fn parse_date_time(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|_| {
            anyhow::anyhow!(
                "Invalid date \"{}\". Use ISO-8601 date + time + offset, \
                 e.g. 2011-12-03T10:15:30+01:00",
                text
            )
        })
}

/// Discord timestamp markup, rendered in each reader's local time.
pub fn format_discord_timestamp(instant: DateTime<Utc>) -> String {
    format!("<t:{}>", instant.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflakes_round_trip_to_the_millisecond() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let snowflake = timestamp_to_snowflake(instant);
        assert_eq!(snowflake_to_timestamp(snowflake), instant);
        assert_eq!(snowflake_to_timestamp(snowflake + (1 << 22) - 1), instant);
    }

    #[test]
    fn times_before_discord_map_to_zero() {
        assert_eq!(timestamp_to_snowflake(DateTime::<Utc>::UNIX_EPOCH), 0);
    }

    #[test]
    fn parses_dates_with_offsets() {
        let parsed = parse_date_time("2011-12-03T10:15:30+01:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2011, 12, 3, 9, 15, 30).unwrap());
        assert!(parse_date_time("2011-12-03").is_err());
    }

    #[test]
    fn formats_discord_timestamps() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_discord_timestamp(instant), "<t:1704067200>");
    }
}
