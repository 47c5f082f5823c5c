// ABOUTME: Duration parsing and formatting for podcast episode lengths.
// ABOUTME: Reads seconds, HH:MM:SS, MM:SS, or "1h30m" and renders itunes:duration as HH:MM:SS.

/// Reads a manifest duration as whole seconds.
///
/// Accepts bare seconds (`"1234"`), clock notation (`"20:34"`, `"00:20:34"`),
/// and unit strings handled by `parse_duration` (`"1h30m"`, `"45m"`).
/// Anything that does not fit in a `u32` is treated as unknown.
pub fn parse_duration_seconds(s: &str) -> Option<u32> {
    let s = s.trim();
    let total = if s.is_empty() {
        return None;
    } else if s.contains(':') {
        clock_seconds(s)?
    } else if let Ok(secs) = s.parse::<u64>() {
        secs
    } else {
        parse_duration::parse(s).ok()?.as_secs()
    };
    u32::try_from(total).ok()
}

/// `MM:SS` or `HH:MM:SS`; each field shifts the running total by one base-60 place.
fn clock_seconds(s: &str) -> Option<u64> {
    let fields: Vec<&str> = s.split(':').collect();
    if !(2..=3).contains(&fields.len()) {
        return None;
    }
    fields.iter().try_fold(0u64, |total, field| {
        let value: u64 = field.trim().parse().ok()?;
        total.checked_mul(60)?.checked_add(value)
    })
}

/// Formats seconds as `HH:MM:SS` for `itunes:duration`.
/// Hours are zero-padded to two digits but not capped.
pub fn format_itunes_duration(total_seconds: u32) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_integer() {
        assert_eq!(parse_duration_seconds("123"), Some(123));
        assert_eq!(parse_duration_seconds("0"), Some(0));
    }

    #[test]
    fn test_hhmmss() {
        assert_eq!(parse_duration_seconds("01:02:03"), Some(3723));
        assert_eq!(parse_duration_seconds("0:0:0"), Some(0));
    }

    #[test]
    fn test_mmss() {
        assert_eq!(parse_duration_seconds("05:30"), Some(330));
        assert_eq!(parse_duration_seconds("0:30"), Some(30));
    }

    #[test]
    fn test_go_duration() {
        assert_eq!(parse_duration_seconds("1h30m"), Some(5400));
        assert_eq!(parse_duration_seconds("45m"), Some(2700));
    }

    #[test]
    fn test_overflow_is_unknown() {
        assert!(parse_duration_seconds("99999999999").is_none());
        assert!(parse_duration_seconds("9999999:00:00").is_none());
    }

    #[test]
    fn test_invalid_returns_none() {
        assert!(parse_duration_seconds("").is_none());
        assert!(parse_duration_seconds("1:2:3:4").is_none());
        assert!(parse_duration_seconds("12:").is_none());
        assert!(parse_duration_seconds("not a duration").is_none());
    }

    #[test]
    fn test_format_itunes_duration() {
        assert_eq!(format_itunes_duration(0), "00:00:00");
        assert_eq!(format_itunes_duration(59), "00:00:59");
        assert_eq!(format_itunes_duration(3723), "01:02:03");
        assert_eq!(format_itunes_duration(100 * 3600 + 5), "100:00:05");
    }

    #[test]
    fn test_format_then_parse_is_stable() {
        let text = format_itunes_duration(1234);
        assert_eq!(text, "00:20:34");
        assert_eq!(parse_duration_seconds(&text), Some(1234));
    }
}
