use crate::domain::ValidationWarning;

/// Leading-digits integer read of one `H:MM:SS` segment.
///
/// Surrounding whitespace is ignored and anything after the first non-digit is discarded, so
/// `" 3"` -> 3, `"50s"` -> 50, `""`/`"x"` -> 0. Values too large for `i64` saturate.
fn segment_value(segment: Option<&str>) -> i64 {
    let Some(s) = segment else { return 0 };
    s.trim()
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, b| {
            acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
        })
}

/// Convert a textual `H:MM:SS` duration into whole minutes (`hours * 60 + minutes`).
///
/// Seconds are ignored. Missing or malformed segments count as 0; this never fails.
pub fn parse_duration_minutes(raw: &str) -> i64 {
    let mut parts = raw.split(':');
    let hours = segment_value(parts.next());
    let minutes = segment_value(parts.next());
    hours.saturating_mul(60).saturating_add(minutes)
}

/// True when `raw` is two or three colon-separated, all-digit segments (`H:MM` or `H:MM:SS`).
pub fn is_well_formed_duration(raw: &str) -> bool {
    let parts = raw.trim().split(':').collect::<Vec<_>>();
    (2..=3).contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

/// Same value as [`parse_duration_minutes`], plus a warning when the text had to be degraded.
pub fn parse_duration_checked(
    raw: &str,
    line: u64,
    warnings: &mut Vec<ValidationWarning>,
) -> i64 {
    let minutes = parse_duration_minutes(raw);
    if !is_well_formed_duration(raw) {
        warnings.push(
            ValidationWarning::new(
                "DURATION_MALFORMED",
                "Duration is not H:MM:SS; unreadable segments were counted as 0",
            )
            .with_details(format!("line={line}; value={raw:?}; minutes={minutes}")),
        );
    }
    minutes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hours_and_minutes_ignoring_seconds() {
        assert_eq!(parse_duration_minutes("3:50:00"), 230);
        assert_eq!(parse_duration_minutes("0:59:59"), 59);
        assert_eq!(parse_duration_minutes("27:05:00"), 27 * 60 + 5);
    }

    #[test]
    fn malformed_segments_degrade_to_zero() {
        assert_eq!(parse_duration_minutes(""), 0);
        assert_eq!(parse_duration_minutes("abc"), 0);
        assert_eq!(parse_duration_minutes("2"), 120);
        assert_eq!(parse_duration_minutes("x:15:00"), 15);
        assert_eq!(parse_duration_minutes("1:3o:00"), 63);
        assert_eq!(parse_duration_minutes(" 1 : 30 "), 90);
    }

    #[test]
    fn huge_values_saturate_instead_of_overflowing() {
        assert_eq!(parse_duration_minutes("99999999999999999999999:00:00"), i64::MAX);
    }

    #[test]
    fn checked_parse_warns_only_on_degraded_input() {
        let mut warnings = Vec::new();
        assert_eq!(parse_duration_checked("1:00:00", 1, &mut warnings), 60);
        assert_eq!(parse_duration_checked("0:45", 2, &mut warnings), 45);
        assert!(warnings.is_empty());

        assert_eq!(parse_duration_checked("about an hour", 3, &mut warnings), 0);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, "DURATION_MALFORMED");
        assert!(warnings[0].details.as_deref().unwrap().contains("line=3"));
    }
}
