//! Resolving a canonical timezone name to a UTC offset.

use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone, timezones};

/// Get the UTC offset that `canonical_timezone` currently observes.
///
/// Returns `None` if `canonical_timezone` is not a valid, canonical timezone
/// name such as "Pacific/Auckland".
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    let timezone = timezones::get_by_name(canonical_timezone)?;
    let offset = timezone.get_offset_utc(&OffsetDateTime::now_utc());

    Some(offset.to_utc())
}

#[cfg(test)]
mod timezone_tests {
    use time::UtcOffset;

    use super::get_local_offset;

    #[test]
    fn utc_resolves_to_zero_offset() {
        let offset = get_local_offset("Etc/UTC");

        assert_eq!(offset, Some(UtcOffset::UTC));
    }

    #[test]
    fn invalid_timezone_resolves_to_none() {
        let offset = get_local_offset("Not/ARealPlace");

        assert_eq!(offset, None);
    }
}
