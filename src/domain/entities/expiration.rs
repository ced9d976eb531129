//! Expiration policies for stored values.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_IN_ONE_DAY: i64 = 24 * 60 * 60;

/// 4001-01-01T00:00:00Z, standing in for "never expires".
const DISTANT_FUTURE_SECS: i64 = 64_092_211_200;

/// 0001-01-01T00:00:00Z, standing in for "already expired".
const DISTANT_PAST_SECS: i64 = -62_135_596_800;

/// Returns the instant used as expiration for values that never expire.
#[must_use]
pub fn distant_future() -> DateTime<Utc> {
    DateTime::from_timestamp(DISTANT_FUTURE_SECS, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Returns the instant used as expiration for values that are already expired.
#[must_use]
pub fn distant_past() -> DateTime<Utc> {
    DateTime::from_timestamp(DISTANT_PAST_SECS, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Expiration strategy for a stored value.
///
/// In configuration files the policy is written as `"never"`, `"expired"`,
/// `{ seconds = 300 }`, `{ days = 7 }` or `{ date = "2030-01-01T00:00:00Z" }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageExpiration {
    /// The value never expires.
    Never,
    /// The value expires the given number of seconds after the reference time.
    Seconds(i64),
    /// The value expires the given number of days after the reference time.
    Days(i64),
    /// The value expires at a fixed instant.
    Date(DateTime<Utc>),
    /// The value is already expired. Storing with this policy is skipped.
    Expired,
}

impl Default for StorageExpiration {
    fn default() -> Self {
        Self::Days(7)
    }
}

impl StorageExpiration {
    /// Computes the instant at which a value stored at `date` expires.
    #[must_use]
    pub fn estimated_expiration_since(&self, date: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Self::Never => distant_future(),
            Self::Seconds(seconds) => offset_by_seconds(date, seconds),
            Self::Days(days) => offset_by_seconds(date, days.saturating_mul(SECONDS_IN_ONE_DAY)),
            Self::Date(date) => date,
            Self::Expired => distant_past(),
        }
    }

    /// Computes the expiration instant of a value stored now.
    #[must_use]
    pub fn estimated_expiration_since_now(&self) -> DateTime<Utc> {
        self.estimated_expiration_since(Utc::now())
    }

    /// Returns true if a value stored at `reference` would already be expired.
    #[must_use]
    pub fn is_expired_at(&self, reference: DateTime<Utc>) -> bool {
        match *self {
            Self::Never => false,
            Self::Seconds(seconds) => seconds <= 0,
            Self::Days(days) => days <= 0,
            Self::Date(date) => date <= reference,
            Self::Expired => true,
        }
    }

    /// Returns true if the remaining lifetime under this policy is not positive.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

fn offset_by_seconds(date: DateTime<Utc>, seconds: i64) -> DateTime<Utc> {
    TimeDelta::try_seconds(seconds)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or_else(|| {
            if seconds >= 0 {
                distant_future()
            } else {
                distant_past()
            }
        })
}

/// How an expiration is extended after a value is accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirationExtending {
    /// Keep the original expiration.
    None,
    /// Extend by the original cache duration, anchored to the access time.
    #[default]
    CacheTime,
    /// Extend by the given policy, anchored to the access time.
    ExpirationTime(StorageExpiration),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    #[test_case(StorageExpiration::Never ; "never")]
    #[test_case(StorageExpiration::Seconds(30) ; "positive seconds")]
    #[test_case(StorageExpiration::Seconds(0) ; "zero seconds")]
    #[test_case(StorageExpiration::Seconds(-5) ; "negative seconds")]
    #[test_case(StorageExpiration::Seconds(i64::MAX) ; "huge seconds")]
    #[test_case(StorageExpiration::Days(7) ; "days")]
    #[test_case(StorageExpiration::Days(0) ; "zero days")]
    #[test_case(StorageExpiration::Date(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()) ; "future date")]
    #[test_case(StorageExpiration::Date(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()) ; "past date")]
    #[test_case(StorageExpiration::Date(reference()) ; "date at reference")]
    #[test_case(StorageExpiration::Expired ; "expired")]
    fn test_is_expired_matches_estimated_expiration(policy: StorageExpiration) {
        let at = reference();
        assert_eq!(
            policy.is_expired_at(at),
            policy.estimated_expiration_since(at) <= at
        );
    }

    #[test]
    fn test_days_are_whole_days() {
        let at = reference();
        let expiration = StorageExpiration::Days(2).estimated_expiration_since(at);
        assert_eq!(expiration - at, TimeDelta::days(2));
    }

    #[test]
    fn test_never_and_expired_bounds() {
        assert!(StorageExpiration::Never.estimated_expiration_since_now() > Utc::now());
        assert!(StorageExpiration::Expired.estimated_expiration_since_now() < Utc::now());
        assert!(StorageExpiration::Expired.is_expired());
        assert!(!StorageExpiration::Never.is_expired());
    }

    #[test]
    fn test_parse_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            a: StorageExpiration,
            b: StorageExpiration,
            c: ExpirationExtending,
        }

        let parsed: Wrapper = toml::from_str(
            r#"
                a = "never"
                b = { days = 3 }
                c = "cache_time"
            "#,
        )
        .expect("valid toml");

        assert_eq!(parsed.a, StorageExpiration::Never);
        assert_eq!(parsed.b, StorageExpiration::Days(3));
        assert_eq!(parsed.c, ExpirationExtending::CacheTime);
    }
}
