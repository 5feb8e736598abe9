//! Expiry window checks for query-mode links.

use std::time::{SystemTime, UNIX_EPOCH};

/// Result of checking an `expire` value against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryCheck {
    /// Timestamp is now or in the future.
    Valid,
    /// Timestamp is in the past.
    Stale { expire: i64 },
    /// Not a base-10 signed 64-bit integer.
    Malformed,
}

/// Compare a raw `expire` value to `now` (Unix seconds).
pub fn check(raw: &str, now: i64) -> ExpiryCheck {
    match raw.parse::<i64>() {
        Ok(expire) if expire < now => ExpiryCheck::Stale { expire },
        Ok(_) => ExpiryCheck::Valid,
        Err(_) => ExpiryCheck::Malformed,
    }
}

/// Current wall-clock time as Unix seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        assert_eq!(check("100", 100), ExpiryCheck::Valid);
        assert_eq!(check("101", 100), ExpiryCheck::Valid);
        assert_eq!(check("99", 100), ExpiryCheck::Stale { expire: 99 });
        assert_eq!(check("-5", 100), ExpiryCheck::Stale { expire: -5 });
        assert_eq!(check("+200", 100), ExpiryCheck::Valid);
    }

    #[test]
    fn malformed_values() {
        assert_eq!(check("foo", 0), ExpiryCheck::Malformed);
        assert_eq!(check("", 0), ExpiryCheck::Malformed);
        assert_eq!(check("1.5", 0), ExpiryCheck::Malformed);
        assert_eq!(check("99999999999999999999", 0), ExpiryCheck::Malformed);
    }

    #[test]
    fn clock_is_after_2020() {
        assert!(unix_now() > 1_577_836_800);
    }
}
