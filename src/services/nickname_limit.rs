//! Nickname rate limiting: a cooldown between consecutive changes and a
//! per-UTC-day quota, advanced as one logical value so the remote and local
//! ledgers stay interchangeable.

use time::OffsetDateTime;

use crate::{dao::models::NicknameLimitEntity, error::ServiceError};

/// UTC calendar bucket (`YYYY-MM-DD`) for a unix-milliseconds instant.
pub fn day_key(now_ms: u64) -> String {
    match OffsetDateTime::from_unix_timestamp((now_ms / 1000) as i64) {
        Ok(when) => format!(
            "{:04}-{:02}-{:02}",
            when.year(),
            when.month() as u8,
            when.day()
        ),
        Err(_) => "1970-01-01".to_owned(),
    }
}

/// Decide whether a nickname change is admissible right now.
///
/// On success returns the advanced limiter state the caller must persist
/// alongside the change. A stale `day_key` resets the daily count before the
/// quota is checked; the cooldown applies across day boundaries.
pub fn check_limit(
    meta: &NicknameLimitEntity,
    now_ms: u64,
    cooldown_ms: u64,
    daily_limit: u32,
) -> Result<NicknameLimitEntity, ServiceError> {
    if meta.last_change_at > 0 {
        let elapsed = now_ms.saturating_sub(meta.last_change_at);
        if elapsed < cooldown_ms {
            let remaining_ms = cooldown_ms - elapsed;
            return Err(ServiceError::NicknameCooldown {
                retry_after_seconds: remaining_ms.div_ceil(1000).max(1),
            });
        }
    }

    let today = day_key(now_ms);
    let used_today = if meta.day_key == today {
        meta.day_count
    } else {
        0
    };

    if used_today >= daily_limit {
        return Err(ServiceError::NicknameDailyLimit { limit: daily_limit });
    }

    Ok(NicknameLimitEntity {
        day_key: today,
        day_count: used_today + 1,
        last_change_at: now_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: u64 = 86_400_000;
    const COOLDOWN: u64 = 30_000;

    #[test]
    fn first_change_is_admitted() {
        let advanced = check_limit(&NicknameLimitEntity::default(), DAY_MS, COOLDOWN, 2).unwrap();
        assert_eq!(advanced.day_count, 1);
        assert_eq!(advanced.last_change_at, DAY_MS);
        assert_eq!(advanced.day_key, "1970-01-02");
    }

    #[test]
    fn cooldown_rejects_with_remaining_seconds() {
        let meta = NicknameLimitEntity {
            day_key: day_key(DAY_MS),
            day_count: 1,
            last_change_at: DAY_MS,
        };
        let err = check_limit(&meta, DAY_MS + 12_000, COOLDOWN, 2).unwrap_err();
        match err {
            ServiceError::NicknameCooldown { retry_after_seconds } => {
                assert_eq!(retry_after_seconds, 18);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn quota_rejects_after_daily_limit() {
        let meta = NicknameLimitEntity {
            day_key: day_key(DAY_MS),
            day_count: 2,
            last_change_at: DAY_MS,
        };
        let err = check_limit(&meta, DAY_MS + COOLDOWN, COOLDOWN, 2).unwrap_err();
        assert!(matches!(err, ServiceError::NicknameDailyLimit { limit: 2 }));
    }

    #[test]
    fn stale_day_key_resets_the_count() {
        let meta = NicknameLimitEntity {
            day_key: day_key(DAY_MS),
            day_count: 2,
            last_change_at: DAY_MS,
        };
        let advanced = check_limit(&meta, DAY_MS * 2, COOLDOWN, 2).unwrap();
        assert_eq!(advanced.day_count, 1);
        assert_eq!(advanced.day_key, "1970-01-03");
    }

    #[test]
    fn cooldown_spans_day_boundaries() {
        let just_before_midnight = DAY_MS * 2 - 1_000;
        let meta = NicknameLimitEntity {
            day_key: day_key(just_before_midnight),
            day_count: 1,
            last_change_at: just_before_midnight,
        };
        let err = check_limit(&meta, DAY_MS * 2, COOLDOWN, 2).unwrap_err();
        assert!(matches!(err, ServiceError::NicknameCooldown { .. }));
    }
}
