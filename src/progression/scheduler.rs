//! 解锁调度：根据开始时间与当前时间计算固定长度连载已解锁的单元数。
//!
//! 当前时间总是由调用方显式传入，本模块从不读取时钟。

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::progression::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockSchedule {
    series_length: u32,
    unit_duration: Duration,
}

/// 某一时刻的解锁窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockWindow {
    pub started_at: DateTime<Utc>,
    pub unlocked: u32,
    pub series_length: u32,
    pub next_unlock_at: Option<DateTime<Utc>>,
}

impl UnlockWindow {
    pub fn is_complete(&self) -> bool {
        self.unlocked >= self.series_length
    }
}

impl UnlockSchedule {
    pub fn new(series_length: u32, unit_duration: Duration) -> Result<Self, EngineError> {
        if series_length == 0 {
            return Err(EngineError::invalid("series length must be positive"));
        }
        if unit_duration <= Duration::zero() {
            return Err(EngineError::invalid("unit duration must be positive"));
        }
        Ok(Self {
            series_length,
            unit_duration,
        })
    }

    pub fn series_length(&self) -> u32 {
        self.series_length
    }

    pub fn unit_duration(&self) -> Duration {
        self.unit_duration
    }

    /// `floor((now - started_at) / unit) + 1`，夹在 `[1, series_length]`。
    /// 时钟回拨（now 早于 started_at）按 1 处理。
    pub fn unlocked_count(&self, started_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
        let elapsed_ms = (now - started_at).num_milliseconds();
        if elapsed_ms <= 0 {
            return 1;
        }
        let unit_ms = self.unit_duration.num_milliseconds().max(1);
        let elapsed_units = elapsed_ms / unit_ms;
        let unlocked = elapsed_units.saturating_add(1);
        unlocked.clamp(1, i64::from(self.series_length)) as u32
    }

    /// 下一个单元的解锁时刻；全部解锁后为 None
    pub fn next_unlock_at(
        &self,
        started_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let unlocked = self.unlocked_count(started_at, now);
        if unlocked >= self.series_length {
            return None;
        }
        let units = i32::try_from(unlocked).ok()?;
        started_at.checked_add_signed(self.unit_duration * units)
    }

    /// 首次访问（无开始时间）隐式以 now 作为开始时间，返回 1
    pub fn window(&self, started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> UnlockWindow {
        let started_at = started_at.unwrap_or(now);
        UnlockWindow {
            started_at,
            unlocked: self.unlocked_count(started_at, now),
            series_length: self.series_length,
            next_unlock_at: self.next_unlock_at(started_at, now),
        }
    }
}

/// 移动当前查看位置。超出已解锁范围时返回 `Locked`，不做夹取。
pub fn advance_position(target: u32, window: &UnlockWindow) -> Result<u32, EngineError> {
    if target == 0 {
        return Err(EngineError::invalid("position starts at 1"));
    }
    if target > window.unlocked {
        return Err(EngineError::Locked {
            requested: target,
            unlocked: window.unlocked,
            next_unlock_at: window.next_unlock_at,
        });
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    fn devotional() -> UnlockSchedule {
        UnlockSchedule::new(22, Duration::hours(24)).unwrap()
    }

    #[test]
    fn twenty_two_day_devotional_windows() {
        let schedule = devotional();
        assert_eq!(schedule.unlocked_count(t0(), t0()), 1);
        assert_eq!(schedule.unlocked_count(t0(), t0() + Duration::hours(23)), 1);
        assert_eq!(schedule.unlocked_count(t0(), t0() + Duration::hours(24)), 2);
        assert_eq!(schedule.unlocked_count(t0(), t0() + Duration::hours(25)), 2);
        assert_eq!(schedule.unlocked_count(t0(), t0() + Duration::days(1000)), 22);
    }

    #[test]
    fn clock_skew_before_start_yields_one() {
        let schedule = devotional();
        assert_eq!(schedule.unlocked_count(t0(), t0() - Duration::hours(5)), 1);
    }

    #[test]
    fn first_access_starts_now() {
        let window = devotional().window(None, t0());
        assert_eq!(window.started_at, t0());
        assert_eq!(window.unlocked, 1);
        assert_eq!(window.next_unlock_at, Some(t0() + Duration::hours(24)));
    }

    #[test]
    fn next_unlock_is_none_when_complete() {
        let schedule = devotional();
        let now = t0() + Duration::days(40);
        assert!(schedule.next_unlock_at(t0(), now).is_none());
        assert!(schedule.window(Some(t0()), now).is_complete());
    }

    #[test]
    fn next_unlock_tracks_current_unit() {
        let schedule = devotional();
        let now = t0() + Duration::hours(30);
        assert_eq!(
            schedule.next_unlock_at(t0(), now),
            Some(t0() + Duration::hours(48))
        );
    }

    #[test]
    fn invalid_schedules_are_rejected() {
        assert!(UnlockSchedule::new(0, Duration::hours(1)).is_err());
        assert!(UnlockSchedule::new(3, Duration::zero()).is_err());
    }

    #[test]
    fn advancing_past_window_is_locked() {
        let window = devotional().window(Some(t0()), t0() + Duration::hours(25));
        assert_eq!(advance_position(2, &window), Ok(2));
        assert_eq!(advance_position(1, &window), Ok(1));
        match advance_position(3, &window) {
            Err(EngineError::Locked {
                requested,
                unlocked,
                next_unlock_at,
            }) => {
                assert_eq!(requested, 3);
                assert_eq!(unlocked, 2);
                assert_eq!(next_unlock_at, Some(t0() + Duration::hours(48)));
            }
            other => panic!("expected Locked, got {other:?}"),
        }
        assert!(matches!(
            advance_position(0, &window),
            Err(EngineError::InvalidInput(_))
        ));
    }
}
