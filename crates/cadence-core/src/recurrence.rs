use chrono::{DateTime, Datelike, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CoreError;
use crate::models::RepeatUnit;

/// A fixed cadence: every `every` days, weeks or months.
///
/// Dates are stepped naively in UTC. Month steps roll day-of-month
/// overflow into the following month (Jan 31 + 1 month = Mar 3, or Mar 2 in
/// a leap year).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub every: u32,
    pub unit: RepeatUnit,
}

impl RecurrenceRule {
    pub fn new(every: u32, unit: RepeatUnit) -> Result<Self, CoreError> {
        if every == 0 {
            return Err(CoreError::InvalidRecurrenceRule(
                "repeat_every must be > 0".to_string(),
            ));
        }
        Ok(Self { every, unit })
    }

    /// Parses the raw column pair stored on a task.
    pub fn parse(every: i64, unit: &str) -> Result<Self, CoreError> {
        let unit = RepeatUnit::from_str(unit)
            .map_err(|e| CoreError::InvalidRecurrenceRule(e.to_string()))?;
        let every = u32::try_from(every).map_err(|_| {
            CoreError::InvalidRecurrenceRule(format!("repeat_every out of range: {}", every))
        })?;
        Self::new(every, unit)
    }

    /// Validates caller input where both halves of the rule are optional.
    ///
    /// Neither set means "no rule"; exactly one set is a validation error.
    pub fn from_input(every: Option<i64>, unit: Option<&str>) -> Result<Option<Self>, CoreError> {
        match (every, unit) {
            (None, None) => Ok(None),
            (Some(every), Some(_)) if every <= 0 => Err(CoreError::Validation(
                "repeat_every must be > 0".to_string(),
            )),
            (Some(every), Some(unit)) => Self::parse(every, unit).map(Some),
            _ => Err(CoreError::Validation(
                "repeat_every and repeat_unit must be set together".to_string(),
            )),
        }
    }

    /// Advances `from` by one step. `None` only when the result would fall
    /// outside chrono's representable range.
    #[inline]
    pub fn step(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.unit {
            RepeatUnit::Day => from.checked_add_signed(Duration::days(i64::from(self.every))),
            RepeatUnit::Week => from.checked_add_signed(Duration::days(7 * i64::from(self.every))),
            RepeatUnit::Month => {
                let day_offset = Duration::days(i64::from(from.day0()));
                from.checked_sub_signed(day_offset)?
                    .checked_add_months(Months::new(self.every))?
                    .checked_add_signed(day_offset)
            }
        }
    }

    /// Iterates due dates starting at `first` (inclusive) up to `horizon`
    /// (inclusive).
    pub fn schedule(&self, first: DateTime<Utc>, horizon: DateTime<Utc>) -> Schedule {
        Schedule {
            rule: *self,
            next: Some(first),
            horizon,
        }
    }

    /// First date of the series anchored at `anchor` that falls strictly
    /// after `after`. Returns `anchor` when `after` precedes it.
    pub fn first_after(&self, anchor: DateTime<Utc>, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut current = anchor;
        while current <= after {
            current = self.step(current)?;
        }
        Some(current)
    }

    /// Column values for persistence.
    pub fn to_columns(&self) -> (i64, String) {
        (i64::from(self.every), self.unit.to_string())
    }
}

impl std::fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.every == 1 {
            write!(f, "every {}", self.unit)
        } else {
            write!(f, "every {} {}s", self.every, self.unit)
        }
    }
}

/// Bounded iterator over the due dates of a rule.
#[derive(Debug, Clone)]
pub struct Schedule {
    rule: RecurrenceRule,
    next: Option<DateTime<Utc>>,
    horizon: DateTime<Utc>,
}

impl Iterator for Schedule {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        if current > self.horizon {
            self.next = None;
            return None;
        }
        self.next = self.rule.step(current);
        Some(current)
    }
}

// ============================================================================
// MaterializationManager
// ============================================================================

/// Configuration for lazy occurrence generation and the read windows built
/// on top of it.
#[derive(Debug, Clone)]
pub struct MaterializationConfig {
    /// Default horizon, in days past now, for task reads and edits
    pub lookahead_days: u32,
    /// Default occurrence listing window, days before now
    pub occurrence_lookback_days: u32,
    /// Default occurrence listing window, days after now
    pub occurrence_lookahead_days: u32,
    /// Default agenda window, days before now
    pub agenda_lookback_days: u32,
    /// Default agenda window, days after now
    pub agenda_lookahead_days: u32,
    /// Largest agenda window a caller may request
    pub agenda_max_span_days: u32,
    /// Deadline applied by front ends around each operation
    pub operation_timeout: std::time::Duration,
}

impl Default for MaterializationConfig {
    fn default() -> Self {
        Self {
            lookahead_days: 60,
            occurrence_lookback_days: 30,
            occurrence_lookahead_days: 60,
            agenda_lookback_days: 1,
            agenda_lookahead_days: 7,
            agenda_max_span_days: 180,
            operation_timeout: std::time::Duration::from_secs(10),
        }
    }
}

/// Computes generation horizons and read windows from configuration.
#[derive(Debug, Clone)]
pub struct MaterializationManager {
    config: MaterializationConfig,
}

impl MaterializationManager {
    pub fn new(config: MaterializationConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(MaterializationConfig::default())
    }

    /// Horizon used when a task is created, edited or read.
    #[inline]
    pub fn default_horizon(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(i64::from(self.config.lookahead_days))
    }

    /// Fills in the default occurrence listing window. No validation: an
    /// inverted range simply lists nothing.
    pub fn occurrence_window(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = from.unwrap_or_else(|| {
            now - Duration::days(i64::from(self.config.occurrence_lookback_days))
        });
        let to = to.unwrap_or_else(|| {
            now + Duration::days(i64::from(self.config.occurrence_lookahead_days))
        });
        (from, to)
    }

    /// Fills in and validates the agenda window.
    ///
    /// `to` must be strictly after `from` and the span may not exceed
    /// `agenda_max_span_days`.
    pub fn agenda_window(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), CoreError> {
        let from = from
            .unwrap_or_else(|| now - Duration::days(i64::from(self.config.agenda_lookback_days)));
        let to = to
            .unwrap_or_else(|| now + Duration::days(i64::from(self.config.agenda_lookahead_days)));

        if to <= from {
            return Err(CoreError::Validation("to must be after from".to_string()));
        }
        let max_span = Duration::days(i64::from(self.config.agenda_max_span_days));
        if to - from > max_span {
            return Err(CoreError::Validation(format!(
                "time window too large (max {} days)",
                self.config.agenda_max_span_days
            )));
        }
        Ok((from, to))
    }

    pub fn config(&self) -> &MaterializationConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
    }

    mod recurrence_rule_tests {
        use super::*;

        #[rstest]
        #[case(RepeatUnit::Day, 1, utc(2025, 3, 1), utc(2025, 3, 2))]
        #[case(RepeatUnit::Day, 3, utc(2025, 2, 27), utc(2025, 3, 2))]
        #[case(RepeatUnit::Week, 1, utc(2025, 3, 1), utc(2025, 3, 8))]
        #[case(RepeatUnit::Week, 2, utc(2025, 12, 25), utc(2026, 1, 8))]
        #[case(RepeatUnit::Month, 1, utc(2025, 1, 15), utc(2025, 2, 15))]
        #[case(RepeatUnit::Month, 2, utc(2025, 11, 15), utc(2026, 1, 15))]
        #[case(RepeatUnit::Month, 1, utc(2025, 1, 31), utc(2025, 3, 3))]
        #[case(RepeatUnit::Month, 1, utc(2024, 1, 31), utc(2024, 3, 2))]
        #[case(RepeatUnit::Month, 1, utc(2025, 3, 31), utc(2025, 5, 1))]
        #[case(RepeatUnit::Month, 12, utc(2024, 2, 29), utc(2025, 3, 1))]
        fn test_step(
            #[case] unit: RepeatUnit,
            #[case] every: u32,
            #[case] from: DateTime<Utc>,
            #[case] expected: DateTime<Utc>,
        ) {
            let rule = RecurrenceRule::new(every, unit).unwrap();
            assert_eq!(rule.step(from), Some(expected));
        }

        #[test]
        fn test_step_keeps_time_of_day() {
            let rule = RecurrenceRule::new(1, RepeatUnit::Month).unwrap();
            let from = Utc.with_ymd_and_hms(2025, 5, 10, 23, 59, 58).unwrap();
            assert_eq!(
                rule.step(from),
                Some(Utc.with_ymd_and_hms(2025, 6, 10, 23, 59, 58).unwrap())
            );
        }

        #[test]
        fn test_zero_every_rejected() {
            assert!(matches!(
                RecurrenceRule::new(0, RepeatUnit::Day),
                Err(CoreError::InvalidRecurrenceRule(_))
            ));
        }

        #[rstest]
        #[case(1, "days", RepeatUnit::Day)]
        #[case(4, "week", RepeatUnit::Week)]
        #[case(6, "months", RepeatUnit::Month)]
        fn test_parse_columns(#[case] every: i64, #[case] unit: &str, #[case] expected: RepeatUnit) {
            let rule = RecurrenceRule::parse(every, unit).unwrap();
            assert_eq!(rule.every as i64, every);
            assert_eq!(rule.unit, expected);
        }

        #[rstest]
        #[case(1, "year")]
        #[case(0, "day")]
        #[case(-2, "week")]
        #[case(i64::MAX, "day")]
        fn test_parse_columns_rejects_bad_values(#[case] every: i64, #[case] unit: &str) {
            assert!(matches!(
                RecurrenceRule::parse(every, unit),
                Err(CoreError::InvalidRecurrenceRule(_))
            ));
        }

        #[test]
        fn test_from_input() {
            assert_eq!(RecurrenceRule::from_input(None, None).unwrap(), None);
            assert_eq!(
                RecurrenceRule::from_input(Some(2), Some("weeks")).unwrap(),
                Some(RecurrenceRule { every: 2, unit: RepeatUnit::Week })
            );
            assert!(matches!(
                RecurrenceRule::from_input(Some(2), None),
                Err(CoreError::Validation(_))
            ));
            assert!(matches!(
                RecurrenceRule::from_input(None, Some("day")),
                Err(CoreError::Validation(_))
            ));
            assert!(matches!(
                RecurrenceRule::from_input(Some(0), Some("day")),
                Err(CoreError::Validation(_))
            ));
            assert!(matches!(
                RecurrenceRule::from_input(Some(1), Some("hourly")),
                Err(CoreError::InvalidRecurrenceRule(_))
            ));
        }

        #[test]
        fn test_display() {
            assert_eq!(RecurrenceRule::new(1, RepeatUnit::Day).unwrap().to_string(), "every day");
            assert_eq!(RecurrenceRule::new(3, RepeatUnit::Week).unwrap().to_string(), "every 3 weeks");
        }
    }

    mod schedule_tests {
        use super::*;

        #[test]
        fn test_daily_inclusive_both_ends() {
            let rule = RecurrenceRule::new(1, RepeatUnit::Day).unwrap();
            let dates: Vec<_> = rule.schedule(utc(2025, 1, 1), utc(2025, 1, 3)).collect();
            assert_eq!(dates, vec![utc(2025, 1, 1), utc(2025, 1, 2), utc(2025, 1, 3)]);
        }

        #[test]
        fn test_every_two_months_stops_at_horizon() {
            let rule = RecurrenceRule::new(2, RepeatUnit::Month).unwrap();
            let dates: Vec<_> = rule.schedule(utc(2025, 1, 15), utc(2025, 5, 20)).collect();
            assert_eq!(dates, vec![utc(2025, 1, 15), utc(2025, 3, 15), utc(2025, 5, 15)]);
        }

        #[test]
        fn test_month_end_overflow_rolls_forward() {
            let rule = RecurrenceRule::new(1, RepeatUnit::Month).unwrap();
            let dates: Vec<_> = rule.schedule(utc(2025, 1, 31), utc(2025, 4, 30)).collect();
            assert_eq!(dates, vec![utc(2025, 1, 31), utc(2025, 3, 3), utc(2025, 4, 3)]);
        }

        #[test]
        fn test_first_after_horizon_is_empty() {
            let rule = RecurrenceRule::new(1, RepeatUnit::Week).unwrap();
            assert_eq!(rule.schedule(utc(2025, 2, 1), utc(2025, 1, 1)).count(), 0);
        }

        #[test]
        fn test_first_after_stays_on_anchor_grid() {
            let rule = RecurrenceRule::new(1, RepeatUnit::Week).unwrap();
            let anchor = utc(2025, 1, 1);
            assert_eq!(rule.first_after(anchor, utc(2024, 12, 1)), Some(anchor));
            assert_eq!(rule.first_after(anchor, anchor), Some(utc(2025, 1, 8)));
            assert_eq!(rule.first_after(anchor, utc(2025, 1, 8)), Some(utc(2025, 1, 15)));
            // Off-grid rows do not shift the series.
            assert_eq!(rule.first_after(anchor, utc(2025, 1, 10)), Some(utc(2025, 1, 15)));
        }

        #[test]
        fn test_iterator_is_fused_after_horizon() {
            let rule = RecurrenceRule::new(1, RepeatUnit::Day).unwrap();
            let mut schedule = rule.schedule(utc(2025, 1, 1), utc(2025, 1, 1));
            assert_eq!(schedule.next(), Some(utc(2025, 1, 1)));
            assert_eq!(schedule.next(), None);
            assert_eq!(schedule.next(), None);
        }
    }

    mod materialization_manager_tests {
        use super::*;

        #[test]
        fn test_with_defaults() {
            let manager = MaterializationManager::with_defaults();
            assert_eq!(manager.config().lookahead_days, 60);
            assert_eq!(manager.config().agenda_lookback_days, 1);
            assert_eq!(manager.config().agenda_lookahead_days, 7);
            assert_eq!(manager.config().agenda_max_span_days, 180);
        }

        #[test]
        fn test_custom_config_drives_horizon() {
            let manager = MaterializationManager::new(MaterializationConfig {
                lookahead_days: 14,
                ..Default::default()
            });
            assert_eq!(manager.default_horizon(utc(2025, 1, 1)), utc(2025, 1, 15));
        }

        #[test]
        fn test_default_horizon() {
            let manager = MaterializationManager::with_defaults();
            let now = utc(2025, 1, 1);
            assert_eq!(manager.default_horizon(now), utc(2025, 3, 2));
        }

        #[test]
        fn test_agenda_window_defaults() {
            let manager = MaterializationManager::with_defaults();
            let now = utc(2025, 6, 10);
            let (from, to) = manager.agenda_window(None, None, now).unwrap();
            assert_eq!(from, utc(2025, 6, 9));
            assert_eq!(to, utc(2025, 6, 17));
        }

        #[test]
        fn test_agenda_window_rejects_inverted_range() {
            let manager = MaterializationManager::with_defaults();
            let now = utc(2025, 6, 10);
            let result = manager.agenda_window(Some(now), Some(now), now);
            assert!(matches!(result, Err(CoreError::Validation(_))));
        }

        #[test]
        fn test_agenda_window_caps_span() {
            let manager = MaterializationManager::with_defaults();
            let now = utc(2025, 1, 1);
            assert!(manager
                .agenda_window(Some(now), Some(now + Duration::days(180)), now)
                .is_ok());
            let result = manager.agenda_window(
                Some(now),
                Some(now + Duration::days(180) + Duration::seconds(1)),
                now,
            );
            assert!(matches!(result, Err(CoreError::Validation(_))));
        }

        #[test]
        fn test_occurrence_window_keeps_explicit_bounds() {
            let manager = MaterializationManager::with_defaults();
            let now = utc(2025, 1, 1);
            let (from, to) = manager.occurrence_window(Some(utc(2024, 12, 1)), None, now);
            assert_eq!(from, utc(2024, 12, 1));
            assert_eq!(to, utc(2025, 3, 2));
        }

    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn unit_strategy() -> impl Strategy<Value = RepeatUnit> {
            prop_oneof![
                Just(RepeatUnit::Day),
                Just(RepeatUnit::Week),
                Just(RepeatUnit::Month),
            ]
        }

        proptest! {
            #[test]
            fn schedule_is_strictly_increasing_and_bounded(
                every in 1u32..24,
                unit in unit_strategy(),
                start_offset in 0i64..3650,
                span in 0i64..730,
            ) {
                let rule = RecurrenceRule::new(every, unit).unwrap();
                let first = utc(2000, 1, 1) + Duration::days(start_offset);
                let horizon = first + Duration::days(span);
                let dates: Vec<_> = rule.schedule(first, horizon).collect();

                prop_assert_eq!(dates.first().copied(), Some(first));
                for pair in dates.windows(2) {
                    prop_assert!(pair[0] < pair[1]);
                }
                for date in &dates {
                    prop_assert!(*date <= horizon);
                }
                let last = *dates.last().unwrap();
                prop_assert!(rule.step(last).unwrap() > horizon);
            }
        }
    }
}
