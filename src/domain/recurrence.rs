//! Recurrence rules for repeating tasks
//!
//! A rule is free text stored on the task. Supported forms (case-insensitive):
//!
//! | Rule | Next occurrence |
//! |------|-----------------|
//! | `daily` | +1 day |
//! | `weekly` | +7 days |
//! | `monthly` | same day next month, clamped to month end |
//! | `every N days` | +N days (N > 0) |
//! | `mon,wed,fri` | first listed weekday strictly after the base date |
//!
//! Anything else means "no recurrence". Recurrence is advisory, so an
//! unrecognized rule is never an error.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};

/// Upper bound on the forward search for a weekday rule
const WEEKDAY_SEARCH_DAYS: i64 = 14;

/// A parsed recurrence rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
    EveryNDays(u32),
    Weekdays(BTreeSet<u32>),
}

impl Recurrence {
    /// Parses rule text, returning `None` for empty or unrecognized rules
    pub fn parse(rule: &str) -> Option<Self> {
        let rule = rule.trim().to_lowercase();
        if rule.is_empty() {
            return None;
        }

        match rule.as_str() {
            "daily" => return Some(Recurrence::Daily),
            "weekly" => return Some(Recurrence::Weekly),
            "monthly" => return Some(Recurrence::Monthly),
            _ => {}
        }

        if rule.starts_with("every ") {
            let parts: Vec<&str> = rule.split_whitespace().collect();
            if parts.len() >= 3 && parts[2].starts_with("day") {
                return match parts[1].parse::<u32>() {
                    Ok(n) if n > 0 => Some(Recurrence::EveryNDays(n)),
                    _ => None,
                };
            }
        }

        if rule.contains(',') || weekday_from_token(&rule).is_some() {
            let days: BTreeSet<u32> = rule
                .split(',')
                .filter_map(|token| weekday_from_token(token.trim()))
                .map(|day| day.num_days_from_monday())
                .collect();
            if !days.is_empty() {
                return Some(Recurrence::Weekdays(days));
            }
        }

        None
    }

    /// Computes the occurrence following `base`
    pub fn next_after(&self, base: NaiveDate) -> Option<NaiveDate> {
        match self {
            Recurrence::Daily => base.checked_add_signed(Duration::days(1)),
            Recurrence::Weekly => base.checked_add_signed(Duration::days(7)),
            Recurrence::Monthly => base.checked_add_months(Months::new(1)),
            Recurrence::EveryNDays(n) => base.checked_add_signed(Duration::days(i64::from(*n))),
            Recurrence::Weekdays(days) => (1..=WEEKDAY_SEARCH_DAYS)
                .filter_map(|offset| base.checked_add_signed(Duration::days(offset)))
                .find(|candidate| days.contains(&candidate.weekday().num_days_from_monday())),
        }
    }
}

/// Maps a full or three-letter English weekday name
fn weekday_from_token(token: &str) -> Option<Weekday> {
    let day = match token {
        "mon" | "monday" => Weekday::Mon,
        "tue" | "tuesday" => Weekday::Tue,
        "wed" | "wednesday" => Weekday::Wed,
        "thu" | "thursday" => Weekday::Thu,
        "fri" | "friday" => Weekday::Fri,
        "sat" | "saturday" => Weekday::Sat,
        "sun" | "sunday" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

/// Next occurrence of `base` under `rule`, or `None` when the rule is
/// absent, empty or unrecognized.
pub fn next_occurrence(base: NaiveDate, rule: Option<&str>) -> Option<NaiveDate> {
    rule.and_then(Recurrence::parse)?.next_after(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn no_rule_no_occurrence() {
        assert_eq!(next_occurrence(ymd(2024, 1, 1), None), None);
        assert_eq!(next_occurrence(ymd(2024, 1, 1), Some("")), None);
        assert_eq!(next_occurrence(ymd(2024, 1, 1), Some("  ")), None);
    }

    #[test]
    fn daily_and_weekly() {
        assert_eq!(next_occurrence(ymd(2024, 12, 15), Some("daily")), Some(ymd(2024, 12, 16)));
        assert_eq!(next_occurrence(ymd(2024, 12, 31), Some("daily")), Some(ymd(2025, 1, 1)));
        assert_eq!(next_occurrence(ymd(2024, 6, 1), Some("weekly")), Some(ymd(2024, 6, 8)));
    }

    #[test]
    fn rules_are_case_insensitive_and_trimmed() {
        assert_eq!(next_occurrence(ymd(2024, 6, 1), Some("  WEEKLY ")), Some(ymd(2024, 6, 8)));
    }

    #[test]
    fn monthly_clamps_to_month_end() {
        assert_eq!(next_occurrence(ymd(2024, 1, 31), Some("monthly")), Some(ymd(2024, 2, 29)));
        assert_eq!(next_occurrence(ymd(2023, 1, 31), Some("monthly")), Some(ymd(2023, 2, 28)));
        assert_eq!(next_occurrence(ymd(1900, 1, 31), Some("monthly")), Some(ymd(1900, 2, 28)));
        assert_eq!(next_occurrence(ymd(2000, 1, 31), Some("monthly")), Some(ymd(2000, 2, 29)));
        assert_eq!(next_occurrence(ymd(2024, 3, 31), Some("monthly")), Some(ymd(2024, 4, 30)));
    }

    #[test]
    fn monthly_rolls_over_december() {
        assert_eq!(next_occurrence(ymd(2024, 12, 10), Some("monthly")), Some(ymd(2025, 1, 10)));
    }

    #[test]
    fn every_n_days() {
        let base = ymd(2024, 2, 26);
        assert_eq!(next_occurrence(base, Some("every 5 days")), Some(ymd(2024, 3, 2)));
        assert_eq!(next_occurrence(base, Some("every 1 day")), Some(ymd(2024, 2, 27)));
    }

    #[test]
    fn every_n_days_malformed_is_no_recurrence() {
        let base = ymd(2024, 2, 26);
        assert_eq!(next_occurrence(base, Some("every x days")), None);
        assert_eq!(next_occurrence(base, Some("every 0 days")), None);
        assert_eq!(next_occurrence(base, Some("every -3 days")), None);
        assert_eq!(next_occurrence(base, Some("every 3 weeks")), None);
    }

    #[test]
    fn weekday_from_friday_to_monday() {
        // 2024-06-07 is a Friday
        let friday = ymd(2024, 6, 7);
        assert_eq!(friday.weekday(), Weekday::Fri);
        assert_eq!(next_occurrence(friday, Some("mon")), Some(ymd(2024, 6, 10)));
        assert_eq!(next_occurrence(friday, Some("Monday")), Some(ymd(2024, 6, 10)));
    }

    #[test]
    fn weekday_set_picks_nearest() {
        // 2024-06-03 is a Monday
        let monday = ymd(2024, 6, 3);
        assert_eq!(next_occurrence(monday, Some("mon, wed ,fri")), Some(ymd(2024, 6, 5)));
        assert_eq!(next_occurrence(monday, Some("mon")), Some(ymd(2024, 6, 10)));
    }

    #[test]
    fn weekday_set_ignores_unknown_tokens() {
        let monday = ymd(2024, 6, 3);
        assert_eq!(next_occurrence(monday, Some("funday,thu")), Some(ymd(2024, 6, 6)));
        assert_eq!(next_occurrence(monday, Some("foo,bar")), None);
    }

    #[test]
    fn unknown_rule_is_no_recurrence() {
        assert_eq!(next_occurrence(ymd(2024, 1, 1), Some("fortnightly")), None);
        assert_eq!(Recurrence::parse("yearly"), None);
    }
}
