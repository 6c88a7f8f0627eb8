use std::cmp::Ordering;

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use serde::Serialize;
use tracing::warn;

use crate::model::{Cat, ClassInfo};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// CATs closer than this many days are listed in the alert box.
pub const CAT_ALERT_WINDOW_DAYS: i64 = 21;
pub const CAT_URGENT_DAYS: i64 = 7;

pub fn parse_weekday(name: &str) -> Option<Weekday> {
    name.trim().parse::<Weekday>().ok()
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

fn class_slot(class: &ClassInfo) -> Option<(Weekday, NaiveTime)> {
    let Some(day) = parse_weekday(&class.day_of_week) else {
        warn!(day = %class.day_of_week, course = %class.course_name, "unknown day_of_week");
        return None;
    };
    let Some(start) = parse_clock(&class.start_time) else {
        warn!(time = %class.start_time, course = %class.course_name, "unreadable start_time");
        return None;
    };
    Some((day, start))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpcomingClass<'a> {
    pub class: &'a ClassInfo,
    /// 0 for later today, 7 for a class earlier today that next recurs in a week.
    pub days_ahead: u32,
}

impl UpcomingClass<'_> {
    pub fn display_day(&self) -> &str {
        if self.days_ahead == 0 {
            "Today"
        } else {
            &self.class.day_of_week
        }
    }
}

/// The next class to start after `now`, wrapping into next week.
pub fn upcoming_class(classes: &[ClassInfo], now: NaiveDateTime) -> Option<UpcomingClass<'_>> {
    let today = now.weekday().num_days_from_sunday();
    let now_minute = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0)?;
    classes
        .iter()
        .filter_map(|class| {
            let (day, start) = class_slot(class)?;
            let mut days_ahead = (day.num_days_from_sunday() + 7 - today) % 7;
            if days_ahead == 0 && start < now_minute {
                days_ahead = 7;
            }
            Some((days_ahead, start, class))
        })
        .min_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(days_ahead, _, class)| UpcomingClass { class, days_ahead })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WeekSlot<'a> {
    pub class: &'a ClassInfo,
    pub is_today: bool,
}

/// Every class in server order, with today's flagged.
pub fn classes_this_week(classes: &[ClassInfo], today: Weekday) -> Vec<WeekSlot<'_>> {
    classes
        .iter()
        .map(|class| WeekSlot {
            class,
            is_today: parse_weekday(&class.day_of_week) == Some(today),
        })
        .collect()
}

/// Monday-first weekly order, then start time. Unreadable slots go last.
pub fn sort_schedule(classes: &mut [ClassInfo]) {
    fn key(class: &ClassInfo) -> Option<(u32, NaiveTime)> {
        let day = parse_weekday(&class.day_of_week)?;
        let start = parse_clock(&class.start_time)?;
        Some((day.num_days_from_monday(), start))
    }
    classes.sort_by(|a, b| match (key(a), key(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatUrgency {
    Urgent,
    Approaching,
    Upcoming,
}

impl CatUrgency {
    pub fn from_days(days_until: i64) -> Self {
        if (0..=CAT_URGENT_DAYS).contains(&days_until) {
            Self::Urgent
        } else if days_until > CAT_URGENT_DAYS && days_until <= CAT_ALERT_WINDOW_DAYS {
            Self::Approaching
        } else {
            Self::Upcoming
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Urgent => "Urgent: Less than 7 days!",
            Self::Approaching => "Approaching: Less than 3 weeks!",
            Self::Upcoming => "Upcoming",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScheduledCat<'a> {
    pub cat: &'a Cat,
    pub at: DateTime<Utc>,
    pub days_until: i64,
    pub urgency: CatUrgency,
}

/// RFC 3339, or a bare `YYYY-MM-DD HH:MM:SS` read as UTC.
pub fn parse_cat_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Whole days until `at`, rounded up.
pub fn days_until(at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (at - now).num_milliseconds();
    ms.div_euclid(DAY_MS) + i64::from(ms.rem_euclid(DAY_MS) > 0)
}

fn schedule_cat(cat: &Cat, now: DateTime<Utc>) -> Option<ScheduledCat<'_>> {
    let Some(at) = parse_cat_datetime(&cat.cat_datetime) else {
        warn!(id = cat.id, value = %cat.cat_datetime, "unreadable cat_datetime");
        return None;
    };
    let days = days_until(at, now);
    Some(ScheduledCat {
        cat,
        at,
        days_until: days,
        urgency: CatUrgency::from_days(days),
    })
}

/// CATs still ahead of `now`, earliest first.
pub fn upcoming_cats(cats: &[Cat], now: DateTime<Utc>) -> Vec<ScheduledCat<'_>> {
    let mut out: Vec<_> = cats
        .iter()
        .filter_map(|cat| schedule_cat(cat, now))
        .filter(|s| s.at > now)
        .collect();
    out.sort_by_key(|s| s.at);
    out
}

/// CATs starting within the alert window, in server order.
pub fn cat_alerts(cats: &[Cat], now: DateTime<Utc>) -> Vec<ScheduledCat<'_>> {
    let window = Duration::days(CAT_ALERT_WINDOW_DAYS);
    cats.iter()
        .filter_map(|cat| schedule_cat(cat, now))
        .filter(|s| s.at >= now && s.at - now <= window)
        .collect()
}
