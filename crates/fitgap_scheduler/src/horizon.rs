//! Date ranges a run covers: the listed range (events read and eligible for
//! removal) and the walked business days (where placements happen).

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use fitgap_config::HorizonSetting;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    /// `[today, today + 7 days)`
    Week,
    /// The calendar month containing today
    #[default]
    Month,
}

impl From<HorizonSetting> for Horizon {
    fn from(setting: HorizonSetting) -> Self {
        match setting {
            HorizonSetting::Week => Horizon::Week,
            HorizonSetting::Month => Horizon::Month,
        }
    }
}

impl Horizon {
    /// Range whose events are read, and removed when a kind is disabled.
    ///
    /// Month covers the whole calendar month, including days already past.
    pub fn listed_range(self, now: DateTime<Utc>, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let today = now.with_timezone(&tz).date_naive();
        match self {
            Horizon::Week => (local_midnight(today, tz), local_midnight(add_days(today, 7), tz)),
            Horizon::Month => {
                let first = first_of_month(today);
                (local_midnight(first, tz), local_midnight(first_of_next_month(today), tz))
            }
        }
    }

    /// `[today 00:00, end of horizon)` in `tz`, the span busy times are read for.
    pub fn walk_range(self, now: DateTime<Utc>, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let today = now.with_timezone(&tz).date_naive();
        let (_, end) = self.listed_range(now, tz);
        (local_midnight(today, tz), end)
    }

    /// Business days from today through the end of the horizon, in order.
    pub fn walk_days(self, now: DateTime<Utc>, tz: Tz) -> Vec<NaiveDate> {
        let today = now.with_timezone(&tz).date_naive();
        let end = match self {
            Horizon::Week => add_days(today, 7),
            Horizon::Month => first_of_next_month(today),
        };
        business_days(today, end)
    }
}

/// Period for wellness statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    /// Sunday-based week containing today
    #[default]
    Week,
    Month,
    Year,
}

impl StatsPeriod {
    pub fn range(self, now: DateTime<Utc>, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let today = now.with_timezone(&tz).date_naive();
        let (from, until) = match self {
            StatsPeriod::Week => {
                let sunday = today
                    .checked_sub_days(Days::new(u64::from(today.weekday().num_days_from_sunday())))
                    .unwrap_or(today);
                (sunday, add_days(sunday, 7))
            }
            StatsPeriod::Month => (first_of_month(today), first_of_next_month(today)),
            StatsPeriod::Year => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                let next = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).unwrap_or(NaiveDate::MAX);
                (first, next)
            }
        };
        (local_midnight(from, tz), local_midnight(until, tz))
    }
}

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday to Friday dates in `[from, until)`.
pub fn business_days(from: NaiveDate, until: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|day| *day < until)
        .filter(|day| is_business_day(*day))
        .collect()
}

/// Number of Monday to Friday dates in the month containing `date`.
pub fn business_days_in_month(date: NaiveDate) -> usize {
    business_days(first_of_month(date), first_of_next_month(date)).len()
}

/// Start of `date` in `tz`, as an instant. Zones whose midnight can fall into a
/// DST gap resolve to the first valid local time after it.
pub fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(midnight + chrono::Duration::hours(1)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .unwrap_or(NaiveDate::MAX)
}
