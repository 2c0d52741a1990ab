//! Subscription expiry and fine computation for `GET /users/subscription-details/{id}`

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::api::User;

pub const MILLIS_PER_DAY: i64 = 1000 * 60 * 60 * 24;
pub const OVERDUE_NOTICE: &str = "Book is overdue";
/// Fine when the book is overdue but the subscription is still running
pub const OVERDUE_FINE: u32 = 100;
/// Fine when the book is overdue and the subscription has expired too
pub const OVERDUE_AND_EXPIRED_FINE: u32 = 200;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid date: {0}")]
pub struct InvalidDate(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionTier {
    Basic,
    Standard,
    Premium,
}

impl SubscriptionTier {
    /// Exact match on the tier name, unknown names give None
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Basic" => Some(Self::Basic),
            "Standard" => Some(Self::Standard),
            "Premium" => Some(Self::Premium),
            _ => None,
        }
    }

    pub fn allowance_days(self) -> i64 {
        match self {
            Self::Basic => 90,
            Self::Standard => 180,
            Self::Premium => 365,
        }
    }
}

/// Day the subscription runs out. Unknown tiers get no allowance.
pub fn expiry_day(subscription_type: &str, start_day: i64) -> i64 {
    start_day
        + SubscriptionTier::from_name(subscription_type)
            .map(SubscriptionTier::allowance_days)
            .unwrap_or_default()
}

/// Whole days since epoch, rounded up
pub fn day_number(instant: DateTime<Utc>) -> i64 {
    let millis = instant.timestamp_millis();
    let days = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) == 0 {
        days
    } else {
        days + 1
    }
}

/// Parses a stored date. Values without an offset are read as UTC.
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>, InvalidDate> {
    let raw = raw.trim();
    if let Ok(date_time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date_time.with_timezone(&Utc));
    }
    if let Ok(date_time) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(date_time.and_utc());
    }
    ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%B %d, %Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date_time| date_time.and_utc())
        .ok_or_else(|| InvalidDate(raw.to_string()))
}

/// Day number of a stored date, or of `now` when it is missing or empty
fn day_number_or_now(raw: Option<&str>, now: DateTime<Utc>) -> Result<i64, InvalidDate> {
    match raw {
        Some(raw) if !raw.is_empty() => parse_date(raw).map(day_number),
        _ => Ok(day_number(now)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnStatus {
    Overdue,
    DueOn(i64),
}

impl Serialize for ReturnStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Overdue => serializer.serialize_str(OVERDUE_NOTICE),
            Self::DueOn(day) => serializer.serialize_i64(*day),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSummary {
    pub subscription_type: String,
    pub subscription_date: String,
    pub subscription_days_left: i64,
    pub days_left_for_return: i64,
    pub return_date: ReturnStatus,
    pub fine: u32,
}

impl SubscriptionSummary {
    /// A user without `returnDate` is treated as due today.
    pub fn compute(user: &User, now: DateTime<Utc>) -> Result<Self, InvalidDate> {
        let current_day = day_number(now);
        let start_day = day_number_or_now(Some(&user.subscription_date), now)?;
        let return_day = day_number_or_now(user.return_date.as_deref(), now)?;
        let expiry_day = expiry_day(&user.subscription_type, start_day);

        let overdue = return_day < current_day;
        let fine = match (overdue, expiry_day <= current_day) {
            (false, _) => 0,
            (true, false) => OVERDUE_FINE,
            (true, true) => OVERDUE_AND_EXPIRED_FINE,
        };

        Ok(Self {
            subscription_type: user.subscription_type.clone(),
            subscription_date: user.subscription_date.clone(),
            subscription_days_left: expiry_day - current_day,
            days_left_for_return: return_day - current_day,
            return_date: if overdue {
                ReturnStatus::Overdue
            } else {
                ReturnStatus::DueOn(return_day)
            },
            fine,
        })
    }
}

/// All user fields with the computed summary laid over them
pub fn subscription_details(
    user: &User,
    now: DateTime<Utc>,
) -> Result<Map<String, Value>, InvalidDate> {
    let summary = SubscriptionSummary::compute(user, now)?;
    let mut details = to_object(user);
    details.extend(to_object(&summary));
    Ok(details)
}

fn to_object<T: Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => fields,
        _ => Map::new(),
    }
}
