/// Time utilities for market session management
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Asia::Kolkata;

const MARKET_OPEN_MINUTE: u32 = 9 * 60 + 15;
const MARKET_CLOSE_MINUTE: u32 = 15 * 60 + 30;

/// Parse "HH:MM" or "HH:MM:SS"
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

fn ist_minute_of_day(now: DateTime<Utc>) -> u32 {
    let now_ist = now.with_timezone(&Kolkata);
    now_ist.hour() * 60 + now_ist.minute()
}

/// Monday to Friday in IST (exchange holidays are not tracked)
pub fn is_trading_weekday(now: DateTime<Utc>) -> bool {
    now.with_timezone(&Kolkata).weekday().num_days_from_monday() < 5
}

/// Check if market is open
pub fn is_market_open(now: DateTime<Utc>) -> bool {
    let minute = ist_minute_of_day(now);
    is_trading_weekday(now) && (MARKET_OPEN_MINUTE..MARKET_CLOSE_MINUTE).contains(&minute)
}

/// True once the IST wall clock reaches the intraday square-off time
pub fn is_past_square_off(now: DateTime<Utc>, square_off: NaiveTime) -> bool {
    now.with_timezone(&Kolkata).time() >= square_off
}

/// Calendar date of `now` in IST
pub fn ist_date(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&Kolkata).date_naive()
}
