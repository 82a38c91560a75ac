use crate::error::{Result, SalesError};
use chrono::{DateTime, Datelike, Days, Local, NaiveDate, NaiveDateTime};

const DAY_NAMES: [&str; 7] = [
    "Domingo",
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
];

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Parses an issue date in one of the accepted layouts:
/// `YYYY-MM-DD`, `DD/MM/YYYY`, `DD-MM-YYYY` or `YYYY/MM/DD`.
///
/// Anything else gets a best-effort pass through timestamp layouts
/// (RFC 3339, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS`) and keeps the date part.
/// Input that still does not resolve to a calendar date is an error.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();

    let layout = if matches_shape(value, "dddd-dd-dd") {
        Some("%Y-%m-%d")
    } else if matches_shape(value, "dd/dd/dddd") {
        Some("%d/%m/%Y")
    } else if matches_shape(value, "dd-dd-dddd") {
        Some("%d-%m-%Y")
    } else if matches_shape(value, "dddd/dd/dd") {
        Some("%Y/%m/%d")
    } else {
        None
    };

    if let Some(layout) = layout {
        return NaiveDate::parse_from_str(value, layout).map_err(|_| {
            SalesError::DateError(format!("'{}' is not a valid calendar date", value))
        });
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.date_naive());
    }

    for layout in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, layout) {
            return Ok(timestamp.date());
        }
    }

    Err(SalesError::DateError(format!(
        "Unrecognized date format: '{}'. Expected YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY or YYYY/MM/DD",
        value
    )))
}

/// `d` matches one ASCII digit, every other pattern byte matches itself.
fn matches_shape(value: &str, pattern: &str) -> bool {
    value.len() == pattern.len()
        && value
            .bytes()
            .zip(pattern.bytes())
            .all(|(v, p)| if p == b'd' { v.is_ascii_digit() } else { v == p })
}

/// Day label used for day-level reporting (`DD/MM/YYYY`).
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn get_day_of_week(date: NaiveDate) -> &'static str {
    DAY_NAMES[date.weekday().num_days_from_sunday() as usize]
}

pub fn get_month_name(date: NaiveDate) -> &'static str {
    MONTH_NAMES[date.month0() as usize]
}

/// Week of year as used for commission periods: `ceil((day_of_year + jan1_weekday + 1) / 7)`
/// where `day_of_year` is zero-based and `jan1_weekday` counts from Sunday = 0.
///
/// This is not ISO-8601. Weeks effectively start on Sunday and week 1 is the
/// (possibly partial) week containing January 1st.
pub fn get_week_number(date: NaiveDate) -> u32 {
    let day_of_year = date.ordinal0();
    let jan1_weekday = (date.weekday().num_days_from_sunday() + 7 - day_of_year % 7) % 7;
    (day_of_year + jan1_weekday + 1 + 6) / 7
}

pub fn get_quarter(date: NaiveDate) -> u32 {
    date.month0() / 3 + 1
}

pub fn get_semester(date: NaiveDate) -> u32 {
    if date.month() <= 6 {
        1
    } else {
        2
    }
}

/// Current local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn is_today(date: NaiveDate) -> bool {
    is_same_day(date, today())
}

pub fn is_this_week(date: NaiveDate) -> bool {
    is_in_week_of(date, today())
}

pub fn is_this_month(date: NaiveDate) -> bool {
    is_in_month_of(date, today())
}

pub fn is_same_day(date: NaiveDate, reference: NaiveDate) -> bool {
    date == reference
}

/// True when `date` falls in the Sunday-to-Saturday week containing `reference`.
pub fn is_in_week_of(date: NaiveDate, reference: NaiveDate) -> bool {
    let offset = u64::from(reference.weekday().num_days_from_sunday());
    let Some(week_start) = reference.checked_sub_days(Days::new(offset)) else {
        return false;
    };
    let Some(week_end) = week_start.checked_add_days(Days::new(6)) else {
        return date >= week_start;
    };
    date >= week_start && date <= week_end
}

pub fn is_in_month_of(date: NaiveDate, reference: NaiveDate) -> bool {
    date.year() == reference.year() && date.month() == reference.month()
}
