use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::{CoreError, CoreResult};

/// Parse an ISO-8601 date or date-time, keeping only the calendar date.
///
/// Date-times with an offset are normalised to UTC first, so ordering
/// between two parsed dates never contradicts the order of the instants.
pub fn parse_iso_date(field: &str, raw: &str) -> CoreResult<NaiveDate> {
    let value = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.date());
    }

    Err(CoreError::validation(format!(
        "{} '{}' is not a valid ISO-8601 date",
        field, raw
    )))
}

/// Parse both ends of a stay and require check-in strictly before check-out.
pub fn parse_stay(check_in: &str, check_out: &str) -> CoreResult<(NaiveDate, NaiveDate)> {
    let check_in = parse_iso_date("checkIn", check_in)?;
    let check_out = parse_iso_date("checkOut", check_out)?;

    if check_in >= check_out {
        return Err(CoreError::validation(format!(
            "checkIn ({}) must be before checkOut ({})",
            check_in, check_out
        )));
    }

    Ok((check_in, check_out))
}
