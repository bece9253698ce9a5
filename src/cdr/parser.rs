// src/cdr/parser.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::ParseRejection;
use crate::models::{CallRecord, Direction};

/// Minimum number of tab-separated fields on a valid CDR line.
const MIN_FIELDS: usize = 19;

/// Positional layout of the PBX export. Only these columns are consumed;
/// the rest are vendor padding.
const IDX_CALL_ID: usize = 0;
const IDX_DURATION: usize = 1;
const IDX_START: usize = 2;
const IDX_ANSWERED: usize = 3;
const IDX_END: usize = 4;
const IDX_FROM: usize = 6;
const IDX_TO: usize = 8;
const IDX_COST: usize = 17;

/// A fully validated and enriched CDR, not yet persisted. Becomes a
/// `CallRecord` once the recorder stamps the ingestion time.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCdr {
    pub call_id: String,
    pub direction: Direction,
    pub from_number: String,
    pub to_number: String,
    pub start_time: DateTime<Utc>,
    pub answered_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_sec: i64,
    pub area_code: Option<String>,
    pub cost: Decimal,
    pub day: String,
}

impl ParsedCdr {
    pub fn into_record(self, ingested_at: DateTime<Utc>) -> CallRecord {
        CallRecord {
            call_id: self.call_id,
            direction: self.direction,
            from_number: self.from_number,
            to_number: self.to_number,
            start_time: self.start_time,
            answered_time: self.answered_time,
            end_time: self.end_time,
            duration_sec: self.duration_sec,
            area_code: self.area_code,
            cost: self.cost,
            day: self.day,
            ingested_at,
        }
    }
}

/// Parses one tab-delimited CDR line (terminator already stripped).
///
/// Pure and total: every malformed input comes back as a
/// `ParseRejection`, nothing panics across this boundary.
pub fn parse_cdr_line(line: &str) -> Result<ParsedCdr, ParseRejection> {
    let fields: Vec<&str> = line.split('\t').collect();

    if fields.len() < MIN_FIELDS {
        return Err(ParseRejection::InsufficientFields {
            expected: MIN_FIELDS,
            got: fields.len(),
        });
    }

    let call_id = fields[IDX_CALL_ID].trim();
    let duration_str = fields[IDX_DURATION].trim();
    let time_start = fields[IDX_START].trim();
    let time_answered = fields[IDX_ANSWERED].trim();
    let time_end = fields[IDX_END].trim();
    let from_number = fields[IDX_FROM].trim();
    let to_number = fields[IDX_TO].trim();
    let cost_str = fields[IDX_COST].trim();

    if call_id.is_empty() {
        return Err(ParseRejection::MissingRequiredField("call_id"));
    }
    if from_number.is_empty() {
        return Err(ParseRejection::MissingRequiredField("from_number"));
    }
    if to_number.is_empty() {
        return Err(ParseRejection::MissingRequiredField("to_number"));
    }
    if time_start.is_empty() {
        return Err(ParseRejection::MissingRequiredField("start_time"));
    }

    let start_time = parse_timestamp(time_start, "start_time")?;
    let answered_time = parse_optional_timestamp(time_answered, "answered_time")?;
    let end_time = parse_optional_timestamp(time_end, "end_time")?;

    let duration_sec = derive_duration(duration_str, start_time, end_time);

    // Dialing a short extension means the call terminated inside the
    // PBX. Threshold of 5 matches this PBX's numbering plan.
    let to_digits = digits_only(to_number);
    let direction = if to_digits.len() <= 5 {
        Direction::Incoming
    } else {
        Direction::Outgoing
    };

    // The external party's number carries the area code.
    let external_number = match direction {
        Direction::Incoming => from_number,
        Direction::Outgoing => to_number,
    };
    let area_code = extract_area_code(external_number);

    let cost = cost_str
        .parse::<Decimal>()
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO);

    let day = start_time.format("%Y-%m-%d").to_string();

    Ok(ParsedCdr {
        call_id: call_id.to_string(),
        direction,
        from_number: from_number.to_string(),
        to_number: to_number.to_string(),
        start_time,
        answered_time,
        end_time,
        duration_sec,
        area_code,
        cost,
        day,
    })
}

fn parse_timestamp(value: &str, field: &'static str) -> Result<DateTime<Utc>, ParseRejection> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ParseRejection::InvalidTimestamp {
            field,
            value: value.to_string(),
        })
}

/// Answered/end columns use `""` or a literal `"0"` for "never
/// happened"; both mean absent, not malformed.
fn parse_optional_timestamp(
    value: &str,
    field: &'static str,
) -> Result<Option<DateTime<Utc>>, ParseRejection> {
    if value.is_empty() || value == "0" {
        return Ok(None);
    }
    parse_timestamp(value, field).map(Some)
}

/// The PBX's duration column is authoritative when numeric; otherwise
/// fall back to the wall-clock span, rounded to whole seconds. Never
/// negative.
fn derive_duration(
    field: &str,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> i64 {
    if let Ok(dur) = field.parse::<f64>() {
        if dur.is_finite() {
            return (dur.round() as i64).max(0);
        }
    }
    if let Some(end) = end {
        let millis = (end - start).num_milliseconds();
        return (((millis as f64) / 1000.0).round() as i64).max(0);
    }
    0
}

fn digits_only(number: &str) -> String {
    number.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// 3-digit area code of a NANP number, when one can be derived.
/// `+15551234567` and `5551234567` both yield `555`; anything that does
/// not normalize to exactly 10 digits yields nothing.
fn extract_area_code(phone_number: &str) -> Option<String> {
    let digits = digits_only(phone_number);

    let national = if digits.len() == 11 && digits.starts_with('1') {
        &digits[1..]
    } else {
        digits.as_str()
    };

    if national.len() == 10 {
        Some(national[..3].to_string())
    } else {
        None
    }
}
