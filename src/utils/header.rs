use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use fxhash::FxHashMap as HashMap;
use rand::rngs::StdRng;
use rand::Rng;

use crate::config::defs::{BASES_PER_SECOND, FALLBACK_JITTER_SECS, START_TIME_KEY};

pub type HeaderFields = HashMap<String, String>;

/// Collects the `key=value` tokens of a FASTX description.
/// Tokens are separated by single spaces; tokens without `=` are ignored and a repeated key keeps its last value.
pub fn parse_header_fields(desc: &str) -> HeaderFields {
    let mut fields = HeaderFields::default();
    for token in desc.split(' ') {
        if !token.contains('=') {
            continue;
        }
        let mut bits = token.split('=');
        let key = bits.next().unwrap_or_default();
        let value = bits.next().unwrap_or_default();
        fields.insert(key.to_string(), value.to_string());
    }
    fields
}

/// Seconds the instrument needed to produce a read of `seq_len` bases.
pub fn generation_duration(seq_len: usize) -> f64 {
    seq_len as f64 / BASES_PER_SECOND
}

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y%m%dT%H%M%S%.f%z"];
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y%m%dT%H%M%S%.f",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// Parses an ISO-8601 timestamp in extended or basic form.
/// Values without an offset are taken as UTC; a bare date means midnight.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }
    let local = value.strip_suffix('Z').unwrap_or(value);
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(local, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// The time attributed to a single read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTime {
    /// `start_time` from the header plus the generation duration.
    Recorded(DateTime<Utc>),
    /// No usable `start_time`; a random instant within the last minute.
    Estimated(DateTime<Utc>),
}

impl ReadTime {
    pub fn time(&self) -> DateTime<Utc> {
        match self {
            ReadTime::Recorded(t) | ReadTime::Estimated(t) => *t,
        }
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, ReadTime::Estimated(_))
    }
}

/// Turns header fields into read times. Owns the RNG used for the fallback policy.
pub struct TimestampResolver {
    rng: StdRng,
}

impl TimestampResolver {
    pub fn new(rng: StdRng) -> Self {
        TimestampResolver { rng }
    }

    /// Resolves the completion instant of one read.
    ///
    /// # Arguments
    ///
    /// * `fields` - Header fields of the read.
    /// * `generation_secs` - Estimated seconds the read took to sequence.
    ///
    /// # Returns
    /// ReadTime::Recorded when `start_time` parses, otherwise ReadTime::Estimated.
    pub fn resolve(&mut self, fields: &HeaderFields, generation_secs: f64) -> ReadTime {
        match fields.get(START_TIME_KEY).and_then(|v| parse_timestamp(v)) {
            Some(start) => ReadTime::Recorded(start + seconds_to_delta(generation_secs)),
            None => {
                let back = self.rng.random_range(0..=FALLBACK_JITTER_SECS);
                ReadTime::Estimated(Utc::now() - TimeDelta::seconds(back))
            }
        }
    }
}

fn seconds_to_delta(secs: f64) -> TimeDelta {
    TimeDelta::microseconds((secs * 1_000_000.0).round() as i64)
}
