//! Order-time normalization to `YYYY-MM-DD HH:MM:SS GMT±HH:MM`.
//!
//! The display offset is the one the customer wrote when there is one;
//! otherwise the configured local zone's offset at that instant. Input that
//! cannot be read as a date is returned unchanged.

use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;
use lb_domain::config::YearPolicy;
use regex::{Captures, Regex};

static GMT_OFFSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)GMT([+-])(\d{2}):?(\d{2})").expect("valid regex"));
static UTC_OFFSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)UTC([+-])(\d{2}):?(\d{2})").expect("valid regex"));
static TRAILING_OFFSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*([+-])(\d{2}):?(\d{2})$").expect("valid regex"));

static MARKED_OFFSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:GMT|UTC)\s*([+-])(\d{2}):?(\d{2})").expect("valid regex")
});
static BARE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:GMT|UTC)\b").expect("valid regex"));
static ZONE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^()]*\)\s*$").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %I:%M %p",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%B %d, %Y %H:%M",
    "%B %d, %Y %I:%M %p",
    "%d %B %Y %H:%M",
    "%d %B %Y %I:%M %p",
    "%a %b %d %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%d %B %Y"];

/// Zone used for inputs without an explicit offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalZone {
    /// The host's local zone.
    #[default]
    System,
    Named(Tz),
}

impl LocalZone {
    /// Parse an IANA zone name; `None` means the host zone.
    pub fn from_config(name: Option<&str>) -> Result<Self, String> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            None => Ok(LocalZone::System),
            Some(n) => n
                .parse::<Tz>()
                .map(LocalZone::Named)
                .map_err(|e| format!("unknown timezone {n:?}: {e}")),
        }
    }

    fn offset_at(self, instant: DateTime<Utc>) -> FixedOffset {
        match self {
            LocalZone::System => instant.with_timezone(&Local).offset().fix(),
            LocalZone::Named(tz) => instant.with_timezone(&tz).offset().fix(),
        }
    }

    fn localize(self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            LocalZone::System => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|d| d.fixed_offset()),
            LocalZone::Named(tz) => tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|d| d.fixed_offset()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    pub year_policy: YearPolicy,
    pub local: LocalZone,
}

/// Normalize a free-text order time. Never fails: unreadable input comes
/// back as given.
pub fn normalize(raw: &str, opts: &NormalizeOptions, now: DateTime<Utc>) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return raw.to_owned();
    }
    // `Tue Mar 05 2024 18:30:00 GMT+0700 (Indochina Time)`: the offset
    // carries the zone, the name in parentheses is display only.
    let trimmed = ZONE_NAME.replace(trimmed, "");
    let trimmed = trimmed.as_ref();

    let Some(mut parsed) = parse_instant(trimmed, opts.local) else {
        tracing::debug!(order_time = %trimmed, "order time not recognised, keeping raw text");
        return raw.to_owned();
    };

    if opts.year_policy == YearPolicy::ForceCurrent {
        let year = now.with_timezone(parsed.offset()).year();
        if let Some(moved) = parsed.with_year(year) {
            parsed = moved;
        }
    }

    let instant = parsed.with_timezone(&Utc);
    let display = explicit_offset(trimmed)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| opts.local.offset_at(instant));

    render(instant.with_timezone(&display))
}

fn render(dt: DateTime<FixedOffset>) -> String {
    let secs = dt.offset().local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let abs = secs.unsigned_abs() / 60;
    format!(
        "{} GMT{sign}{:02}:{:02}",
        dt.format("%Y-%m-%d %H:%M:%S"),
        abs / 60,
        abs % 60
    )
}

/// Offset written in the text, in seconds east of UTC.
fn explicit_offset(text: &str) -> Option<i32> {
    [&*GMT_OFFSET, &*UTC_OFFSET, &*TRAILING_OFFSET]
        .into_iter()
        .find_map(|re| re.captures(text))
        .map(|c| offset_seconds(&c))
}

fn offset_seconds(c: &Captures<'_>) -> i32 {
    let hours: i32 = c[2].parse().unwrap_or(0);
    let minutes: i32 = c[3].parse().unwrap_or(0);
    let magnitude = hours * 3600 + minutes * 60;
    if &c[1] == "-" {
        -magnitude
    } else {
        magnitude
    }
}

fn parse_instant(text: &str, local: LocalZone) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt);
    }

    let (cleaned, has_offset) = clean_offsets(text);
    if has_offset {
        return DATETIME_FORMATS.iter().find_map(|fmt| {
            DateTime::parse_from_str(&cleaned, &format!("{fmt} %z")).ok()
        });
    }

    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&cleaned, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    local.localize(naive)
}

/// Rewrite `GMT+07:00`, `UTC`, trailing `+07:00` and similar into a single
/// ` +0700` suffix that `%z` accepts. Returns whether an offset is present.
fn clean_offsets(text: &str) -> (String, bool) {
    let mut has_offset = false;
    let mut out = text.to_owned();

    if MARKED_OFFSET.is_match(&out) {
        has_offset = true;
        out = MARKED_OFFSET.replace(&out, " ${1}${2}${3}").into_owned();
    } else if BARE_MARKER.is_match(&out) {
        has_offset = true;
        out = BARE_MARKER.replace(&out, " +0000").into_owned();
    } else if TRAILING_OFFSET.is_match(&out) {
        has_offset = true;
        out = TRAILING_OFFSET.replace(&out, " ${1}${2}${3}").into_owned();
    }

    (WHITESPACE.replace_all(out.trim(), " ").into_owned(), has_offset)
}
