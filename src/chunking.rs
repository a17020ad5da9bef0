//! Date-range chunking for usage and readings.
//!
//! The API serves time series in bounded windows. A calendar range is split
//! into `[start, end)` windows aligned to local midnight in the meter's
//! timezone, one request is issued per window, and the pieces are stitched
//! back together.
//!
//! The UTC offset is taken once, at local midnight of the first day, and used
//! for every window. Windows that cross a daylight-saving change are therefore
//! shifted by the DST delta.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::client::CopperClient;
use crate::config::parse_timezone;
use crate::error::{CopperError, Result};
use crate::models::{merge, Meter, MeterLocation, Reading, UsageAccumulator, UsageChunk};
use crate::pagination::ErrorPolicy;
use crate::progress::Progress;
use crate::traits::Get;

/// One request window, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A calendar range `[start, end)` in the meter's local dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

/// How usage is requested.
#[derive(Debug, Clone)]
pub struct UsageOptions {
    /// Sample granularity understood by the API (`hour`, `day`, ...).
    pub granularity: String,
    /// Days covered by one request.
    pub step_days: u32,
    pub policy: ErrorPolicy,
}

impl Default for UsageOptions {
    fn default() -> Self {
        Self {
            granularity: "hour".to_string(),
            step_days: 1,
            policy: ErrorPolicy::Continue,
        }
    }
}

/// UTC offset of `tz` at local midnight of `date`.
///
/// A midnight skipped by a DST jump falls back to the offset in force at
/// that instant read as UTC.
pub fn offset_for(tz: Tz, date: NaiveDate) -> FixedOffset {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.offset_from_local_datetime(&midnight).earliest() {
        Some(offset) => offset.fix(),
        None => tz.offset_from_utc_datetime(&midnight).fix(),
    }
}

fn boundary(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local_midnight = date.and_time(NaiveTime::MIN);
    let utc = local_midnight - Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&utc)
}

/// The whole of `range` as a single UTC window.
pub fn window_for(range: DateRange, offset: FixedOffset) -> DateWindow {
    DateWindow {
        start: boundary(range.start, offset),
        end: boundary(range.end, offset),
    }
}

/// Split `range` into windows of `step_days` days.
///
/// The start is clamped to the local date of `created_at`, and windows ending
/// at or before `created_at` are dropped. The last window is shortened to end
/// at `range.end`. An empty or inverted range yields no windows.
///
/// # Errors
///
/// Returns [`CopperError::InvalidArgument`] when `step_days` is zero.
pub fn plan_windows(
    range: DateRange,
    step_days: u32,
    offset: FixedOffset,
    created_at: Option<DateTime<Utc>>,
) -> Result<Vec<DateWindow>> {
    if step_days == 0 {
        return Err(CopperError::InvalidArgument(
            "step must be at least one day".to_string(),
        ));
    }

    let mut day = range.start;
    if let Some(created) = created_at {
        let created_day = created.with_timezone(&offset).date_naive();
        if created_day > day {
            day = created_day;
        }
    }

    let step = Duration::days(i64::from(step_days));
    let mut windows = Vec::new();
    while day < range.end {
        let next = (day + step).min(range.end);
        let window = DateWindow {
            start: boundary(day, offset),
            end: boundary(next, offset),
        };
        if created_at.map_or(true, |created| window.end > created) {
            windows.push(window);
        }
        day = next;
    }

    Ok(windows)
}

/// Timezone used to align a meter's windows.
///
/// The configured override wins; otherwise the meter's location is looked up.
/// A location without a timezone falls back to UTC.
///
/// # Errors
///
/// Returns an error if the location lookup fails or names an unknown zone.
#[tracing::instrument(skip(client))]
pub async fn resolve_timezone(client: &CopperClient, meter_id: &str) -> Result<Tz> {
    if let Some(tz) = client.timezone() {
        return Ok(tz);
    }

    let location = MeterLocation::get(client, meter_id.to_string()).await?;
    match location.timezone.as_deref() {
        Some(name) if !name.trim().is_empty() => parse_timezone(name),
        _ => {
            tracing::warn!(meter_id, "meter location has no timezone, using UTC");
            Ok(Tz::UTC)
        }
    }
}

/// Usage of one meter over `range`, fetched window by window.
///
/// Failed windows are skipped under [`ErrorPolicy::Continue`] and leave a
/// gap in the series; `skipped_windows` counts them.
///
/// # Errors
///
/// Returns an error if the timezone cannot be resolved, the options are
/// invalid, or a window fails under [`ErrorPolicy::Abort`].
#[tracing::instrument(skip(client, meter, options, progress), fields(meter_id = %meter.id))]
pub async fn fetch_usage_chunked(
    client: &CopperClient,
    meter: &Meter,
    range: DateRange,
    options: &UsageOptions,
    progress: &dyn Progress,
) -> Result<UsageAccumulator> {
    let tz = resolve_timezone(client, &meter.id).await?;
    let offset = offset_for(tz, range.start);
    let windows = plan_windows(range, options.step_days, offset, meter.created_at)?;

    let mut acc = UsageAccumulator::new(&meter.id, tz.name(), offset.local_minus_utc());
    acc.meter_type = meter.meter_type.clone();

    for window in windows {
        progress.tick();
        match UsageChunk::fetch_meter(client, &meter.id, &options.granularity, window.start, window.end)
            .await
        {
            Ok(chunk) => acc = merge(acc, chunk),
            Err(e) if options.policy == ErrorPolicy::Continue => {
                tracing::warn!(start = %window.start, end = %window.end, error = %e, "usage window failed, skipping");
                acc.skipped_windows += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(acc)
}

/// Readings of one meter, in order, with the timezone their days were cut in.
#[derive(Debug, Clone)]
pub struct ReadingSeries {
    pub meter_id: String,
    pub tz: Tz,
    pub readings: Vec<Reading>,
    /// Days that failed and are missing from `readings`.
    pub skipped_windows: usize,
}

/// Readings of one meter over `range`, one day per request.
///
/// Each day is sorted by time before it is appended.
///
/// # Errors
///
/// Returns an error if the timezone cannot be resolved or a day fails under
/// [`ErrorPolicy::Abort`].
#[tracing::instrument(skip(client, meter, progress), fields(meter_id = %meter.id))]
pub async fn fetch_readings_chunked(
    client: &CopperClient,
    meter: &Meter,
    range: DateRange,
    policy: ErrorPolicy,
    progress: &dyn Progress,
) -> Result<ReadingSeries> {
    let tz = resolve_timezone(client, &meter.id).await?;
    let offset = offset_for(tz, range.start);
    let windows = plan_windows(range, 1, offset, meter.created_at)?;

    let mut readings = Vec::new();
    let mut skipped_windows = 0;
    for window in windows {
        progress.tick();
        match Reading::fetch(client, &meter.id, window.start, window.end).await {
            Ok(mut page) => {
                page.sort_by_key(|r| r.time);
                readings.extend(page);
            }
            Err(e) if policy == ErrorPolicy::Continue => {
                tracing::warn!(start = %window.start, end = %window.end, error = %e, "readings window failed, skipping");
                skipped_windows += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(ReadingSeries {
        meter_id: meter.id.clone(),
        tz,
        readings,
        skipped_windows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_offset_for_denver() {
        let tz: Tz = "America/Denver".parse().unwrap();
        assert_eq!(offset_for(tz, date(2024, 1, 15)).local_minus_utc(), -7 * 3600);
        assert_eq!(offset_for(tz, date(2024, 7, 15)).local_minus_utc(), -6 * 3600);
        assert_eq!(offset_for(Tz::UTC, date(2024, 7, 15)).local_minus_utc(), 0);
    }

    #[test]
    fn test_plan_daily_windows_aligned_to_local_midnight() {
        let offset = FixedOffset::west_opt(7 * 3600).unwrap();
        let windows =
            plan_windows(DateRange::new(date(2024, 1, 1), date(2024, 1, 4)), 1, offset, None).unwrap();

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].start, utc(2024, 1, 1, 7));
        assert_eq!(windows[0].end, utc(2024, 1, 2, 7));
        assert_eq!(windows[2].end, utc(2024, 1, 4, 7));
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_window_for_whole_range() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let window = window_for(DateRange::new(date(2024, 5, 1), date(2024, 5, 2)), offset);
        assert_eq!(window.start, utc(2024, 4, 30, 23));
        assert_eq!(window.end, utc(2024, 5, 1, 23));
    }

    #[test]
    fn test_plan_last_window_is_shortened() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let windows =
            plan_windows(DateRange::new(date(2024, 1, 1), date(2024, 1, 11)), 4, offset, None).unwrap();

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[2].start, utc(2024, 1, 9, 0));
        assert_eq!(windows[2].end, utc(2024, 1, 11, 0));
    }

    #[test]
    fn test_plan_clamps_to_creation() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let created = utc(2024, 1, 3, 12);
        let windows = plan_windows(
            DateRange::new(date(2024, 1, 1), date(2024, 1, 5)),
            1,
            offset,
            Some(created),
        )
        .unwrap();

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].start, utc(2024, 1, 3, 0));
    }

    #[test]
    fn test_plan_created_after_range_is_empty() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let windows = plan_windows(
            DateRange::new(date(2024, 1, 1), date(2024, 1, 3)),
            1,
            offset,
            Some(utc(2024, 6, 1, 0)),
        )
        .unwrap();
        assert!(windows.is_empty());
    }

    #[test]
    fn test_plan_empty_and_invalid() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let range = DateRange::new(date(2024, 1, 3), date(2024, 1, 1));
        assert!(plan_windows(range, 1, offset, None).unwrap().is_empty());

        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 3));
        assert!(matches!(
            plan_windows(range, 0, offset, None),
            Err(CopperError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_plan_keeps_start_offset_across_dst() {
        // Denver springs forward on 2024-03-10; the offset stays at -7h.
        let tz: Tz = "America/Denver".parse().unwrap();
        let offset = offset_for(tz, date(2024, 3, 9));
        let windows =
            plan_windows(DateRange::new(date(2024, 3, 9), date(2024, 3, 12)), 1, offset, None).unwrap();
        assert_eq!(windows[2].start, utc(2024, 3, 11, 7));
    }
}
