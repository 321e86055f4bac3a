// ABOUTME: Time-window validation and greedy splitting for range-limited provider requests
// ABOUTME: Converts calendar date ranges to epoch seconds and partitions them into legal windows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::NaiveDate;
use pierre_wellness_core::{SyncError, SyncResult, TimeWindow};

/// True iff `0 < end - start <= max_range_seconds`
#[must_use]
pub const fn validate_range(start: i64, end: i64, max_range_seconds: i64) -> bool {
    let span = end.saturating_sub(start);
    span > 0 && span <= max_range_seconds
}

/// Check a single window before it is sent
///
/// # Errors
///
/// Returns `RangeInvalid` when the window is empty, reversed, or too long
pub fn ensure_valid_window(window: TimeWindow, max_range_seconds: i64) -> SyncResult<()> {
    if validate_range(window.start, window.end, max_range_seconds) {
        Ok(())
    } else {
        Err(SyncError::RangeInvalid {
            start: window.start,
            end: window.end,
            max_range_seconds,
        })
    }
}

/// Partition `[start, end)` into consecutive windows of at most `max_range_seconds`
///
/// Windows are contiguous and non-overlapping; only the last may be shorter.
///
/// # Errors
///
/// Returns `RangeInvalid` when `end <= start` or `max_range_seconds <= 0`
pub fn split_range(start: i64, end: i64, max_range_seconds: i64) -> SyncResult<Vec<TimeWindow>> {
    if end <= start || max_range_seconds <= 0 {
        return Err(SyncError::RangeInvalid {
            start,
            end,
            max_range_seconds,
        });
    }

    let mut windows = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let window_end = cursor.saturating_add(max_range_seconds).min(end);
        windows.push(TimeWindow::new(cursor, window_end));
        cursor = window_end;
    }
    Ok(windows)
}

/// Convert a calendar date range to epoch seconds at UTC midnight
///
/// `end_date` is exclusive: 2025-01-01..2025-01-04 covers three full days.
///
/// # Errors
///
/// Returns `InvalidInput` when `end_date` is not after `start_date`
pub fn date_range_to_epoch(start_date: NaiveDate, end_date: NaiveDate) -> SyncResult<(i64, i64)> {
    if end_date <= start_date {
        return Err(SyncError::invalid_input(format!(
            "End date {end_date} must be after start date {start_date}"
        )));
    }
    Ok((midnight_epoch(start_date), midnight_epoch(end_date)))
}

fn midnight_epoch(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}
