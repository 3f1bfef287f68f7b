//! Time-of-day arithmetic for the booking grid.
//!
//! Appointment times travel as `HH:MM` 24-hour strings; internally they are
//! minutes since midnight so interval math stays integral. All intervals are
//! half-open `[start, end)`, so back-to-back appointments never collide.

use crate::error::{AppError, AppResult};

/// Grid granularity in minutes.
pub const SLOT_MINUTES: u16 = 30;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Parse an `HH:MM` string into minutes since midnight.
pub fn parse_hhmm(s: &str) -> AppResult<u16> {
    let (hh, mm) = s
        .split_once(':')
        .ok_or_else(|| AppError::Validation(format!("Invalid time format: {s}")))?;
    // Exactly two digits each; u16::parse alone would tolerate a leading sign.
    if hh.len() != 2
        || mm.len() != 2
        || !hh.bytes().all(|b| b.is_ascii_digit())
        || !mm.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(AppError::Validation(format!("Invalid time format: {s}")));
    }
    let hours: u16 = hh
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid time format: {s}")))?;
    let minutes: u16 = mm
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid time format: {s}")))?;
    if hours > 23 || minutes > 59 {
        return Err(AppError::Validation(format!("Invalid time format: {s}")));
    }
    Ok(hours * 60 + minutes)
}

pub fn format_hhmm(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// A validated `[start, end)` interval within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: u16,
    pub end: u16,
}

impl TimeRange {
    pub fn parse(start: &str, end: &str) -> AppResult<Self> {
        let start = parse_hhmm(start)?;
        let end = parse_hhmm(end)?;
        if end <= start {
            return Err(AppError::Validation(
                "End time must be after start time".to_string(),
            ));
        }
        if end > MINUTES_PER_DAY {
            return Err(AppError::Validation(
                "Time range must fall within a single day".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Half-open interval overlap. Touching ranges (`a.end == b.start`) do
    /// not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Intersection of two windows, `None` when they do not meet.
    pub fn intersect(&self, other: &TimeRange) -> Option<TimeRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start < end {
            Some(TimeRange { start, end })
        } else {
            None
        }
    }
}

/// Fixed-width grid cells covering `window`, ascending. A trailing remainder
/// shorter than a full cell is dropped, matching the booking grid.
pub fn grid(window: TimeRange) -> Vec<TimeRange> {
    let mut cells = Vec::new();
    let mut start = window.start;
    while start + SLOT_MINUTES <= window.end {
        cells.push(TimeRange {
            start,
            end: start + SLOT_MINUTES,
        });
        start += SLOT_MINUTES;
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_times() {
        assert_eq!(parse_hhmm("00:00").unwrap(), 0);
        assert_eq!(parse_hhmm("09:30").unwrap(), 570);
        assert_eq!(parse_hhmm("23:59").unwrap(), 1439);
    }

    #[test]
    fn rejects_malformed_times() {
        for bad in [
            "9:30", "09:5", "24:00", "12:60", "noon", "12-30", "", "+9:30", "09:+5", " 9:30",
            "1a:30",
        ] {
            assert!(parse_hhmm(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn formats_back_to_hhmm() {
        assert_eq!(format_hhmm(570), "09:30");
        assert_eq!(format_hhmm(0), "00:00");
    }

    #[test]
    fn range_requires_end_after_start() {
        assert!(TimeRange::parse("10:00", "10:00").is_err());
        assert!(TimeRange::parse("10:30", "10:00").is_err());
        assert!(TimeRange::parse("10:00", "10:30").is_ok());
    }

    #[test]
    fn overlap_boundary_cases() {
        let existing = TimeRange::parse("10:00", "11:00").unwrap();

        // identical interval
        assert!(existing.overlaps(&TimeRange::parse("10:00", "11:00").unwrap()));
        // proposed strictly inside existing
        assert!(existing.overlaps(&TimeRange::parse("10:15", "10:45").unwrap()));
        // existing strictly inside proposed
        assert!(existing.overlaps(&TimeRange::parse("09:00", "12:00").unwrap()));
        // straddling either edge
        assert!(existing.overlaps(&TimeRange::parse("09:30", "10:30").unwrap()));
        assert!(existing.overlaps(&TimeRange::parse("10:30", "11:30").unwrap()));
        // touching but not overlapping
        assert!(!existing.overlaps(&TimeRange::parse("09:00", "10:00").unwrap()));
        assert!(!existing.overlaps(&TimeRange::parse("11:00", "12:00").unwrap()));
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = TimeRange::parse("10:00", "10:30").unwrap();
        let b = TimeRange::parse("10:15", "11:00").unwrap();
        assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    #[test]
    fn intersect_clamps_to_the_tighter_window() {
        let work = TimeRange::parse("09:00", "18:00").unwrap();
        let salon = TimeRange::parse("10:00", "17:00").unwrap();
        let clamped = work.intersect(&salon).unwrap();
        assert_eq!(clamped, TimeRange::parse("10:00", "17:00").unwrap());

        let disjoint = TimeRange::parse("19:00", "21:00").unwrap();
        assert!(work.intersect(&disjoint).is_none());
    }

    #[test]
    fn grid_covers_the_window_in_half_hours() {
        let window = TimeRange::parse("09:00", "12:00").unwrap();
        let cells = grid(window);
        assert_eq!(cells.len(), 6);
        assert_eq!(format_hhmm(cells[0].start), "09:00");
        assert_eq!(format_hhmm(cells[0].end), "09:30");
        assert_eq!(format_hhmm(cells[5].start), "11:30");
        assert_eq!(format_hhmm(cells[5].end), "12:00");
    }

    #[test]
    fn grid_drops_a_short_trailing_remainder() {
        let window = TimeRange::parse("09:00", "10:15").unwrap();
        let cells = grid(window);
        assert_eq!(cells.len(), 2);
        assert_eq!(format_hhmm(cells[1].end), "10:00");
    }

    #[test]
    fn nine_hour_day_yields_eighteen_slots() {
        let window = TimeRange::parse("09:00", "18:00").unwrap();
        assert_eq!(grid(window).len(), 18);
    }
}
