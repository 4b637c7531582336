//! Day-schedule arithmetic: business hours, the shared overlap predicate
//! and the slot generator.
//!
//! All times are minute-of-day integers in `[0, 1440)`. Strings like
//! "09:30" exist only at the API edge (`minutes_to_hhmm`).

use serde::Serialize;

/// A half-open time range `[start, end)` already occupied by an active
/// booking (or a break). Invariant: `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct BusyInterval {
    pub start_min: i64,
    pub end_min: i64,
}

impl BusyInterval {
    pub fn new(start_min: i64, end_min: i64) -> Self {
        Self { start_min, end_min }
    }
}

/// Half-open interval intersection test.
///
/// Both the slot listing (read path) and the booking commit (write path)
/// must agree on what a conflict is, so this is the only place the
/// comparison lives. An interval ending exactly where another starts is
/// NOT a conflict (back-to-back bookings are allowed).
pub fn overlaps(start: i64, end: i64, busy: &BusyInterval) -> bool {
    start < busy.end_min && end > busy.start_min
}

/// Business hours and slot granularity for a working day.
#[derive(Debug, Clone)]
pub struct BusinessHours {
    /// Opening time, minute of day.
    pub open_min: i64,
    /// Closing time, minute of day.
    pub close_min: i64,
    /// Candidate start times advance by this step.
    pub step_min: i64,
    /// Optional break (e.g. lunch), treated like one more busy interval.
    pub break_interval: Option<BusyInterval>,
}

impl Default for BusinessHours {
    /// 08:00–20:00, 10-minute grid, no break.
    fn default() -> Self {
        Self {
            open_min: 8 * 60,
            close_min: 20 * 60,
            step_min: 10,
            break_interval: None,
        }
    }
}

impl BusinessHours {
    /// Read hours from env, falling back to the defaults per field.
    /// `BREAK_START_MIN`/`BREAK_END_MIN` must both be set to take effect.
    pub fn from_env() -> Self {
        fn env_min(key: &str) -> Option<i64> {
            std::env::var(key).ok()?.parse().ok()
        }

        let defaults = Self::default();
        let break_interval = match (env_min("BREAK_START_MIN"), env_min("BREAK_END_MIN")) {
            (Some(s), Some(e)) if s < e => Some(BusyInterval::new(s, e)),
            _ => None,
        };

        Self {
            open_min: env_min("OPEN_MIN").unwrap_or(defaults.open_min),
            close_min: env_min("CLOSE_MIN").unwrap_or(defaults.close_min),
            step_min: env_min("SLOT_STEP_MIN").filter(|s| *s > 0).unwrap_or(defaults.step_min),
            break_interval,
        }
    }

    /// Whether `[start, start + duration)` fits inside opening hours.
    pub fn within_hours(&self, start_min: i64, duration_min: i64) -> bool {
        start_min >= self.open_min && start_min + duration_min <= self.close_min
    }
}

/// A bookable start time plus its display label.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Slot {
    /// Start minute of day; what the client sends back on booking.
    pub value: i64,
    /// "HH:MM" for display.
    pub label: String,
}

/// Compute the ordered list of bookable start times for one day.
///
/// A start `t` is returned when it lies on the step grid (`open + k*step`),
/// the whole service fits before closing, and `[t, t+duration)` overlaps
/// neither any busy interval nor the break. Pure function: same inputs,
/// same output.
pub fn available_slots(
    hours: &BusinessHours,
    duration_min: i64,
    busy: &[BusyInterval],
) -> Vec<Slot> {
    let mut slots = Vec::new();

    let mut start = hours.open_min;
    while start + duration_min <= hours.close_min {
        let end = start + duration_min;
        let conflict = busy.iter().any(|b| overlaps(start, end, b))
            || hours
                .break_interval
                .as_ref()
                .is_some_and(|b| overlaps(start, end, b));

        if !conflict {
            slots.push(Slot {
                value: start,
                label: minutes_to_hhmm(start),
            });
        }
        start += hours.step_min;
    }

    slots
}

/// Render a minute-of-day as "HH:MM".
pub fn minutes_to_hhmm(min: i64) -> String {
    format!("{:02}:{:02}", min / 60, min % 60)
}

// ── Tests ──
