//! League calendar: "today" in the league's home timezone, season
//! boundaries, strict date parsing and the availability messages shown
//! when a date has no games.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

use crate::types::StatsError;

/// Default regular-season window (month, day), inclusive.
pub const DEFAULT_SEASON_START: (u32, u32) = (3, 1);
pub const DEFAULT_SEASON_END: (u32, u32) = (11, 30);

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// LeagueCalendar
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct LeagueCalendar {
    tz: Tz,
    clock: Arc<dyn Clock>,
    season_start: (u32, u32),
    season_end: (u32, u32),
}

impl LeagueCalendar {
    pub fn new(tz: Tz, clock: Arc<dyn Clock>) -> Self {
        Self {
            tz,
            clock,
            season_start: DEFAULT_SEASON_START,
            season_end: DEFAULT_SEASON_END,
        }
    }

    pub fn system(tz: Tz) -> Self {
        Self::new(tz, Arc::new(SystemClock))
    }

    /// Calendar frozen at `now`, for tests and replays.
    pub fn fixed(tz: Tz, now: DateTime<Utc>) -> Self {
        Self::new(tz, Arc::new(FixedClock(now)))
    }

    pub fn with_season_bounds(mut self, start: (u32, u32), end: (u32, u32)) -> Self {
        self.season_start = start;
        self.season_end = end;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn now(&self) -> DateTime<Tz> {
        self.clock.now().with_timezone(&self.tz)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    pub fn yesterday(&self) -> NaiveDate {
        let today = self.today();
        today.pred_opt().unwrap_or(today)
    }

    pub fn is_today(&self, date: NaiveDate) -> bool {
        date == self.today()
    }

    pub fn is_future(&self, date: NaiveDate) -> bool {
        date > self.today()
    }

    /// November through February belong to the season that started the
    /// previous calendar year.
    pub fn infer_season(date: NaiveDate) -> i32 {
        match date.month() {
            1 | 2 => date.year() - 1,
            _ => date.year(),
        }
    }

    pub fn season_start(&self, season: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(season, self.season_start.0, self.season_start.1)
    }

    pub fn season_end(&self, season: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(season, self.season_end.0, self.season_end.1)
    }

    /// Why a date has no games, phrased for an end user.
    pub fn availability_message(&self, date: NaiveDate) -> String {
        let today = self.today();
        let long = format_long(date);

        if date.year() > today.year() {
            return format!(
                "Schedule for the {} MLB season is not yet available. Please check back later.",
                date.year()
            );
        }
        if date > today {
            return format!("No games are scheduled for {long} yet.");
        }
        match date.month() {
            1 | 2 => format!(
                "No games were played on {long}: the {} season had not started yet.",
                date.year()
            ),
            11 | 12 => format!("No games were played on {long} (off-season)."),
            _ if date.year() < today.year() => {
                format!("No games were played on {long} (past season).")
            }
            _ => format!("No games were played on {long}."),
        }
    }

    /// Message for a date whose games produced no qualifying lines.
    pub fn no_performances_message(&self, date: NaiveDate) -> String {
        format!(
            "No qualifying player performances were recorded on {}.",
            format_long(date)
        )
    }
}

impl std::fmt::Debug for LeagueCalendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeagueCalendar")
            .field("tz", &self.tz)
            .field("season_start", &self.season_start)
            .field("season_end", &self.season_end)
            .finish()
    }
}

/// Strict `YYYY-MM-DD` parsing. The text must be exactly ten characters
/// and name a real calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, StatsError> {
    let invalid = || {
        StatsError::InvalidInput(format!(
            "Invalid date format: '{input}'. Expected YYYY-MM-DD."
        ))
    };

    let bytes = input.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| invalid())
}

/// "July 4, 2024"
pub fn format_long(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Parse a `MM-DD` month/day pair, as used for season bounds in config.
pub fn parse_month_day(input: &str) -> Option<(u32, u32)> {
    let (month, day) = input.trim().split_once('-')?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    // 2024 is a leap year so Feb 29 is accepted here.
    NaiveDate::from_ymd_opt(2024, month, day).map(|_| (month, day))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
